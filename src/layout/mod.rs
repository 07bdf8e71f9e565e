//! Layout algorithms: pure functions from a dataset and a chart config to geometry.

pub mod density;
pub mod matrix;
pub mod partition;
pub mod path;
pub mod place;
pub mod stack;

use crate::chart::ChartSpec;
use crate::data::{format_number, Dataset};
use crate::ir::{Axis, Frame, Geometry, Orientation, Tick};
use crate::scale::{BandScale, LinearScale, ScaleConfig};

const VALUE_TICKS: usize = 5;

/// Build the geometry for any chart type.
///
/// An empty dataset yields an empty geometry; callers decide how to present that.
#[tracing::instrument(level = "debug", skip_all, fields(chart = %spec.kind(), records = dataset.len()))]
pub fn layout(dataset: &Dataset, spec: &ChartSpec, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let geometry = match spec {
        ChartSpec::Bar(c) => place::bar(dataset, c, frame, scales),
        ChartSpec::StackedBar(c) => stack::layout(dataset, c, frame, scales),
        ChartSpec::Bubble(c) => place::bubble(dataset, c, frame, scales),
        ChartSpec::Scatter(c) => place::bubble(dataset, &c.into(), frame, scales),
        ChartSpec::Line(c) => path::line(dataset, c, frame, scales),
        ChartSpec::MultiLine(c) => path::multi_line(dataset, c, frame, scales),
        ChartSpec::ClusteredBar(c) => place::clustered_bar(dataset, c, frame, scales),
        ChartSpec::Heatmap(c) => place::heatmap(dataset, c, frame, scales),
        ChartSpec::MedalHeatmap(c) => place::medal_heatmap(dataset, c, frame, scales),
        ChartSpec::Sunburst(c) => partition::layout(dataset, c, frame, scales),
        ChartSpec::Violin(c) => density::layout(dataset, c, frame, scales),
        ChartSpec::Parallel(c) => path::parallel(dataset, c, frame, scales),
        ChartSpec::Matrix(c) => matrix::layout(dataset, c, frame, scales),
    };
    tracing::debug!(primitives = geometry.primitives.len(), "layout complete");
    geometry
}

/// Category axis along the bottom of the plot area, one tick per band.
pub(crate) fn band_axis(scale: &BandScale, frame: &Frame, title: Option<String>) -> Axis {
    let ticks = scale
        .domain
        .iter()
        .filter_map(|c| {
            scale.center(c).map(|position| Tick {
                position,
                label: c.clone(),
            })
        })
        .collect();
    Axis {
        orientation: Orientation::Bottom,
        offset: frame.y_range().0,
        span: frame.x_range(),
        ticks,
        title,
    }
}

/// Category axis along the left edge, for heatmap rows.
pub(crate) fn band_axis_left(scale: &BandScale, frame: &Frame, title: Option<String>) -> Axis {
    Axis {
        orientation: Orientation::Left,
        offset: frame.x_range().0,
        span: frame.y_range(),
        ..band_axis(scale, frame, title)
    }
}

/// Numeric axis along the left edge.
pub(crate) fn value_axis(scale: &LinearScale, frame: &Frame, title: Option<String>) -> Axis {
    Axis {
        orientation: Orientation::Left,
        offset: frame.x_range().0,
        span: frame.y_range(),
        ticks: numeric_ticks(scale),
        title,
    }
}

/// Numeric axis along the bottom edge.
pub(crate) fn bottom_value_axis(scale: &LinearScale, frame: &Frame, title: Option<String>) -> Axis {
    Axis {
        orientation: Orientation::Bottom,
        offset: frame.y_range().0,
        span: frame.x_range(),
        ticks: numeric_ticks(scale),
        title,
    }
}

pub(crate) fn numeric_ticks(scale: &LinearScale) -> Vec<Tick> {
    scale
        .ticks(VALUE_TICKS)
        .into_iter()
        .map(|v| Tick {
            position: scale.map(v),
            label: format_number(v),
        })
        .collect()
}
