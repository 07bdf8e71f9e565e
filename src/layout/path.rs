// Connected marks: single and multi-series lines, parallel coordinates.

use crate::chart::{capitalize, LineConfig, MultiLineConfig, ParallelConfig};
use crate::data::{Dataset, Record};
use crate::ir::{Axis, Frame, Geometry, LegendEntry, Orientation, Shape, Style};
use crate::palette::Rgb;
use crate::scale::{max_of, resolve, Accessor, LinearScale, PointScale, Scale, ScaleConfig, ScaleKind};

const DOT_RADIUS: f64 = 4.0;

/// Records ordered by the x accessor. Ties keep input order.
fn sorted_by<'a>(dataset: &'a Dataset, x: &Accessor) -> Vec<&'a Record> {
    let mut rows: Vec<&Record> = dataset.iter().collect();
    rows.sort_by(|a, b| x.value(a).total_cmp(&x.value(b)));
    rows
}

pub fn line(dataset: &Dataset, config: &LineConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    if dataset.is_empty() {
        return geometry;
    }
    let (xv, yv) = (Accessor::field(&config.x), Accessor::field(&config.y));

    let x = LinearScale::new(scales.continuous_domain(dataset.extent(&config.x)), frame.x_range());
    let y = LinearScale::new(scales.zero_domain(max_of(dataset.iter().map(|r| yv.value(r)))), frame.y_range());

    let rows = sorted_by(dataset, &xv);
    let points: Vec<(f64, f64)> = rows.iter().map(|r| (x.map(xv.value(r)), y.map(yv.value(r)))).collect();
    geometry.decorate(Shape::Polyline { points: points.clone() }, Style::stroked(config.color, 2.0));

    for (record, (cx, cy)) in rows.into_iter().zip(points) {
        geometry.push(
            record.label(&config.x),
            record.clone(),
            Shape::Circle { cx, cy, r: DOT_RADIUS },
            Style::filled(config.color).with_stroke(Rgb::WHITE, 1.0),
        );
    }

    geometry.axes.push(super::bottom_value_axis(&x, frame, Some(capitalize(&config.x))));
    geometry.axes.push(super::value_axis(&y, frame, Some(capitalize(&config.y))));
    geometry
}

/// Several numeric series over a shared sorted x key.
pub fn multi_line(dataset: &Dataset, config: &MultiLineConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    if dataset.is_empty() {
        return geometry;
    }
    let xv = Accessor::field(&config.x);
    let series: Vec<Accessor> = config.series.iter().map(|s| Accessor::field(s)).collect();

    let x = LinearScale::new(scales.continuous_domain(dataset.extent(&config.x)), frame.x_range());
    let max = max_of(dataset.iter().flat_map(|r| series.iter().map(move |s| s.value(r))));
    let y = LinearScale::new(scales.zero_domain(max), frame.y_range());
    let rows = sorted_by(dataset, &xv);

    for (k, accessor) in series.iter().enumerate() {
        let color = scales.palette.categorical(k);
        let points: Vec<(f64, f64)> = rows
            .iter()
            .map(|r| (x.map(xv.value(r)), y.map(accessor.value(r))))
            .collect();
        geometry.decorate(Shape::Polyline { points: points.clone() }, Style::stroked(color, 2.0));
        for (record, (cx, cy)) in rows.iter().zip(points) {
            geometry.push(
                accessor.field.clone(),
                (*record).clone(),
                Shape::Circle { cx, cy, r: DOT_RADIUS },
                Style::filled(color).with_stroke(Rgb::WHITE, 1.0),
            );
        }
        geometry.legend.push(LegendEntry {
            label: capitalize(&accessor.field),
            color,
        });
    }

    geometry.axes.push(super::bottom_value_axis(&x, frame, Some(capitalize(&config.x))));
    geometry.axes.push(super::value_axis(&y, frame, None));
    geometry
}

/// One polyline per record across evenly spaced vertical axes.
///
/// Each axis has its own linear scale over the extent of that dimension, with the
/// dimension's fallback substituted for missing values.
pub fn parallel(dataset: &Dataset, config: &ParallelConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    if dataset.is_empty() {
        return geometry;
    }
    let labels: Vec<String> = config.dimensions.iter().map(|d| d.label.clone()).collect();
    let position = PointScale::new(labels, frame.x_range());
    let axes: Vec<(f64, Accessor, LinearScale)> = config
        .dimensions
        .iter()
        .filter_map(|d| {
            let accessor = Accessor::field(&d.field).or(d.fallback);
            let Scale::Linear(scale) = resolve(dataset, &accessor, frame.y_range(), ScaleKind::Linear, scales) else {
                return None;
            };
            Some((position.map(&d.label)?, accessor, scale))
        })
        .collect();
    let groups = dataset.distinct(&config.color_by);

    for record in dataset {
        let key = record.label(&config.color_by);
        let points = axes
            .iter()
            .map(|(px, accessor, scale)| (*px, scale.map(accessor.value(record))))
            .collect();
        let index = groups.iter().position(|g| *g == key).unwrap_or(0);
        geometry.push(
            key,
            record.clone(),
            Shape::Polyline { points },
            Style::stroked(scales.palette.categorical(index), 1.5).with_opacity(0.6),
        );
    }

    for ((px, _, scale), dimension) in axes.iter().zip(&config.dimensions) {
        geometry.axes.push(Axis {
            orientation: Orientation::Vertical,
            offset: *px,
            span: frame.y_range(),
            ticks: super::numeric_ticks(scale),
            title: Some(dimension.label.clone()),
        });
    }
    geometry
}
