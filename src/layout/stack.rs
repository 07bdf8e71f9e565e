use crate::chart::{capitalize, StackedBarConfig};
use crate::data::Dataset;
use crate::ir::{Frame, Geometry, LegendEntry, Shape, Style};
use crate::palette::Rgb;
use crate::scale::{max_of, BandScale, LinearScale, ScaleConfig};

/// Tolerance for comparing a declared total with the stacked sum.
const TOTAL_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct StackSegment {
    pub key: String,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedRow {
    /// Position of the source record in the dataset.
    pub index: usize,
    pub segments: Vec<StackSegment>,
    pub total: f64,
}

/// Cumulative `[y0, y1]` bands per key, in the given key order.
///
/// Missing or invalid key values count as 0, negative values are clamped to 0. The row
/// total is always the stacked sum; a declared total that disagrees is logged.
pub fn stack(dataset: &Dataset, keys: &[String], total_field: Option<&str>) -> Vec<StackedRow> {
    dataset
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut y = 0.0;
            let segments = keys
                .iter()
                .map(|key| {
                    let value = record.number_or(key, 0.0).max(0.0);
                    let segment = StackSegment {
                        key: key.clone(),
                        y0: y,
                        y1: y + value,
                    };
                    y += value;
                    segment
                })
                .collect();

            if let Some(declared) = total_field.and_then(|f| record.number(f)) {
                if (declared - y).abs() > TOTAL_EPSILON {
                    tracing::warn!(index, declared, stacked = y, "declared total does not match stacked keys");
                }
            }

            StackedRow {
                index,
                segments,
                total: y,
            }
        })
        .collect()
}

#[tracing::instrument(level = "debug", skip_all, fields(records = dataset.len()))]
pub fn layout(dataset: &Dataset, config: &StackedBarConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let rows = stack(dataset, &config.keys, config.total.as_deref());

    let x = BandScale::new(dataset.distinct(&config.x), frame.x_range(), scales.band_padding);
    let y = LinearScale::new(
        scales.zero_domain(max_of(rows.iter().map(|r| r.total))),
        frame.y_range(),
    );

    for (row, record) in rows.iter().zip(dataset.iter()) {
        let Some(x0) = x.map(&record.label(&config.x)) else {
            continue;
        };
        for (k, segment) in row.segments.iter().enumerate() {
            geometry.push(
                segment.key.clone(),
                record.clone(),
                Shape::rect_between(x0, y.map(segment.y0), x0 + x.bandwidth(), y.map(segment.y1)),
                Style::filled(scales.palette.categorical(k)).with_stroke(Rgb::WHITE, 1.0),
            );
        }
    }

    geometry.legend = config
        .keys
        .iter()
        .enumerate()
        .map(|(k, key)| LegendEntry {
            label: capitalize(key),
            color: scales.palette.categorical(k),
        })
        .collect();
    geometry.axes.push(super::band_axis(&x, frame, Some(capitalize(&config.x))));
    geometry.axes.push(super::value_axis(&y, frame, Some("Medals".into())));
    geometry
}
