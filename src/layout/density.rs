use crate::chart::{capitalize, ViolinConfig};
use crate::data::{Dataset, Record};
use crate::ir::{Frame, Geometry, Shape, Style};
use crate::palette::Rgb;
use crate::scale::{Accessor, BandScale, LinearScale, ScaleConfig};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl Summary {
    /// `None` for an empty sample.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            count: sorted.len(),
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            median: percentile(&sorted, 0.5),
            q1: percentile(&sorted, 0.25),
            q3: percentile(&sorted, 0.75),
        })
    }
}

/// Linear interpolation between closest ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let rank = p * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Per-category density profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Violin {
    pub category: String,
    pub counts: Vec<usize>,
    /// `count / max(count)` per bin, 0 everywhere when the category is empty.
    pub widths: Vec<f64>,
    pub summary: Summary,
}

/// Drawn half-width, in pixels, of a bin whose profile width is 0.
const MIN_HALF_WIDTH: f64 = 0.5;

/// Count values into `bins` equal-width bins over `domain`. The top edge is inclusive.
pub fn histogram(values: &[f64], domain: (f64, f64), bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    let (lo, hi) = domain;
    if bins == 0 || hi <= lo {
        return counts;
    }
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let i = (((v - lo) / (hi - lo)) * bins as f64).floor() as usize;
        counts[i.min(bins - 1)] += 1;
    }
    counts
}

/// Histogram of `value` per `category`, all categories binned over the same domain.
pub fn density(dataset: &Dataset, config: &ViolinConfig, domain: (f64, f64)) -> Vec<Violin> {
    let accessor = Accessor {
        field: config.value.clone(),
        fallback: config.fallback,
    };
    let mut order: Vec<String> = Vec::new();
    let mut samples: HashMap<String, Vec<f64>> = HashMap::new();
    for record in dataset {
        if !record.has(&config.category) {
            continue;
        }
        let Some(v) = accessor.read(record) else {
            continue;
        };
        let category = record.label(&config.category);
        samples
            .entry(category.clone())
            .or_insert_with(|| {
                order.push(category);
                Vec::new()
            })
            .push(v);
    }

    order
        .into_iter()
        .filter_map(|category| {
            let values = samples.remove(&category)?;
            let counts = histogram(&values, domain, config.bins.max(1));
            let max = counts.iter().copied().max().unwrap_or(0);
            let widths = counts
                .iter()
                .map(|&c| if max == 0 { 0.0 } else { c as f64 / max as f64 })
                .collect();
            Some(Violin {
                category,
                counts,
                widths,
                summary: Summary::of(&values)?,
            })
        })
        .collect()
}

#[tracing::instrument(level = "debug", skip_all, fields(records = dataset.len()))]
pub fn layout(dataset: &Dataset, config: &ViolinConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let accessor = Accessor {
        field: config.value.clone(),
        fallback: config.fallback,
    };
    let extent = dataset
        .iter()
        .filter_map(|r| accessor.read(r))
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });
    let domain = scales.continuous_domain(extent);
    let violins = density(dataset, config, domain);

    let categories = violins.iter().map(|v| v.category.clone()).collect();
    let x = BandScale::new(categories, frame.x_range(), scales.band_padding);
    let y = LinearScale::new(domain, frame.y_range());
    let half = x.bandwidth() / 2.0;
    let bins = config.bins.max(1);
    let bin_height = (domain.1 - domain.0) / bins as f64;

    for (k, violin) in violins.iter().enumerate() {
        let Some(cx) = x.center(&violin.category) else {
            continue;
        };
        let color = scales.palette.categorical(k);
        let mids: Vec<f64> = (0..bins)
            .map(|i| y.map(domain.0 + bin_height * (i as f64 + 0.5)))
            .collect();
        // Empty bins keep a hairline so the outline stays closed.
        let offset = |w: &f64| (w * half).max(MIN_HALF_WIDTH);
        let right = violin.widths.iter().zip(&mids).map(|(w, py)| (cx + offset(w), *py));
        let left = violin.widths.iter().zip(&mids).rev().map(|(w, py)| (cx - offset(w), *py));
        let points = right.chain(left).collect();

        let s = &violin.summary;
        let datum = Record::new()
            .with(&config.category, violin.category.as_str())
            .with("count", s.count as f64)
            .with("mean", s.mean)
            .with("median", s.median)
            .with("q1", s.q1)
            .with("q3", s.q3);
        geometry.push(
            violin.category.clone(),
            datum,
            Shape::Polygon { points },
            Style::filled(color).with_stroke(color, 1.0).with_opacity(0.7),
        );

        let box_half = half * 0.1;
        geometry.decorate(
            Shape::rect_between(cx - box_half, y.map(s.q1), cx + box_half, y.map(s.q3)),
            Style::filled(Rgb::WHITE).with_stroke(Rgb::STROKE, 1.0),
        );
        geometry.decorate(
            Shape::Line {
                x1: cx - box_half * 2.0,
                y1: y.map(s.median),
                x2: cx + box_half * 2.0,
                y2: y.map(s.median),
            },
            Style::stroked(Rgb::BLACK, 2.0),
        );
    }

    geometry.axes.push(super::band_axis(&x, frame, Some(capitalize(&config.category))));
    geometry.axes.push(super::value_axis(&y, frame, Some(capitalize(&config.value))));
    geometry
}
