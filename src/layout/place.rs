// Direct placement: one primitive per record, no intermediate aggregation.

use crate::chart::{capitalize, BarConfig, BubbleConfig, ClusteredBarConfig, HeatmapConfig, MedalHeatmapConfig};
use crate::data::{format_number, medal_pivot, Dataset};
use crate::ir::{Frame, Geometry, Label, LegendEntry, Shape, Style};
use crate::palette::Rgb;
use crate::scale::{max_of, Accessor, BandScale, ColorScale, LinearScale, ScaleConfig, SqrtScale};

pub fn bar(dataset: &Dataset, config: &BarConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let value = Accessor::field(&config.y);

    let x = BandScale::new(dataset.distinct(&config.x), frame.x_range(), scales.band_padding);
    let y = LinearScale::new(
        scales.zero_domain(max_of(dataset.iter().map(|r| value.value(r)))),
        frame.y_range(),
    );

    for record in dataset {
        let category = record.label(&config.x);
        let Some(x0) = x.map(&category) else {
            continue;
        };
        geometry.push(
            category,
            record.clone(),
            Shape::rect_between(x0, y.map(0.0), x0 + x.bandwidth(), y.map(value.value(record))),
            Style::filled(config.color),
        );
    }

    geometry.axes.push(super::band_axis(&x, frame, Some(capitalize(&config.x))));
    geometry.axes.push(super::value_axis(&y, frame, Some(capitalize(&config.y))));
    geometry
}

/// Bubbles on two zero-based linear axes, radius on a square-root scale.
pub fn bubble(dataset: &Dataset, config: &BubbleConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let (xv, yv, sv) = (
        Accessor::field(&config.x),
        Accessor::field(&config.y),
        Accessor::field(&config.size),
    );

    let max_size = max_of(dataset.iter().map(|r| sv.value(r)));
    let x = LinearScale::new(scales.zero_domain(max_of(dataset.iter().map(|r| xv.value(r)))), frame.x_range());
    let y = LinearScale::new(scales.zero_domain(max_of(dataset.iter().map(|r| yv.value(r)))), frame.y_range());
    let radius = SqrtScale::new(scales.zero_domain(max_size), (0.0, config.max_radius));
    let color = ColorScale::new(scales.zero_domain(max_size), scales.palette);
    let groups = config.color_by.as_ref().map(|f| dataset.distinct(f));

    for (i, record) in dataset.iter().enumerate() {
        let (cx, cy) = (x.map(xv.value(record)), y.map(yv.value(record)));
        let r = radius.map(sv.value(record)).max(0.0);
        let fill = match config.color_by.as_ref().zip(groups.as_ref()) {
            Some((field, groups)) => {
                let label = record.label(field);
                let index = groups.iter().position(|g| *g == label).unwrap_or(0);
                scales.palette.categorical(index)
            }
            None => color.color(sv.value(record)),
        };

        geometry.push(
            record.label(&config.label),
            record.clone(),
            Shape::Circle { cx, cy, r },
            Style::filled(fill).with_stroke(Rgb::WHITE, 1.0).with_opacity(0.7),
        );

        let text = record.label(&config.label);
        if i < config.label_limit && !text.is_empty() {
            geometry.labels.push(Label::new(cx, cy + 4.0, text).sized(10.0).colored(Rgb::WHITE));
        }
    }

    if let Some(groups) = &groups {
        geometry.legend = groups
            .iter()
            .enumerate()
            .map(|(i, g)| LegendEntry {
                label: g.clone(),
                color: scales.palette.categorical(i),
            })
            .collect();
    }
    geometry.axes.push(super::bottom_value_axis(&x, frame, Some(capitalize(&config.x))));
    geometry.axes.push(super::value_axis(&y, frame, Some(capitalize(&config.y))));
    geometry
}

/// Bars grouped by an outer category, one inner band per subcategory.
pub fn clustered_bar(dataset: &Dataset, config: &ClusteredBarConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let value = Accessor::field(&config.value);

    let outer = BandScale::new(dataset.distinct(&config.category), frame.x_range(), scales.band_padding);
    let inner = BandScale::new(
        dataset.distinct(&config.subcategory),
        (0.0, outer.bandwidth()),
        config.inner_padding,
    );
    let max = max_of(dataset.iter().map(|r| value.value(r)));
    let y = LinearScale::new(scales.zero_domain(max * config.headroom), frame.y_range());

    for record in dataset {
        let sub = record.label(&config.subcategory);
        let (Some(x0), Some(dx), Some(k)) = (
            outer.map(&record.label(&config.category)),
            inner.map(&sub),
            inner.index_of(&sub),
        ) else {
            continue;
        };
        geometry.push(
            sub,
            record.clone(),
            Shape::rect_between(
                x0 + dx,
                y.map(0.0),
                x0 + dx + inner.bandwidth(),
                y.map(value.value(record)),
            ),
            Style::filled(scales.palette.categorical(k)).with_opacity(0.8),
        );
    }

    geometry.legend = inner
        .domain
        .iter()
        .enumerate()
        .map(|(k, label)| LegendEntry {
            label: label.clone(),
            color: scales.palette.categorical(k),
        })
        .collect();
    geometry.axes.push(super::band_axis(&outer, frame, Some(capitalize(&config.category))));
    geometry.axes.push(super::value_axis(&y, frame, Some(capitalize(&config.value))));
    geometry
}

/// Band x band grid coloured by a sequential scale over `[0, max]`.
pub fn heatmap(dataset: &Dataset, config: &HeatmapConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let value = Accessor::field(&config.value);

    let x = BandScale::new(dataset.distinct(&config.x), frame.x_range(), scales.band_padding);
    let (bottom, top) = frame.y_range();
    let y = BandScale::new(dataset.distinct(&config.y), (top, bottom), scales.band_padding);
    let max = max_of(dataset.iter().map(|r| value.value(r)));
    let color = ColorScale::new(scales.zero_domain(max), scales.palette);

    for record in dataset {
        let (Some(x0), Some(y0)) = (x.map(&record.label(&config.x)), y.map(&record.label(&config.y))) else {
            continue;
        };
        let v = value.value(record);
        let fill = color.color(v);
        geometry.push(
            format!("{}/{}", record.label(&config.y), record.label(&config.x)),
            record.clone(),
            Shape::Rect {
                x: x0,
                y: y0,
                width: x.bandwidth(),
                height: y.bandwidth(),
            },
            Style::filled(fill).with_stroke(Rgb::WHITE, 1.0),
        );
        if max > 0.0 && v > config.label_threshold * max {
            geometry.labels.push(
                Label::new(x0 + x.bandwidth() / 2.0, y0 + y.bandwidth() / 2.0 + 4.0, format_number(v))
                    .sized(10.0)
                    .colored(fill.contrasting_text()),
            );
        }
    }

    geometry.axes.push(super::band_axis(&x, frame, Some(capitalize(&config.x))));
    geometry.axes.push(super::band_axis_left(&y, frame, Some(capitalize(&config.y))));
    geometry
}

/// Country x medal-type heatmap over the pivoted leading countries.
pub fn medal_heatmap(dataset: &Dataset, config: &MedalHeatmapConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let pivot = medal_pivot(dataset, config.countries);
    let cells = HeatmapConfig {
        x: "medalType".into(),
        y: "country".into(),
        value: "value".into(),
        label_threshold: config.label_threshold,
    };
    heatmap(&pivot, &cells, frame, scales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::palette::Palette;

    fn medals() -> Dataset {
        vec![
            Record::new().with("country", "USA").with("code", "USA").with("gold", 40).with("silver", 40).with("total", 120),
            Record::new().with("country", "China").with("code", "CHN").with("gold", 10).with("silver", 20).with("total", 30),
        ]
        .into_iter()
        .collect()
    }

    fn circle(geometry: &Geometry, i: usize) -> (f64, f64, f64) {
        match geometry.primitives[i].shape {
            Shape::Circle { cx, cy, r } => (cx, cy, r),
            ref other => panic!("expected circle, got {:?}", other),
        }
    }

    #[test]
    fn test_bar_heights() {
        let frame = Frame::default();
        let geometry = bar(&medals(), &BarConfig::default(), &frame, &ScaleConfig::default());
        assert_eq!(geometry.primitives.len(), 2);
        let Shape::Rect { height, .. } = geometry.primitives[1].shape else {
            panic!("expected rect")
        };
        assert!((height - frame.inner_height() * 30.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_bar_all_zero_uses_fallback_domain() {
        let data: Dataset = vec![Record::new().with("country", "FRA").with("total", 0)].into_iter().collect();
        let geometry = bar(&data, &BarConfig::default(), &Frame::default(), &ScaleConfig::default());
        assert!(geometry.is_finite());
        let Shape::Rect { height, .. } = geometry.primitives[0].shape else {
            panic!("expected rect")
        };
        assert_eq!(height, 0.0);
    }

    #[test]
    fn test_bubble_area_proportional_to_size() {
        let geometry = bubble(&medals(), &BubbleConfig::default(), &Frame::default(), &ScaleConfig::default());
        let (_, _, r_usa) = circle(&geometry, 0);
        let (_, _, r_chn) = circle(&geometry, 1);
        assert!((r_usa - 40.0).abs() < 1e-9);
        assert!(((r_usa * r_usa) / (r_chn * r_chn) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bubble_labels_limited() {
        let config = BubbleConfig {
            label_limit: 1,
            ..BubbleConfig::default()
        };
        let geometry = bubble(&medals(), &config, &Frame::default(), &ScaleConfig::default());
        assert_eq!(geometry.labels.len(), 1);
        assert_eq!(geometry.labels[0].text, "USA");
    }

    #[test]
    fn test_bubble_categorical_colour() {
        let data: Dataset = vec![
            Record::new().with("region", "Europe").with("total_medals", 5),
            Record::new().with("region", "Asia").with("total_medals", 5),
            Record::new().with("region", "Europe").with("total_medals", 5),
        ]
        .into_iter()
        .collect();
        let config: BubbleConfig = (&crate::chart::ScatterConfig::default()).into();
        let geometry = bubble(&data, &config, &Frame::default(), &ScaleConfig::default());
        assert_eq!(geometry.primitives[0].style.fill, geometry.primitives[2].style.fill);
        assert_ne!(geometry.primitives[0].style.fill, geometry.primitives[1].style.fill);
        assert_eq!(geometry.legend.len(), 2);
    }

    #[test]
    fn test_clustered_bars_sit_inside_outer_band() {
        let data: Dataset = vec![
            Record::new().with("category", "Summer").with("subcategory", "Men").with("value", 10),
            Record::new().with("category", "Summer").with("subcategory", "Women").with("value", 8),
            Record::new().with("category", "Winter").with("subcategory", "Men").with("value", 4),
        ]
        .into_iter()
        .collect();
        let frame = Frame::default();
        let scales = ScaleConfig::default();
        let geometry = clustered_bar(&data, &ClusteredBarConfig::default(), &frame, &scales);
        assert_eq!(geometry.primitives.len(), 3);
        let outer = BandScale::new(data.distinct("category"), frame.x_range(), scales.band_padding);
        let start = outer.map("Summer").unwrap();
        for p in &geometry.primitives[..2] {
            let Shape::Rect { x, width, .. } = p.shape else { panic!("expected rect") };
            assert!(x >= start - 1e-9 && x + width <= start + outer.bandwidth() + 1e-9);
        }
        // max 10 with 1.1 headroom: the tallest bar stops short of the top.
        let Shape::Rect { y, .. } = geometry.primitives[0].shape else { panic!("expected rect") };
        assert!(y > frame.margin.top);
    }

    #[test]
    fn test_heatmap_colour_and_labels() {
        let data: Dataset = vec![
            Record::new().with("country", "USA").with("sport", "Swimming").with("total", 100),
            Record::new().with("country", "USA").with("sport", "Rowing").with("total", 10),
        ]
        .into_iter()
        .collect();
        let scales = ScaleConfig::default().with_palette(Palette::YlOrRd);
        let geometry = heatmap(&data, &HeatmapConfig::default(), &Frame::default(), &scales);
        assert_eq!(geometry.primitives[0].style.fill, Some(Palette::YlOrRd.interpolate(1.0)));
        assert_eq!(geometry.labels.len(), 1);
        assert_eq!(geometry.labels[0].text, "100");
        assert_eq!(geometry.primitives[0].key, "USA/Swimming");
    }

    #[test]
    fn test_medal_heatmap_pivots_rows() {
        let geometry = medal_heatmap(&medals(), &MedalHeatmapConfig::default(), &Frame::default(), &ScaleConfig::default());
        assert_eq!(geometry.primitives.len(), 6);
        assert_eq!(geometry.primitives[0].datum.text("medalType"), Some("gold"));
    }
}
