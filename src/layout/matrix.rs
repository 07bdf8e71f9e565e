use crate::chart::{capitalize, MatrixConfig};
use crate::data::{Dataset, Record};
use crate::ir::{Frame, Geometry, Label, Shape, Style};
use crate::palette::Rgb;
use crate::scale::{max_of, Accessor, BandScale, ColorScale, ScaleConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCell {
    pub category: String,
    pub age_group: String,
    pub athlete_count: usize,
    pub medal_count: f64,
    /// Medals per athlete as a percentage, clamped to `[0, 100]`; 0 for an empty cell.
    pub success_rate: f64,
}

impl MatrixCell {
    fn to_record(&self, category_field: &str) -> Record {
        Record::new()
            .with(category_field, self.category.as_str())
            .with("ageGroup", self.age_group.as_str())
            .with("athleteCount", self.athlete_count as f64)
            .with("medalCount", self.medal_count)
            .with("value", self.success_rate)
    }
}

pub fn success_rate(medals: f64, athletes: usize) -> f64 {
    if athletes == 0 {
        return 0.0;
    }
    (medals / athletes as f64 * 100.0).clamp(0.0, 100.0)
}

/// Cross every age group with the leading categories, in group-major order.
///
/// Ages come from the configured field, falling back to `fallback_age` when missing.
/// Records outside every age group, or without a category, are not counted.
pub fn bin(dataset: &Dataset, config: &MatrixConfig) -> (Vec<String>, Vec<MatrixCell>) {
    let mut categories = dataset.distinct(&config.category);
    if let Some(limit) = config.max_categories {
        categories.truncate(limit);
    }
    let age = Accessor::field(&config.age).or(config.fallback_age);

    let mut cells = Vec::with_capacity(config.age_groups.len() * categories.len());
    for group in &config.age_groups {
        for category in &categories {
            let (athletes, medals) = dataset
                .iter()
                .filter(|r| r.has(&config.category) && r.label(&config.category) == *category)
                .filter(|r| group.contains(age.value(r)))
                .fold((0usize, 0.0), |(n, m), r| (n + 1, m + r.number_or(&config.medals, 0.0).max(0.0)));
            cells.push(MatrixCell {
                category: category.clone(),
                age_group: group.label.clone(),
                athlete_count: athletes,
                medal_count: medals,
                success_rate: success_rate(medals, athletes),
            });
        }
    }
    (categories, cells)
}

#[tracing::instrument(level = "debug", skip_all, fields(records = dataset.len()))]
pub fn layout(dataset: &Dataset, config: &MatrixConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let (categories, cells) = bin(dataset, config);
    if categories.is_empty() {
        return geometry;
    }

    let x = BandScale::new(categories, frame.x_range(), scales.band_padding);
    let (bottom, top) = frame.y_range();
    let groups = config.age_groups.iter().map(|g| g.label.clone()).collect();
    let y = BandScale::new(groups, (top, bottom), scales.band_padding);
    let color = ColorScale::new(
        scales.zero_domain(max_of(cells.iter().map(|c| c.success_rate))),
        scales.palette,
    );

    for cell in &cells {
        let (Some(x0), Some(y0)) = (x.map(&cell.category), y.map(&cell.age_group)) else {
            continue;
        };
        let fill = color.color(cell.success_rate);
        geometry.push(
            format!("{}/{}", cell.category, cell.age_group),
            cell.to_record(&config.category),
            Shape::Rect {
                x: x0,
                y: y0,
                width: x.bandwidth(),
                height: y.bandwidth(),
            },
            Style::filled(fill).with_stroke(Rgb::WHITE, 2.0),
        );
        let text = if cell.success_rate > 0.0 {
            format!("{:.1}%", cell.success_rate)
        } else {
            "0%".to_string()
        };
        geometry.labels.push(
            Label::new(x0 + x.bandwidth() / 2.0, y0 + y.bandwidth() / 2.0 + 4.0, text)
                .sized(11.0)
                .colored(fill.contrasting_text()),
        );
    }

    geometry.axes.push(super::band_axis(&x, frame, Some(capitalize(&config.category))));
    geometry.axes.push(super::band_axis_left(&y, frame, Some("Age Groups".into())));
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athlete(sport: &str, age: Option<f64>, medals: f64) -> Record {
        let r = Record::new().with("sport", sport).with("medalCount", medals);
        match age {
            Some(a) => r.with("age", a),
            None => r,
        }
    }

    #[test]
    fn test_success_rate_zero_athletes() {
        assert_eq!(success_rate(5.0, 0), 0.0);
        assert_eq!(success_rate(1.0, 4), 25.0);
        assert_eq!(success_rate(9.0, 2), 100.0);
    }

    #[test]
    fn test_bin_counts_and_rates() {
        let data: Dataset = vec![
            athlete("Swimming", Some(22.0), 1.0),
            athlete("Swimming", Some(24.0), 0.0),
            athlete("Swimming", Some(33.0), 1.0),
            athlete("Rowing", None, 1.0),
        ]
        .into_iter()
        .collect();
        let (categories, cells) = bin(&data, &MatrixConfig::default());
        assert_eq!(categories, vec!["Swimming", "Rowing"]);
        assert_eq!(cells.len(), 8);

        let swim_young = &cells[0];
        assert_eq!(swim_young.age_group, "18-25");
        assert_eq!(swim_young.athlete_count, 2);
        assert_eq!(swim_young.success_rate, 50.0);

        // Missing age falls back to 25.
        let rowing_young = &cells[1];
        assert_eq!(rowing_young.athlete_count, 1);

        let swim_mid = cells.iter().find(|c| c.category == "Swimming" && c.age_group == "26-30").unwrap();
        assert_eq!(swim_mid.athlete_count, 0);
        assert_eq!(swim_mid.success_rate, 0.0);
    }

    #[test]
    fn test_rates_always_in_range() {
        let data: Dataset = vec![
            athlete("Judo", Some(40.0), 7.0),
            athlete("Judo", Some(19.0), -3.0),
            athlete("Judo", Some(16.0), 1.0),
        ]
        .into_iter()
        .collect();
        let (_, cells) = bin(&data, &MatrixConfig::default());
        assert!(cells.iter().all(|c| (0.0..=100.0).contains(&c.success_rate)));
        assert_eq!(cells.iter().map(|c| c.athlete_count).sum::<usize>(), 2);
    }

    #[test]
    fn test_category_limit() {
        let data: Dataset = (0..10).map(|i| athlete(&format!("Sport{}", i), Some(20.0), 1.0)).collect();
        let (categories, cells) = bin(&data, &MatrixConfig::default());
        assert_eq!(categories.len(), 8);
        assert_eq!(cells.len(), 32);
    }

    #[test]
    fn test_layout_cells_and_labels() {
        let data: Dataset = vec![athlete("Swimming", Some(22.0), 1.0)].into_iter().collect();
        let geometry = layout(&data, &MatrixConfig::default(), &Frame::default(), &ScaleConfig::default());
        assert_eq!(geometry.primitives.len(), 4);
        assert_eq!(geometry.labels[0].text, "100.0%");
        assert_eq!(geometry.labels[1].text, "0%");
        assert_eq!(geometry.primitives[0].datum.number("athleteCount"), Some(1.0));
    }
}
