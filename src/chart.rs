// Chart router keys and per-chart configuration.

use crate::error::{BoardError, BoardResult};
use crate::interaction::TooltipTemplate;
use crate::palette::{Palette, Rgb};
use crate::scale::ScaleConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    StackedBar,
    Bubble,
    Scatter,
    Line,
    MultiLine,
    ClusteredBar,
    Heatmap,
    MedalHeatmap,
    Sunburst,
    Violin,
    Parallel,
    Matrix,
}

impl ChartKind {
    pub const ALL: [ChartKind; 13] = [
        ChartKind::Bar,
        ChartKind::StackedBar,
        ChartKind::Bubble,
        ChartKind::Scatter,
        ChartKind::Line,
        ChartKind::MultiLine,
        ChartKind::ClusteredBar,
        ChartKind::Heatmap,
        ChartKind::MedalHeatmap,
        ChartKind::Sunburst,
        ChartKind::Violin,
        ChartKind::Parallel,
        ChartKind::Matrix,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::StackedBar => "stacked_bar",
            ChartKind::Bubble => "bubble",
            ChartKind::Scatter => "scatter",
            ChartKind::Line => "line",
            ChartKind::MultiLine => "multi_line",
            ChartKind::ClusteredBar => "clustered_bar",
            ChartKind::Heatmap => "heatmap",
            ChartKind::MedalHeatmap => "medal_heatmap",
            ChartKind::Sunburst => "sunburst",
            ChartKind::Violin => "violin",
            ChartKind::Parallel => "parallel",
            ChartKind::Matrix => "matrix",
        }
    }

    /// Scale resolver settings each chart starts from.
    pub fn default_scales(self) -> ScaleConfig {
        let base = ScaleConfig::default();
        match self {
            ChartKind::StackedBar => base.with_palette(Palette::Medal),
            ChartKind::Bubble => base.with_palette(Palette::Viridis),
            ChartKind::Heatmap | ChartKind::MedalHeatmap | ChartKind::Matrix => {
                base.with_palette(Palette::YlOrRd).with_padding(0.05)
            }
            _ => base,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ChartKind {
    type Err = BoardError;

    fn from_str(s: &str) -> BoardResult<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ChartKind::ALL
            .into_iter()
            .find(|k| k.key() == wanted)
            .ok_or_else(|| BoardError::UnsupportedChart(s.to_string()))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    pub x: String,
    pub y: String,
    pub color: Rgb,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            x: "country".into(),
            y: "total".into(),
            color: Rgb(70, 130, 180),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackedBarConfig {
    pub x: String,
    /// Stacking order, bottom first.
    pub keys: Vec<String>,
    /// Declared total to check the stack against.
    pub total: Option<String>,
}

impl Default for StackedBarConfig {
    fn default() -> Self {
        Self {
            x: "country".into(),
            keys: strings(&["gold", "silver", "bronze"]),
            total: Some("total".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    pub x: String,
    pub y: String,
    pub size: String,
    pub label: String,
    /// Only the first N bubbles get a text label.
    pub label_limit: usize,
    pub max_radius: f64,
    /// Categorical colouring field; `None` colours by `size` on the sequential palette.
    pub color_by: Option<String>,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            x: "gold".into(),
            y: "silver".into(),
            size: "total".into(),
            label: "code".into(),
            label_limit: 10,
            max_radius: 40.0,
            color_by: None,
        }
    }
}

/// Population-versus-efficiency bubbles, coloured by region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub x: String,
    pub y: String,
    pub size: String,
    pub label: String,
    pub label_limit: usize,
    pub max_radius: f64,
    pub color_by: Option<String>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            x: "population".into(),
            y: "medals_per_capita".into(),
            size: "total_medals".into(),
            label: "country".into(),
            label_limit: 0,
            max_radius: 40.0,
            color_by: Some("region".into()),
        }
    }
}

impl From<&ScatterConfig> for BubbleConfig {
    fn from(c: &ScatterConfig) -> Self {
        Self {
            x: c.x.clone(),
            y: c.y.clone(),
            size: c.size.clone(),
            label: c.label.clone(),
            label_limit: c.label_limit,
            max_radius: c.max_radius,
            color_by: c.color_by.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub x: String,
    pub y: String,
    pub color: Rgb,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            x: "year".into(),
            y: "total".into(),
            color: Rgb(70, 130, 180),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiLineConfig {
    pub x: String,
    pub series: Vec<String>,
}

impl Default for MultiLineConfig {
    fn default() -> Self {
        Self {
            x: "year".into(),
            series: strings(&["male", "female", "total"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteredBarConfig {
    pub category: String,
    pub subcategory: String,
    pub value: String,
    pub inner_padding: f64,
    /// Multiplier applied to the max value for the top of the y domain.
    pub headroom: f64,
}

impl Default for ClusteredBarConfig {
    fn default() -> Self {
        Self {
            category: "category".into(),
            subcategory: "subcategory".into(),
            value: "value".into(),
            inner_padding: 0.05,
            headroom: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub x: String,
    pub y: String,
    pub value: String,
    /// Cells above this fraction of the max value get a text label.
    pub label_threshold: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            x: "sport".into(),
            y: "country".into(),
            value: "total".into(),
            label_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedalHeatmapConfig {
    /// Number of leading countries pivoted into rows.
    pub countries: usize,
    pub label_threshold: f64,
}

impl Default for MedalHeatmapConfig {
    fn default() -> Self {
        Self {
            countries: 12,
            label_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunburstConfig {
    pub category: String,
    pub value: String,
    pub root: String,
    /// Arcs whose value exceeds this get a text label.
    pub label_threshold: f64,
}

impl Default for SunburstConfig {
    fn default() -> Self {
        Self {
            category: "sport".into(),
            value: "medals".into(),
            root: "Olympics".into(),
            label_threshold: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolinConfig {
    pub category: String,
    pub value: String,
    pub bins: usize,
    /// Substitute for missing values; `None` leaves such records out of the histogram.
    pub fallback: Option<f64>,
}

impl Default for ViolinConfig {
    fn default() -> Self {
        Self {
            category: "sport".into(),
            value: "age".into(),
            bins: 15,
            fallback: None,
        }
    }
}

/// Half-open age bucket `[min, max)`; `max: None` is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroup {
    pub label: String,
    pub min: f64,
    pub max: Option<f64>,
}

impl AgeGroup {
    pub fn new(label: &str, min: f64, max: Option<f64>) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
        }
    }

    pub fn contains(&self, age: f64) -> bool {
        age >= self.min && self.max.map_or(true, |max| age < max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub category: String,
    pub age: String,
    pub medals: String,
    pub age_groups: Vec<AgeGroup>,
    pub fallback_age: f64,
    pub max_categories: Option<usize>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            category: "sport".into(),
            age: "age".into(),
            medals: "medalCount".into(),
            age_groups: vec![
                AgeGroup::new("18-25", 18.0, Some(26.0)),
                AgeGroup::new("26-30", 26.0, Some(31.0)),
                AgeGroup::new("31-35", 31.0, Some(36.0)),
                AgeGroup::new("36+", 36.0, None),
            ],
            fallback_age: 25.0,
            max_categories: Some(8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub field: String,
    pub label: String,
    pub fallback: f64,
}

impl Dimension {
    pub fn new(field: &str, label: &str, fallback: f64) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    pub dimensions: Vec<Dimension>,
    /// Field used to colour each polyline.
    pub color_by: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            dimensions: vec![
                Dimension::new("age", "Age", 25.0),
                Dimension::new("medalCount", "Medal Count", 0.0),
                Dimension::new("countryRank", "Country Rank", 50.0),
                Dimension::new("sportPopularity", "Sport Popularity", 5.0),
                Dimension::new("performanceScore", "Performance Score", 50.0),
            ],
            color_by: "country".into(),
        }
    }
}

/// A chart type together with its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    Bar(BarConfig),
    StackedBar(StackedBarConfig),
    Bubble(BubbleConfig),
    Scatter(ScatterConfig),
    Line(LineConfig),
    MultiLine(MultiLineConfig),
    ClusteredBar(ClusteredBarConfig),
    Heatmap(HeatmapConfig),
    MedalHeatmap(MedalHeatmapConfig),
    Sunburst(SunburstConfig),
    Violin(ViolinConfig),
    Parallel(ParallelConfig),
    Matrix(MatrixConfig),
}

impl ChartSpec {
    pub fn default_for(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Bar => ChartSpec::Bar(Default::default()),
            ChartKind::StackedBar => ChartSpec::StackedBar(Default::default()),
            ChartKind::Bubble => ChartSpec::Bubble(Default::default()),
            ChartKind::Scatter => ChartSpec::Scatter(Default::default()),
            ChartKind::Line => ChartSpec::Line(Default::default()),
            ChartKind::MultiLine => ChartSpec::MultiLine(Default::default()),
            ChartKind::ClusteredBar => ChartSpec::ClusteredBar(Default::default()),
            ChartKind::Heatmap => ChartSpec::Heatmap(Default::default()),
            ChartKind::MedalHeatmap => ChartSpec::MedalHeatmap(Default::default()),
            ChartKind::Sunburst => ChartSpec::Sunburst(Default::default()),
            ChartKind::Violin => ChartSpec::Violin(Default::default()),
            ChartKind::Parallel => ChartSpec::Parallel(Default::default()),
            ChartKind::Matrix => ChartSpec::Matrix(Default::default()),
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Bar(_) => ChartKind::Bar,
            ChartSpec::StackedBar(_) => ChartKind::StackedBar,
            ChartSpec::Bubble(_) => ChartKind::Bubble,
            ChartSpec::Scatter(_) => ChartKind::Scatter,
            ChartSpec::Line(_) => ChartKind::Line,
            ChartSpec::MultiLine(_) => ChartKind::MultiLine,
            ChartSpec::ClusteredBar(_) => ChartKind::ClusteredBar,
            ChartSpec::Heatmap(_) => ChartKind::Heatmap,
            ChartSpec::MedalHeatmap(_) => ChartKind::MedalHeatmap,
            ChartSpec::Sunburst(_) => ChartKind::Sunburst,
            ChartSpec::Violin(_) => ChartKind::Violin,
            ChartSpec::Parallel(_) => ChartKind::Parallel,
            ChartSpec::Matrix(_) => ChartKind::Matrix,
        }
    }

    /// Human-readable title used by the renderer.
    pub fn title(&self) -> &'static str {
        match self.kind() {
            ChartKind::Bar => "Medal Totals",
            ChartKind::StackedBar => "Medal Breakdown by Country",
            ChartKind::Bubble => "Gold vs Silver",
            ChartKind::Scatter => "Medal Efficiency by Population",
            ChartKind::Line => "Trend over Time",
            ChartKind::MultiLine => "Participation by Gender",
            ChartKind::ClusteredBar => "Comparison by Category",
            ChartKind::Heatmap => "Medals by Country and Sport",
            ChartKind::MedalHeatmap => "Medal Types by Country",
            ChartKind::Sunburst => "Olympic Sports",
            ChartKind::Violin => "Age Distribution by Sport",
            ChartKind::Parallel => "Athlete Profiles",
            ChartKind::Matrix => "Success Rate by Age Group",
        }
    }

    /// Tooltip fields shown on hover, per chart type.
    pub fn tooltip(&self) -> TooltipTemplate {
        match self {
            ChartSpec::Bar(c) => TooltipTemplate::new([
                format!("{{{}}}", c.x),
                format!("Value: {{{}}}", c.y),
                "?Gold: {gold}".into(),
                "?Silver: {silver}".into(),
                "?Bronze: {bronze}".into(),
            ]),
            ChartSpec::StackedBar(c) => TooltipTemplate::new(
                std::iter::once(format!("{{{}}}", c.x))
                    .chain(c.keys.iter().map(|k| format!("{}: {{{}}}", capitalize(k), k)))
                    .chain(c.total.iter().map(|t| format!("Total: {{{}}}", t))),
            ),
            ChartSpec::Bubble(_) => TooltipTemplate::new([
                "{country}",
                "Gold: {gold}",
                "Silver: {silver}",
                "Bronze: {bronze}",
                "Total: {total}",
            ]),
            ChartSpec::Scatter(_) => TooltipTemplate::new([
                "{country}",
                "Region: {region}",
                "Population: {population:M}",
                "Total Medals: {total_medals}",
                "Medals per Million: {medals_per_capita:.2}",
            ]),
            ChartSpec::Line(c) => TooltipTemplate::new([
                format!("{{{}}}", c.x),
                format!("{}: {{{}}}", capitalize(&c.y), c.y),
            ]),
            ChartSpec::MultiLine(c) => TooltipTemplate::new(
                std::iter::once(format!("Year: {{{}}}", c.x))
                    .chain(c.series.iter().map(|s| format!("?{}: {{{}}}", capitalize(s), s))),
            ),
            ChartSpec::ClusteredBar(c) => TooltipTemplate::new([
                format!("{{{}}}", c.category),
                format!("{{{}}}: {{{}}}", c.subcategory, c.value),
                "?{description}".into(),
            ]),
            ChartSpec::Heatmap(c) => TooltipTemplate::new([
                format!("{{{}}} - {{{}}}", c.y, c.x),
                "?Gold: {gold}".into(),
                "?Silver: {silver}".into(),
                "?Bronze: {bronze}".into(),
                format!("Total: {{{}}}", c.value),
                "?Athletes: {athletes}".into(),
                "?Events: {events}".into(),
            ]),
            ChartSpec::MedalHeatmap(_) => TooltipTemplate::new(["{country}", "{medalType}: {value}"]),
            ChartSpec::Sunburst(_) => TooltipTemplate::new([
                "{name}",
                "Total Medals: {value}",
                "?Gold Medals: {goldMedals}",
                "?Average Age: {avgAge} years",
                "?Athletes: {athletes}",
                "?Events: {events}",
            ]),
            ChartSpec::Violin(c) => TooltipTemplate::new([
                format!("{{{}}}", c.category),
                "Athletes: {count}".into(),
                "Avg Age: {mean:.1}".into(),
                "Median: {median:.1}".into(),
                "Q1: {q1:.1}, Q3: {q3:.1}".into(),
            ]),
            ChartSpec::Parallel(c) => TooltipTemplate::new(
                std::iter::once("{country}".to_string()).chain(
                    c.dimensions
                        .iter()
                        .map(|d| format!("{}: {{{}}}", d.label, d.field)),
                ),
            ),
            ChartSpec::Matrix(c) => TooltipTemplate::new([
                format!("{{{}}} - {{ageGroup}}", c.category),
                "Athletes: {athleteCount}".into(),
                "Total Medals: {medalCount}".into(),
                "Success Rate: {value:.2}%".into(),
            ]),
        }
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
