use crate::data::{Dataset, Record};
use crate::palette::{Palette, Rgb};
use serde::{Deserialize, Serialize};

/// Reads a numeric field from a record, optionally substituting a fallback
/// for missing or non-numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessor {
    pub field: String,
    #[serde(default)]
    pub fallback: Option<f64>,
}

impl Accessor {
    pub fn field(field: &str) -> Self {
        Self {
            field: field.to_string(),
            fallback: None,
        }
    }

    pub fn or(mut self, fallback: f64) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// The value used for domain computation: the field, else the fallback.
    pub fn read(&self, record: &Record) -> Option<f64> {
        record.number(&self.field).or(self.fallback)
    }

    /// The value used for positioning. Anything unreadable counts as 0.
    pub fn value(&self, record: &Record) -> f64 {
        self.read(record).unwrap_or(0.0)
    }
}

/// Resolver settings owned by a single chart view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    #[serde(default = "default_band_padding")]
    pub band_padding: f64,
    #[serde(default = "default_fallback_domain")]
    pub fallback_domain: (f64, f64),
    #[serde(default)]
    pub palette: Palette,
}

fn default_band_padding() -> f64 {
    0.1
}

fn default_fallback_domain() -> (f64, f64) {
    (0.0, 100.0)
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            band_padding: default_band_padding(),
            fallback_domain: default_fallback_domain(),
            palette: Palette::default(),
        }
    }
}

impl ScaleConfig {
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.band_padding = padding;
        self
    }

    /// Turn a raw min/max into a usable continuous domain.
    ///
    /// Empty input and all-equal values fall back to `fallback_domain`. A single value
    /// outside the fallback is padded by one unit instead so it still lands on the plot,
    /// unless it is too large for the padding to register.
    pub fn continuous_domain(&self, extent: Option<(f64, f64)>) -> (f64, f64) {
        let (lo, hi) = self.fallback_domain;
        match extent {
            Some((min, max)) if min < max => (min, max),
            Some((v, _)) if (v < lo || v > hi) && v - 1.0 < v + 1.0 => (v - 1.0, v + 1.0),
            _ => (lo, hi),
        }
    }

    /// Domain `[0, max]` used by bar heights, bubble axes and colour ramps.
    pub fn zero_domain(&self, max: f64) -> (f64, f64) {
        let extent = if max.is_finite() && max != 0.0 {
            Some((max.min(0.0), max.max(0.0)))
        } else {
            None
        };
        self.continuous_domain(extent)
    }
}

fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Max of the valid values, or 0 when there are none.
pub fn max_of<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    extent(values).map(|(_, hi)| hi).unwrap_or(0.0)
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    /// The caller guarantees `domain.0 != domain.1`; `ScaleConfig` domains always are.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = (sanitize(v) - d0) / (d1 - d0);
        r0 + t * (r1 - r0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        nice_ticks(d0.min(d1), d0.max(d1), count)
    }
}

/// Square-root scale: area, not radius, is linear in the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqrtScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let signed_sqrt = |x: f64| x.signum() * x.abs().sqrt();
        let (d0, d1) = (signed_sqrt(self.domain.0), signed_sqrt(self.domain.1));
        let (r0, r1) = self.range;
        if d0 == d1 {
            return r0;
        }
        let t = (signed_sqrt(sanitize(v)) - d0) / (d1 - d0);
        r0 + t * (r1 - r0)
    }
}

/// Categorical scale dividing the range into equal bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: (f64, f64),
    pub padding: f64,
}

impl BandScale {
    pub fn new(domain: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        Self {
            domain,
            range,
            padding: padding.clamp(0.0, 1.0),
        }
    }

    pub fn step(&self) -> f64 {
        let n = self.domain.len() as f64;
        (self.range.1 - self.range.0) / (n + self.padding).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    pub fn index_of(&self, category: &str) -> Option<usize> {
        self.domain.iter().position(|c| c == category)
    }

    /// Start of the band for a category.
    pub fn map(&self, category: &str) -> Option<f64> {
        let step = self.step();
        self.index_of(category)
            .map(|i| self.range.0 + step * self.padding + step * i as f64)
    }

    pub fn center(&self, category: &str) -> Option<f64> {
        self.map(category).map(|x| x + self.bandwidth() / 2.0)
    }
}

/// Categorical scale mapping to evenly spaced points (parallel-coordinate axes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointScale {
    pub domain: Vec<String>,
    pub range: (f64, f64),
}

impl PointScale {
    pub fn new(domain: Vec<String>, range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, category: &str) -> Option<f64> {
        let n = self.domain.len();
        let span = self.range.1 - self.range.0;
        let i = self.domain.iter().position(|c| c == category)?;
        if n <= 1 {
            return Some(self.range.0 + span / 2.0);
        }
        Some(self.range.0 + span * i as f64 / (n - 1) as f64)
    }
}

/// Sequential colour scale: monotonic interpolation over a palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub domain: (f64, f64),
    pub palette: Palette,
}

impl ColorScale {
    pub fn new(domain: (f64, f64), palette: Palette) -> Self {
        Self { domain, palette }
    }

    pub fn color(&self, v: f64) -> Rgb {
        let (d0, d1) = self.domain;
        let t = if d1 == d0 {
            0.0
        } else {
            (sanitize(v) - d0) / (d1 - d0)
        };
        self.palette.interpolate(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Linear,
    Sqrt,
    Band,
    Point,
    SequentialColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scale {
    Linear(LinearScale),
    Sqrt(SqrtScale),
    Band(BandScale),
    Point(PointScale),
    SequentialColor(ColorScale),
}

impl Scale {
    pub fn kind(&self) -> ScaleKind {
        match self {
            Scale::Linear(_) => ScaleKind::Linear,
            Scale::Sqrt(_) => ScaleKind::Sqrt,
            Scale::Band(_) => ScaleKind::Band,
            Scale::Point(_) => ScaleKind::Point,
            Scale::SequentialColor(_) => ScaleKind::SequentialColor,
        }
    }

    /// Position of a record along this scale. Categorical scales return the band centre.
    pub fn position(&self, accessor: &Accessor, record: &Record) -> Option<f64> {
        match self {
            Scale::Linear(s) => Some(s.map(accessor.value(record))),
            Scale::Sqrt(s) => Some(s.map(accessor.value(record))),
            Scale::Band(s) => s.center(&record.label(&accessor.field)),
            Scale::Point(s) => s.map(&record.label(&accessor.field)),
            Scale::SequentialColor(_) => None,
        }
    }
}

/// Resolve a scale for one field of a dataset.
///
/// Continuous kinds take their domain from the valid values of the field; band and point
/// kinds take the distinct labels in first-seen order. The colour kind ignores `range`
/// and uses the configured palette.
#[tracing::instrument(level = "debug", skip(dataset, config), fields(records = dataset.len()))]
pub fn resolve(
    dataset: &Dataset,
    accessor: &Accessor,
    range: (f64, f64),
    kind: ScaleKind,
    config: &ScaleConfig,
) -> Scale {
    let values = || dataset.iter().filter_map(|r| accessor.read(r));
    match kind {
        ScaleKind::Linear => {
            Scale::Linear(LinearScale::new(config.continuous_domain(extent(values())), range))
        }
        ScaleKind::Sqrt => Scale::Sqrt(SqrtScale::new(config.zero_domain(max_of(values())), range)),
        ScaleKind::Band => Scale::Band(BandScale::new(
            dataset.distinct(&accessor.field),
            range,
            config.band_padding,
        )),
        ScaleKind::Point => Scale::Point(PointScale::new(dataset.distinct(&accessor.field), range)),
        ScaleKind::SequentialColor => Scale::SequentialColor(ColorScale::new(
            config.continuous_domain(extent(values())),
            config.palette,
        )),
    }
}

/// Round tick positions covering `[lo, hi]`, roughly `count` of them.
pub fn nice_ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo || count == 0 {
        return vec![sanitize(lo)];
    }
    let raw = (hi - lo) / count as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = magnitude
        * match raw / magnitude {
            n if n >= 7.07 => 10.0,
            n if n >= 3.16 => 5.0,
            n if n >= 1.41 => 2.0,
            _ => 1.0,
        };
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(values: &[f64]) -> Dataset {
        values
            .iter()
            .map(|v| Record::new().with("v", *v))
            .collect()
    }

    #[test]
    fn test_linear_domain_from_data() {
        let data = dataset(&[10.0, 50.0, 30.0]);
        let scale = resolve(&data, &Accessor::field("v"), (0.0, 400.0), ScaleKind::Linear, &ScaleConfig::default());
        match scale {
            Scale::Linear(s) => {
                assert_eq!(s.domain, (10.0, 50.0));
                assert_eq!(s.map(30.0), 200.0);
            }
            other => panic!("expected linear, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_empty_falls_back() {
        let scale = resolve(&Dataset::default(), &Accessor::field("v"), (0.0, 1.0), ScaleKind::Linear, &ScaleConfig::default());
        match scale {
            Scale::Linear(s) => assert_eq!(s.domain, (0.0, 100.0)),
            other => panic!("expected linear, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_all_invalid_falls_back() {
        let data: Dataset = vec![Record::new().with("v", "n/a"), Record::new()].into_iter().collect();
        let scale = resolve(&data, &Accessor::field("v"), (0.0, 1.0), ScaleKind::Linear, &ScaleConfig::default());
        let Scale::Linear(s) = scale else { panic!("expected linear") };
        assert_eq!(s.domain, (0.0, 100.0));
        assert!(s.map(f64::NAN).is_finite());
    }

    #[test]
    fn test_degenerate_domain() {
        let config = ScaleConfig::default();
        assert_eq!(config.continuous_domain(Some((42.0, 42.0))), (0.0, 100.0));
        assert_eq!(config.continuous_domain(Some((2020.0, 2020.0))), (2019.0, 2021.0));
        assert_eq!(config.zero_domain(0.0), (0.0, 100.0));
        assert_eq!(config.zero_domain(250.0), (0.0, 250.0));
        // Padding by one unit is lost at this magnitude.
        assert_eq!(config.continuous_domain(Some((1e17, 1e17))), (0.0, 100.0));
    }

    #[test]
    fn test_accessor_fallback_participates_in_domain() {
        let data: Dataset = vec![
            Record::new().with("age", 30),
            Record::new(),
        ]
        .into_iter()
        .collect();
        let scale = resolve(&data, &Accessor::field("age").or(25.0), (0.0, 10.0), ScaleKind::Linear, &ScaleConfig::default());
        let Scale::Linear(s) = scale else { panic!("expected linear") };
        assert_eq!(s.domain, (25.0, 30.0));
    }

    #[test]
    fn test_sqrt_area_is_linear() {
        let scale = SqrtScale::new((0.0, 100.0), (0.0, 40.0));
        let small = scale.map(25.0);
        let large = scale.map(100.0);
        let value_ratio: f64 = 100.0 / 25.0;
        assert!((large / small - value_ratio.sqrt()).abs() < 1e-9);
        assert!(((large * large) / (small * small) - value_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_sqrt_resolve_anchors_at_zero() {
        let data = dataset(&[16.0, 64.0]);
        let Scale::Sqrt(s) = resolve(&data, &Accessor::field("v"), (0.0, 8.0), ScaleKind::Sqrt, &ScaleConfig::default()) else {
            panic!("expected sqrt")
        };
        assert_eq!(s.domain, (0.0, 64.0));
        assert_eq!(s.map(16.0), 4.0);
    }

    #[test]
    fn test_band_first_seen_order_and_padding() {
        let data: Dataset = ["USA", "CHN", "USA", "GBR"]
            .iter()
            .map(|c| Record::new().with("country", *c))
            .collect();
        let Scale::Band(band) = resolve(&data, &Accessor::field("country"), (0.0, 310.0), ScaleKind::Band, &ScaleConfig::default()) else {
            panic!("expected band")
        };
        assert_eq!(band.domain, vec!["USA", "CHN", "GBR"]);
        // step = 310 / 3.1 = 100
        assert!((band.step() - 100.0).abs() < 1e-9);
        assert!((band.bandwidth() - 90.0).abs() < 1e-9);
        assert!((band.map("USA").unwrap() - 10.0).abs() < 1e-9);
        assert!((band.map("GBR").unwrap() - 210.0).abs() < 1e-9);
        assert_eq!(band.map("FRA"), None);
    }

    #[test]
    fn test_band_empty_domain_is_finite() {
        let band = BandScale::new(Vec::new(), (0.0, 100.0), 0.1);
        assert!(band.step().is_finite());
    }

    #[test]
    fn test_point_scale() {
        let scale = PointScale::new(vec!["a".into(), "b".into(), "c".into()], (0.0, 100.0));
        assert_eq!(scale.map("b"), Some(50.0));
        let single = PointScale::new(vec!["a".into()], (0.0, 100.0));
        assert_eq!(single.map("a"), Some(50.0));
    }

    #[test]
    fn test_color_scale_monotonic() {
        let scale = ColorScale::new((0.0, 10.0), Palette::YlOrRd);
        let mut last = f64::INFINITY;
        for v in 0..=10 {
            let lum = scale.color(v as f64).luminance();
            assert!(lum <= last + 1e-9);
            last = lum;
        }
        assert_eq!(scale.color(-5.0), scale.color(0.0));
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 100.0, 5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(nice_ticks(5.0, 5.0, 5), vec![5.0]);
    }
}
