//! Facet Filter Engine.
//!
//! `filter` is a pure function of `(dataset, spec)`: it never mutates its input, keeps
//! record order, and returns identical output for identical input.

use crate::data::{Dataset, Record, Value, MEDAL_FIELDS};
use crate::error::{BoardError, BoardResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

const COUNTRY_OPTIONS: usize = 20;
const SPORT_OPTIONS: usize = 15;
const DEFAULT_YEARS: YearRange = YearRange { min: 1896, max: 2020 };

/// One filter dimension: unrestricted, or restricted to a set of allowed values.
///
/// `Only` with an empty set matches nothing; it arises from intersecting disjoint facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Facet<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Facet<T> {
    fn default() -> Self {
        Facet::All
    }
}

impl<T: Ord + Clone> Facet<T> {
    /// An empty selection means no restriction.
    pub fn from_values<I: IntoIterator<Item = T>>(values: I) -> Self {
        let set: BTreeSet<T> = values.into_iter().collect();
        if set.is_empty() {
            Facet::All
        } else {
            Facet::Only(set)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Facet::All)
    }

    pub fn allows(&self, value: &T) -> bool {
        match self {
            Facet::All => true,
            Facet::Only(set) => set.contains(value),
        }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Facet::All, f) | (f, Facet::All) => f.clone(),
            (Facet::Only(a), Facet::Only(b)) => Facet::Only(a.intersection(b).cloned().collect()),
        }
    }

    /// Number of selected values, 0 when unrestricted.
    pub fn selected(&self) -> usize {
        match self {
            Facet::All => 0,
            Facet::Only(set) => set.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub const ALL: [Medal; 3] = [Medal::Gold, Medal::Silver, Medal::Bronze];

    pub fn field(self) -> &'static str {
        match self {
            Medal::Gold => MEDAL_FIELDS[0],
            Medal::Silver => MEDAL_FIELDS[1],
            Medal::Bronze => MEDAL_FIELDS[2],
        }
    }
}

impl FromStr for Medal {
    type Err = BoardError;

    fn from_str(s: &str) -> BoardResult<Self> {
        Medal::ALL
            .into_iter()
            .find(|m| m.field().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BoardError::filter_syntax(format!("unknown medal type '{}'", s)))
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
}

impl FromStr for Season {
    type Err = BoardError;

    fn from_str(s: &str) -> BoardResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Season::Summer),
            "winter" => Ok(Season::Winter),
            _ => Err(BoardError::filter_syntax(format!("unknown season '{}'", s))),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Season::Summer => "summer",
            Season::Winter => "winter",
        })
    }
}

/// Inclusive year interval. `min > max` is a valid, empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: f64) -> bool {
        year >= self.min as f64 && year <= self.max as f64
    }

    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSpec {
    pub countries: Facet<String>,
    pub sports: Facet<String>,
    pub years: Option<YearRange>,
    pub season: Facet<Season>,
    pub medals: Facet<Medal>,
}

impl FilterSpec {
    pub fn countries<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = Facet::from_values(values.into_iter().map(Into::into));
        self
    }

    pub fn sports<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sports = Facet::from_values(values.into_iter().map(Into::into));
        self
    }

    pub fn years(mut self, min: i32, max: i32) -> Self {
        self.years = Some(YearRange::new(min, max));
        self
    }

    pub fn season(mut self, season: Option<Season>) -> Self {
        self.season = Facet::from_values(season);
        self
    }

    pub fn medals<I: IntoIterator<Item = Medal>>(mut self, values: I) -> Self {
        self.medals = Facet::from_values(values);
        self
    }

    /// Facet-wise intersection: records passing the result pass both specs.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            countries: self.countries.intersect(&other.countries),
            sports: self.sports.intersect(&other.sports),
            years: match (self.years, other.years) {
                (Some(a), Some(b)) => Some(a.intersect(&b)),
                (a, b) => a.or(b),
            },
            season: self.season.intersect(&other.season),
            medals: self.medals.intersect(&other.medals),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.countries.is_all()
            && self.sports.is_all()
            && self.years.is_none()
            && self.season.is_all()
            && self.medals.is_all()
    }

    /// Count shown on the filter badge. The year range is not counted.
    pub fn active_count(&self) -> usize {
        self.countries.selected()
            + self.sports.selected()
            + self.medals.selected()
            + usize::from(!self.season.is_all())
    }

    /// Multi-line description of the selection and the number of results.
    pub fn summary(&self, result_count: usize) -> String {
        if self.is_unrestricted() {
            return format!("No filters applied - showing all data ({} items)", result_count);
        }
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        let mut lines = Vec::new();
        if let Facet::Only(set) = &self.countries {
            lines.push(format!("Countries: {}", join(set)));
        }
        if let Facet::Only(set) = &self.sports {
            lines.push(format!("Sports: {}", join(set)));
        }
        if let Some(range) = &self.years {
            lines.push(format!("Years: {} - {}", range.min, range.max));
        }
        if let Facet::Only(set) = &self.season {
            lines.push(format!(
                "Season: {}",
                set.iter().map(Season::to_string).collect::<Vec<_>>().join(", ")
            ));
        }
        if let Facet::Only(set) = &self.medals {
            lines.push(format!(
                "Medals: {}",
                set.iter().map(Medal::to_string).collect::<Vec<_>>().join(", ")
            ));
        }
        lines.push(format!("Showing {} filtered results", result_count));
        lines.join("\n")
    }

    fn keep(&self, record: &Record) -> bool {
        if let Facet::Only(set) = &self.countries {
            match country_label(record) {
                Some(label) if set.contains(&label) => {}
                _ => return false,
            }
        }
        if let Facet::Only(set) = &self.sports {
            if !(record.has("sport") && set.contains(&record.label("sport"))) {
                return false;
            }
        }
        if let Some(range) = &self.years {
            if let Some(year) = record.number("year") {
                if !range.contains(year) {
                    return false;
                }
            }
        }
        if !self.season.is_all() && record.has("season") {
            match record.label("season").parse::<Season>() {
                Ok(season) if self.season.allows(&season) => {}
                _ => return false,
            }
        }
        true
    }

    /// Zero unselected medal types and recompute `total`. Missing selected medals become 0.
    fn recount(&self, record: &Record) -> Option<Record> {
        if self.medals.is_all() {
            return Some(record.clone());
        }
        let mut out = record.clone();
        let mut total = 0.0;
        for medal in Medal::ALL {
            let count = if self.medals.allows(&medal) {
                record.number_or(medal.field(), 0.0)
            } else {
                0.0
            };
            out.set(medal.field(), count);
            total += count;
        }
        out.set("total", Value::Number(total));
        (total != 0.0).then_some(out)
    }
}

/// Apply every facet conjunctively. The input dataset is left untouched.
#[tracing::instrument(level = "debug", skip_all, fields(records = dataset.len(), active = spec.active_count()))]
pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    let out: Dataset = dataset
        .iter()
        .filter(|r| spec.keep(r))
        .filter_map(|r| spec.recount(r))
        .collect();
    tracing::debug!(kept = out.len(), "filter applied");
    out
}

/// Counts and per-field sums over a dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregates {
    pub count: usize,
    pub countries: usize,
    pub totals: BTreeMap<String, f64>,
}

impl Aggregates {
    pub fn of(dataset: &Dataset) -> Self {
        let mut totals = BTreeMap::new();
        for field in MEDAL_FIELDS.iter().chain(std::iter::once(&"total")) {
            totals.insert(
                field.to_string(),
                dataset.iter().map(|r| r.number_or(field, 0.0)).sum(),
            );
        }
        Self {
            count: dataset.len(),
            countries: distinct_countries(dataset),
            totals,
        }
    }
}

/// A record's country: `country`, or `code` when the record has no country name.
pub fn country_label(record: &Record) -> Option<String> {
    ["country", "code"]
        .iter()
        .find(|f| record.has(f))
        .map(|f| record.label(f))
}

/// Number of distinct country labels.
pub fn distinct_countries(dataset: &Dataset) -> usize {
    dataset.iter().filter_map(country_label).collect::<HashSet<_>>().len()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub dataset: Dataset,
    pub aggregates: Aggregates,
}

pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> FilterOutcome {
    let dataset = filter(dataset, spec);
    let aggregates = Aggregates::of(&dataset);
    FilterOutcome { dataset, aggregates }
}

/// Values offered by the filter controls for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOptions {
    pub countries: Vec<String>,
    pub sports: Vec<String>,
    pub years: YearRange,
}

impl FacetOptions {
    pub fn of(dataset: &Dataset) -> Self {
        let mut countries = dataset.distinct("country");
        countries.truncate(COUNTRY_OPTIONS);
        let mut sports = dataset.distinct("sport");
        sports.truncate(SPORT_OPTIONS);
        let years = dataset
            .extent("year")
            .map(|(lo, hi)| YearRange::new(lo.floor() as i32, hi.ceil() as i32))
            .unwrap_or(DEFAULT_YEARS);
        Self {
            countries,
            sports,
            years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medals() -> Dataset {
        vec![
            Record::new().with("country", "USA").with("gold", 40).with("silver", 40).with("bronze", 40).with("total", 120),
            Record::new().with("country", "CHN").with("gold", 30).with("silver", 20).with("bronze", 10).with("total", 60),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_gold_only_scenario() {
        let out = filter(&medals(), &FilterSpec::default().medals([Medal::Gold]));
        let expected: Dataset = vec![
            Record::new().with("country", "USA").with("gold", 40).with("silver", 0).with("bronze", 0).with("total", 40),
            Record::new().with("country", "CHN").with("gold", 30).with("silver", 0).with("bronze", 0).with("total", 30),
        ]
        .into_iter()
        .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_unknown_country_scenario() {
        let base = medals();
        let out = filter(&base, &FilterSpec::default().countries(["FRA"]));
        assert!(out.is_empty());
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_medal_filter_drops_zero_totals() {
        let data: Dataset = vec![
            Record::new().with("country", "NOR").with("gold", 0).with("bronze", 3),
            Record::new().with("country", "USA").with("gold", 2),
        ]
        .into_iter()
        .collect();
        let out = filter(&data, &FilterSpec::default().medals([Medal::Gold, Medal::Silver]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].number("silver"), Some(0.0));
        assert_eq!(out.records()[0].number("total"), Some(2.0));
    }

    #[test]
    fn test_country_facet_uses_one_label() {
        let data: Dataset = vec![
            Record::new().with("country", "United States").with("code", "USA"),
            Record::new().with("code", "GBR"),
        ]
        .into_iter()
        .collect();
        assert_eq!(filter(&data, &FilterSpec::default().countries(["United States"])).len(), 1);
        assert!(filter(&data, &FilterSpec::default().countries(["USA"])).is_empty());
        assert_eq!(filter(&data, &FilterSpec::default().countries(["GBR"])).len(), 1);
    }

    #[test]
    fn test_year_and_season() {
        let data: Dataset = vec![
            Record::new().with("year", 1976).with("season", "Summer"),
            Record::new().with("year", 1988).with("season", "Winter"),
            Record::new().with("year", 2000).with("season", "Summer"),
            Record::new().with("season", "Summer"),
        ]
        .into_iter()
        .collect();
        let spec = FilterSpec::default().years(1980, 2020).season(Some(Season::Summer));
        let out = filter(&data, &spec);
        assert_eq!(out.len(), 2);
        assert_eq!(out.records()[0].number("year"), Some(2000.0));
    }

    #[test]
    fn test_sport_facet_requires_field() {
        let data: Dataset = vec![Record::new().with("sport", "Judo"), Record::new()].into_iter().collect();
        assert_eq!(filter(&data, &FilterSpec::default().sports(["Judo"])).len(), 1);
    }

    #[test]
    fn test_empty_selection_means_all() {
        let spec = FilterSpec::default().countries(Vec::<String>::new()).medals([]);
        assert!(spec.is_unrestricted());
        assert_eq!(filter(&medals(), &spec), medals());
    }

    #[test]
    fn test_composition_equals_intersection() {
        let data: Dataset = vec![
            Record::new().with("country", "USA").with("sport", "Swimming").with("year", 2016).with("gold", 3).with("silver", 1),
            Record::new().with("country", "CHN").with("sport", "Diving").with("year", 2008).with("silver", 2),
            Record::new().with("country", "GBR").with("sport", "Rowing").with("year", 2012).with("gold", 1).with("bronze", 2),
            Record::new().with("country", "USA").with("sport", "Rowing").with("year", 1996).with("bronze", 1),
            Record::new().with("country", "United States").with("code", "US").with("sport", "Judo").with("gold", 1),
            Record::new().with("code", "KEN").with("sport", "Athletics").with("gold", 2),
        ]
        .into_iter()
        .collect();
        let specs = [
            FilterSpec::default().countries(["US"]),
            FilterSpec::default().countries(["United States", "KEN"]),
            FilterSpec::default().countries(["USA", "GBR"]).medals([Medal::Gold, Medal::Bronze]),
            FilterSpec::default().sports(["Rowing"]).years(2000, 2020),
            FilterSpec::default().medals([Medal::Gold]).years(1990, 2012),
            FilterSpec::default().countries(["CHN"]),
            FilterSpec::default(),
        ];
        for a in &specs {
            for b in &specs {
                assert_eq!(
                    filter(&filter(&data, a), b),
                    filter(&data, &a.intersect(b)),
                    "composition differs for {:?} then {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_disjoint_intersection_matches_nothing() {
        let spec = FilterSpec::default()
            .countries(["USA"])
            .intersect(&FilterSpec::default().countries(["CHN"]));
        assert_eq!(spec.countries, Facet::Only(BTreeSet::new()));
        assert!(filter(&medals(), &spec).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let spec = FilterSpec::default().medals([Medal::Silver]);
        let a = serde_json::to_string(&filter(&medals(), &spec)).unwrap();
        let b = serde_json::to_string(&filter(&medals(), &spec)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_active_count_and_summary() {
        let spec = FilterSpec::default()
            .countries(["USA", "CHN"])
            .medals([Medal::Gold])
            .season(Some(Season::Winter))
            .years(1980, 2020);
        assert_eq!(spec.active_count(), 4);
        let summary = spec.summary(7);
        assert!(summary.contains("Countries: CHN, USA"));
        assert!(summary.contains("Years: 1980 - 2020"));
        assert!(summary.ends_with("Showing 7 filtered results"));
        assert_eq!(
            FilterSpec::default().summary(3),
            "No filters applied - showing all data (3 items)"
        );
    }

    #[test]
    fn test_aggregates() {
        let agg = Aggregates::of(&medals());
        assert_eq!(agg.count, 2);
        assert_eq!(agg.countries, 2);
        assert_eq!(agg.totals["gold"], 70.0);
        assert_eq!(agg.totals["total"], 180.0);
    }

    #[test]
    fn test_facet_options() {
        let data: Dataset = (0..25)
            .map(|i| Record::new().with("country", format!("C{}", i)).with("year", 1990 + i))
            .collect();
        let options = FacetOptions::of(&data);
        assert_eq!(options.countries.len(), 20);
        assert!(options.sports.is_empty());
        assert_eq!(options.years, YearRange::new(1990, 2014));
        assert_eq!(FacetOptions::of(&Dataset::default()).years, YearRange::new(1896, 2020));
    }
}
