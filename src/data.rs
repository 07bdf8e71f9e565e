use crate::error::{BoardError, BoardResult};
use serde::Serialize;
use serde_json::Value as Json;
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

/// A single cell of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

static MISSING: Value = Value::Missing;

impl Value {
    /// Numeric view of the value. Non-finite numbers count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Display form used for categories and tooltips.
    pub fn label(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }

    fn from_json(value: &Json, field: &str) -> BoardResult<Self> {
        match value {
            Json::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| BoardError::data(format!("Number out of range for field '{}'", field))),
            Json::String(s) => Ok(Value::Text(s.clone())),
            Json::Bool(b) => Ok(Value::Text(b.to_string())),
            Json::Null => Ok(Value::Missing),
            _ => Err(BoardError::data(format!(
                "Unsupported value type for field '{}'",
                field
            ))),
        }
    }

    fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            Value::Missing
        } else if let Ok(n) = cell.parse::<f64>() {
            Value::Number(n)
        } else {
            Value::Text(cell.to_string())
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Integers print without a fractional part, everything else with at most two decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let s = format!("{:.2}", n);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// A mapping from field name to value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_missing())
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_f64()
    }

    /// Numeric value or the given default when missing or non-numeric.
    pub fn number_or(&self, field: &str, default: f64) -> f64 {
        self.number(field).unwrap_or(default)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).as_str()
    }

    pub fn label(&self, field: &str) -> String {
        self.get(field).label()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An ordered sequence of records.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct labels of a field in first-seen order. Missing values are skipped.
    pub fn distinct(&self, field: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in &self.records {
            let value = record.get(field);
            if value.is_missing() {
                continue;
            }
            let label = value.label();
            if seen.insert(label.clone()) {
                out.push(label);
            }
        }
        out
    }

    /// Min and max of the valid numeric values of a field.
    pub fn extent(&self, field: &str) -> Option<(f64, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.number(field))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Create a Dataset from a JSON array of objects
    pub fn from_json(value: &Json) -> BoardResult<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| BoardError::data("Input data must be a JSON array of objects"))?;

        let mut records = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| BoardError::data("Items in array must be objects"))?;
            let mut record = Record::new();
            for (field, raw) in obj {
                record.set(field, Value::from_json(raw, field)?);
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn from_json_str(input: &str) -> BoardResult<Self> {
        let json: Json = serde_json::from_str(input)
            .map_err(|e| BoardError::data(format!("Invalid JSON: {}", e)))?;
        Self::from_json(&json)
    }

    /// Read CSV with a header row. Numeric-looking cells become numbers, empty cells missing.
    pub fn from_csv_reader<R: Read>(reader: R) -> BoardResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| BoardError::data(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut records = Vec::new();
        for (row_idx, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| {
                BoardError::data(format!("Failed to read CSV row {}: {}", row_idx + 1, e))
            })?;
            let mut record = Record::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                record.set(header, Value::from_cell(cell));
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    /// Parse either JSON (leading `[`) or CSV text.
    pub fn from_text(input: &str) -> BoardResult<Self> {
        if input.trim_start().starts_with('[') {
            Self::from_json_str(input)
        } else {
            Self::from_csv_reader(input.as_bytes())
        }
    }

    pub fn load(path: &Path) -> BoardResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let dataset = if is_csv {
            Self::from_csv_reader(text.as_bytes())?
        } else {
            Self::from_text(&text)?
        };
        tracing::debug!(path = %path.display(), records = dataset.len(), "loaded dataset");
        Ok(dataset)
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

pub const MEDAL_FIELDS: [&str; 3] = ["gold", "silver", "bronze"];

/// Country x medal-type cells for the medal heatmap, limited to the first `limit` countries.
pub fn medal_pivot(dataset: &Dataset, limit: usize) -> Dataset {
    dataset
        .iter()
        .take(limit)
        .flat_map(|country| {
            MEDAL_FIELDS.iter().map(move |medal| {
                Record::new()
                    .with("country", country.get("country").clone())
                    .with("code", country.get("code").clone())
                    .with("medalType", *medal)
                    .with("value", country.number_or(medal, 0.0))
            })
        })
        .collect()
}

/// Join medal totals with population by `code`, falling back to `country`.
/// Countries without a population entry (or a zero population) are skipped.
pub fn medals_per_million(medals: &Dataset, population: &Dataset) -> Dataset {
    let find = |country: &Record| {
        population
            .iter()
            .find(|p| country.has("code") && p.get("code") == country.get("code"))
            .or_else(|| {
                population
                    .iter()
                    .find(|p| country.has("country") && p.get("country") == country.get("country"))
            })
    };

    medals
        .iter()
        .filter_map(|country| {
            let info = find(country)?;
            let people = info.number("population").filter(|p| *p > 0.0)?;
            let total = country.number_or("total", 0.0);
            Some(
                Record::new()
                    .with("country", country.get("country").clone())
                    .with("code", country.get("code").clone())
                    .with("population", people)
                    .with("total_medals", total)
                    .with("medals_per_capita", total / people * 1_000_000.0)
                    .with("region", info.get("region").clone())
                    .with("gold", country.number_or("gold", 0.0))
                    .with("silver", country.number_or("silver", 0.0))
                    .with("bronze", country.number_or("bronze", 0.0)),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = serde_json::json!([
            {"country": "USA", "gold": 40, "total": 120},
            {"country": "CHN", "gold": 30.5, "total": null}
        ]);
        let data = Dataset::from_json(&json).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.records()[0].number("gold"), Some(40.0));
        assert_eq!(data.records()[1].text("country"), Some("CHN"));
        assert!(data.records()[1].get("total").is_missing());
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let json = serde_json::json!({"country": "USA"});
        assert!(Dataset::from_json(&json).is_err());
    }

    #[test]
    fn test_from_json_empty_array_is_empty_dataset() {
        let data = Dataset::from_json_str("[]").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_from_csv() {
        let csv = "country,gold,age\nUSA,40,\nCHN, 30 ,twenty\n";
        let data = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.records()[1].number("gold"), Some(30.0));
        assert!(data.records()[0].get("age").is_missing());
        assert_eq!(data.records()[1].text("age"), Some("twenty"));
    }

    #[test]
    fn test_from_text_detects_format() {
        let json = Dataset::from_text("  [{\"a\": 1}]").unwrap();
        assert_eq!(json.records()[0].number("a"), Some(1.0));
        let csv = Dataset::from_text("a,b\n1,2\n").unwrap();
        assert_eq!(csv.records()[0].number("b"), Some(2.0));
    }

    #[test]
    fn test_number_or_defaults() {
        let r = Record::new().with("age", "unknown");
        assert_eq!(r.number_or("age", 25.0), 25.0);
        assert_eq!(r.number_or("missing", 0.0), 0.0);
        let nan = Record::new().with("v", f64::NAN);
        assert_eq!(nan.number("v"), None);
    }

    #[test]
    fn test_distinct_first_seen_order() {
        let data = Dataset::new(vec![
            Record::new().with("sport", "Swimming"),
            Record::new().with("sport", "Athletics"),
            Record::new().with("sport", "Swimming"),
            Record::new(),
        ]);
        assert_eq!(data.distinct("sport"), vec!["Swimming", "Athletics"]);
    }

    #[test]
    fn test_extent_skips_invalid() {
        let data = Dataset::new(vec![
            Record::new().with("year", 2000),
            Record::new().with("year", "n/a"),
            Record::new().with("year", 1980),
        ]);
        assert_eq!(data.extent("year"), Some((1980.0, 2000.0)));
        assert_eq!(Dataset::default().extent("year"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
    }

    #[test]
    fn test_medal_pivot() {
        let data = Dataset::new(vec![
            Record::new().with("country", "USA").with("gold", 40).with("silver", 30),
            Record::new().with("country", "CHN").with("gold", 30),
        ]);
        let pivot = medal_pivot(&data, 1);
        assert_eq!(pivot.len(), 3);
        assert_eq!(pivot.records()[1].text("medalType"), Some("silver"));
        assert_eq!(pivot.records()[2].number("value"), Some(0.0));
    }

    #[test]
    fn test_medals_per_million() {
        let medals = Dataset::new(vec![
            Record::new().with("country", "Norway").with("code", "NOR").with("total", 50),
            Record::new().with("country", "Atlantis").with("code", "ATL").with("total", 5),
        ]);
        let population = Dataset::new(vec![Record::new()
            .with("country", "Norway")
            .with("population", 5_000_000)
            .with("region", "Europe")]);
        let joined = medals_per_million(&medals, &population);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.records()[0].number("medals_per_capita"), Some(10.0));
        assert_eq!(joined.records()[0].text("region"), Some("Europe"));
    }
}
