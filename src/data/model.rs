use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `FieldValue` must be `Ord`.
///
/// Deserializes from plain JSON scalars (`null`, `true`, `67`, `36.6`, `"Male"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

// -- Manual Eq/Ord so we can put FieldValue in BTreeSet --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v:.2}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<missing>"),
        }
    }
}

impl FieldValue {
    /// Interpret the value as an `f64`; `None` for non-numeric or missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

// ---------------------------------------------------------------------------
// FieldKind – declared semantic type of a column
// ---------------------------------------------------------------------------

/// Tokens the CSV exports of this dataset use for a missing cell.
const MISSING_TOKENS: &[&str] = &["n/a", "na", "nan", "null", "none"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-form category compared as text.
    Categorical,
    /// 0/1 integer flag.
    Flag,
    Integer,
    Float,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Categorical => "categorical",
            FieldKind::Flag => "0/1 flag",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
        };
        f.write_str(name)
    }
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }

    /// Whether the field is filtered by picking one value out of a domain.
    pub fn is_discrete(self) -> bool {
        matches!(self, FieldKind::Categorical | FieldKind::Flag)
    }

    /// Convert `value` to this kind's semantic type.
    ///
    /// Returns `None` when no sensible conversion exists (e.g. `"abc"` for a
    /// numeric field, `7` for a flag). `Null` always normalizes to `Null`.
    pub fn normalize(self, value: &FieldValue) -> Option<FieldValue> {
        if value.is_null() {
            return Some(FieldValue::Null);
        }
        match self {
            FieldKind::Categorical => Some(FieldValue::Text(match value {
                FieldValue::Text(s) => s.clone(),
                other => other.to_string(),
            })),
            FieldKind::Flag => {
                let flag = match value {
                    FieldValue::Bool(b) => Some(*b),
                    FieldValue::Integer(0) => Some(false),
                    FieldValue::Integer(1) => Some(true),
                    FieldValue::Float(f) if *f == 0.0 => Some(false),
                    FieldValue::Float(f) if *f == 1.0 => Some(true),
                    FieldValue::Text(s) => parse_flag(s),
                    _ => None,
                }?;
                Some(FieldValue::Integer(i64::from(flag)))
            }
            FieldKind::Integer => match value {
                FieldValue::Integer(i) => Some(FieldValue::Integer(*i)),
                FieldValue::Float(f) => Some(integral_or_float(*f)),
                FieldValue::Text(s) => {
                    let s = s.trim();
                    match s.parse::<i64>() {
                        Ok(i) => Some(FieldValue::Integer(i)),
                        Err(_) => s.parse::<f64>().ok().map(integral_or_float),
                    }
                }
                _ => None,
            },
            FieldKind::Float => match value {
                FieldValue::Integer(i) => Some(FieldValue::Float(*i as f64)),
                FieldValue::Float(f) => Some(FieldValue::Float(*f)),
                FieldValue::Text(s) => s.trim().parse::<f64>().ok().map(FieldValue::Float),
                _ => None,
            },
        }
    }

    /// Coerce a raw text cell, treating empty cells and `N/A`-style tokens as missing.
    pub fn parse_cell(self, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
            return Some(FieldValue::Null);
        }
        self.normalize(&FieldValue::Text(trimmed.to_string()))
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Some(true),
        "0" | "0.0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Ages are declared integral but the public dataset carries infant ages such
/// as `0.64`; those stay fractional.
fn integral_or_float(f: f64) -> FieldValue {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        FieldValue::Integer(f as i64)
    } else {
        FieldValue::Float(f)
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Human readable label used for widgets and axes.
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind }
    }
}

const STROKE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("gender", "Gender", FieldKind::Categorical),
    FieldSpec::new("age", "Age", FieldKind::Integer),
    FieldSpec::new("hypertension", "Hypertension", FieldKind::Flag),
    FieldSpec::new("heart_disease", "Heart Disease", FieldKind::Flag),
    FieldSpec::new("ever_married", "Ever Married", FieldKind::Categorical),
    FieldSpec::new("work_type", "Work Type", FieldKind::Categorical),
    FieldSpec::new("Residence_type", "Residence Type", FieldKind::Categorical),
    FieldSpec::new("avg_glucose_level", "Average Glucose Level", FieldKind::Float),
    FieldSpec::new("bmi", "BMI", FieldKind::Float),
    FieldSpec::new("smoking_status", "Smoking Status", FieldKind::Categorical),
    FieldSpec::new("stroke", "Stroke", FieldKind::Flag),
];

/// Declared, fixed set of columns a dataset must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

impl Schema {
    /// Columns of the stroke prediction dataset, in CSV order.
    pub fn stroke() -> Self {
        Self {
            fields: STROKE_FIELDS,
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(|f| f.kind)
    }

    /// Label for `name`, falling back to the raw column name.
    pub fn label_of<'a>(&self, name: &'a str) -> &'a str {
        self.field(name).map(|f| f.label).unwrap_or(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
    #[error("row {row}: column '{column}' value '{value}' is not a valid {kind}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
        kind: FieldKind,
    },
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// column_name → value, including undeclared passthrough columns.
    pub values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Numeric value of `field`; `None` when missing, non-numeric or NaN.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field)
            .and_then(FieldValue::as_f64)
            .filter(|v| !v.is_nan())
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Record {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    /// All rows, in file order.
    pub records: Vec<Record>,
    /// Every column name seen, declared ones first in schema order.
    pub column_names: Vec<String>,
    /// For each categorical / flag column the sorted set of observed values.
    pub unique_values: BTreeMap<String, BTreeSet<FieldValue>>,
    /// For each numeric column the observed `(min, max)`, ignoring missing cells.
    pub bounds: BTreeMap<String, (f64, f64)>,
}

impl Dataset {
    /// Build column indices from records already coerced to `schema`.
    pub fn from_records(schema: Schema, records: Vec<Record>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<FieldValue>> = BTreeMap::new();
        let mut bounds: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        let mut extra_columns: BTreeSet<String> = BTreeSet::new();

        for record in &records {
            for (col, val) in &record.values {
                match schema.kind_of(col) {
                    Some(kind) if kind.is_discrete() => {
                        if !val.is_null() {
                            unique_values
                                .entry(col.clone())
                                .or_default()
                                .insert(val.clone());
                        }
                    }
                    Some(_) => {
                        if let Some(v) = val.as_f64().filter(|v| !v.is_nan()) {
                            let entry = bounds.entry(col.clone()).or_insert((v, v));
                            entry.0 = entry.0.min(v);
                            entry.1 = entry.1.max(v);
                        }
                    }
                    None => {
                        extra_columns.insert(col.clone());
                    }
                }
            }
        }

        let column_names = schema
            .fields()
            .iter()
            .map(|f| f.name.to_string())
            .chain(extra_columns)
            .collect();

        Dataset {
            schema,
            records,
            column_names,
            unique_values,
            bounds,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn bounds_of(&self, field: &str) -> Option<(f64, f64)> {
        self.bounds.get(field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_normalizes_mixed_representations() {
        let k = FieldKind::Flag;
        assert_eq!(k.normalize(&FieldValue::Bool(true)), Some(FieldValue::Integer(1)));
        assert_eq!(k.normalize(&FieldValue::Text("0".into())), Some(FieldValue::Integer(0)));
        assert_eq!(k.normalize(&FieldValue::Text("Yes".into())), Some(FieldValue::Integer(1)));
        assert_eq!(k.normalize(&FieldValue::Float(1.0)), Some(FieldValue::Integer(1)));
        assert_eq!(k.normalize(&FieldValue::Integer(7)), None);
        assert_eq!(k.normalize(&FieldValue::Text("maybe".into())), None);
    }

    #[test]
    fn numeric_kinds_parse_text() {
        assert_eq!(
            FieldKind::Integer.normalize(&FieldValue::Text("67".into())),
            Some(FieldValue::Integer(67))
        );
        assert_eq!(
            FieldKind::Integer.normalize(&FieldValue::Text("0.64".into())),
            Some(FieldValue::Float(0.64))
        );
        assert_eq!(
            FieldKind::Integer.normalize(&FieldValue::Float(61.0)),
            Some(FieldValue::Integer(61))
        );
        assert_eq!(
            FieldKind::Float.normalize(&FieldValue::Integer(36)),
            Some(FieldValue::Float(36.0))
        );
        assert_eq!(FieldKind::Float.normalize(&FieldValue::Text("abc".into())), None);
        assert_eq!(FieldKind::Float.normalize(&FieldValue::Bool(true)), None);
    }

    #[test]
    fn categorical_normalizes_to_text() {
        assert_eq!(
            FieldKind::Categorical.normalize(&FieldValue::Integer(1)),
            Some(FieldValue::Text("1".into()))
        );
    }

    #[test]
    fn missing_tokens_parse_as_null() {
        for raw in ["", "  ", "N/A", "NaN", "null"] {
            assert_eq!(FieldKind::Float.parse_cell(raw), Some(FieldValue::Null), "{raw:?}");
        }
        assert_eq!(FieldKind::Float.parse_cell("36.6"), Some(FieldValue::Float(36.6)));
    }

    #[test]
    fn dataset_indexes_domains_and_bounds() {
        let rows = vec![
            Record::from_iter([
                ("gender", FieldValue::Text("Male".into())),
                ("bmi", FieldValue::Float(36.6)),
                ("id", FieldValue::Integer(9046)),
            ]),
            Record::from_iter([
                ("gender", FieldValue::Text("Female".into())),
                ("bmi", FieldValue::Null),
            ]),
            Record::from_iter([
                ("gender", FieldValue::Text("Male".into())),
                ("bmi", FieldValue::Float(24.0)),
            ]),
        ];
        let ds = Dataset::from_records(Schema::stroke(), rows);

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.bounds_of("bmi"), Some((24.0, 36.6)));
        assert_eq!(ds.unique_values["gender"].len(), 2);
        assert_eq!(ds.column_names.first().map(String::as_str), Some("gender"));
        assert_eq!(ds.column_names.last().map(String::as_str), Some("id"));
    }

    #[test]
    fn ordering_is_total_across_variants() {
        let mut set = BTreeSet::new();
        set.insert(FieldValue::Text("a".into()));
        set.insert(FieldValue::Integer(3));
        set.insert(FieldValue::Null);
        set.insert(FieldValue::Float(f64::NAN));
        let first = set.iter().next().cloned();
        assert_eq!(first, Some(FieldValue::Null));
        assert_eq!(set.len(), 4);
    }
}
