use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Dataset, FieldKind, FieldValue, Record, Schema};

// ---------------------------------------------------------------------------
// Selection: what the user picked for one field
// ---------------------------------------------------------------------------

/// Per-field selection value.
///
/// JSON form: `"unrestricted"`, `{"equals": "Male"}`, `{"range": [0, 120]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// No condition on this field.
    #[default]
    Unrestricted,
    /// Keep rows whose value equals this one after normalization to the field's kind.
    Equals(FieldValue),
    /// Inclusive `[lo, hi]` bounds for numeric and flag fields.
    Range(FieldValue, FieldValue),
}

impl Selection {
    pub fn range(lo: f64, hi: f64) -> Self {
        Selection::Range(FieldValue::Float(lo), FieldValue::Float(hi))
    }
}

/// Current filter values: field name → [`Selection`].
/// Fields absent from the map impose no condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection(BTreeMap<String, Selection>);

impl FilterSelection {
    /// Starting state for a freshly loaded dataset: every declared field
    /// unrestricted. Numeric fields are not narrowed to their observed range
    /// here, since a range condition would drop rows with missing values.
    pub fn initial(dataset: &Dataset) -> Self {
        dataset
            .schema
            .fields()
            .iter()
            .map(|field| (field.name, Selection::Unrestricted))
            .collect()
    }

    pub fn get(&self, field: &str) -> Option<&Selection> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, selection: Selection) {
        self.0.insert(field.into(), selection);
    }

    pub fn with(mut self, field: impl Into<String>, selection: Selection) -> Self {
        self.set(field, selection);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Selection)> {
        self.0.iter()
    }

    /// Number of fields carrying an actual condition.
    pub fn active_count(&self) -> usize {
        self.0
            .values()
            .filter(|s| !matches!(s, Selection::Unrestricted))
            .count()
    }
}

impl<K: Into<String>> FromIterator<(K, Selection)> for FilterSelection {
    fn from_iter<I: IntoIterator<Item = (K, Selection)>>(iter: I) -> Self {
        FilterSelection(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter references unknown field '{0}'")]
    UnknownField(String),
    #[error("value '{value}' for field '{field}' cannot be read as {kind}")]
    InvalidValue {
        field: String,
        value: String,
        kind: FieldKind,
    },
    #[error("range for field '{field}' is inverted: {lo} > {hi}")]
    InvertedRange { field: String, lo: f64, hi: f64 },
    #[error("field '{0}' is categorical and cannot be filtered by range")]
    RangeOnCategorical(String),
}

// ---------------------------------------------------------------------------
// Compiled predicate
// ---------------------------------------------------------------------------

/// Row condition for one field, with the selection already normalized.
#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Equals(FieldValue),
    Between { lo: f64, hi: f64 },
}

impl Condition {
    fn matches(&self, value: Option<&FieldValue>) -> bool {
        match self {
            Condition::Equals(expected) => value.unwrap_or(&FieldValue::Null) == expected,
            // Missing and NaN cells never fall inside a range.
            Condition::Between { lo, hi } => value
                .and_then(FieldValue::as_f64)
                .is_some_and(|v| *lo <= v && v <= *hi),
        }
    }
}

/// Per-row inclusion predicate: the row-wise AND of every field's condition.
///
/// Built once per selection change by [`FilterPredicate::compile`]; evaluating
/// it has no side effects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPredicate {
    conditions: Vec<(String, Condition)>,
}

impl FilterPredicate {
    /// Normalize `selection` against `schema` and build the row predicate.
    ///
    /// Unrestricted fields are dropped. Every other selection value is
    /// converted to its field's declared kind first, so `"1"`, `true` and `1`
    /// all select the same rows of a 0/1 flag.
    pub fn compile(schema: &Schema, selection: &FilterSelection) -> Result<Self, FilterError> {
        let mut conditions = Vec::new();

        for (name, sel) in selection.iter() {
            let field = schema
                .field(name)
                .ok_or_else(|| FilterError::UnknownField(name.clone()))?;
            let kind = field.kind;

            let condition = match sel {
                Selection::Unrestricted => continue,
                Selection::Equals(value) if kind.is_numeric() => {
                    let v = numeric_bound(kind, name, value)?;
                    Condition::Between { lo: v, hi: v }
                }
                Selection::Equals(value) => {
                    let normalized = kind.normalize(value).ok_or_else(|| invalid(name, value, kind))?;
                    Condition::Equals(normalized)
                }
                Selection::Range(..) if kind == FieldKind::Categorical => {
                    return Err(FilterError::RangeOnCategorical(name.clone()));
                }
                Selection::Range(lo, hi) => {
                    let lo = numeric_bound(kind, name, lo)?;
                    let hi = numeric_bound(kind, name, hi)?;
                    if lo > hi {
                        return Err(FilterError::InvertedRange {
                            field: name.clone(),
                            lo,
                            hi,
                        });
                    }
                    Condition::Between { lo, hi }
                }
            };
            conditions.push((name.clone(), condition));
        }

        Ok(FilterPredicate { conditions })
    }

    /// Whether `record` satisfies every condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(record.get(field)))
    }

    /// Number of fields that actually restrict rows.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        FilteredView::new(dataset, filtered_indices(dataset, self))
    }
}

fn invalid(field: &str, value: &FieldValue, kind: FieldKind) -> FilterError {
    FilterError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        kind,
    }
}

/// Range bounds on flags are read as plain numbers so `[0, 1]` keeps both values.
fn numeric_bound(kind: FieldKind, field: &str, value: &FieldValue) -> Result<f64, FilterError> {
    let numeric_kind = if kind == FieldKind::Flag {
        FieldKind::Float
    } else {
        kind
    };
    numeric_kind
        .normalize(value)
        .and_then(|v| v.as_f64())
        .filter(|v| !v.is_nan())
        .ok_or_else(|| invalid(field, value, kind))
}

/// Return indices of rows that pass `predicate`, in dataset order.
pub fn filtered_indices(dataset: &Dataset, predicate: &FilterPredicate) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| predicate.matches(record))
        .map(|(i, _)| i)
        .collect()
}

/// Compile `selection` and apply it to `dataset` in one step.
pub fn apply<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> Result<FilteredView<'a>, FilterError> {
    let predicate = FilterPredicate::compile(&dataset.schema, selection)?;
    Ok(predicate.apply(dataset))
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Order-preserving subset of a [`Dataset`]; never owns or alters rows.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Cow<'a, [usize]>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        Self {
            dataset,
            indices: Cow::Owned(indices),
        }
    }

    /// View over indices cached elsewhere (e.g. in the UI state).
    pub fn borrowed(dataset: &'a Dataset, indices: &'a [usize]) -> Self {
        Self {
            dataset,
            indices: Cow::Borrowed(indices),
        }
    }

    /// Every row of `dataset`.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self::new(dataset, (0..dataset.len()).collect())
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = &self.dataset.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    /// Present, non-NaN values of a numeric column.
    pub fn numbers(&self, field: &str) -> Vec<f64> {
        self.records().filter_map(|r| r.number(field)).collect()
    }

    /// `(x, y)` pairs for rows where both columns are present.
    pub fn points(&self, x: &str, y: &str) -> Vec<[f64; 2]> {
        self.records()
            .filter_map(|r| Some([r.number(x)?, r.number(y)?]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        gender: &str,
        age: i64,
        hypertension: i64,
        heart_disease: i64,
        glucose: f64,
        bmi: Option<f64>,
        smoking: &str,
        stroke: i64,
    ) -> Record {
        Record::from_iter([
            ("gender", text(gender)),
            ("age", FieldValue::Integer(age)),
            ("hypertension", FieldValue::Integer(hypertension)),
            ("heart_disease", FieldValue::Integer(heart_disease)),
            ("ever_married", text("Yes")),
            ("work_type", text("Private")),
            ("Residence_type", text("Urban")),
            ("avg_glucose_level", FieldValue::Float(glucose)),
            ("bmi", bmi.map(FieldValue::Float).unwrap_or(FieldValue::Null)),
            ("smoking_status", text(smoking)),
            ("stroke", FieldValue::Integer(stroke)),
        ])
    }

    /// The two-patient table used by the documented scenarios.
    fn scenario_dataset() -> Dataset {
        Dataset::from_records(
            Schema::stroke(),
            vec![
                row("Male", 67, 0, 1, 228.69, Some(36.6), "formerly smoked", 1),
                row("Female", 61, 0, 0, 202.21, None, "never smoked", 1),
            ],
        )
    }

    fn wider_dataset() -> Dataset {
        Dataset::from_records(
            Schema::stroke(),
            vec![
                row("Male", 67, 0, 1, 228.69, Some(36.6), "formerly smoked", 1),
                row("Female", 61, 0, 0, 202.21, Some(28.1), "never smoked", 1),
                row("Female", 49, 1, 0, 171.23, Some(34.4), "smokes", 0),
                row("Male", 80, 1, 1, 105.92, Some(32.5), "never smoked", 1),
                row("Other", 3, 0, 0, 95.12, Some(18.0), "Unknown", 0),
                row("Female", 79, 1, 0, 174.12, Some(24.0), "never smoked", 0),
            ],
        )
    }

    fn scenario_selection() -> FilterSelection {
        FilterSelection::from_iter([
            ("gender", Selection::Equals(text("Male"))),
            ("age", Selection::range(0.0, 120.0)),
            ("hypertension", Selection::Unrestricted),
            ("heart_disease", Selection::Unrestricted),
            ("avg_glucose_level", Selection::range(0.0, 300.0)),
            ("bmi", Selection::range(0.0, 100.0)),
            ("smoking_status", Selection::Unrestricted),
        ])
    }

    #[test]
    fn scenario_gender_restriction_keeps_first_row() {
        let ds = scenario_dataset();
        let view = apply(&ds, &scenario_selection()).unwrap();
        assert_eq!(view.indices(), &[0]);
    }

    #[test]
    fn scenario_age_range_keeps_first_row() {
        let ds = scenario_dataset();
        let selection = FilterSelection::default().with("age", Selection::range(62.0, 80.0));
        let view = apply(&ds, &selection).unwrap();
        assert_eq!(view.indices(), &[0]);
    }

    #[test]
    fn scenario_missing_bmi_is_excluded_by_range() {
        let ds = scenario_dataset();
        let selection = FilterSelection::default()
            .with("gender", Selection::Unrestricted)
            .with("bmi", Selection::range(0.0, 100.0));
        let view = apply(&ds, &selection).unwrap();
        assert_eq!(view.indices(), &[0]);
    }

    #[test]
    fn nan_is_excluded_by_range() {
        let mut ds = scenario_dataset();
        ds.records[1]
            .values
            .insert("bmi".to_string(), FieldValue::Float(f64::NAN));
        let selection = FilterSelection::default().with("bmi", Selection::range(f64::MIN, f64::MAX));
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[0]);
    }

    #[test]
    fn initial_selection_keeps_every_row() {
        let ds = wider_dataset();
        let selection = FilterSelection::initial(&ds);
        let view = apply(&ds, &selection).unwrap();
        assert_eq!(view.indices(), (0..ds.len()).collect::<Vec<_>>().as_slice());
        assert_eq!(selection.get("gender"), Some(&Selection::Unrestricted));
        assert_eq!(selection.get("age"), Some(&Selection::Unrestricted));
        assert_eq!(selection.active_count(), 0);
    }

    #[test]
    fn initial_selection_keeps_rows_with_missing_numbers() {
        let ds = scenario_dataset();
        let selection = FilterSelection::initial(&ds);
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[0, 1]);

        // Pinning bmi to its observed range is an explicit condition and
        // drops the row without a bmi.
        let (lo, hi) = ds.bounds_of("bmi").unwrap();
        let pinned = selection.with("bmi", Selection::range(lo, hi));
        assert_eq!(apply(&ds, &pinned).unwrap().indices(), &[0]);
    }

    #[test]
    fn empty_selection_is_identity() {
        let ds = wider_dataset();
        let predicate = FilterPredicate::compile(&ds.schema, &FilterSelection::default()).unwrap();
        assert!(predicate.is_empty());
        assert_eq!(predicate.apply(&ds).len(), ds.len());
    }

    #[test]
    fn category_restriction_partitions_rows() {
        let ds = wider_dataset();
        let selection = FilterSelection::default().with("gender", Selection::Equals(text("Female")));
        let view = apply(&ds, &selection).unwrap();

        assert_eq!(view.len(), 3);
        assert!(view.records().all(|r| r.get("gender") == Some(&text("Female"))));
        for (i, record) in ds.records.iter().enumerate() {
            if !view.indices().contains(&i) {
                assert_ne!(record.get("gender"), Some(&text("Female")));
            }
        }
    }

    #[test]
    fn result_is_ordered_subset() {
        let ds = wider_dataset();
        let selection = FilterSelection::default()
            .with("hypertension", Selection::Equals(FieldValue::Integer(1)))
            .with("avg_glucose_level", Selection::range(100.0, 200.0));
        let view = apply(&ds, &selection).unwrap();

        assert_eq!(view.indices(), &[2, 3, 5]);
        assert!(view.indices().windows(2).all(|w| w[0] < w[1]));
        for record in view.records() {
            let glucose = record.number("avg_glucose_level").unwrap();
            assert!((100.0..=200.0).contains(&glucose));
        }
    }

    #[test]
    fn compile_is_idempotent() {
        let ds = wider_dataset();
        let selection = FilterSelection::default().with("age", Selection::range(50.0, 80.0));
        let a = apply(&ds, &selection).unwrap();
        let b = apply(&ds, &selection).unwrap();
        assert_eq!(a.indices(), b.indices());
    }

    // Some dashboard variants compared checkbox state as text or combined
    // column masks with a scalar `and`; conditions here are normalized and
    // combined row by row instead.
    #[test]
    fn flag_selection_is_normalized_before_comparison() {
        let ds = wider_dataset();
        let as_int = FilterSelection::default().with("heart_disease", Selection::Equals(FieldValue::Integer(1)));
        let as_text = FilterSelection::default().with("heart_disease", Selection::Equals(text("1")));
        let as_bool = FilterSelection::default().with("heart_disease", Selection::Equals(FieldValue::Bool(true)));

        let expected = apply(&ds, &as_int).unwrap().indices().to_vec();
        assert_eq!(expected, vec![0, 3]);
        assert_eq!(apply(&ds, &as_text).unwrap().indices(), expected.as_slice());
        assert_eq!(apply(&ds, &as_bool).unwrap().indices(), expected.as_slice());
    }

    #[test]
    fn conditions_combine_row_wise() {
        let ds = wider_dataset();
        let selection = FilterSelection::default()
            .with("gender", Selection::Equals(text("Male")))
            .with("hypertension", Selection::Equals(FieldValue::Integer(1)));
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[3]);
    }

    #[test]
    fn category_named_all_is_an_ordinary_value() {
        let mut ds = wider_dataset();
        ds.records[4]
            .values
            .insert("work_type".to_string(), text("All"));
        let selection = FilterSelection::default().with("work_type", Selection::Equals(text("All")));
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[4]);
    }

    #[test]
    fn degenerate_range_is_accepted() {
        let ds = wider_dataset();
        let selection = FilterSelection::default().with("age", Selection::range(67.0, 67.0));
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[0]);
    }

    #[test]
    fn numeric_equals_acts_as_point_range() {
        let ds = wider_dataset();
        let selection = FilterSelection::default().with("age", Selection::Equals(text("80")));
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[3]);
    }

    #[test]
    fn out_of_domain_selection_yields_empty_view() {
        let ds = wider_dataset();
        let selection = FilterSelection::default().with("smoking_status", Selection::Equals(text("vapes")));
        let view = apply(&ds, &selection).unwrap();
        assert!(view.is_empty());
        assert!(view.numbers("age").is_empty());
    }

    #[test]
    fn configuration_errors_are_reported() {
        let schema = Schema::stroke();
        let unknown = FilterSelection::default().with("cholesterol", Selection::Unrestricted);
        assert_eq!(
            FilterPredicate::compile(&schema, &unknown),
            Err(FilterError::UnknownField("cholesterol".into()))
        );

        let bad_number = FilterSelection::default()
            .with("bmi", Selection::Range(text("low"), FieldValue::Float(40.0)));
        assert!(matches!(
            FilterPredicate::compile(&schema, &bad_number),
            Err(FilterError::InvalidValue { .. })
        ));

        let inverted = FilterSelection::default().with("age", Selection::range(80.0, 10.0));
        assert!(matches!(
            FilterPredicate::compile(&schema, &inverted),
            Err(FilterError::InvertedRange { .. })
        ));

        let bad_flag = FilterSelection::default().with("stroke", Selection::Equals(FieldValue::Integer(2)));
        assert!(matches!(
            FilterPredicate::compile(&schema, &bad_flag),
            Err(FilterError::InvalidValue { .. })
        ));

        let ranged_category = FilterSelection::default().with("gender", Selection::range(0.0, 1.0));
        assert_eq!(
            FilterPredicate::compile(&schema, &ranged_category),
            Err(FilterError::RangeOnCategorical("gender".into()))
        );
    }

    #[test]
    fn selection_round_trips_through_json() {
        let json = r#"{"gender": {"equals": "Male"}, "age": {"range": [62, 80]}, "stroke": "unrestricted"}"#;
        let selection: FilterSelection = serde_json::from_str(json).unwrap();
        assert_eq!(selection.get("gender"), Some(&Selection::Equals(text("Male"))));
        assert_eq!(
            selection.get("age"),
            Some(&Selection::Range(FieldValue::Integer(62), FieldValue::Integer(80)))
        );
        assert_eq!(selection.active_count(), 2);

        let ds = scenario_dataset();
        assert_eq!(apply(&ds, &selection).unwrap().indices(), &[0]);
    }

    #[test]
    fn points_skip_rows_missing_a_coordinate() {
        let ds = scenario_dataset();
        let view = FilteredView::all(&ds);
        assert_eq!(view.points("age", "bmi"), vec![[67.0, 36.6]]);
        assert_eq!(view.numbers("age"), vec![67.0, 61.0]);
    }
}
