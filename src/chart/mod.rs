//! Chart data preparation.
//!
//! Everything here is a pure function of a [`FilteredView`]; the egui layer
//! in `ui::plot` only draws what [`ChartData`] holds. An empty view produces
//! empty series, never an error.

pub mod aggregate;
pub mod density;
pub mod projection;
pub mod summary;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::filter::{FilterSelection, FilteredView, Selection};
use crate::data::model::{FieldValue, Record};

use aggregate::{Bin, RingArc};
use density::{DensityGrid, Segment};
use summary::FiveNumber;

pub const OUTCOME: &str = "stroke";
pub const AGE: &str = "age";
pub const GLUCOSE: &str = "avg_glucose_level";
pub const BMI: &str = "bmi";

/// Numeric dimensions shared by the 3D scatter and the scatterplot matrix.
pub const MATRIX_FIELDS: [&str; 3] = [AGE, GLUCOSE, BMI];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter3d,
    DensityContour,
    Pie,
    Bar,
    Box,
    Violin,
    Sunburst,
    ScatterMatrix,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::Scatter3d,
        ChartKind::DensityContour,
        ChartKind::Pie,
        ChartKind::Bar,
        ChartKind::Box,
        ChartKind::Violin,
        ChartKind::Sunburst,
        ChartKind::ScatterMatrix,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Scatter3d => "3D Scatter Plot of Age, Glucose Level, and BMI",
            ChartKind::DensityContour => "Contour Plot of Age vs. Average Glucose Level",
            ChartKind::Pie => "Distribution of Stroke",
            ChartKind::Bar => "Strokes Over Glucose Level",
            ChartKind::Box => "BMI by Smoking Status",
            ChartKind::Violin => "Age Distribution by Stroke Outcome",
            ChartKind::Sunburst => "Gender, Work Type and Stroke",
            ChartKind::ScatterMatrix => "Scatterplot Matrix",
        }
    }
}

/// Pie title naming the selected gender, as the original dashboard did.
pub fn pie_title(selection: &FilterSelection) -> String {
    let who = match selection.get("gender") {
        Some(Selection::Equals(FieldValue::Text(g))) => g.as_str(),
        _ => "All Genders",
    };
    format!("Distribution of Stroke for {who}")
}

/// Tuning knobs for the derived series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub histogram_bins: usize,
    /// Lattice resolution of the density contour (per axis).
    pub density_grid: usize,
    pub contour_levels: usize,
    pub violin_samples: usize,
    /// Discrete field whose values split the scatter, contour, bar, violin and
    /// matrix series.
    pub color_by: String,
    /// Glucose axis of the bar chart; pinned to the whole dataset so the axis
    /// does not jump while filtering.
    pub glucose_range: Option<(f64, f64)>,
    pub sunburst_levels: Vec<String>,
    pub box_group: String,
    pub box_value: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            density_grid: 40,
            contour_levels: 5,
            violin_samples: 80,
            color_by: OUTCOME.into(),
            glucose_range: None,
            sunburst_levels: vec!["gender".into(), "work_type".into(), OUTCOME.into()],
            box_group: "smoking_status".into(),
            box_value: BMI.into(),
        }
    }
}

/// A series that belongs to one value of the colour-by field.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<T> {
    pub key: FieldValue,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violin {
    pub curve: Vec<[f64; 2]>,
    pub summary: Option<FiveNumber>,
}

/// Every chart's series for the current view, recomputed on each filter change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub rows: usize,
    /// Raw `(age, glucose, bmi)` per group; rows missing any axis are skipped.
    pub scatter3d: Vec<Group<Vec<[f64; 3]>>>,
    /// Contour segments per group, one inner vector per level.
    pub contours: Vec<Group<Vec<Vec<Segment>>>>,
    pub outcome_counts: Vec<(FieldValue, usize)>,
    pub glucose_bars: Vec<Group<Vec<Bin>>>,
    pub boxes: Vec<Group<FiveNumber>>,
    pub violins: Vec<Group<Violin>>,
    pub sunburst: Vec<RingArc>,
    /// Per group, every row's `MATRIX_FIELDS` values (missing as `None`).
    pub matrix: Vec<Group<Vec<[Option<f64>; 3]>>>,
}

impl ChartData {
    pub fn build(view: &FilteredView<'_>, options: &ChartOptions) -> Self {
        let groups = aggregate::group_by(view, &options.color_by);

        let scatter3d = groups
            .iter()
            .map(|(key, rows)| Group {
                key: key.clone(),
                data: rows
                    .iter()
                    .filter_map(|r| Some([r.number(AGE)?, r.number(GLUCOSE)?, r.number(BMI)?]))
                    .collect(),
            })
            .collect();

        let contours = contour_groups(view, &groups, options);

        // The glucose range in the main selection filters these bars like every
        // other chart; only the axis stays on the full dataset range.
        let glucose_range = options.glucose_range.or_else(|| span(&view.numbers(GLUCOSE)));
        let glucose_bars = match glucose_range {
            Some(range) => groups
                .iter()
                .map(|(key, rows)| {
                    let values: Vec<f64> = rows.iter().filter_map(|r| r.number(GLUCOSE)).collect();
                    Group {
                        key: key.clone(),
                        data: aggregate::histogram(&values, range, options.histogram_bins),
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let boxes = aggregate::group_by(view, &options.box_group)
            .into_iter()
            .filter_map(|(key, rows)| {
                let values: Vec<f64> = rows.iter().filter_map(|r| r.number(&options.box_value)).collect();
                Some(Group {
                    key,
                    data: FiveNumber::from_values(&values)?,
                })
            })
            .collect();

        let violins = groups
            .iter()
            .map(|(key, rows)| {
                let ages: Vec<f64> = rows.iter().filter_map(|r| r.number(AGE)).collect();
                Group {
                    key: key.clone(),
                    data: Violin {
                        curve: density::kde(&ages, options.violin_samples),
                        summary: FiveNumber::from_values(&ages),
                    },
                }
            })
            .collect();

        let levels: Vec<&str> = options.sunburst_levels.iter().map(String::as_str).collect();
        let sunburst = aggregate::sunburst_arcs(&aggregate::sunburst(view, &levels));

        let matrix = groups
            .iter()
            .map(|(key, rows)| Group {
                key: key.clone(),
                data: rows
                    .iter()
                    .map(|r| MATRIX_FIELDS.map(|f| r.number(f)))
                    .collect(),
            })
            .collect();

        ChartData {
            rows: view.len(),
            scatter3d,
            contours,
            outcome_counts: aggregate::value_counts(view, OUTCOME),
            glucose_bars,
            boxes,
            violins,
            sunburst,
            matrix,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

fn contour_groups(
    view: &FilteredView<'_>,
    groups: &BTreeMap<FieldValue, Vec<&Record>>,
    options: &ChartOptions,
) -> Vec<Group<Vec<Vec<Segment>>>> {
    // Shared axes so every group's contours line up.
    let all = view.points(AGE, GLUCOSE);
    let (Some(x_range), Some(y_range)) = (
        span(&all.iter().map(|p| p[0]).collect::<Vec<_>>()),
        span(&all.iter().map(|p| p[1]).collect::<Vec<_>>()),
    ) else {
        return Vec::new();
    };
    let x_range = pad(x_range);
    let y_range = pad(y_range);

    groups
        .iter()
        .filter_map(|(key, rows)| {
            let points: Vec<[f64; 2]> = rows
                .iter()
                .filter_map(|r| Some([r.number(AGE)?, r.number(GLUCOSE)?]))
                .collect();
            let n = options.density_grid;
            let grid = DensityGrid::estimate(&points, x_range, y_range, n, n)?;
            let segments = grid
                .levels(options.contour_levels)
                .into_iter()
                .map(|level| grid.contour(level))
                .collect();
            Some(Group {
                key: key.clone(),
                data: segments,
            })
        })
        .collect()
}

/// `(min, max)` of finite values.
pub fn span(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen a range by 10% each side; a single point gets a unit margin.
fn pad((lo, hi): (f64, f64)) -> (f64, f64) {
    let margin = if hi > lo { (hi - lo) * 0.1 } else { 1.0 };
    (lo - margin, hi + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter;
    use crate::data::model::{Dataset, Schema};

    fn dataset() -> Dataset {
        let rows = [
            ("Male", 67.0, 228.69, Some(36.6), 1),
            ("Female", 61.0, 202.21, None, 1),
            ("Female", 49.0, 171.23, Some(34.4), 0),
            ("Male", 80.0, 105.92, Some(32.5), 1),
            ("Female", 79.0, 174.12, Some(24.0), 0),
            ("Male", 81.0, 186.21, Some(29.0), 0),
        ];
        Dataset::from_records(
            Schema::stroke(),
            rows.iter()
                .map(|&(gender, age, glucose, bmi, stroke)| {
                    Record::from_iter([
                        ("gender", FieldValue::Text(gender.into())),
                        ("age", FieldValue::Float(age)),
                        ("avg_glucose_level", FieldValue::Float(glucose)),
                        ("bmi", bmi.map(FieldValue::Float).unwrap_or(FieldValue::Null)),
                        ("smoking_status", FieldValue::Text("never smoked".into())),
                        ("work_type", FieldValue::Text("Private".into())),
                        ("stroke", FieldValue::Integer(stroke)),
                    ])
                })
                .collect(),
        )
    }

    #[test]
    fn builds_every_series() {
        let ds = dataset();
        let data = ChartData::build(&FilteredView::all(&ds), &ChartOptions::default());

        assert_eq!(data.rows, 6);
        assert_eq!(
            data.outcome_counts,
            vec![(FieldValue::Integer(0), 3), (FieldValue::Integer(1), 3)]
        );
        // The row without bmi drops out of the 3D scatter only.
        let scatter_points: usize = data.scatter3d.iter().map(|g| g.data.len()).sum();
        assert_eq!(scatter_points, 5);
        let matrix_rows: usize = data.matrix.iter().map(|g| g.data.len()).sum();
        assert_eq!(matrix_rows, 6);

        assert_eq!(data.contours.len(), 2);
        assert_eq!(data.violins.len(), 2);
        assert_eq!(data.boxes.len(), 1);
        assert_eq!(data.boxes[0].data.count, 5);

        let bars: usize = data
            .glucose_bars
            .iter()
            .flat_map(|g| g.data.iter().map(|b| b.count))
            .sum();
        assert_eq!(bars, 6);
        assert!(!data.sunburst.is_empty());
    }

    #[test]
    fn empty_view_builds_empty_series() {
        let ds = dataset();
        let selection = FilterSelection::default().with("gender", Selection::Equals(FieldValue::Text("Other".into())));
        let view = filter::apply(&ds, &selection).unwrap();
        let data = ChartData::build(&view, &ChartOptions::default());

        assert!(data.is_empty());
        assert!(data.scatter3d.is_empty());
        assert!(data.contours.is_empty());
        assert!(data.glucose_bars.is_empty());
        assert!(data.sunburst.is_empty());
        assert!(data.outcome_counts.is_empty());
    }

    #[test]
    fn pinned_glucose_range_keeps_axis() {
        let ds = dataset();
        let selection = FilterSelection::default().with("gender", Selection::Equals(FieldValue::Text("Male".into())));
        let view = filter::apply(&ds, &selection).unwrap();
        let options = ChartOptions {
            glucose_range: ds.bounds_of(GLUCOSE),
            histogram_bins: 4,
            ..ChartOptions::default()
        };
        let data = ChartData::build(&view, &options);
        for group in &data.glucose_bars {
            assert_eq!(group.data.first().map(|b| b.start), Some(105.92));
            assert_eq!(group.data.last().map(|b| b.end), Some(228.69));
        }
    }

    #[test]
    fn pie_title_follows_gender_selection() {
        let all = FilterSelection::default();
        assert_eq!(pie_title(&all), "Distribution of Stroke for All Genders");
        let male = all.with("gender", Selection::Equals(FieldValue::Text("Male".into())));
        assert_eq!(pie_title(&male), "Distribution of Stroke for Male");
    }
}
