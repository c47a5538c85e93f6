use std::collections::BTreeSet;

use crate::chart::projection::Camera;
use crate::chart::{ChartData, ChartKind, ChartOptions, GLUCOSE};
use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{FilterPredicate, FilterSelection, FilteredView, Selection, filtered_indices};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CentralTab {
    #[default]
    Charts,
    Table,
}

/// The full UI state, independent of rendering. The filter selection lives
/// here explicitly and is handed to the predicate builder on every change.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Current per-field selections.
    pub selection: FilterSelection,

    /// Selection overrides from the startup config, reapplied on each load.
    pub configured_selection: FilterSelection,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Chart series for `visible_indices` (cached).
    pub chart_data: ChartData,

    pub chart_options: ChartOptions,

    /// Charts drawn in the central panel, in display order.
    pub enabled_charts: BTreeSet<ChartKind>,

    /// Active colour map for `chart_options.color_by`.
    pub color_map: Option<ColorMap>,

    pub camera: Camera,

    pub tab: CentralTab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl AppState {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            dataset: None,
            selection: FilterSelection::default(),
            configured_selection: config.filters.clone(),
            visible_indices: Vec::new(),
            chart_data: ChartData::default(),
            chart_options: config.chart_options(),
            enabled_charts: config.charts.iter().copied().collect(),
            color_map: None,
            camera: Camera::default(),
            tab: CentralTab::default(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset, initialise filters and colour.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let mut selection = FilterSelection::initial(&dataset);
        for (field, sel) in self.configured_selection.iter() {
            selection.set(field.clone(), sel.clone());
        }
        self.selection = selection;
        self.chart_options.glucose_range = dataset.bounds_of(GLUCOSE);
        self.color_map = build_color_map(&dataset, &self.chart_options.color_by);

        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the chart series after a selection change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match FilterPredicate::compile(&ds.schema, &self.selection) {
            Ok(predicate) => {
                self.visible_indices = filtered_indices(ds, &predicate);
                let view = FilteredView::borrowed(ds, &self.visible_indices);
                self.chart_data = ChartData::build(&view, &self.chart_options);
                log::debug!(
                    "{} conditions keep {} of {} rows",
                    predicate.len(),
                    self.visible_indices.len(),
                    ds.len()
                );
            }
            Err(e) => {
                log::warn!("Ignoring filter change: {e}");
                self.status_message = Some(format!("Filter error: {e}"));
            }
        }
    }

    /// Current view over the dataset, if one is loaded.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.dataset
            .as_ref()
            .map(|ds| FilteredView::borrowed(ds, &self.visible_indices))
    }

    /// Replace one field's selection and refilter. A selection that does not
    /// compile is reported and dropped; the previous one stays in effect.
    pub fn set_selection(&mut self, field: &str, selection: Selection) {
        if self.selection.get(field) == Some(&selection) {
            return;
        }
        let candidate = self.selection.clone().with(field, selection);
        if let Some(ds) = &self.dataset {
            if let Err(e) = FilterPredicate::compile(&ds.schema, &candidate) {
                log::warn!("Ignoring filter change: {e}");
                self.status_message = Some(format!("Filter error: {e}"));
                return;
            }
        }
        self.selection = candidate;
        self.status_message = None;
        self.refilter();
    }

    /// Back to the dataset's initial selection (config overrides dropped).
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection = FilterSelection::initial(ds);
        }
        self.refilter();
    }

    /// Set colour-by field, rebuild the map and the grouped series.
    pub fn set_color_by(&mut self, field: String) {
        if let Some(ds) = &self.dataset {
            self.color_map = build_color_map(ds, &field);
        }
        self.chart_options.color_by = field;
        self.refilter();
    }

    pub fn toggle_chart(&mut self, chart: ChartKind) {
        if !self.enabled_charts.remove(&chart) {
            self.enabled_charts.insert(chart);
        }
    }
}

fn build_color_map(dataset: &Dataset, field: &str) -> Option<ColorMap> {
    dataset
        .unique_values
        .get(field)
        .map(|vals| ColorMap::new(field, vals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FieldValue, Record, Schema};

    fn dataset() -> Dataset {
        let rows = [("Male", 67, 1), ("Female", 61, 1), ("Female", 49, 0)];
        Dataset::from_records(
            Schema::stroke(),
            rows.iter()
                .map(|&(gender, age, stroke)| {
                    Record::from_iter([
                        ("gender", FieldValue::Text(gender.into())),
                        ("age", FieldValue::Integer(age)),
                        ("avg_glucose_level", FieldValue::Float(100.0 + age as f64)),
                        ("stroke", FieldValue::Integer(stroke)),
                    ])
                })
                .collect(),
        )
    }

    #[test]
    fn loading_shows_every_row() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.chart_data.rows, 3);
        assert_eq!(state.chart_options.glucose_range, Some((149.0, 167.0)));
        assert!(state.color_map.is_some());
    }

    #[test]
    fn selection_change_refilters() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.set_selection("gender", Selection::Equals(FieldValue::Text("Female".into())));
        assert_eq!(state.visible_indices, vec![1, 2]);
        assert_eq!(state.view().map(|v| v.len()), Some(2));

        state.set_selection("age", Selection::range(100.0, 120.0));
        assert!(state.visible_indices.is_empty());
        assert!(state.chart_data.is_empty());

        state.reset_filters();
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn configured_selection_applies_on_load() {
        let config = DashboardConfig {
            filters: FilterSelection::default().with("stroke", Selection::Equals(FieldValue::Integer(0))),
            ..DashboardConfig::default()
        };
        let mut state = AppState::from_config(&config);
        state.set_dataset(dataset());
        assert_eq!(state.visible_indices, vec![2]);
    }

    #[test]
    fn invalid_selection_keeps_previous_view() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.set_selection("gender", Selection::range(0.0, 1.0));
        assert_eq!(state.visible_indices.len(), 3);
        assert!(state.status_message.is_some());
        assert_eq!(state.selection.get("gender"), Some(&Selection::Unrestricted));
    }

    #[test]
    fn rejected_selection_does_not_block_later_edits() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.set_selection("gender", Selection::range(0.0, 1.0));
        state.set_selection("gender", Selection::Equals(FieldValue::Text("Female".into())));
        assert_eq!(state.visible_indices, vec![1, 2]);
        state.set_selection("age", Selection::range(60.0, 70.0));
        assert_eq!(state.visible_indices, vec![1]);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn rows_missing_a_number_stay_visible_until_ranged() {
        let mut ds = dataset();
        ds.records[0].values.insert("bmi".into(), FieldValue::Float(36.6));
        ds.records[1].values.insert("bmi".into(), FieldValue::Null);
        ds.records[2].values.insert("bmi".into(), FieldValue::Float(28.1));
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(Schema::stroke(), ds.records));
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.chart_data.rows, 3);

        state.set_selection("bmi", Selection::range(20.0, 40.0));
        assert_eq!(state.visible_indices, vec![0, 2]);
    }

    #[test]
    fn chart_toggle_round_trips() {
        let mut state = AppState::default();
        assert!(state.enabled_charts.contains(&ChartKind::Pie));
        state.toggle_chart(ChartKind::Pie);
        assert!(!state.enabled_charts.contains(&ChartKind::Pie));
        state.toggle_chart(ChartKind::Pie);
        assert!(state.enabled_charts.contains(&ChartKind::Pie));
    }
}
