use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::{ChartKind, ChartOptions, OUTCOME};
use crate::data::filter::{FilterPredicate, FilterSelection};
use crate::data::model::Schema;

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

/// Dashboard settings read once at startup from a JSON file.
///
/// ```json
/// {
///   "dataset": "stroke_data.csv",
///   "window": { "width": 1400, "height": 900 },
///   "charts": ["scatter3d", "pie", "bar"],
///   "color_by": "stroke",
///   "histogram_bins": 30,
///   "filters": { "gender": { "equals": "Male" }, "age": { "range": [40, 80] } }
/// }
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub dataset: Option<PathBuf>,
    pub window: WindowConfig,
    pub charts: Vec<ChartKind>,
    pub color_by: String,
    pub histogram_bins: usize,
    pub contour_levels: usize,
    /// Overrides applied on top of the dataset's initial selection.
    pub filters: FilterSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let chart_defaults = ChartOptions::default();
        Self {
            dataset: None,
            window: WindowConfig::default(),
            charts: ChartKind::ALL.to_vec(),
            color_by: OUTCOME.to_string(),
            histogram_bins: chart_defaults.histogram_bins,
            contour_levels: chart_defaults.contour_levels,
            filters: FilterSelection::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(text)?;
        config.validate(&Schema::stroke())?;
        Ok(config)
    }

    /// Reject selections and settings that could never be applied, so the
    /// problem surfaces once at startup rather than on every interaction.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        FilterPredicate::compile(schema, &self.filters).context("invalid initial filters")?;
        match schema.kind_of(&self.color_by) {
            Some(kind) if kind.is_discrete() => {}
            Some(kind) => anyhow::bail!("color_by field '{}' is {kind}, expected a categorical field", self.color_by),
            None => anyhow::bail!("color_by references unknown field '{}'", self.color_by),
        }
        if self.histogram_bins == 0 {
            anyhow::bail!("histogram_bins must be at least 1");
        }
        Ok(())
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            histogram_bins: self.histogram_bins,
            contour_levels: self.contour_levels,
            color_by: self.color_by.clone(),
            ..ChartOptions::default()
        }
    }
}
