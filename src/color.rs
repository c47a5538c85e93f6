use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Lighten, Srgb};

use crate::chart::OUTCOME;
use crate::data::model::FieldValue;

/// Outcome colours of the original dashboard: no stroke blue, stroke red.
pub const NO_STROKE: Color32 = Color32::from_rgb(31, 119, 180);
pub const STROKE: Color32 = Color32::from_rgb(214, 39, 40);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55).into_color())
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Lighter variant of `color` for outer sunburst rings.
pub fn lighten(color: Color32, amount: f32) -> Color32 {
    let rgb = Srgb::new(
        color.r() as f32 / 255.0,
        color.g() as f32 / 255.0,
        color.b() as f32 / 255.0,
    );
    let hsl: Hsl = rgb.into_color();
    to_color32(hsl.lighten(amount).into_color())
}

// ---------------------------------------------------------------------------
// Color mapping: field value → Color32
// ---------------------------------------------------------------------------

/// Maps observed values of a chosen field to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<FieldValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for `field` from its unique values. The stroke
    /// outcome keeps its fixed blue/red pair.
    pub fn new(field: &str, unique_values: &BTreeSet<FieldValue>) -> Self {
        let mapping: BTreeMap<FieldValue, Color32> = if field == OUTCOME {
            unique_values
                .iter()
                .map(|v| (v.clone(), outcome_color(v)))
                .collect()
        } else {
            let palette = generate_palette(unique_values.len());
            unique_values.iter().cloned().zip(palette).collect()
        };

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &FieldValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}

pub fn outcome_color(value: &FieldValue) -> Color32 {
    match value {
        FieldValue::Integer(1) => STROKE,
        FieldValue::Integer(0) => NO_STROKE,
        _ => Color32::GRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let colours = generate_palette(5);
        assert_eq!(colours.len(), 5);
        let unique: BTreeSet<[u8; 4]> = colours.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 5);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn outcome_keeps_fixed_colours() {
        let values: BTreeSet<FieldValue> = [FieldValue::Integer(0), FieldValue::Integer(1)].into();
        let map = ColorMap::new(OUTCOME, &values);
        assert_eq!(map.color_for(&FieldValue::Integer(1)), STROKE);
        assert_eq!(map.color_for(&FieldValue::Integer(0)), NO_STROKE);
        assert_eq!(map.color_for(&FieldValue::Null), Color32::GRAY);
        assert_eq!(map.legend_entries().len(), 2);
    }

    #[test]
    fn lighten_moves_toward_white() {
        let light = lighten(STROKE, 0.4);
        assert!(light.r() >= STROKE.r() && light.g() > STROKE.g() && light.b() > STROKE.b());
    }
}
