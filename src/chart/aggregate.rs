use std::collections::BTreeMap;

use crate::data::filter::FilteredView;
use crate::data::model::{FieldValue, Record};

/// Row count per distinct value of `field`, ordered by value. Missing cells
/// count under [`FieldValue::Null`].
pub fn value_counts(view: &FilteredView<'_>, field: &str) -> Vec<(FieldValue, usize)> {
    let mut counts: BTreeMap<FieldValue, usize> = BTreeMap::new();
    for record in view.records() {
        let value = record.get(field).cloned().unwrap_or(FieldValue::Null);
        *counts.entry(value).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Group rows of `view` by the value of `field`, keeping row order inside groups.
pub fn group_by<'a>(view: &FilteredView<'a>, field: &str) -> BTreeMap<FieldValue, Vec<&'a Record>> {
    let mut groups: BTreeMap<FieldValue, Vec<&'a Record>> = BTreeMap::new();
    for record in view.records() {
        let key = record.get(field).cloned().unwrap_or(FieldValue::Null);
        groups.entry(key).or_default().push(record);
    }
    groups
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width histogram of `values` over `[lo, hi]`. The last bin is closed
/// so `hi` itself is counted; values outside the range are ignored.
pub fn histogram(values: &[f64], (lo, hi): (f64, f64), bins: usize) -> Vec<Bin> {
    if bins == 0 || !(lo <= hi) {
        return Vec::new();
    }
    let width = (hi - lo) / bins as f64;
    if width == 0.0 {
        let count = values.iter().filter(|&&v| v == lo).count();
        return vec![Bin {
            start: lo,
            end: hi,
            count,
        }];
    }

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &v in values {
        if !(lo..=hi).contains(&v) {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Sunburst hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SunburstNode {
    pub label: FieldValue,
    pub count: usize,
    pub children: Vec<SunburstNode>,
}

/// Nested counts following `levels`, outermost grouping first.
pub fn sunburst(view: &FilteredView<'_>, levels: &[&str]) -> Vec<SunburstNode> {
    let rows: Vec<&Record> = view.records().collect();
    build_level(&rows, levels)
}

fn build_level(rows: &[&Record], levels: &[&str]) -> Vec<SunburstNode> {
    let Some((field, rest)) = levels.split_first() else {
        return Vec::new();
    };
    let mut groups: BTreeMap<FieldValue, Vec<&Record>> = BTreeMap::new();
    for &record in rows {
        let key = record.get(field).cloned().unwrap_or(FieldValue::Null);
        groups.entry(key).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(label, members)| SunburstNode {
            label,
            count: members.len(),
            children: build_level(&members, rest),
        })
        .collect()
}

/// One wedge of a sunburst ring. Angles are fractions of the full turn.
#[derive(Debug, Clone, PartialEq)]
pub struct RingArc {
    /// 0 for the innermost ring.
    pub depth: usize,
    pub start: f64,
    pub end: f64,
    pub label: String,
    pub count: usize,
    /// Position of the top-level ancestor, used to pick a colour family.
    pub family: usize,
}

/// Flatten a sunburst hierarchy into ring wedges proportional to counts.
pub fn sunburst_arcs(nodes: &[SunburstNode]) -> Vec<RingArc> {
    let total: usize = nodes.iter().map(|n| n.count).sum();
    let mut arcs = Vec::new();
    if total == 0 {
        return arcs;
    }
    let mut cursor = 0.0;
    for (family, node) in nodes.iter().enumerate() {
        cursor = push_arcs(node, 0, cursor, total as f64, family, &mut arcs);
    }
    arcs
}

fn push_arcs(
    node: &SunburstNode,
    depth: usize,
    start: f64,
    total: f64,
    family: usize,
    arcs: &mut Vec<RingArc>,
) -> f64 {
    let end = start + node.count as f64 / total;
    arcs.push(RingArc {
        depth,
        start,
        end,
        label: node.label.to_string(),
        count: node.count,
        family,
    });
    let mut cursor = start;
    for child in &node.children {
        cursor = push_arcs(child, depth + 1, cursor, total, family, arcs);
    }
    end
}
