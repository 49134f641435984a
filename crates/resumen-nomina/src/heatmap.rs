//! Heat-map layout engine.
//!
//! Turns a flat list of [`VariationRecord`]s into a two-level partition
//! (business group → position cell). Group and cell weights drive
//! proportional sizing; cell color encodes the sign and magnitude of the
//! percentage change. Pure and deterministic: the same records always give
//! the same layout.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::types::{HeatmapSnapshot, VariationRecord};

/// Group weights are expressed in tenths of the total.
pub const GROUP_WEIGHT_SCALE: f64 = 10.0;
/// One unit of cell weight per million of current value.
pub const ITEM_WEIGHT_UNIT: f64 = 1_000_000.0;
/// Smallest rendered cell size, in size units.
pub const MIN_CELL_SIZE: u32 = 80;
/// Size units per unit of cell weight.
pub const SIZE_PER_WEIGHT: u32 = 20;
/// Percentage change at which color intensity saturates.
pub const SATURATION_PERCENT: f64 = 15.0;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// One position inside a business group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub record: VariationRecord,
    pub weight: u32,
    /// Guaranteed minimum footprint, in size units.
    pub min_size: u32,
    /// 0.0 – 1.0, saturating at ±15%.
    pub intensity: f64,
    pub color: Rgb,
}

/// One business and its cells, largest swings first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGroup {
    pub business: String,
    pub weight: u32,
    pub cells: Vec<HeatmapCell>,
}

/// Render-ready heat-map geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapLayout {
    /// Sorted by business name (ordinal).
    pub groups: Vec<HeatmapGroup>,
}

impl HeatmapLayout {
    /// Lay out a snapshot. The flat `items` list is authoritative; the
    /// pre-grouped map is only used when the server sent nothing else.
    pub fn from_snapshot(snapshot: &HeatmapSnapshot) -> Self {
        if !snapshot.items.is_empty() || snapshot.items_by_business.is_empty() {
            return layout(&snapshot.items);
        }
        let flat: Vec<VariationRecord> = snapshot
            .items_by_business
            .values()
            .flatten()
            .cloned()
            .collect();
        layout(&flat)
    }

    pub fn group(&self, business: &str) -> Option<&HeatmapGroup> {
        self.groups.iter().find(|g| g.business == business)
    }

    pub fn cell_count(&self) -> usize {
        self.groups.iter().map(|g| g.cells.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Build the layout for a snapshot's records.
pub fn layout(records: &[VariationRecord]) -> HeatmapLayout {
    let mut by_business: BTreeMap<&str, Vec<&VariationRecord>> = BTreeMap::new();
    for record in records {
        by_business
            .entry(record.business.as_str())
            .or_default()
            .push(record);
    }

    let total: f64 = records.iter().map(|r| r.current_value.abs()).sum();

    let groups = by_business
        .into_iter()
        .map(|(business, mut members)| {
            // Stable: equal swings keep their input order.
            members.sort_by(|a, b| b.percent_change.abs().total_cmp(&a.percent_change.abs()));

            let group_sum: f64 = members.iter().map(|r| r.current_value.abs()).sum();
            let cells = members
                .into_iter()
                .map(|record| {
                    let weight = item_weight(record.current_value);
                    HeatmapCell {
                        weight,
                        min_size: min_cell_size(weight),
                        intensity: intensity(record.percent_change),
                        color: color_for(record.percent_change),
                        record: record.clone(),
                    }
                })
                .collect();

            HeatmapGroup {
                business: business.to_string(),
                weight: group_weight(group_sum, total),
                cells,
            }
        })
        .collect();

    HeatmapLayout { groups }
}

/// `max(1, round(10 × group / total))`; 1 when the total is zero.
pub fn group_weight(group_sum: f64, total: f64) -> u32 {
    if total == 0.0 {
        return 1;
    }
    let weight = ((group_sum / total) * GROUP_WEIGHT_SCALE).round();
    (weight as u32).max(1)
}

/// `max(1, round(|value| / 1,000,000))`.
pub fn item_weight(current_value: f64) -> u32 {
    let weight = (current_value.abs() / ITEM_WEIGHT_UNIT).round();
    (weight as u32).max(1)
}

pub fn min_cell_size(weight: u32) -> u32 {
    weight.saturating_mul(SIZE_PER_WEIGHT).max(MIN_CELL_SIZE)
}

pub fn intensity(percent_change: f64) -> f64 {
    (percent_change.abs() / SATURATION_PERCENT).min(1.0)
}

/// Green for growth (zero included), red for decline; darker as the swing grows.
pub fn color_for(percent_change: f64) -> Rgb {
    let fade = 1.0 - intensity(percent_change);
    if percent_change >= 0.0 {
        Rgb {
            r: channel(40.0 + fade * 100.0),
            g: channel(120.0 + fade * 80.0),
            b: channel(40.0 + fade * 100.0),
        }
    } else {
        Rgb {
            r: channel(180.0 + fade * 50.0),
            g: channel(50.0 + fade * 100.0),
            b: channel(50.0 + fade * 100.0),
        }
    }
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
