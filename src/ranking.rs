//! Summary rankings over the field and the alert set.
//!
//! Stateless: every function is a pure view over the snapshots it is
//! handed. Feeds the "highest risk areas" and "detection frequency" panels.

use std::collections::BTreeMap;

use crate::heatmap::{SpatialField, VALUE_MAX};
use crate::types::{AlertKind, AlertRecord, ZoneIntensity};

/// Named zones of the 3×3 compass partition, row-major from the top-left.
const ZONE_LABELS: [&str; 9] = [
    "north-west",
    "north",
    "north-east",
    "west",
    "central",
    "east",
    "south-west",
    "south",
    "south-east",
];

/// The `n` zones with the highest mean intensity, descending; ties broken
/// by zone label ascending. Changing `n` only truncates or extends the
/// ordered result.
pub fn top_regions(field: &SpatialField, n: usize) -> Vec<ZoneIntensity> {
    let mut zones: Vec<ZoneIntensity> = ZONE_LABELS
        .iter()
        .enumerate()
        .map(|(index, label)| ZoneIntensity {
            label: (*label).to_string(),
            intensity_pct: zone_mean_pct(field, index as u32 % 3, index as u32 / 3),
        })
        .collect();

    zones.sort_by(|a, b| {
        b.intensity_pct
            .cmp(&a.intensity_pct)
            .then_with(|| a.label.cmp(&b.label))
    });
    zones.truncate(n);
    zones
}

/// Mean intensity of one zone as a 0–100 percentage, rounded half-up.
fn zone_mean_pct(field: &SpatialField, zone_col: u32, zone_row: u32) -> u8 {
    let width = field.width();
    let height = field.height();
    let col_start = zone_col * width / 3;
    let col_end = (zone_col + 1) * width / 3;
    let row_start = zone_row * height / 3;
    let row_end = (zone_row + 1) * height / 3;

    let cells = field.cells();
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in row_start..row_end {
        let base = (row as usize) * (width as usize);
        for col in col_start..col_end {
            sum += cells[base + col as usize];
            count += 1;
        }
    }

    if count == 0 {
        return 0;
    }
    ((sum / count as f64) / VALUE_MAX * 100.0).round() as u8
}

/// Per-category share of the alert set as whole percentages.
///
/// Largest-remainder rounding: floor every share, then hand the remaining
/// points to the largest fractional parts (ties by category order), so the
/// total is exactly 100 for non-empty input. Empty input yields an empty
/// map.
pub fn category_frequency(alerts: &[AlertRecord]) -> BTreeMap<AlertKind, u8> {
    let mut counts: BTreeMap<AlertKind, usize> = BTreeMap::new();
    for alert in alerts {
        *counts.entry(alert.kind).or_insert(0) += 1;
    }
    let total = alerts.len();
    if total == 0 {
        return BTreeMap::new();
    }

    let mut shares: Vec<(AlertKind, u8, usize)> = counts
        .into_iter()
        .map(|(kind, count)| {
            let scaled = count * 100;
            (kind, (scaled / total) as u8, scaled % total)
        })
        .collect();

    let floor_sum: u32 = shares.iter().map(|(_, pct, _)| *pct as u32).sum();
    let mut leftover = 100 - floor_sum;

    // Largest fractional part first; category order settles ties.
    shares.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    for share in shares.iter_mut() {
        if leftover == 0 {
            break;
        }
        share.1 += 1;
        leftover -= 1;
    }

    shares.into_iter().map(|(kind, pct, _)| (kind, pct)).collect()
}
