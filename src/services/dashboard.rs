// Dashboard service: assembles the summary-panel snapshot from core state.
// Covers the alert summary, highest-risk zones, and detection frequency
// panels; any rendering surface consumes the serialized form.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ranking;
use crate::state::MonitorState;
use crate::types::{AlertFilter, AlertKind, AlertSummary, TimeWindow, ZoneIntensity};

/// JSON-serializable snapshot of the dashboard's summary panels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub window: TimeWindow,
    pub summary: AlertSummary,
    pub top_regions: Vec<ZoneIntensity>,
    pub frequency: BTreeMap<AlertKind, u8>,
}

/// Build the snapshot from the current alert and field state. Each section
/// reads one consistent snapshot of its owning structure.
pub fn build_snapshot(state: &MonitorState) -> DashboardSnapshot {
    let config = state.config();
    let alerts = state.alerts.query(AlertFilter::All);

    DashboardSnapshot {
        window: state.aggregator.window(),
        summary: state.alerts.summary(),
        top_regions: state
            .aggregator
            .with_field(|field| ranking::top_regions(field, config.top_zones)),
        frequency: ranking::category_frequency(&alerts),
    }
}
