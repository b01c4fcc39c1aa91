//! Deployment state and configuration.
//!
//! One `MonitorState` per monitored deployment/session, owned explicitly by
//! the caller, so multiple independent dashboards can live in one process.
//! The core defines no event loop: the host calls `set_window`/`on_resize`
//! from whatever event system it runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::aggregator::ObservationAggregator;
use crate::alerts::AlertStore;
use crate::error::CoreError;
use crate::feed::DetectionRecord;
use crate::types::{AlertRecord, MonitorConfig, Observation, Rgba, TimeWindow};

/// Rendering surface bound until the host reports its real size. Matches
/// the dashboard's fallback surface of 600×400.
const DEFAULT_SURFACE: (u32, u32) = (600, 400);

/// Per-deployment state: one alert store, one aggregated field.
pub struct MonitorState {
    config: RwLock<MonitorConfig>,
    pub alerts: AlertStore,
    pub aggregator: ObservationAggregator,
}

impl MonitorState {
    pub fn new(config: MonitorConfig) -> Self {
        let (width, height) = DEFAULT_SURFACE;
        let aggregator =
            ObservationAggregator::new(width, height, config.heatmap, config.default_window);
        Self {
            config: RwLock::new(config),
            alerts: AlertStore::new(),
            aggregator,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MonitorConfig::default())
    }

    pub fn config(&self) -> MonitorConfig {
        self.config.read().clone()
    }

    /// Store one feed record: always as an alert, and additionally as a
    /// field observation at the region centroid when the detector attached
    /// a bounding region.
    pub fn ingest_detection(&self, record: &DetectionRecord) -> Result<AlertRecord, CoreError> {
        let alert = self.alerts.ingest(record.to_alert()?)?;
        if let Some(observation) = record.observation()? {
            self.aggregator.push(observation);
        }
        Ok(alert)
    }

    /// Switch the active lookback window and re-render the field.
    pub fn set_window(&self, window: TimeWindow, now: DateTime<Utc>) -> Vec<Observation> {
        self.aggregator.set_window(window, now)
    }

    /// Window selector as it arrives from the outside (`day|week|month`).
    pub fn set_window_str(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Observation>, CoreError> {
        let window = TimeWindow::try_from(raw)?;
        Ok(self.set_window(window, now))
    }

    pub fn on_resize(&self, width: u32, height: u32) {
        self.aggregator.on_resize(width, height);
    }

    pub fn query_color(&self, x: f64, y: f64) -> Rgba {
        self.aggregator.query_color(x, y)
    }

    /// Re-read configuration from disk and swap it in. Rendering parameters
    /// take effect for fields created afterwards.
    pub fn reload_config(&self) -> Result<MonitorConfig, CoreError> {
        let config = load_config()?;
        *self.config.write() = config.clone();
        Ok(config)
    }
}

/// Canonical config file path (~/.emberwatch/config.json)
pub fn config_path() -> Result<PathBuf, CoreError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CoreError::InvalidArgument("could not find home directory".to_string()))?;
    Ok(home.join(".emberwatch").join("config.json"))
}

/// Load configuration from the canonical path. A missing file yields the
/// defaults; a malformed file is an error.
pub fn load_config() -> Result<MonitorConfig, CoreError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<MonitorConfig, CoreError> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(MonitorConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        CoreError::InvalidArgument(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        CoreError::InvalidArgument(format!("failed to parse {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::BoundingRegion;
    use crate::types::{AlertFilter, AlertKind, AlertStatus};

    fn sample_record(kind: AlertKind, region: Option<BoundingRegion>) -> DetectionRecord {
        DetectionRecord {
            kind,
            confidence: 90,
            location: "Zone A - Processing Unit".to_string(),
            bounding_region: region,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_ingest_feeds_both_store_and_field() {
        let state = MonitorState::with_defaults();
        let record = sample_record(
            AlertKind::Fire,
            Some(BoundingRegion {
                x: 280.0,
                y: 180.0,
                w: 40.0,
                h: 40.0,
            }),
        );

        let alert = state.ingest_detection(&record).unwrap();
        assert_eq!(alert.status, AlertStatus::Critical);
        assert_eq!(state.aggregator.observation_count(), 1);

        state.set_window(TimeWindow::Day, Utc::now());
        assert!(state.aggregator.intensity_at(300.0, 200.0) > 0.0);
    }

    #[test]
    fn test_ingest_without_region_stores_alert_only() {
        let state = MonitorState::with_defaults();
        state
            .ingest_detection(&sample_record(AlertKind::Smoke, None))
            .unwrap();
        assert_eq!(state.alerts.query(AlertFilter::All).len(), 1);
        assert_eq!(state.aggregator.observation_count(), 0);
    }

    #[test]
    fn test_window_selector_rejects_unknown_value() {
        let state = MonitorState::with_defaults();
        let err = state.set_window_str("decade", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"heatmap": {"radius": 40.0}, "topZones": 5}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.heatmap.radius, 40.0);
        assert_eq!(config.heatmap.blur, 0.9);
        assert_eq!(config.top_zones, 5);
        assert_eq!(config.default_window, TimeWindow::Week);
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(CoreError::InvalidArgument(_))
        ));
    }
}
