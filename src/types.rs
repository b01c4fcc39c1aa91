use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// =============================================================================
// Observations & time windows
// =============================================================================

/// Hazard category attached to an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardCategory {
    Fire,
    Smoke,
    Other,
}

/// A timestamped, located, weighted hazard signal feeding the intensity field.
///
/// `value` is a confidence/intensity score in [0, 100], not a probability;
/// there is no normalization guarantee across categories. Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub detected_at: DateTime<Utc>,
    pub category: HazardCategory,
}

/// Lookback window used to select which observations feed the current render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
    Month,
}

impl TimeWindow {
    /// Fixed lookback duration for this window.
    pub fn lookback(&self) -> Duration {
        match self {
            TimeWindow::Day => Duration::hours(24),
            TimeWindow::Week => Duration::days(7),
            TimeWindow::Month => Duration::days(30),
        }
    }

    /// Maximum observation count per window. Bounds synthetic-load
    /// scenarios; a deployment wanting "all observations within the
    /// lookback" raises this, not the selection code.
    pub fn max_points(&self) -> usize {
        match self {
            TimeWindow::Day => 10,
            TimeWindow::Week => 30,
            TimeWindow::Month => 80,
        }
    }

    /// Wire name, matching the inbound window selector.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
        }
    }
}

impl TryFrom<&str> for TimeWindow {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown time window '{}', expected day|week|month",
                other
            ))),
        }
    }
}

// =============================================================================
// Alerts
// =============================================================================

/// Detection kind carried by an alert. Serialized as `type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Fire,
    Smoke,
}

/// Alert lifecycle state.
///
/// Created in `Critical` (fire) or `Warning` (smoke); moves to
/// `Acknowledged`/`Escalated` only via explicit operator action; `Closed`
/// is terminal. No implicit expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Critical,
    Warning,
    Acknowledged,
    Escalated,
    Closed,
}

impl AlertStatus {
    /// Open alerts are the ones still awaiting operator action.
    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::Critical | AlertStatus::Warning)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Closed)
    }
}

/// Operator action applied to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertAction {
    Acknowledge,
    Escalate,
    Close,
}

/// A stored detection alert.
///
/// The original UI's `selected` flag is presentation state and is not part
/// of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub confidence: u8,
    pub location: String,
    pub detected_at: DateTime<Utc>,
    pub status: AlertStatus,
}

/// Pure category predicate over the alert set. Does not mutate stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertFilter {
    #[default]
    All,
    Fire,
    Smoke,
}

impl AlertFilter {
    pub fn matches(&self, kind: AlertKind) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Fire => kind == AlertKind::Fire,
            AlertFilter::Smoke => kind == AlertKind::Smoke,
        }
    }
}

impl TryFrom<&str> for AlertFilter {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "all" => Ok(AlertFilter::All),
            "fire" => Ok(AlertFilter::Fire),
            "smoke" => Ok(AlertFilter::Smoke),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown alert filter '{}', expected all|fire|smoke",
                other
            ))),
        }
    }
}

/// Aggregate counts over the current alert set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
}

// =============================================================================
// Rendering payloads
// =============================================================================

/// Interpolated gradient color for one cell. Alpha is not pre-multiplied;
/// the rendering surface applies it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Mean intensity of one named zone, as a 0–100 percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneIntensity {
    pub label: String,
    pub intensity_pct: u8,
}

// =============================================================================
// Configuration
// =============================================================================

/// Field rendering parameters.
///
/// Defaults mirror the deployed dashboard: radius 25, blur 0.9, opacity
/// 0.3–0.8. Every field carries a serde default so partial configs parse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapConfig {
    /// Radius of influence around a contributing point, in grid units.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Falloff softness in [0, 1]. Clamped on use.
    #[serde(default = "default_blur")]
    pub blur: f64,
    #[serde(default = "default_min_opacity")]
    pub min_opacity: f32,
    #[serde(default = "default_max_opacity")]
    pub max_opacity: f32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            blur: default_blur(),
            min_opacity: default_min_opacity(),
            max_opacity: default_max_opacity(),
        }
    }
}

fn default_radius() -> f64 {
    25.0
}

fn default_blur() -> f64 {
    0.9
}

fn default_min_opacity() -> f32 {
    0.3
}

fn default_max_opacity() -> f32 {
    0.8
}

/// Configuration stored in ~/.emberwatch/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub default_window: TimeWindow,
    #[serde(default = "default_top_zones")]
    pub top_zones: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heatmap: HeatmapConfig::default(),
            default_window: TimeWindow::default(),
            top_zones: default_top_zones(),
        }
    }
}

fn default_top_zones() -> usize {
    3
}
