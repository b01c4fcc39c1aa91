//! Inbound detector feed.
//!
//! The detector is an opaque upstream: it emits `{type, confidence,
//! location, boundingRegion?, timestamp}` records. This module parses the
//! wire shape, resolves timestamps, and converts records into alert inputs
//! and field observations. No classification happens here.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::NewDetection;
use crate::error::CoreError;
use crate::types::{AlertKind, HazardCategory, Observation};

/// Axis-aligned detection region in field coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingRegion {
    pub fn centroid(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// One record of the detector feed, as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub confidence: u8,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_region: Option<BoundingRegion>,
    /// ISO-8601. Timezone-less timestamps are read as UTC.
    pub timestamp: String,
}

impl DetectionRecord {
    pub fn detected_at(&self) -> Result<DateTime<Utc>, CoreError> {
        parse_timestamp(&self.timestamp)
    }

    /// Alert-store input for this record.
    pub fn to_alert(&self) -> Result<NewDetection, CoreError> {
        Ok(NewDetection {
            kind: self.kind,
            confidence: self.confidence,
            location: self.location.clone(),
            detected_at: self.detected_at()?,
        })
    }

    /// Field observation for this record: region centroid with
    /// `value = confidence`. `None` when the detector attached no region.
    pub fn observation(&self) -> Result<Option<Observation>, CoreError> {
        let Some(region) = self.bounding_region else {
            return Ok(None);
        };
        let (x, y) = region.centroid();
        let category = match self.kind {
            AlertKind::Fire => HazardCategory::Fire,
            AlertKind::Smoke => HazardCategory::Smoke,
        };
        Ok(Some(Observation {
            x,
            y,
            value: self.confidence as f64,
            detected_at: self.detected_at()?,
            category,
        }))
    }
}

/// Parse a JSON array of feed records.
pub fn parse_feed(json: &str) -> Result<Vec<DetectionRecord>, CoreError> {
    serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidArgument(format!("malformed detection feed: {}", e)))
}

/// RFC 3339 first; the deployed detectors also emit local timestamps
/// without an offset, which are read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            CoreError::InvalidObservation(format!("unparseable detection timestamp '{}'", raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_sample_record() {
        let json = r#"{
            "type": "fire",
            "confidence": 92,
            "location": "Zone A - Processing Unit",
            "boundingRegion": {"x": 100.0, "y": 60.0, "w": 40.0, "h": 20.0},
            "timestamp": "2025-04-08T10:45:32"
        }"#;
        let record: DetectionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, AlertKind::Fire);
        assert_eq!(record.confidence, 92);

        let detected = record.detected_at().unwrap();
        assert_eq!(detected.hour(), 10);
        assert_eq!(detected.minute(), 45);
    }

    #[test]
    fn test_rfc3339_timestamps_respect_offset() {
        let detected = parse_timestamp("2025-04-08T10:45:32+02:00").unwrap();
        assert_eq!(detected.hour(), 8);
    }

    #[test]
    fn test_garbage_timestamp_is_invalid_observation() {
        let err = parse_timestamp("yesterday-ish").unwrap_err();
        assert!(matches!(err, CoreError::InvalidObservation(_)));
    }

    #[test]
    fn test_observation_uses_region_centroid_and_confidence() {
        let record = DetectionRecord {
            kind: AlertKind::Smoke,
            confidence: 78,
            location: "Zone C - Storage Area".to_string(),
            bounding_region: Some(BoundingRegion {
                x: 100.0,
                y: 60.0,
                w: 40.0,
                h: 20.0,
            }),
            timestamp: "2025-04-08T09:22:15Z".to_string(),
        };
        let obs = record.observation().unwrap().unwrap();
        assert_eq!((obs.x, obs.y), (120.0, 70.0));
        assert_eq!(obs.value, 78.0);
        assert_eq!(obs.category, HazardCategory::Smoke);
    }

    #[test]
    fn test_record_without_region_yields_no_observation() {
        let record = DetectionRecord {
            kind: AlertKind::Fire,
            confidence: 85,
            location: "Zone B - Equipment Room".to_string(),
            bounding_region: None,
            timestamp: "2025-04-07T16:18:43Z".to_string(),
        };
        assert_eq!(record.observation().unwrap(), None);
        // The alert side is unaffected by the missing region.
        assert!(record.to_alert().is_ok());
    }

    #[test]
    fn test_parse_feed_array() {
        let json = r#"[
            {"type": "fire", "confidence": 92, "location": "Zone A", "timestamp": "2025-04-08T10:45:32"},
            {"type": "smoke", "confidence": 78, "location": "Zone C", "timestamp": "2025-04-08T09:22:15"}
        ]"#;
        let records = parse_feed(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind, AlertKind::Smoke);
    }

    #[test]
    fn test_unknown_kind_rejected_without_corrupting_batch() {
        let json = r#"[{"type": "meteor", "confidence": 10, "location": "Zone X", "timestamp": "2025-04-08T10:45:32"}]"#;
        let err = parse_feed(json).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }
}
