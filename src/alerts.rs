//! Alert store and lifecycle.
//!
//! Holds detection alerts, applies operator lifecycle transitions, and
//! answers filtered queries and aggregate counts. All reads and writes go
//! through one lock, so `query` and `summary` see the same snapshot and a
//! transition is checked and applied atomically per record: two
//! conflicting transitions on the same id cannot both succeed.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::CoreError;
use crate::types::{AlertAction, AlertFilter, AlertKind, AlertRecord, AlertStatus, AlertSummary};

/// Detector output accepted by `ingest`, before an id and status exist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDetection {
    pub kind: AlertKind,
    pub confidence: u8,
    pub location: String,
    pub detected_at: DateTime<Utc>,
}

struct StoreInner {
    next_id: u64,
    records: Vec<AlertRecord>,
}

/// In-memory alert store. One per monitored deployment.
pub struct AlertStore {
    inner: Mutex<StoreInner>,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                next_id: 1,
                records: Vec::new(),
            }),
        }
    }

    /// Store a detection as a new alert with the next monotonic id.
    ///
    /// Initial status follows the canonical severity policy: fire is always
    /// `Critical`, smoke is always `Warning`, regardless of confidence.
    pub fn ingest(&self, detection: NewDetection) -> Result<AlertRecord, CoreError> {
        if detection.confidence > 100 {
            return Err(CoreError::InvalidObservation(format!(
                "confidence {} outside [0, 100]",
                detection.confidence
            )));
        }

        let status = match detection.kind {
            AlertKind::Fire => AlertStatus::Critical,
            AlertKind::Smoke => AlertStatus::Warning,
        };

        let mut inner = self.inner.lock();
        let record = AlertRecord {
            id: inner.next_id,
            kind: detection.kind,
            confidence: detection.confidence,
            location: detection.location,
            detected_at: detection.detected_at,
            status,
        };
        inner.next_id += 1;
        inner.records.push(record.clone());

        log::info!(
            "alert {} ingested: {:?} at '{}' ({}% confidence) -> {:?}",
            record.id,
            record.kind,
            record.location,
            record.confidence,
            record.status
        );
        Ok(record)
    }

    /// Apply an operator action to an alert.
    ///
    /// `Acknowledge`/`Escalate` are valid only from `{Critical, Warning}`;
    /// `Close` is valid from any non-terminal status. An illegal move fails
    /// with `InvalidTransition` and leaves the record unchanged.
    pub fn transition(&self, id: u64, action: AlertAction) -> Result<AlertRecord, CoreError> {
        let mut inner = self.inner.lock();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CoreError::NotFound(id))?;

        let next = next_status(record.status, action).ok_or(CoreError::InvalidTransition {
            id,
            status: record.status,
            action,
        })?;

        record.status = next;
        let updated = record.clone();
        log::info!("alert {} -> {:?} via {:?}", id, updated.status, action);
        Ok(updated)
    }

    /// Records matching the filter, most recent first; ties broken by id
    /// descending. Pure; stored state is untouched.
    pub fn query(&self, filter: AlertFilter) -> Vec<AlertRecord> {
        let inner = self.inner.lock();
        let mut matched: Vec<AlertRecord> = inner
            .records
            .iter()
            .filter(|r| filter.matches(r.kind))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.detected_at
                .cmp(&a.detected_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matched
    }

    /// Counts over the same snapshot `query` sees.
    pub fn summary(&self) -> AlertSummary {
        let inner = self.inner.lock();
        AlertSummary {
            total: inner.records.len(),
            critical: inner
                .records
                .iter()
                .filter(|r| r.status == AlertStatus::Critical)
                .count(),
            warning: inner
                .records
                .iter()
                .filter(|r| r.status == AlertStatus::Warning)
                .count(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The lifecycle state machine. `None` marks an illegal move.
fn next_status(status: AlertStatus, action: AlertAction) -> Option<AlertStatus> {
    match (action, status) {
        (AlertAction::Acknowledge, AlertStatus::Critical | AlertStatus::Warning) => {
            Some(AlertStatus::Acknowledged)
        }
        (AlertAction::Escalate, AlertStatus::Critical | AlertStatus::Warning) => {
            Some(AlertStatus::Escalated)
        }
        (AlertAction::Close, status) if !status.is_terminal() => Some(AlertStatus::Closed),
        _ => None,
    }
}
