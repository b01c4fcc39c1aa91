//! Error types for the monitoring core.
//!
//! Errors are classified by blast radius:
//! - Per-observation: dropped at the batch boundary, logged, never fatal
//! - Per-request: returned to the caller, state unchanged
//! - Retryable: backing store unresponsive (only when persistence is wired in)

use thiserror::Error;

use crate::types::{AlertAction, AlertStatus};

/// Error types for core operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // Per-observation errors, swallowed at the batch boundary
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    // Per-request errors, returned to the caller
    #[error("invalid transition: alert {id} is {status:?}, cannot {action:?}")]
    InvalidTransition {
        id: u64,
        status: AlertStatus,
        action: AlertAction,
    },

    #[error("alert not found: {0}")]
    NotFound(u64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Retryable
    #[error("backing store timed out after {0} seconds")]
    Timeout(u64),
}

impl CoreError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Timeout(_))
    }

    /// Returns true if the error is confined to a single observation and
    /// must not abort the surrounding batch.
    pub fn is_observation_scoped(&self) -> bool {
        matches!(self, CoreError::InvalidObservation(_))
    }
}

/// Serializable error representation for presentation layers
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreErrorPayload {
    pub message: String,
    pub can_retry: bool,
}

impl From<&CoreError> for CoreErrorPayload {
    fn from(err: &CoreError) -> Self {
        CoreErrorPayload {
            message: err.to_string(),
            can_retry: err.is_retryable(),
        }
    }
}
