use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AlertStatus, ConfidenceLevel, NotificationUrgency, Severity};

// ---------------------------------------------------------------------------
// Gate decision
// ---------------------------------------------------------------------------

/// Why an alert is blocking administration for a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    /// The staff member has never acknowledged this alert.
    Unacknowledged,
    /// The latest acknowledgment has expired or is missing a verification.
    Expired,
}

/// An active alert the staff member must acknowledge before administering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingAlert {
    pub alert_id: Uuid,
    pub reason: BlockReason,
    pub medication_name: String,
    pub suspected_reaction: String,
    pub severity: Severity,
    pub confidence: ConfidenceLevel,
    pub urgency: NotificationUrgency,
    pub status: AlertStatus,
}

/// A medication this staff member placed on hold through an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldMedication {
    pub alert_id: Uuid,
    pub medication_id: Uuid,
    pub medication_name: String,
    pub suspected_reaction: String,
    pub hold_reason: Option<String>,
    pub hold_duration: Option<String>,
    pub provider_notified: bool,
}

/// Result of the pre-administration check. A refusal is a normal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub blocking_alerts: Vec<BlockingAlert>,
    pub held_medications: Vec<HeldMedication>,
}

impl GateDecision {
    pub fn from_findings(blocking_alerts: Vec<BlockingAlert>, held_medications: Vec<HeldMedication>) -> Self {
        Self {
            allowed: blocking_alerts.is_empty() && held_medications.is_empty(),
            blocking_alerts,
            held_medications,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch sweep
// ---------------------------------------------------------------------------

/// Returned by `batch_surveillance`; mirrors the persisted run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub patients_screened: u32,
    pub observations_analyzed: u32,
    pub alerts_generated: u32,
    pub high_severity_alerts: u32,
    pub immediate_action_alerts: u32,
    pub execution_time_ms: u64,
}

// ---------------------------------------------------------------------------
// SurveillanceError
// ---------------------------------------------------------------------------

/// Coarse error taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    InvalidTransition,
    Internal,
}

#[derive(Error, Debug)]
pub enum SurveillanceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Alert {alert_id} is {status}; cannot {action}")]
    InvalidTransition {
        alert_id: Uuid,
        status: AlertStatus,
        action: &'static str,
    },

    #[error("No staff member is signed in")]
    NoCurrentStaff,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl SurveillanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::NoCurrentStaff => ErrorKind::ValidationError,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Database(DatabaseError::NotFound { .. }) => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Database(_)
            | Self::ReferenceDataLoad(..)
            | Self::ReferenceDataParse(..)
            | Self::LockPoisoned => ErrorKind::Internal,
        }
    }
}

impl From<rusqlite::Error> for SurveillanceError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}
