use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AcknowledgmentAction;

/// The three attestations staff must make before an acknowledgment counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerifications {
    pub reaction_awareness: bool,
    pub monitoring_parameters: bool,
    pub escalation_criteria: bool,
}

impl SafetyVerifications {
    pub fn all() -> Self {
        Self {
            reaction_awareness: true,
            monitoring_parameters: true,
            escalation_criteria: true,
        }
    }

    pub fn all_verified(&self) -> bool {
        self.reaction_awareness && self.monitoring_parameters && self.escalation_criteria
    }
}

/// Justification attached to a HOLD_MEDICATION acknowledgment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldDetails {
    pub reason: String,
    #[serde(default)]
    pub duration: Option<String>,
    /// Must be stated explicitly, true or false.
    pub provider_notified: Option<bool>,
    #[serde(default)]
    pub hold_order_obtained: bool,
}

/// Payload submitted by staff when acknowledging an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgmentRequest {
    pub action: AcknowledgmentAction,
    pub verifications: SafetyVerifications,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub monitoring_plan: Option<String>,
    #[serde(default)]
    pub hold: Option<HoldDetails>,
}

impl AcknowledgmentRequest {
    pub fn acknowledge(verifications: SafetyVerifications) -> Self {
        Self {
            action: AcknowledgmentAction::Acknowledged,
            verifications,
            notes: None,
            monitoring_plan: None,
            hold: None,
        }
    }

    pub fn hold(verifications: SafetyVerifications, hold: HoldDetails) -> Self {
        Self {
            action: AcknowledgmentAction::HoldMedication,
            verifications,
            notes: None,
            monitoring_plan: None,
            hold: Some(hold),
        }
    }
}

/// Append-only record of one staff member acknowledging one alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertAcknowledgment {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub staff_id: Uuid,
    pub action: AcknowledgmentAction,
    pub verifications: SafetyVerifications,
    pub notes: Option<String>,
    pub monitoring_plan: Option<String>,
    pub hold_reason: Option<String>,
    pub hold_duration: Option<String>,
    pub provider_notified: bool,
    pub provider_notified_at: Option<NaiveDateTime>,
    pub hold_order_obtained: bool,
    pub acknowledged_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl AlertAcknowledgment {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now > self.expires_at
    }

    pub fn is_valid(&self, now: NaiveDateTime) -> bool {
        !self.is_expired(now) && self.verifications.all_verified()
    }

    pub fn is_hold(&self) -> bool {
        self.action == AcknowledgmentAction::HoldMedication
    }
}
