use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AlertStatus, ConfidenceLevel, Likelihood, NotificationUrgency, Severity};
use super::knowledge::RiskFactor;

/// A potential adverse drug reaction raised by the correlation engine.
///
/// Everything shown to staff is copied from the knowledge-base entry at
/// creation, so a later edit or retirement of that entry never changes
/// historical alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdrAlert {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub facility_id: Uuid,
    pub medication_id: Uuid,
    pub medication_name: String,
    pub observation_id: Uuid,
    pub known_reaction_id: Uuid,

    pub suspected_reaction: String,
    pub summary: String,
    pub confidence: ConfidenceLevel,
    pub severity: Severity,
    pub likelihood: Option<Likelihood>,
    pub matching_symptoms: Vec<String>,
    pub matching_vital_signs: Vec<String>,
    pub matching_behaviors: Vec<String>,
    pub correlation_score: f64,

    pub medication_start_date: Option<NaiveDate>,
    pub days_since_start: Option<i64>,
    pub expected_onset_match: bool,
    pub risk_factors_present: Vec<RiskFactor>,

    pub nursing_actions: Vec<String>,
    pub provider_actions: Vec<String>,
    pub monitoring_recommendations: Option<String>,
    pub provider_notification_guidance: Option<String>,
    pub escalation_guidance: Option<String>,

    pub urgency: NotificationUrgency,
    pub requires_immediate_action: bool,
    pub is_hospice: bool,
    pub hospice_guidance: Option<Vec<String>>,

    pub status: AlertStatus,
    pub acknowledged_by: Option<Uuid>,
    pub acknowledged_at: Option<NaiveDateTime>,
    pub pharmacist_consulted: bool,
    pub pharmacist_consulted_at: Option<NaiveDateTime>,
    pub pharmacist_notes: Option<String>,
    pub provider_notified: bool,
    pub provider_notified_at: Option<NaiveDateTime>,
    pub provider_response: Option<String>,
    pub investigation_notes: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<NaiveDateTime>,
    pub outcome_notes: Option<String>,
    pub action_taken: Option<String>,
    pub created_at: NaiveDateTime,
}

impl AdrAlert {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Hours from creation to the first acknowledgment.
    pub fn response_time_hours(&self) -> Option<f64> {
        self.acknowledged_at.map(|at| hours_between(self.created_at, at))
    }

    /// Hours from creation to resolution.
    pub fn resolution_time_hours(&self) -> Option<f64> {
        self.resolved_at.map(|at| hours_between(self.created_at, at))
    }
}

fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

/// Terminal outcome recorded when an alert is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertOutcome {
    ConfirmedAdr,
    NotAdr,
    Dismissed,
}

impl AlertOutcome {
    pub fn status(&self) -> AlertStatus {
        match self {
            AlertOutcome::ConfirmedAdr => AlertStatus::ConfirmedAdr,
            AlertOutcome::NotAdr => AlertStatus::NotAdr,
            AlertOutcome::Dismissed => AlertStatus::Dismissed,
        }
    }
}

/// Provider contact documented against an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderNotification {
    /// Phone, fax, in person, EHR message.
    pub method: String,
    pub provider_name: String,
    #[serde(default)]
    pub provider_response: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_alert(created_at: NaiveDateTime) -> AdrAlert {
        AdrAlert {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            facility_id: Uuid::new_v4(),
            medication_id: Uuid::new_v4(),
            medication_name: "Digoxin".into(),
            observation_id: Uuid::new_v4(),
            known_reaction_id: Uuid::new_v4(),
            suspected_reaction: "Digoxin toxicity".into(),
            summary: "Possible digoxin toxicity".into(),
            confidence: ConfidenceLevel::High,
            severity: Severity::Major,
            likelihood: Some(Likelihood::Common),
            matching_symptoms: vec!["nausea".into()],
            matching_vital_signs: vec![],
            matching_behaviors: vec![],
            correlation_score: 0.6,
            medication_start_date: None,
            days_since_start: None,
            expected_onset_match: false,
            risk_factors_present: vec![],
            nursing_actions: vec![],
            provider_actions: vec![],
            monitoring_recommendations: None,
            provider_notification_guidance: None,
            escalation_guidance: None,
            urgency: NotificationUrgency::Urgent,
            requires_immediate_action: true,
            is_hospice: false,
            hospice_guidance: None,
            status: AlertStatus::New,
            acknowledged_by: None,
            acknowledged_at: None,
            pharmacist_consulted: false,
            pharmacist_consulted_at: None,
            pharmacist_notes: None,
            provider_notified: false,
            provider_notified_at: None,
            provider_response: None,
            investigation_notes: None,
            resolved_by: None,
            resolved_at: None,
            outcome_notes: None,
            action_taken: None,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_alert;
    use super::*;
    use chrono::Duration;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn response_and_resolution_times() {
        let mut alert = sample_alert(t0());
        assert!(alert.response_time_hours().is_none());

        alert.acknowledged_at = Some(t0() + Duration::minutes(90));
        alert.resolved_at = Some(t0() + Duration::hours(26));
        assert!((alert.response_time_hours().unwrap() - 1.5).abs() < 1e-9);
        assert!((alert.resolution_time_hours().unwrap() - 26.0).abs() < 1e-9);
    }

    #[test]
    fn outcome_maps_to_terminal_status() {
        for outcome in [AlertOutcome::ConfirmedAdr, AlertOutcome::NotAdr, AlertOutcome::Dismissed] {
            assert!(outcome.status().is_terminal());
        }
    }
}
