//! Per-staff, time-bounded acknowledgment gate.
//!
//! Each staff member must hold a valid acknowledgment for every active alert
//! on a patient before recording a dose. A HOLD_MEDICATION acknowledgment
//! blocks the alert's medication for that staff member until the alert is
//! resolved.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::lifecycle::{load_alert, rejected};
use super::types::{BlockReason, BlockingAlert, GateDecision, HeldMedication, SurveillanceError};
use crate::clock::whole_seconds;
use crate::db::repository::{
    get_medication, get_patient, insert_acknowledgment, latest_acknowledgment, latest_hold,
    list_acknowledgments, list_active_alerts_for_patient, mark_alert_acknowledged,
};
use crate::models::enums::AcknowledgmentAction;
use crate::models::{AcknowledgmentRequest, AdrAlert, AlertAcknowledgment};

/// Rejects incomplete requests before anything is looked up.
pub fn validate_request(request: &AcknowledgmentRequest) -> Result<(), SurveillanceError> {
    if !request.verifications.all_verified() {
        return Err(SurveillanceError::Validation(
            "all three safety verifications must be confirmed".into(),
        ));
    }
    if request.action == AcknowledgmentAction::HoldMedication {
        let Some(hold) = &request.hold else {
            return Err(SurveillanceError::Validation("hold details are required".into()));
        };
        if hold.reason.trim().is_empty() {
            return Err(SurveillanceError::Validation("hold reason is required".into()));
        }
        if hold.provider_notified.is_none() {
            return Err(SurveillanceError::Validation(
                "provider notification status is required for a hold".into(),
            ));
        }
    }
    Ok(())
}

/// Record a staff acknowledgment of an alert.
///
/// Returns the existing record unchanged when the staff member already holds
/// a valid one. Otherwise appends a new record expiring `validity_hours`
/// later and moves a NEW alert to ACKNOWLEDGED, in one transaction.
pub fn record_acknowledgment(
    conn: &Connection,
    alert_id: &Uuid,
    staff_id: &Uuid,
    request: &AcknowledgmentRequest,
    now: NaiveDateTime,
    validity_hours: i64,
) -> Result<AlertAcknowledgment, SurveillanceError> {
    validate_request(request)?;
    let now = whole_seconds(now);
    let expires_at = acknowledgment_expiry(now, validity_hours)?;

    let alert = load_alert(conn, alert_id)?;
    if alert.status.is_terminal() {
        return Err(rejected(&alert, "acknowledge"));
    }

    if let Some(existing) = latest_acknowledgment(conn, alert_id, staff_id)? {
        if existing.is_valid(now) {
            if request.action == AcknowledgmentAction::HoldMedication && !existing.is_hold() {
                tracing::warn!(
                    alert_id = %alert_id,
                    staff_id = %staff_id,
                    expires_at = %existing.expires_at,
                    "Hold not recorded: staff member already holds a valid acknowledgment"
                );
            }
            tracing::debug!(
                alert_id = %alert_id,
                staff_id = %staff_id,
                expires_at = %existing.expires_at,
                "Valid acknowledgment already on file"
            );
            return Ok(existing);
        }
    }

    let hold = match request.action {
        AcknowledgmentAction::HoldMedication => request.hold.as_ref(),
        AcknowledgmentAction::Acknowledged => None,
    };
    let provider_notified = hold.and_then(|h| h.provider_notified).unwrap_or(false);

    let ack = AlertAcknowledgment {
        id: Uuid::new_v4(),
        alert_id: *alert_id,
        staff_id: *staff_id,
        action: request.action,
        verifications: request.verifications,
        notes: trimmed(request.notes.as_deref()),
        monitoring_plan: trimmed(request.monitoring_plan.as_deref()),
        hold_reason: hold.map(|h| h.reason.trim().to_string()),
        hold_duration: hold.and_then(|h| trimmed(h.duration.as_deref())),
        provider_notified,
        provider_notified_at: provider_notified.then_some(now),
        hold_order_obtained: hold.is_some_and(|h| h.hold_order_obtained),
        acknowledged_at: now,
        expires_at,
    };

    let tx = conn.unchecked_transaction()?;
    insert_acknowledgment(&tx, &ack)?;
    let first = mark_alert_acknowledged(&tx, alert_id, staff_id, &now)?;
    tx.commit()?;

    tracing::info!(
        alert_id = %alert_id,
        staff_id = %staff_id,
        action = %ack.action,
        first_acknowledgment = first,
        expires_at = %ack.expires_at,
        "Alert acknowledged"
    );
    Ok(ack)
}

/// `now + validity_hours`, rejecting non-positive or out-of-range windows.
pub fn acknowledgment_expiry(now: NaiveDateTime, validity_hours: i64) -> Result<NaiveDateTime, SurveillanceError> {
    if validity_hours <= 0 {
        return Err(SurveillanceError::Validation(format!(
            "acknowledgment validity must be positive, got {validity_hours}h"
        )));
    }
    Duration::try_hours(validity_hours)
        .and_then(|validity| now.checked_add_signed(validity))
        .ok_or_else(|| {
            SurveillanceError::Validation(format!("acknowledgment validity of {validity_hours}h is out of range"))
        })
}

/// Decide whether `staff_id` may administer `medication_id` to `patient_id`.
pub fn check_can_administer(
    conn: &Connection,
    patient_id: &Uuid,
    staff_id: &Uuid,
    medication_id: &Uuid,
    now: NaiveDateTime,
) -> Result<GateDecision, SurveillanceError> {
    let now = whole_seconds(now);
    if get_patient(conn, patient_id)?.is_none() {
        return Err(SurveillanceError::NotFound { entity: "Patient", id: *patient_id });
    }
    let medication = get_medication(conn, medication_id)?.ok_or(SurveillanceError::NotFound {
        entity: "Medication",
        id: *medication_id,
    })?;
    if medication.patient_id != *patient_id {
        return Err(SurveillanceError::Validation(format!(
            "medication {medication_id} does not belong to patient {patient_id}"
        )));
    }

    let mut blocking = Vec::new();
    let mut held = Vec::new();

    for alert in list_active_alerts_for_patient(conn, patient_id)? {
        match latest_acknowledgment(conn, &alert.id, staff_id)? {
            None => blocking.push(blocking_alert(&alert, BlockReason::Unacknowledged)),
            Some(ack) if !ack.is_valid(now) => blocking.push(blocking_alert(&alert, BlockReason::Expired)),
            Some(_) => {}
        }

        if alert.medication_id == *medication_id {
            if let Some(hold) = latest_hold(conn, &alert.id, staff_id)? {
                held.push(HeldMedication {
                    alert_id: alert.id,
                    medication_id: alert.medication_id,
                    medication_name: alert.medication_name.clone(),
                    suspected_reaction: alert.suspected_reaction.clone(),
                    hold_reason: hold.hold_reason,
                    hold_duration: hold.hold_duration,
                    provider_notified: hold.provider_notified,
                });
            }
        }
    }

    let decision = GateDecision::from_findings(blocking, held);
    if decision.allowed {
        tracing::debug!(patient_id = %patient_id, staff_id = %staff_id, "Administration allowed");
    } else {
        tracing::warn!(
            patient_id = %patient_id,
            staff_id = %staff_id,
            medication_id = %medication_id,
            blocking = decision.blocking_alerts.len(),
            held = decision.held_medications.len(),
            "Administration blocked"
        );
    }
    Ok(decision)
}

/// Every acknowledgment of an alert, newest first.
pub fn acknowledgment_history(
    conn: &Connection,
    alert_id: &Uuid,
) -> Result<Vec<AlertAcknowledgment>, SurveillanceError> {
    load_alert(conn, alert_id)?;
    Ok(list_acknowledgments(conn, alert_id)?)
}

fn blocking_alert(alert: &AdrAlert, reason: BlockReason) -> BlockingAlert {
    BlockingAlert {
        alert_id: alert.id,
        reason,
        medication_name: alert.medication_name.clone(),
        suspected_reaction: alert.suspected_reaction.clone(),
        severity: alert.severity,
        confidence: alert.confidence,
        urgency: alert.urgency,
        status: alert.status,
    }
}

fn trimmed(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}
