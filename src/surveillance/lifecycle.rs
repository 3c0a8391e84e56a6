//! Alert state machine.
//!
//! `NEW → ACKNOWLEDGED → INVESTIGATING → {CONFIRMED_ADR | NOT_ADR | DISMISSED}`.
//! The first transition belongs to the acknowledgment gate; everything else
//! is here. Terminal states are irreversible.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use super::messages::MessageTemplates;
use super::types::SurveillanceError;
use crate::db::repository::{
    fmt_datetime, get_alert, list_active_alerts, mark_alert_escalated, mark_alert_resolved,
    record_provider_notification,
};
use crate::models::enums::AlertStatus;
use crate::models::{AdrAlert, AlertFilter, AlertOutcome, AlertScope, ProviderNotification};

/// Fetch an alert or fail with `NotFound`.
pub fn load_alert(conn: &Connection, alert_id: &Uuid) -> Result<AdrAlert, SurveillanceError> {
    get_alert(conn, alert_id)?.ok_or(SurveillanceError::NotFound {
        entity: "AdrAlert",
        id: *alert_id,
    })
}

/// Active alerts for a patient or facility, priority ordered.
pub fn active_alerts(
    conn: &Connection,
    scope: &AlertScope,
    filter: &AlertFilter,
) -> Result<Vec<AdrAlert>, SurveillanceError> {
    Ok(list_active_alerts(conn, scope, filter)?)
}

/// ACKNOWLEDGED → INVESTIGATING.
pub fn escalate_to_pharmacist(
    conn: &Connection,
    alert_id: &Uuid,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<AdrAlert, SurveillanceError> {
    let alert = load_alert(conn, alert_id)?;
    if alert.status != AlertStatus::Acknowledged {
        return Err(rejected(&alert, "escalate to pharmacist"));
    }

    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    if !mark_alert_escalated(conn, alert_id, notes, &now)? {
        // Status moved underneath us.
        let current = load_alert(conn, alert_id)?;
        return Err(rejected(&current, "escalate to pharmacist"));
    }

    tracing::info!(alert_id = %alert_id, "Alert escalated to pharmacist");
    load_alert(conn, alert_id)
}

/// Document provider contact. Never changes status.
pub fn notify_provider(
    conn: &Connection,
    alert_id: &Uuid,
    note: &ProviderNotification,
    now: NaiveDateTime,
) -> Result<AdrAlert, SurveillanceError> {
    if note.method.trim().is_empty() || note.provider_name.trim().is_empty() {
        return Err(SurveillanceError::Validation(
            "provider name and contact method are required".into(),
        ));
    }

    let alert = load_alert(conn, alert_id)?;
    if !alert.is_active() {
        return Err(rejected(&alert, "record provider notification"));
    }

    let response = note
        .provider_response
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let line = MessageTemplates::provider_contact(
        &fmt_datetime(&now),
        note.method.trim(),
        note.provider_name.trim(),
        response,
    );
    if !record_provider_notification(conn, alert_id, response, &line, &now)? {
        let current = load_alert(conn, alert_id)?;
        return Err(rejected(&current, "record provider notification"));
    }

    tracing::info!(alert_id = %alert_id, method = %note.method.trim(), "Provider notification recorded");
    load_alert(conn, alert_id)
}

/// Any active state → terminal. Outcome notes are required.
pub fn resolve(
    conn: &Connection,
    alert_id: &Uuid,
    outcome: AlertOutcome,
    outcome_notes: &str,
    action_taken: Option<&str>,
    resolver: &Uuid,
    now: NaiveDateTime,
) -> Result<AdrAlert, SurveillanceError> {
    let outcome_notes = outcome_notes.trim();
    if outcome_notes.is_empty() {
        return Err(SurveillanceError::Validation("outcome notes are required".into()));
    }

    let alert = load_alert(conn, alert_id)?;
    if alert.status.is_terminal() {
        return Err(rejected(&alert, "resolve"));
    }

    let action_taken = action_taken.map(str::trim).filter(|a| !a.is_empty());
    let status = outcome.status();
    if !mark_alert_resolved(conn, alert_id, status, resolver, outcome_notes, action_taken, &now)? {
        let current = load_alert(conn, alert_id)?;
        return Err(rejected(&current, "resolve"));
    }

    tracing::info!(
        alert_id = %alert_id,
        status = %status,
        resolver = %resolver,
        "Alert resolved"
    );
    load_alert(conn, alert_id)
}

pub(crate) fn rejected(alert: &AdrAlert, action: &'static str) -> SurveillanceError {
    tracing::warn!(alert_id = %alert.id, status = %alert.status, action, "Transition rejected");
    SurveillanceError::InvalidTransition {
        alert_id: alert.id,
        status: alert.status,
        action,
    }
}
