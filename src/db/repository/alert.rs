use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{
    fmt_date, fmt_datetime, from_json, from_opt_json, parse_datetime, parse_opt_date,
    parse_opt_datetime, parse_opt_uuid, parse_uuid, to_json,
};
use crate::db::DatabaseError;
use crate::models::enums::{AlertStatus, ConfidenceLevel, Likelihood, NotificationUrgency, Severity};
use crate::models::{AdrAlert, AlertFilter, AlertScope};

const ALERT_COLUMNS: &str = "id, patient_id, facility_id, medication_id, medication_name,
    observation_id, known_reaction_id, suspected_reaction, summary, confidence, severity,
    likelihood, matching_symptoms, matching_vital_signs, matching_behaviors, correlation_score,
    medication_start_date, days_since_start, expected_onset_match, risk_factors_present,
    nursing_actions, provider_actions, monitoring_recommendations,
    provider_notification_guidance, escalation_guidance, urgency, requires_immediate_action,
    is_hospice, hospice_guidance, status, acknowledged_by, acknowledged_at,
    pharmacist_consulted, pharmacist_consulted_at, pharmacist_notes, provider_notified,
    provider_notified_at, provider_response, investigation_notes, resolved_by, resolved_at,
    outcome_notes, action_taken, created_at";

/// Immediate-action first, then STAT / URGENT / ROUTINE, then newest.
const ALERT_PRIORITY_ORDER: &str = "requires_immediate_action DESC,
    CASE urgency WHEN 'STAT' THEN 0 WHEN 'URGENT' THEN 1 ELSE 2 END,
    created_at DESC, rowid DESC";

pub fn insert_alert(conn: &Connection, alert: &AdrAlert) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO adr_alerts
         (id, patient_id, facility_id, medication_id, medication_name, observation_id,
          known_reaction_id, suspected_reaction, summary, confidence, severity, likelihood,
          matching_symptoms, matching_vital_signs, matching_behaviors, correlation_score,
          medication_start_date, days_since_start, expected_onset_match, risk_factors_present,
          nursing_actions, provider_actions, monitoring_recommendations,
          provider_notification_guidance, escalation_guidance, urgency,
          requires_immediate_action, is_hospice, hospice_guidance, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31)",
        params![
            alert.id.to_string(),
            alert.patient_id.to_string(),
            alert.facility_id.to_string(),
            alert.medication_id.to_string(),
            alert.medication_name,
            alert.observation_id.to_string(),
            alert.known_reaction_id.to_string(),
            alert.suspected_reaction,
            alert.summary,
            alert.confidence.as_str(),
            alert.severity.as_str(),
            alert.likelihood.map(|l| l.as_str()),
            to_json(&alert.matching_symptoms)?,
            to_json(&alert.matching_vital_signs)?,
            to_json(&alert.matching_behaviors)?,
            alert.correlation_score,
            alert.medication_start_date.as_ref().map(fmt_date),
            alert.days_since_start,
            alert.expected_onset_match as i32,
            to_json(&alert.risk_factors_present)?,
            to_json(&alert.nursing_actions)?,
            to_json(&alert.provider_actions)?,
            alert.monitoring_recommendations,
            alert.provider_notification_guidance,
            alert.escalation_guidance,
            alert.urgency.as_str(),
            alert.requires_immediate_action as i32,
            alert.is_hospice as i32,
            alert.hospice_guidance.as_ref().map(to_json).transpose()?,
            alert.status.as_str(),
            fmt_datetime(&alert.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_alert(conn: &Connection, id: &Uuid) -> Result<Option<AdrAlert>, DatabaseError> {
    let sql = format!("SELECT {ALERT_COLUMNS} FROM adr_alerts WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_alert(row)?)),
        None => Ok(None),
    }
}

/// Alerts raised by one observation, in creation order.
pub fn list_alerts_for_observation(
    conn: &Connection,
    observation_id: &Uuid,
) -> Result<Vec<AdrAlert>, DatabaseError> {
    let sql = format!(
        "SELECT {ALERT_COLUMNS} FROM adr_alerts WHERE observation_id = ?1 ORDER BY rowid"
    );
    collect_alerts(conn, &sql, params![observation_id.to_string()])
}

/// Active alerts for a patient, in priority order.
pub fn list_active_alerts_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<AdrAlert>, DatabaseError> {
    list_active_alerts(conn, &AlertScope::Patient(*patient_id), &AlertFilter::default())
}

/// Active alerts in a scope, filtered and in priority order.
pub fn list_active_alerts(
    conn: &Connection,
    scope: &AlertScope,
    filter: &AlertFilter,
) -> Result<Vec<AdrAlert>, DatabaseError> {
    let (scope_column, scope_id) = match scope {
        AlertScope::Patient(id) => ("patient_id", id),
        AlertScope::Facility(id) => ("facility_id", id),
    };
    let sql = format!(
        "SELECT {ALERT_COLUMNS} FROM adr_alerts
         WHERE {scope_column} = ?1
           AND status IN ('NEW', 'ACKNOWLEDGED', 'INVESTIGATING')
           AND (?2 IS NULL OR severity = ?2)
           AND (?3 IS NULL OR confidence = ?3)
         ORDER BY {ALERT_PRIORITY_ORDER}"
    );
    collect_alerts(
        conn,
        &sql,
        params![
            scope_id.to_string(),
            filter.severity.map(|s| s.as_str()),
            filter.confidence.map(|c| c.as_str()),
        ],
    )
}

/// Write-once first-acknowledger transition. Returns whether this call
/// moved the alert out of NEW; later acknowledgments are no-ops.
pub fn mark_alert_acknowledged(
    conn: &Connection,
    id: &Uuid,
    staff_id: &Uuid,
    at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE adr_alerts SET status = 'ACKNOWLEDGED', acknowledged_by = ?2, acknowledged_at = ?3
         WHERE id = ?1 AND status = 'NEW'",
        params![id.to_string(), staff_id.to_string(), fmt_datetime(at)],
    )?;
    Ok(changed == 1)
}

/// ACKNOWLEDGED → INVESTIGATING. Returns false if the alert was not ACKNOWLEDGED.
pub fn mark_alert_escalated(
    conn: &Connection,
    id: &Uuid,
    notes: Option<&str>,
    at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE adr_alerts SET status = 'INVESTIGATING', pharmacist_consulted = 1,
                pharmacist_consulted_at = ?2, pharmacist_notes = ?3
         WHERE id = ?1 AND status = 'ACKNOWLEDGED'",
        params![id.to_string(), fmt_datetime(at), notes],
    )?;
    Ok(changed == 1)
}

/// Record provider contact on an active alert and append `note_line` to the
/// investigation notes. Returns false if the alert is not active.
pub fn record_provider_notification(
    conn: &Connection,
    id: &Uuid,
    response: Option<&str>,
    note_line: &str,
    at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE adr_alerts SET provider_notified = 1, provider_notified_at = ?2,
                provider_response = COALESCE(?3, provider_response),
                investigation_notes = CASE
                    WHEN investigation_notes IS NULL OR investigation_notes = '' THEN ?4
                    ELSE investigation_notes || char(10) || ?4 END
         WHERE id = ?1 AND status IN ('NEW', 'ACKNOWLEDGED', 'INVESTIGATING')",
        params![id.to_string(), fmt_datetime(at), response, note_line],
    )?;
    Ok(changed == 1)
}

/// Active → terminal. Returns false if the alert was already terminal.
pub fn mark_alert_resolved(
    conn: &Connection,
    id: &Uuid,
    status: AlertStatus,
    resolver: &Uuid,
    outcome_notes: &str,
    action_taken: Option<&str>,
    at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    if status.is_active() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "{status} is not a terminal status"
        )));
    }
    let changed = conn.execute(
        "UPDATE adr_alerts SET status = ?2, resolved_by = ?3, resolved_at = ?4,
                outcome_notes = ?5, action_taken = ?6
         WHERE id = ?1 AND status IN ('NEW', 'ACKNOWLEDGED', 'INVESTIGATING')",
        params![
            id.to_string(),
            status.as_str(),
            resolver.to_string(),
            fmt_datetime(at),
            outcome_notes,
            action_taken,
        ],
    )?;
    Ok(changed == 1)
}

fn collect_alerts(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<AdrAlert>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut alerts = Vec::new();
    while let Some(row) = rows.next()? {
        alerts.push(read_alert(row)?);
    }
    Ok(alerts)
}

fn read_alert(row: &Row<'_>) -> Result<AdrAlert, DatabaseError> {
    let confidence: String = row.get("confidence")?;
    let severity: String = row.get("severity")?;
    let likelihood: Option<String> = row.get("likelihood")?;
    let urgency: String = row.get("urgency")?;
    let status: String = row.get("status")?;

    Ok(AdrAlert {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        patient_id: parse_uuid(&row.get::<_, String>("patient_id")?)?,
        facility_id: parse_uuid(&row.get::<_, String>("facility_id")?)?,
        medication_id: parse_uuid(&row.get::<_, String>("medication_id")?)?,
        medication_name: row.get("medication_name")?,
        observation_id: parse_uuid(&row.get::<_, String>("observation_id")?)?,
        known_reaction_id: parse_uuid(&row.get::<_, String>("known_reaction_id")?)?,
        suspected_reaction: row.get("suspected_reaction")?,
        summary: row.get("summary")?,
        confidence: ConfidenceLevel::from_str(&confidence)?,
        severity: Severity::from_str(&severity)?,
        likelihood: likelihood.as_deref().map(Likelihood::from_str).transpose()?,
        matching_symptoms: from_json(&row.get::<_, String>("matching_symptoms")?)?,
        matching_vital_signs: from_json(&row.get::<_, String>("matching_vital_signs")?)?,
        matching_behaviors: from_json(&row.get::<_, String>("matching_behaviors")?)?,
        correlation_score: row.get("correlation_score")?,
        medication_start_date: parse_opt_date(row.get("medication_start_date")?)?,
        days_since_start: row.get("days_since_start")?,
        expected_onset_match: row.get::<_, i32>("expected_onset_match")? != 0,
        risk_factors_present: from_json(&row.get::<_, String>("risk_factors_present")?)?,
        nursing_actions: from_json(&row.get::<_, String>("nursing_actions")?)?,
        provider_actions: from_json(&row.get::<_, String>("provider_actions")?)?,
        monitoring_recommendations: row.get("monitoring_recommendations")?,
        provider_notification_guidance: row.get("provider_notification_guidance")?,
        escalation_guidance: row.get("escalation_guidance")?,
        urgency: NotificationUrgency::from_str(&urgency)?,
        requires_immediate_action: row.get::<_, i32>("requires_immediate_action")? != 0,
        is_hospice: row.get::<_, i32>("is_hospice")? != 0,
        hospice_guidance: from_opt_json(row.get("hospice_guidance")?)?,
        status: AlertStatus::from_str(&status)?,
        acknowledged_by: parse_opt_uuid(row.get("acknowledged_by")?)?,
        acknowledged_at: parse_opt_datetime(row.get("acknowledged_at")?)?,
        pharmacist_consulted: row.get::<_, i32>("pharmacist_consulted")? != 0,
        pharmacist_consulted_at: parse_opt_datetime(row.get("pharmacist_consulted_at")?)?,
        pharmacist_notes: row.get("pharmacist_notes")?,
        provider_notified: row.get::<_, i32>("provider_notified")? != 0,
        provider_notified_at: parse_opt_datetime(row.get("provider_notified_at")?)?,
        provider_response: row.get("provider_response")?,
        investigation_notes: row.get("investigation_notes")?,
        resolved_by: parse_opt_uuid(row.get("resolved_by")?)?,
        resolved_at: parse_opt_datetime(row.get("resolved_at")?)?,
        outcome_notes: row.get("outcome_notes")?,
        action_taken: row.get("action_taken")?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?)?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::repository::test_support::{seed_medication, seed_patient};
    use crate::db::repository::{insert_known_reaction, insert_observation};
    use crate::models::alert::fixtures::sample_alert;
    use crate::models::enums::ObservationType;
    use crate::models::{KnownAdverseReactionSeed, Observation};

    /// Insert an alert plus the patient, medication, observation and
    /// knowledge rows it references.
    pub fn seed_alert(conn: &Connection, created_at: NaiveDateTime) -> AdrAlert {
        let patient = seed_patient(conn, None, false);
        let med = seed_medication(conn, patient.id, "Digoxin", None);
        seed_alert_for(conn, patient.id, patient.facility_id, med.id, created_at)
    }

    pub fn seed_alert_for(
        conn: &Connection,
        patient_id: Uuid,
        facility_id: Uuid,
        medication_id: Uuid,
        created_at: NaiveDateTime,
    ) -> AdrAlert {
        let reaction: KnownAdverseReactionSeed = serde_json::from_value(serde_json::json!({
            "medication_name": "Digoxin",
            "reaction_name": "Digoxin toxicity",
            "severity": "MAJOR"
        }))
        .unwrap();
        let reaction = reaction.into_reaction(Uuid::new_v4(), created_at);
        insert_known_reaction(conn, &reaction).unwrap();

        let obs = Observation {
            id: Uuid::new_v4(),
            patient_id,
            facility_id,
            author_id: Uuid::new_v4(),
            observation_type: ObservationType::Symptom,
            category: None,
            text: "nauseated".into(),
            standardized_terms: vec!["nausea".into()],
            severity_rating: None,
            patient_reported: true,
            vital_signs: None,
            observed_at: created_at,
            created_at,
            surveillance_performed: true,
            potential_adr_detected: true,
        };
        insert_observation(conn, &obs).unwrap();

        let mut alert = sample_alert(created_at);
        alert.patient_id = patient_id;
        alert.facility_id = facility_id;
        alert.medication_id = medication_id;
        alert.observation_id = obs.id;
        alert.known_reaction_id = reaction.id;
        insert_alert(conn, &alert).unwrap();
        alert
    }
}
