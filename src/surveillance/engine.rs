//! Observation intake and correlation runs.
//!
//! An observation is scored against every active medication of its patient.
//! Alerts and the surveyed flag are written in one transaction.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::classify::{classify_urgency, split_interventions};
use super::correlation::{correlate, reaction_applies_to, Correlation};
use super::hospice::comfort_guidance;
use super::messages::MessageTemplates;
use super::types::{BatchSummary, SurveillanceError};
use crate::clock::whole_seconds;
use crate::config::SurveillanceConfig;
use crate::db::repository::{
    get_active_medications, get_observation, get_patient, insert_alert, insert_observation,
    insert_surveillance_run, list_alerts_for_observation, list_current_reactions,
    list_unsurveyed_observations, mark_observation_surveyed,
};
use crate::models::enums::{AlertStatus, RunType};
use crate::models::{
    normalize_terms, AdrAlert, KnownAdverseReaction, Medication, NewObservation, Observation,
    Patient, SurveillanceRun,
};

/// Validate and store a staff observation. Surveillance is not run here.
pub fn store_observation(
    conn: &Connection,
    new: &NewObservation,
    now: NaiveDateTime,
) -> Result<Observation, SurveillanceError> {
    let now = whole_seconds(now);
    if new.text.trim().is_empty() {
        return Err(SurveillanceError::Validation("observation text is required".into()));
    }
    if let Some(rating) = new.severity_rating {
        if !(1..=10).contains(&rating) {
            return Err(SurveillanceError::Validation(format!(
                "severity rating must be 1-10, got {rating}"
            )));
        }
    }

    let patient = get_patient(conn, &new.patient_id)?.ok_or(SurveillanceError::NotFound {
        entity: "Patient",
        id: new.patient_id,
    })?;

    let observation = Observation {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        facility_id: patient.facility_id,
        author_id: new.author_id,
        observation_type: new.observation_type,
        category: new.category.clone(),
        text: new.text.trim().to_string(),
        standardized_terms: normalize_terms(&new.standardized_terms),
        severity_rating: new.severity_rating,
        patient_reported: new.patient_reported,
        vital_signs: new.vital_signs.clone(),
        observed_at: new.observed_at.map(whole_seconds).unwrap_or(now),
        created_at: now,
        surveillance_performed: false,
        potential_adr_detected: false,
    };
    insert_observation(conn, &observation)?;

    tracing::info!(
        observation_id = %observation.id,
        patient_id = %observation.patient_id,
        observation_type = %observation.observation_type,
        terms = observation.standardized_terms.len(),
        "Observation recorded"
    );
    Ok(observation)
}

/// Correlate one observation against the patient's active medications.
///
/// Runs in a single transaction. An observation that was already surveyed
/// is not scored again; its existing alerts are returned.
pub fn evaluate_observation(
    conn: &Connection,
    observation_id: &Uuid,
    now: NaiveDateTime,
    config: &SurveillanceConfig,
) -> Result<Vec<AdrAlert>, SurveillanceError> {
    let start = Instant::now();
    let now = whole_seconds(now);

    let observation = get_observation(conn, observation_id)?.ok_or(SurveillanceError::NotFound {
        entity: "Observation",
        id: *observation_id,
    })?;

    if observation.surveillance_performed {
        tracing::debug!(observation_id = %observation_id, "Observation already surveyed");
        return Ok(list_alerts_for_observation(conn, observation_id)?);
    }

    let tx = conn.unchecked_transaction()?;

    let patient = get_patient(&tx, &observation.patient_id)?.ok_or(SurveillanceError::NotFound {
        entity: "Patient",
        id: observation.patient_id,
    })?;
    let medications = get_active_medications(&tx, &patient.id)?;
    let reactions = if medications.is_empty() {
        Vec::new()
    } else {
        list_current_reactions(&tx)?
    };

    let mut alerts = Vec::new();
    for medication in &medications {
        for reaction in reactions.iter().filter(|r| reaction_applies_to(r, medication)) {
            let Some(correlation) =
                correlate(&observation, medication, reaction, &patient, config.elderly_age_years)
            else {
                continue;
            };
            let alert = build_alert(&observation, &patient, medication, reaction, correlation, now);
            insert_alert(&tx, &alert)?;
            alerts.push(alert);
        }
    }

    mark_observation_surveyed(&tx, &observation.id, !alerts.is_empty())?;
    tx.commit()?;

    tracing::info!(
        observation_id = %observation.id,
        patient_id = %patient.id,
        medications = medications.len(),
        alerts = alerts.len(),
        processing_ms = start.elapsed().as_millis() as u64,
        "Surveillance complete"
    );

    Ok(alerts)
}

/// Assemble an alert, copying every displayed field from the knowledge entry.
pub fn build_alert(
    observation: &Observation,
    patient: &Patient,
    medication: &Medication,
    reaction: &KnownAdverseReaction,
    correlation: Correlation,
    now: NaiveDateTime,
) -> AdrAlert {
    let comfort = patient.is_comfort_focused();
    let urgency = classify_urgency(reaction.severity, correlation.score, comfort);
    let actions = split_interventions(&reaction.suggested_interventions);
    let hospice_guidance = comfort.then(|| comfort_guidance(&correlation.matching_symptoms));
    let summary = MessageTemplates::alert_summary(
        patient,
        medication,
        reaction,
        &correlation.matching_symptoms,
        &correlation.matching_vital_signs,
        &correlation.matching_behaviors,
    );

    AdrAlert {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        facility_id: observation.facility_id,
        medication_id: medication.id,
        medication_name: medication.name.clone(),
        observation_id: observation.id,
        known_reaction_id: reaction.id,
        suspected_reaction: reaction.reaction_name.clone(),
        summary,
        confidence: correlation.confidence,
        severity: reaction.severity,
        likelihood: reaction.likelihood,
        matching_symptoms: correlation.matching_symptoms,
        matching_vital_signs: correlation.matching_vital_signs,
        matching_behaviors: correlation.matching_behaviors,
        correlation_score: correlation.score,
        medication_start_date: medication.start_date,
        days_since_start: correlation.days_since_start,
        expected_onset_match: correlation.expected_onset_match,
        risk_factors_present: correlation.risk_factors_present,
        nursing_actions: actions.nursing,
        provider_actions: actions.provider,
        monitoring_recommendations: reaction.monitoring_recommendations.clone(),
        provider_notification_guidance: reaction.provider_notification_guidance.clone(),
        escalation_guidance: reaction.escalation_guidance.clone(),
        urgency: urgency.urgency,
        requires_immediate_action: urgency.requires_immediate_action,
        is_hospice: comfort,
        hospice_guidance,
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
        created_at: now,
    }
}

/// Sweep recent observations that missed real-time surveillance and record
/// a run summary. One failing observation does not stop the sweep; it stays
/// unsurveyed for the next run.
pub fn batch_surveillance(
    conn: &Connection,
    facility_id: Option<&Uuid>,
    lookback_hours: i64,
    now: NaiveDateTime,
    config: &SurveillanceConfig,
) -> Result<BatchSummary, SurveillanceError> {
    if lookback_hours <= 0 {
        return Err(SurveillanceError::Validation(format!(
            "lookback must be positive, got {lookback_hours}h"
        )));
    }
    let now = whole_seconds(now);
    let since = Duration::try_hours(lookback_hours)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .ok_or_else(|| SurveillanceError::Validation(format!("lookback of {lookback_hours}h is out of range")))?;
    let start = Instant::now();
    let pending = list_unsurveyed_observations(conn, &since, facility_id)?;

    let patients: HashSet<Uuid> = pending.iter().map(|o| o.patient_id).collect();
    let mut alerts_generated = 0u32;
    let mut high_severity_alerts = 0u32;
    let mut immediate_action_alerts = 0u32;

    for observation in &pending {
        match evaluate_observation(conn, &observation.id, now, config) {
            Ok(alerts) => {
                alerts_generated += alerts.len() as u32;
                high_severity_alerts += alerts.iter().filter(|a| a.severity.is_high()).count() as u32;
                immediate_action_alerts +=
                    alerts.iter().filter(|a| a.requires_immediate_action).count() as u32;
            }
            Err(e) => {
                tracing::warn!(observation_id = %observation.id, error = %e, "Surveillance failed; will retry");
            }
        }
    }

    let run = SurveillanceRun {
        id: Uuid::new_v4(),
        run_type: RunType::Batch,
        facility_id: facility_id.copied(),
        patients_screened: patients.len() as u32,
        observations_analyzed: pending.len() as u32,
        alerts_generated,
        high_severity_alerts,
        immediate_action_alerts,
        execution_time_ms: start.elapsed().as_millis() as u64,
        created_at: now,
    };
    insert_surveillance_run(conn, &run)?;

    tracing::info!(
        run_id = %run.id,
        observations = run.observations_analyzed,
        patients = run.patients_screened,
        alerts = run.alerts_generated,
        high_severity = run.high_severity_alerts,
        immediate = run.immediate_action_alerts,
        "Batch surveillance complete"
    );

    Ok(BatchSummary {
        run_id: run.id,
        patients_screened: run.patients_screened,
        observations_analyzed: run.observations_analyzed,
        alerts_generated: run.alerts_generated,
        high_severity_alerts: run.high_severity_alerts,
        immediate_action_alerts: run.immediate_action_alerts,
        execution_time_ms: run.execution_time_ms,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::repository::test_support::{seed_medication, seed_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::ObservationType;
    use crate::models::vital_sign::{VitalSignKind, VitalSnapshot};
    use crate::surveillance::knowledge::KnowledgeBase;
    use chrono::NaiveDate;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn at(d: NaiveDate, h: u32) -> NaiveDateTime {
        d.and_hms_opt(h, 0, 0).unwrap()
    }

    /// Database with the test knowledge base, one elderly patient on
    /// Digoxin for 30 days, and the Digoxin observation from the ward.
    pub struct DigoxinWard {
        pub conn: Connection,
        pub patient: Patient,
        pub digoxin: Medication,
        pub observation: Observation,
        pub now: NaiveDateTime,
    }

    pub fn digoxin_ward(hospice: bool) -> DigoxinWard {
        let conn = open_memory_database().unwrap();
        let now = at(date(2024, 3, 31), 9);
        KnowledgeBase::load_test().seed(&conn, now).unwrap();
        let patient = seed_patient(&conn, Some(date(1941, 7, 4)), hospice);
        let digoxin = seed_medication(&conn, patient.id, "Digoxin", Some(date(2024, 3, 1)));
        let observation = store_observation(&conn, &digoxin_observation(patient.id), now).unwrap();
        DigoxinWard { conn, patient, digoxin, observation, now }
    }

    pub fn digoxin_observation(patient_id: Uuid) -> NewObservation {
        NewObservation {
            patient_id,
            author_id: Uuid::new_v4(),
            observation_type: ObservationType::Symptom,
            category: Some("Cardiac".into()),
            text: "Sees yellow halos around lights, nauseated at breakfast".into(),
            standardized_terms: vec!["Visual disturbance".into(), "nausea".into()],
            severity_rating: Some(5),
            patient_reported: true,
            vital_signs: Some(VitalSnapshot::new().with(VitalSignKind::HeartRate, "48 bpm - decreased")),
            observed_at: None,
        }
    }
}
