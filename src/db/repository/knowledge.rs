use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{fmt_datetime, from_json, from_opt_json, parse_datetime, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::enums::{Likelihood, Severity};
use crate::models::KnownAdverseReaction;

const REACTION_COLUMNS: &str = "id, medication_name, generic_name, drug_class, reaction_name,
    reaction_description, severity, likelihood, typical_onset, observable_symptoms,
    vital_sign_changes, behavioral_changes, monitoring_recommendations,
    suggested_interventions, provider_notification_guidance, escalation_guidance,
    risk_factors, reference_source, retired, created_at";

pub fn insert_known_reaction(
    conn: &Connection,
    reaction: &KnownAdverseReaction,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO known_adverse_reactions
         (id, medication_name, generic_name, drug_class, reaction_name,
          reaction_description, severity, likelihood, typical_onset, observable_symptoms,
          vital_sign_changes, behavioral_changes, monitoring_recommendations,
          suggested_interventions, provider_notification_guidance, escalation_guidance,
          risk_factors, reference_source, retired, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
        params![
            reaction.id.to_string(),
            reaction.medication_name,
            reaction.generic_name,
            reaction.drug_class,
            reaction.reaction_name,
            reaction.reaction_description,
            reaction.severity.as_str(),
            reaction.likelihood.map(|l| l.as_str()),
            reaction.typical_onset.as_ref().map(to_json).transpose()?,
            to_json(&reaction.observable_symptoms)?,
            to_json(&reaction.vital_sign_changes)?,
            to_json(&reaction.behavioral_changes)?,
            reaction.monitoring_recommendations,
            to_json(&reaction.suggested_interventions)?,
            reaction.provider_notification_guidance,
            reaction.escalation_guidance,
            to_json(&reaction.risk_factors)?,
            reaction.reference_source,
            reaction.retired as i32,
            fmt_datetime(&reaction.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_known_reaction(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<KnownAdverseReaction>, DatabaseError> {
    let sql = format!("SELECT {REACTION_COLUMNS} FROM known_adverse_reactions WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_reaction(row)?)),
        None => Ok(None),
    }
}

/// Every entry that may still become a candidate.
pub fn list_current_reactions(conn: &Connection) -> Result<Vec<KnownAdverseReaction>, DatabaseError> {
    let sql = format!(
        "SELECT {REACTION_COLUMNS} FROM known_adverse_reactions
         WHERE retired = 0 ORDER BY medication_name, reaction_name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_reaction(row)?);
    }
    Ok(out)
}

pub fn count_known_reactions(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM known_adverse_reactions", [], |row| row.get(0))?)
}

/// Whether any alert copies from this entry.
pub fn is_reaction_referenced(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM adr_alerts WHERE known_reaction_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Replace an entry in place. Rejected once an alert references it:
/// retire it and insert a replacement instead.
pub fn update_known_reaction(
    conn: &Connection,
    reaction: &KnownAdverseReaction,
) -> Result<(), DatabaseError> {
    if is_reaction_referenced(conn, &reaction.id)? {
        return Err(DatabaseError::ConstraintViolation(format!(
            "known reaction {} is referenced by alerts; retire it instead",
            reaction.id
        )));
    }
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute(
        "DELETE FROM known_adverse_reactions WHERE id = ?1",
        params![reaction.id.to_string()],
    )?;
    if removed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "KnownAdverseReaction".into(),
            id: reaction.id.to_string(),
        });
    }
    insert_known_reaction(&tx, reaction)?;
    tx.commit()?;
    Ok(())
}

/// Mark an entry retired. It stays for alert history but is never a candidate.
pub fn retire_known_reaction(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE known_adverse_reactions SET retired = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "KnownAdverseReaction".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn read_reaction(row: &Row<'_>) -> Result<KnownAdverseReaction, DatabaseError> {
    let severity: String = row.get("severity")?;
    let likelihood: Option<String> = row.get("likelihood")?;
    Ok(KnownAdverseReaction {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        medication_name: row.get("medication_name")?,
        generic_name: row.get("generic_name")?,
        drug_class: row.get("drug_class")?,
        reaction_name: row.get("reaction_name")?,
        reaction_description: row.get("reaction_description")?,
        severity: Severity::from_str(&severity)?,
        likelihood: likelihood.as_deref().map(Likelihood::from_str).transpose()?,
        typical_onset: from_opt_json(row.get("typical_onset")?)?,
        observable_symptoms: from_json(&row.get::<_, String>("observable_symptoms")?)?,
        vital_sign_changes: from_json(&row.get::<_, String>("vital_sign_changes")?)?,
        behavioral_changes: from_json(&row.get::<_, String>("behavioral_changes")?)?,
        monitoring_recommendations: row.get("monitoring_recommendations")?,
        suggested_interventions: from_json(&row.get::<_, String>("suggested_interventions")?)?,
        provider_notification_guidance: row.get("provider_notification_guidance")?,
        escalation_guidance: row.get("escalation_guidance")?,
        risk_factors: from_json(&row.get::<_, String>("risk_factors")?)?,
        reference_source: row.get("reference_source")?,
        retired: row.get::<_, i32>("retired")? != 0,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::vital_sign::{VitalDirection, VitalSignKind};
    use crate::models::{RiskFactor, TypicalOnset};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn reaction() -> KnownAdverseReaction {
        let mut vitals = BTreeMap::new();
        vitals.insert(VitalSignKind::HeartRate, VitalDirection::Decreased);
        KnownAdverseReaction {
            id: Uuid::new_v4(),
            medication_name: "Digoxin".into(),
            generic_name: Some("digoxin".into()),
            drug_class: Some("Cardiac glycoside".into()),
            reaction_name: "Digoxin toxicity".into(),
            reaction_description: None,
            severity: Severity::Major,
            likelihood: Some(Likelihood::Common),
            typical_onset: Some(TypicalOnset::Days(30)),
            observable_symptoms: vec!["nausea".into(), "visual disturbance".into()],
            vital_sign_changes: vitals,
            behavioral_changes: vec!["confusion".into()],
            monitoring_recommendations: Some("Check apical pulse".into()),
            suggested_interventions: vec!["Hold dose if HR < 60".into()],
            provider_notification_guidance: None,
            escalation_guidance: None,
            risk_factors: vec![RiskFactor::Elderly],
            reference_source: Some("Lexicomp".into()),
            retired: false,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn insert_and_load_preserves_json_columns() {
        let conn = open_memory_database().unwrap();
        let r = reaction();
        insert_known_reaction(&conn, &r).unwrap();

        let loaded = get_known_reaction(&conn, &r.id).unwrap().unwrap();
        assert_eq!(loaded.typical_onset, Some(TypicalOnset::Days(30)));
        assert_eq!(loaded.observable_symptoms, r.observable_symptoms);
        assert_eq!(
            loaded.vital_sign_changes.get(&VitalSignKind::HeartRate),
            Some(&VitalDirection::Decreased)
        );
        assert_eq!(loaded.risk_factors, vec![RiskFactor::Elderly]);
    }

    #[test]
    fn retired_entries_are_not_listed() {
        let conn = open_memory_database().unwrap();
        let a = reaction();
        let b = reaction();
        insert_known_reaction(&conn, &a).unwrap();
        insert_known_reaction(&conn, &b).unwrap();
        retire_known_reaction(&conn, &a.id).unwrap();

        let current = list_current_reactions(&conn).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, b.id);
        assert_eq!(count_known_reactions(&conn).unwrap(), 2);
    }

    #[test]
    fn unreferenced_entry_can_be_updated() {
        let conn = open_memory_database().unwrap();
        let mut r = reaction();
        insert_known_reaction(&conn, &r).unwrap();
        r.severity = Severity::LifeThreatening;
        update_known_reaction(&conn, &r).unwrap();
        let loaded = get_known_reaction(&conn, &r.id).unwrap().unwrap();
        assert_eq!(loaded.severity, Severity::LifeThreatening);
    }

    #[test]
    fn retire_unknown_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            retire_known_reaction(&conn, &Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
