use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{fmt_datetime, from_json, from_opt_json, parse_datetime, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::enums::ObservationType;
use crate::models::Observation;

const OBSERVATION_COLUMNS: &str = "id, patient_id, facility_id, author_id, observation_type,
    category, text, standardized_terms, severity_rating, patient_reported, vital_signs,
    observed_at, created_at, surveillance_performed, potential_adr_detected";

pub fn insert_observation(conn: &Connection, obs: &Observation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO observations
         (id, patient_id, facility_id, author_id, observation_type, category, text,
          standardized_terms, severity_rating, patient_reported, vital_signs,
          observed_at, created_at, surveillance_performed, potential_adr_detected)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            obs.id.to_string(),
            obs.patient_id.to_string(),
            obs.facility_id.to_string(),
            obs.author_id.to_string(),
            obs.observation_type.as_str(),
            obs.category,
            obs.text,
            to_json(&obs.standardized_terms)?,
            obs.severity_rating.map(i64::from),
            obs.patient_reported as i32,
            obs.vital_signs.as_ref().map(to_json).transpose()?,
            fmt_datetime(&obs.observed_at),
            fmt_datetime(&obs.created_at),
            obs.surveillance_performed as i32,
            obs.potential_adr_detected as i32,
        ],
    )?;
    Ok(())
}

pub fn get_observation(conn: &Connection, id: &Uuid) -> Result<Option<Observation>, DatabaseError> {
    let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM observations WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_observation(row)?)),
        None => Ok(None),
    }
}

/// Set the engine-owned flags. The only mutation an observation allows.
pub fn mark_observation_surveyed(
    conn: &Connection,
    id: &Uuid,
    adr_detected: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE observations SET surveillance_performed = 1, potential_adr_detected = ?2
         WHERE id = ?1",
        params![id.to_string(), adr_detected as i32],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Observation".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Observations created at or after `since` that have not been surveyed yet,
/// oldest first.
pub fn list_unsurveyed_observations(
    conn: &Connection,
    since: &NaiveDateTime,
    facility_id: Option<&Uuid>,
) -> Result<Vec<Observation>, DatabaseError> {
    let sql = format!(
        "SELECT {OBSERVATION_COLUMNS} FROM observations
         WHERE surveillance_performed = 0 AND created_at >= ?1
           AND (?2 IS NULL OR facility_id = ?2)
         ORDER BY created_at, rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![
        fmt_datetime(since),
        facility_id.map(|f| f.to_string()),
    ])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_observation(row)?);
    }
    Ok(out)
}

fn read_observation(row: &Row<'_>) -> Result<Observation, DatabaseError> {
    let obs_type: String = row.get("observation_type")?;
    let severity: Option<i64> = row.get("severity_rating")?;
    Ok(Observation {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        patient_id: parse_uuid(&row.get::<_, String>("patient_id")?)?,
        facility_id: parse_uuid(&row.get::<_, String>("facility_id")?)?,
        author_id: parse_uuid(&row.get::<_, String>("author_id")?)?,
        observation_type: ObservationType::from_str(&obs_type)?,
        category: row.get("category")?,
        text: row.get("text")?,
        standardized_terms: from_json(&row.get::<_, String>("standardized_terms")?)?,
        severity_rating: severity.and_then(|s| u8::try_from(s).ok()),
        patient_reported: row.get::<_, i32>("patient_reported")? != 0,
        vital_signs: from_opt_json(row.get("vital_signs")?)?,
        observed_at: parse_datetime(&row.get::<_, String>("observed_at")?)?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?)?,
        surveillance_performed: row.get::<_, i32>("surveillance_performed")? != 0,
        potential_adr_detected: row.get::<_, i32>("potential_adr_detected")? != 0,
    })
}
