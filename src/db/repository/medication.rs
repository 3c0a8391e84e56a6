use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_date, parse_opt_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::MedicationStatus;
use crate::models::Medication;

const MEDICATION_COLUMNS: &str =
    "id, patient_id, name, generic_name, drug_class, dose, start_date, status";

/// Upsert a medication mirror row from the records service.
pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications
         (id, patient_id, name, generic_name, drug_class, dose, start_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            generic_name = excluded.generic_name,
            drug_class = excluded.drug_class,
            dose = excluded.dose,
            start_date = excluded.start_date,
            status = excluded.status",
        params![
            med.id.to_string(),
            med.patient_id.to_string(),
            med.name,
            med.generic_name,
            med.drug_class,
            med.dose,
            med.start_date.as_ref().map(fmt_date),
            med.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
    let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_medication(row)?)),
        None => Ok(None),
    }
}

/// Medications the patient is currently taking.
pub fn get_active_medications(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE patient_id = ?1 AND status = 'ACTIVE' ORDER BY name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![patient_id.to_string()])?;
    let mut meds = Vec::new();
    while let Some(row) = rows.next()? {
        meds.push(read_medication(row)?);
    }
    Ok(meds)
}

pub fn medication_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM medications WHERE id = ?1",
            params![id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn read_medication(row: &Row<'_>) -> Result<Medication, DatabaseError> {
    let status: String = row.get("status")?;
    Ok(Medication {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        patient_id: parse_uuid(&row.get::<_, String>("patient_id")?)?,
        name: row.get("name")?,
        generic_name: row.get("generic_name")?,
        drug_class: row.get("drug_class")?,
        dose: row.get("dose")?,
        start_date: parse_opt_date(row.get("start_date")?)?,
        status: MedicationStatus::from_str(&status)?,
    })
}
