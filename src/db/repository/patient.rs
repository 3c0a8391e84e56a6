use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{fmt_date, parse_opt_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Patient;

/// Upsert a patient mirror row from the records service.
pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients
         (id, facility_id, first_name, last_name, date_of_birth, is_hospice,
          comfort_measures_only, hospice_agency, hospice_nurse_name, hospice_nurse_phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            facility_id = excluded.facility_id,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            date_of_birth = excluded.date_of_birth,
            is_hospice = excluded.is_hospice,
            comfort_measures_only = excluded.comfort_measures_only,
            hospice_agency = excluded.hospice_agency,
            hospice_nurse_name = excluded.hospice_nurse_name,
            hospice_nurse_phone = excluded.hospice_nurse_phone",
        params![
            patient.id.to_string(),
            patient.facility_id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.date_of_birth.as_ref().map(fmt_date),
            patient.is_hospice as i32,
            patient.comfort_measures_only as i32,
            patient.hospice_agency,
            patient.hospice_nurse_name,
            patient.hospice_nurse_phone,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, facility_id, first_name, last_name, date_of_birth, is_hospice,
                    comfort_measures_only, hospice_agency, hospice_nurse_name, hospice_nurse_phone
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i32>(5)?,
                    row.get::<_, i32>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                ))
            },
        )
        .optional()?;

    let Some((id, facility_id, first_name, last_name, dob, hospice, cmo, agency, nurse, phone)) = row
    else {
        return Ok(None);
    };

    Ok(Some(Patient {
        id: parse_uuid(&id)?,
        facility_id: parse_uuid(&facility_id)?,
        first_name,
        last_name,
        date_of_birth: parse_opt_date(dob)?,
        is_hospice: hospice != 0,
        comfort_measures_only: cmo != 0,
        hospice_agency: agency,
        hospice_nurse_name: nurse,
        hospice_nurse_phone: phone,
    }))
}
