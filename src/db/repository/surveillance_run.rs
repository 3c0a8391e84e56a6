use std::str::FromStr;

use rusqlite::{params, Connection};

use super::{fmt_datetime, parse_datetime, parse_opt_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::RunType;
use crate::models::SurveillanceRun;

pub fn insert_surveillance_run(conn: &Connection, run: &SurveillanceRun) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO surveillance_runs
         (id, run_type, facility_id, patients_screened, observations_analyzed,
          alerts_generated, high_severity_alerts, immediate_action_alerts,
          execution_time_ms, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            run.id.to_string(),
            run.run_type.as_str(),
            run.facility_id.map(|f| f.to_string()),
            run.patients_screened,
            run.observations_analyzed,
            run.alerts_generated,
            run.high_severity_alerts,
            run.immediate_action_alerts,
            i64::try_from(run.execution_time_ms).unwrap_or(i64::MAX),
            fmt_datetime(&run.created_at),
        ],
    )?;
    Ok(())
}

/// Most recent sweeps first.
pub fn list_recent_runs(conn: &Connection, limit: u32) -> Result<Vec<SurveillanceRun>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, run_type, facility_id, patients_screened, observations_analyzed,
                alerts_generated, high_severity_alerts, immediate_action_alerts,
                execution_time_ms, created_at
         FROM surveillance_runs ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, u32>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, u32>(5)?,
            row.get::<_, u32>(6)?,
            row.get::<_, u32>(7)?,
            row.get::<_, i64>(8)?,
            row.get::<_, String>(9)?,
        ))
    })?;

    let mut runs = Vec::new();
    for row in rows {
        let (id, run_type, facility, patients, observations, alerts, high, immediate, ms, created) =
            row?;
        runs.push(SurveillanceRun {
            id: parse_uuid(&id)?,
            run_type: RunType::from_str(&run_type)?,
            facility_id: parse_opt_uuid(facility)?,
            patients_screened: patients,
            observations_analyzed: observations,
            alerts_generated: alerts,
            high_severity_alerts: high,
            immediate_action_alerts: immediate,
            execution_time_ms: u64::try_from(ms).unwrap_or(0),
            created_at: parse_datetime(&created)?,
        });
    }
    Ok(runs)
}
