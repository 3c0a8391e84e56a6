use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{fmt_datetime, parse_datetime, parse_opt_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::AcknowledgmentAction;
use crate::models::{AlertAcknowledgment, SafetyVerifications};

const ACK_COLUMNS: &str = "id, alert_id, staff_id, action, reaction_awareness,
    monitoring_parameters, escalation_criteria, notes, monitoring_plan, hold_reason,
    hold_duration, provider_notified, provider_notified_at, hold_order_obtained,
    acknowledged_at, expires_at";

/// Append an acknowledgment. Rows are never updated or deleted.
pub fn insert_acknowledgment(
    conn: &Connection,
    ack: &AlertAcknowledgment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO alert_acknowledgments
         (id, alert_id, staff_id, action, reaction_awareness, monitoring_parameters,
          escalation_criteria, notes, monitoring_plan, hold_reason, hold_duration,
          provider_notified, provider_notified_at, hold_order_obtained,
          acknowledged_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            ack.id.to_string(),
            ack.alert_id.to_string(),
            ack.staff_id.to_string(),
            ack.action.as_str(),
            ack.verifications.reaction_awareness as i32,
            ack.verifications.monitoring_parameters as i32,
            ack.verifications.escalation_criteria as i32,
            ack.notes,
            ack.monitoring_plan,
            ack.hold_reason,
            ack.hold_duration,
            ack.provider_notified as i32,
            ack.provider_notified_at.as_ref().map(fmt_datetime),
            ack.hold_order_obtained as i32,
            fmt_datetime(&ack.acknowledged_at),
            fmt_datetime(&ack.expires_at),
        ],
    )?;
    Ok(())
}

/// The staff member's most recent acknowledgment of an alert.
pub fn latest_acknowledgment(
    conn: &Connection,
    alert_id: &Uuid,
    staff_id: &Uuid,
) -> Result<Option<AlertAcknowledgment>, DatabaseError> {
    let sql = format!(
        "SELECT {ACK_COLUMNS} FROM alert_acknowledgments
         WHERE alert_id = ?1 AND staff_id = ?2
         ORDER BY acknowledged_at DESC, rowid DESC LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![alert_id.to_string(), staff_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_acknowledgment(row)?)),
        None => Ok(None),
    }
}

/// The staff member's latest HOLD_MEDICATION on an alert, if any.
pub fn latest_hold(
    conn: &Connection,
    alert_id: &Uuid,
    staff_id: &Uuid,
) -> Result<Option<AlertAcknowledgment>, DatabaseError> {
    let sql = format!(
        "SELECT {ACK_COLUMNS} FROM alert_acknowledgments
         WHERE alert_id = ?1 AND staff_id = ?2 AND action = 'HOLD_MEDICATION'
         ORDER BY acknowledged_at DESC, rowid DESC LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![alert_id.to_string(), staff_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_acknowledgment(row)?)),
        None => Ok(None),
    }
}

/// Every acknowledgment of an alert, newest first.
pub fn list_acknowledgments(
    conn: &Connection,
    alert_id: &Uuid,
) -> Result<Vec<AlertAcknowledgment>, DatabaseError> {
    let sql = format!(
        "SELECT {ACK_COLUMNS} FROM alert_acknowledgments
         WHERE alert_id = ?1 ORDER BY acknowledged_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![alert_id.to_string()])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_acknowledgment(row)?);
    }
    Ok(out)
}

fn read_acknowledgment(row: &Row<'_>) -> Result<AlertAcknowledgment, DatabaseError> {
    let action: String = row.get("action")?;
    Ok(AlertAcknowledgment {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        alert_id: parse_uuid(&row.get::<_, String>("alert_id")?)?,
        staff_id: parse_uuid(&row.get::<_, String>("staff_id")?)?,
        action: AcknowledgmentAction::from_str(&action)?,
        verifications: SafetyVerifications {
            reaction_awareness: row.get::<_, i32>("reaction_awareness")? != 0,
            monitoring_parameters: row.get::<_, i32>("monitoring_parameters")? != 0,
            escalation_criteria: row.get::<_, i32>("escalation_criteria")? != 0,
        },
        notes: row.get("notes")?,
        monitoring_plan: row.get("monitoring_plan")?,
        hold_reason: row.get("hold_reason")?,
        hold_duration: row.get("hold_duration")?,
        provider_notified: row.get::<_, i32>("provider_notified")? != 0,
        provider_notified_at: parse_opt_datetime(row.get("provider_notified_at")?)?,
        hold_order_obtained: row.get::<_, i32>("hold_order_obtained")? != 0,
        acknowledged_at: parse_datetime(&row.get::<_, String>("acknowledged_at")?)?,
        expires_at: parse_datetime(&row.get::<_, String>("expires_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::alert::test_support::seed_alert;
    use crate::db::sqlite::open_memory_database;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn ack(alert_id: Uuid, staff_id: Uuid, at: NaiveDateTime, action: AcknowledgmentAction) -> AlertAcknowledgment {
        AlertAcknowledgment {
            id: Uuid::new_v4(),
            alert_id,
            staff_id,
            action,
            verifications: SafetyVerifications::all(),
            notes: None,
            monitoring_plan: Some("q4h apical pulse".into()),
            hold_reason: (action == AcknowledgmentAction::HoldMedication).then(|| "HR 44".to_string()),
            hold_duration: None,
            provider_notified: true,
            provider_notified_at: Some(at),
            hold_order_obtained: false,
            acknowledged_at: at,
            expires_at: at + Duration::hours(12),
        }
    }

    #[test]
    fn latest_picks_newest_for_staff() {
        let conn = open_memory_database().unwrap();
        let alert = seed_alert(&conn, t0());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let older = ack(alert.id, a, t0(), AcknowledgmentAction::Acknowledged);
        let newer = ack(alert.id, a, t0() + Duration::hours(13), AcknowledgmentAction::Acknowledged);
        let other = ack(alert.id, b, t0() + Duration::hours(20), AcknowledgmentAction::Acknowledged);
        for x in [&older, &newer, &other] {
            insert_acknowledgment(&conn, x).unwrap();
        }

        let latest = latest_acknowledgment(&conn, &alert.id, &a).unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        assert_eq!(latest.monitoring_plan.as_deref(), Some("q4h apical pulse"));
        assert!(latest_acknowledgment(&conn, &alert.id, &Uuid::new_v4()).unwrap().is_none());

        let history = list_acknowledgments(&conn, &alert.id).unwrap();
        let ids: Vec<Uuid> = history.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![other.id, newer.id, older.id]);
    }

    #[test]
    fn hold_survives_later_plain_acknowledgment() {
        let conn = open_memory_database().unwrap();
        let alert = seed_alert(&conn, t0());
        let staff = Uuid::new_v4();
        let hold = ack(alert.id, staff, t0(), AcknowledgmentAction::HoldMedication);
        insert_acknowledgment(&conn, &hold).unwrap();
        insert_acknowledgment(
            &conn,
            &ack(alert.id, staff, t0() + Duration::hours(13), AcknowledgmentAction::Acknowledged),
        )
        .unwrap();

        let found = latest_hold(&conn, &alert.id, &staff).unwrap().unwrap();
        assert_eq!(found.id, hold.id);
        assert_eq!(found.hold_reason.as_deref(), Some("HR 44"));
    }

    #[test]
    fn acknowledgments_reject_updates() {
        let conn = open_memory_database().unwrap();
        let alert = seed_alert(&conn, t0());
        let a = ack(alert.id, Uuid::new_v4(), t0(), AcknowledgmentAction::Acknowledged);
        insert_acknowledgment(&conn, &a).unwrap();
        let result = conn.execute(
            "UPDATE alert_acknowledgments SET notes = 'edited' WHERE id = ?1",
            params![a.id.to_string()],
        );
        assert!(result.is_err());
    }
}
