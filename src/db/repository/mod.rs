//! Repository layer: entity-scoped database operations.
//!
//! Free functions over `&Connection`. Vec and map columns are JSON text,
//! timestamps are `%Y-%m-%d %H:%M:%S` text, ids are UUID text.

mod acknowledgment;
mod alert;
mod knowledge;
mod medication;
mod observation;
mod patient;
mod surveillance_run;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::DatabaseError;

pub use acknowledgment::*;
pub use alert::*;
pub use knowledge::*;
pub use medication::*;
pub use observation::*;
pub use patient::*;
pub use surveillance_run::*;

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(format!("bad uuid {s}: {e}")))
}

pub(crate) fn parse_opt_uuid(s: Option<String>) -> Result<Option<Uuid>, DatabaseError> {
    s.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s}: {e}")))
}

pub(crate) fn parse_opt_datetime(s: Option<String>) -> Result<Option<NaiveDateTime>, DatabaseError> {
    s.as_deref().map(parse_datetime).transpose()
}

pub(crate) fn parse_opt_date(s: Option<String>) -> Result<Option<NaiveDate>, DatabaseError> {
    s.as_deref()
        .map(|d| {
            NaiveDate::parse_from_str(d, DATE_FORMAT)
                .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {d}: {e}")))
        })
        .transpose()
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn from_json<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    Ok(serde_json::from_str(s)?)
}

pub(crate) fn from_opt_json<T: DeserializeOwned>(s: Option<String>) -> Result<Option<T>, DatabaseError> {
    s.as_deref().map(from_json).transpose()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_round_trip_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 1)
            .unwrap();
        let s = fmt_datetime(&dt);
        assert_eq!(s, "2024-02-29 23:59:01");
        assert_eq!(parse_datetime(&s).unwrap(), dt);
    }

    #[test]
    fn bad_uuid_is_constraint_violation() {
        assert!(matches!(
            parse_uuid("not-a-uuid"),
            Err(DatabaseError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn optional_parsers_pass_none_through() {
        assert!(parse_opt_uuid(None).unwrap().is_none());
        assert!(parse_opt_datetime(None).unwrap().is_none());
        assert!(parse_opt_date(None).unwrap().is_none());
        assert!(from_opt_json::<Vec<String>>(None).unwrap().is_none());
    }
}
