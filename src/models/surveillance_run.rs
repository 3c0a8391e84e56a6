use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RunType;

/// Summary of one surveillance sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceRun {
    pub id: Uuid,
    pub run_type: RunType,
    pub facility_id: Option<Uuid>,
    pub patients_screened: u32,
    pub observations_analyzed: u32,
    pub alerts_generated: u32,
    pub high_severity_alerts: u32,
    pub immediate_action_alerts: u32,
    pub execution_time_ms: u64,
    pub created_at: NaiveDateTime,
}
