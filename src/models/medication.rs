use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MedicationStatus;

/// Medication fields the surveillance engine reads. Owned by the records service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub generic_name: Option<String>,
    pub drug_class: Option<String>,
    pub dose: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub status: MedicationStatus,
}

impl Medication {
    pub fn is_active(&self) -> bool {
        self.status == MedicationStatus::Active
    }
}
