use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patient fields the surveillance engine reads. Owned by the records service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub is_hospice: bool,
    pub comfort_measures_only: bool,
    pub hospice_agency: Option<String>,
    pub hospice_nurse_name: Option<String>,
    pub hospice_nurse_phone: Option<String>,
}

impl Patient {
    /// Age in whole years on `date`. `None` without a date of birth.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        if date < dob {
            return Some(0);
        }
        let mut years = date.year() - dob.year();
        if (date.month(), date.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Hospice or comfort-measures-only: alerts are framed around symptom relief.
    pub fn is_comfort_focused(&self) -> bool {
        self.is_hospice || self.comfort_measures_only
    }
}
