use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ObservationType;
use super::vital_sign::VitalSnapshot;

/// A staff-documented clinical observation.
///
/// Immutable after creation except for the two surveillance flags, which
/// only the engine sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub facility_id: Uuid,
    pub author_id: Uuid,
    pub observation_type: ObservationType,
    pub category: Option<String>,
    pub text: String,
    /// Lowercased, trimmed, de-duplicated symptom terms.
    pub standardized_terms: Vec<String>,
    pub severity_rating: Option<u8>,
    pub patient_reported: bool,
    pub vital_signs: Option<VitalSnapshot>,
    pub observed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub surveillance_performed: bool,
    pub potential_adr_detected: bool,
}

/// Observation as submitted by staff, before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservation {
    pub patient_id: Uuid,
    pub author_id: Uuid,
    pub observation_type: ObservationType,
    #[serde(default)]
    pub category: Option<String>,
    pub text: String,
    #[serde(default)]
    pub standardized_terms: Vec<String>,
    #[serde(default)]
    pub severity_rating: Option<u8>,
    #[serde(default)]
    pub patient_reported: bool,
    #[serde(default)]
    pub vital_signs: Option<VitalSnapshot>,
    /// Defaults to the time of recording.
    #[serde(default)]
    pub observed_at: Option<NaiveDateTime>,
}

/// Normalize free-form symptom terms for lexical matching.
pub fn normalize_terms(terms: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let t = term.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
