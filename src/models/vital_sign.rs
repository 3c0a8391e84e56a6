use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Vital sign named by a knowledge-base signature or an observation snapshot.
///
/// Closed set of known keys; anything else is kept verbatim (lowercased) in
/// `Other` so new signatures do not need a code change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VitalSignKind {
    HeartRate,
    BloodPressure,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    RespiratoryRate,
    Temperature,
    OxygenSaturation,
    BloodGlucose,
    Weight,
    Other(String),
}

impl VitalSignKind {
    pub fn as_str(&self) -> &str {
        match self {
            VitalSignKind::HeartRate => "heart_rate",
            VitalSignKind::BloodPressure => "blood_pressure",
            VitalSignKind::BloodPressureSystolic => "bp_systolic",
            VitalSignKind::BloodPressureDiastolic => "bp_diastolic",
            VitalSignKind::RespiratoryRate => "respiratory_rate",
            VitalSignKind::Temperature => "temperature",
            VitalSignKind::OxygenSaturation => "oxygen_saturation",
            VitalSignKind::BloodGlucose => "blood_glucose",
            VitalSignKind::Weight => "weight",
            VitalSignKind::Other(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            "heart_rate" | "pulse" => VitalSignKind::HeartRate,
            "blood_pressure" => VitalSignKind::BloodPressure,
            "bp_systolic" | "systolic" => VitalSignKind::BloodPressureSystolic,
            "bp_diastolic" | "diastolic" => VitalSignKind::BloodPressureDiastolic,
            "respiratory_rate" | "resp_rate" => VitalSignKind::RespiratoryRate,
            "temperature" | "temp" => VitalSignKind::Temperature,
            "oxygen_saturation" | "spo2" => VitalSignKind::OxygenSaturation,
            "blood_glucose" | "glucose" => VitalSignKind::BloodGlucose,
            "weight" => VitalSignKind::Weight,
            _ => VitalSignKind::Other(key),
        }
    }
}

impl From<String> for VitalSignKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<VitalSignKind> for String {
    fn from(kind: VitalSignKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Expected direction of change in a knowledge-base vital-sign signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VitalDirection {
    Increased,
    Decreased,
    Irregular,
    Other(String),
}

impl VitalDirection {
    pub fn as_str(&self) -> &str {
        match self {
            VitalDirection::Increased => "increased",
            VitalDirection::Decreased => "decreased",
            VitalDirection::Irregular => "irregular",
            VitalDirection::Other(text) => text,
        }
    }

    pub fn parse(s: &str) -> Self {
        let text = s.trim().to_lowercase();
        match text.as_str() {
            "increased" => VitalDirection::Increased,
            "decreased" => VitalDirection::Decreased,
            "irregular" => VitalDirection::Irregular,
            _ => VitalDirection::Other(text),
        }
    }

    /// Lexical test against a recorded reading: the direction word must appear
    /// in the reading text. No numeric thresholds.
    pub fn matches_reading(&self, reading: &str) -> bool {
        let needle = self.as_str();
        !needle.is_empty() && reading.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl From<String> for VitalDirection {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<VitalDirection> for String {
    fn from(direction: VitalDirection) -> Self {
        direction.as_str().to_string()
    }
}

/// Vital signs recorded alongside an observation, as free text per vital
/// (e.g. `heart_rate: "48 bpm, decreased"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VitalSnapshot(BTreeMap<VitalSignKind, String>);

impl VitalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: VitalSignKind, reading: impl Into<String>) -> Self {
        self.0.insert(kind, reading.into());
        self
    }

    pub fn reading(&self, kind: &VitalSignKind) -> Option<&str> {
        self.0.get(kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_parse_to_variants() {
        assert_eq!(VitalSignKind::parse("heart_rate"), VitalSignKind::HeartRate);
        assert_eq!(VitalSignKind::parse("Pulse"), VitalSignKind::HeartRate);
        assert_eq!(VitalSignKind::parse("bp_systolic"), VitalSignKind::BloodPressureSystolic);
    }

    #[test]
    fn unknown_key_is_kept() {
        let kind = VitalSignKind::parse("Pain_Score");
        assert_eq!(kind, VitalSignKind::Other("pain_score".into()));
        assert_eq!(kind.as_str(), "pain_score");
    }

    #[test]
    fn direction_matches_case_insensitive_substring() {
        assert!(VitalDirection::Decreased.matches_reading("48 bpm - Decreased"));
        assert!(!VitalDirection::Increased.matches_reading("48 bpm - decreased"));
        assert!(!VitalDirection::Decreased.matches_reading("48"));
    }

    #[test]
    fn snapshot_serializes_as_plain_map() {
        let snapshot = VitalSnapshot::new()
            .with(VitalSignKind::HeartRate, "48 decreased")
            .with(VitalSignKind::Other("pain_score".into()), "7/10");
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"heart_rate":"48 decreased","pain_score":"7/10"}"#);

        let back: VitalSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reading(&VitalSignKind::HeartRate), Some("48 decreased"));
    }
}
