use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Likelihood, Severity};
use super::vital_sign::{VitalDirection, VitalSignKind};

/// How soon after starting a medication a reaction typically appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypicalOnset {
    Days(u32),
    Hours(u32),
}

/// Patient characteristic that raises the likelihood of a reaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskFactor {
    Elderly,
    RenalImpairment,
    HepaticImpairment,
    ConcurrentDiuretics,
    Other(String),
}

impl RiskFactor {
    pub fn as_str(&self) -> &str {
        match self {
            RiskFactor::Elderly => "elderly",
            RiskFactor::RenalImpairment => "renal_impairment",
            RiskFactor::HepaticImpairment => "hepatic_impairment",
            RiskFactor::ConcurrentDiuretics => "concurrent_diuretics",
            RiskFactor::Other(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            "elderly" => RiskFactor::Elderly,
            "renal_impairment" => RiskFactor::RenalImpairment,
            "hepatic_impairment" => RiskFactor::HepaticImpairment,
            "concurrent_diuretics" => RiskFactor::ConcurrentDiuretics,
            _ => RiskFactor::Other(key),
        }
    }
}

impl From<String> for RiskFactor {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RiskFactor> for String {
    fn from(factor: RiskFactor) -> Self {
        factor.as_str().to_string()
    }
}

/// Knowledge-base entry describing a known adverse reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownAdverseReaction {
    pub id: Uuid,
    pub medication_name: String,
    pub generic_name: Option<String>,
    pub drug_class: Option<String>,
    pub reaction_name: String,
    pub reaction_description: Option<String>,
    pub severity: Severity,
    pub likelihood: Option<Likelihood>,
    pub typical_onset: Option<TypicalOnset>,
    pub observable_symptoms: Vec<String>,
    pub vital_sign_changes: BTreeMap<VitalSignKind, VitalDirection>,
    pub behavioral_changes: Vec<String>,
    pub monitoring_recommendations: Option<String>,
    /// Undifferentiated; split into nursing and provider scope per alert.
    pub suggested_interventions: Vec<String>,
    pub provider_notification_guidance: Option<String>,
    pub escalation_guidance: Option<String>,
    pub risk_factors: Vec<RiskFactor>,
    pub reference_source: Option<String>,
    /// Retired entries stay for alert history but are never candidates.
    pub retired: bool,
    pub created_at: NaiveDateTime,
}

/// Knowledge-base entry as it appears in bundled JSON (no id, no timestamps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownAdverseReactionSeed {
    pub medication_name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub drug_class: Option<String>,
    pub reaction_name: String,
    #[serde(default)]
    pub reaction_description: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub likelihood: Option<Likelihood>,
    #[serde(default)]
    pub typical_onset: Option<TypicalOnset>,
    #[serde(default)]
    pub observable_symptoms: Vec<String>,
    #[serde(default)]
    pub vital_sign_changes: BTreeMap<VitalSignKind, VitalDirection>,
    #[serde(default)]
    pub behavioral_changes: Vec<String>,
    #[serde(default)]
    pub monitoring_recommendations: Option<String>,
    #[serde(default)]
    pub suggested_interventions: Vec<String>,
    #[serde(default)]
    pub provider_notification_guidance: Option<String>,
    #[serde(default)]
    pub escalation_guidance: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub reference_source: Option<String>,
}

impl KnownAdverseReactionSeed {
    pub fn into_reaction(self, id: Uuid, created_at: NaiveDateTime) -> KnownAdverseReaction {
        KnownAdverseReaction {
            id,
            medication_name: self.medication_name,
            generic_name: self.generic_name,
            drug_class: self.drug_class,
            reaction_name: self.reaction_name,
            reaction_description: self.reaction_description,
            severity: self.severity,
            likelihood: self.likelihood,
            typical_onset: self.typical_onset,
            observable_symptoms: self.observable_symptoms,
            vital_sign_changes: self.vital_sign_changes,
            behavioral_changes: self.behavioral_changes,
            monitoring_recommendations: self.monitoring_recommendations,
            suggested_interventions: self.suggested_interventions,
            provider_notification_guidance: self.provider_notification_guidance,
            escalation_guidance: self.escalation_guidance,
            risk_factors: self.risk_factors,
            reference_source: self.reference_source,
            retired: false,
            created_at,
        }
    }
}
