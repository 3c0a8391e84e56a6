use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use super::types::SurveillanceError;
use crate::db::repository::{count_known_reactions, insert_known_reaction};
use crate::models::enums::{Likelihood, Severity};
use crate::models::vital_sign::{VitalDirection, VitalSignKind};
use crate::models::{KnownAdverseReactionSeed, RiskFactor, TypicalOnset};

pub const KNOWLEDGE_FILE: &str = "known_adverse_reactions.json";

/// Bundled adverse-reaction reference entries, before they are stored.
pub struct KnowledgeBase {
    pub entries: Vec<KnownAdverseReactionSeed>,
}

impl KnowledgeBase {
    /// Load reference entries from the bundled JSON file.
    pub fn load(resources_dir: &Path) -> Result<Self, SurveillanceError> {
        let path = resources_dir.join(KNOWLEDGE_FILE);
        let json = std::fs::read_to_string(&path).map_err(|e| {
            SurveillanceError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let entries: Vec<KnownAdverseReactionSeed> = serde_json::from_str(&json)
            .map_err(|e| SurveillanceError::ReferenceDataParse(KNOWLEDGE_FILE.into(), e.to_string()))?;
        tracing::info!(entries = entries.len(), "Knowledge base loaded");
        Ok(Self { entries })
    }

    /// Create reference data for tests (no file I/O).
    pub fn load_test() -> Self {
        let mut digoxin = entry("Digoxin", "Digoxin toxicity", Severity::Major);
        digoxin.generic_name = Some("digoxin".into());
        digoxin.drug_class = Some("Cardiac glycoside".into());
        digoxin.likelihood = Some(Likelihood::Common);
        digoxin.typical_onset = Some(TypicalOnset::Days(30));
        digoxin.observable_symptoms = strings(&["visual disturbance", "nausea"]);
        digoxin.vital_sign_changes = vitals(&[(VitalSignKind::HeartRate, VitalDirection::Decreased)]);
        digoxin.behavioral_changes = strings(&["confusion"]);
        digoxin.monitoring_recommendations = Some("Apical pulse before each dose; hold if below 60".into());
        digoxin.suggested_interventions = strings(&[
            "Check apical pulse for a full minute before administration",
            "Hold dose and notify provider if heart rate below 60",
            "Order serum digoxin level",
        ]);
        digoxin.provider_notification_guidance =
            Some("Notify provider within 1 hour with heart rate and symptoms".into());
        digoxin.escalation_guidance = Some("Call 911 for heart rate below 40 or syncope".into());
        digoxin.risk_factors = vec![RiskFactor::Elderly, RiskFactor::RenalImpairment];

        let mut warfarin = entry("Warfarin", "Bleeding", Severity::LifeThreatening);
        warfarin.drug_class = Some("Anticoagulant".into());
        warfarin.likelihood = Some(Likelihood::Common);
        warfarin.typical_onset = Some(TypicalOnset::Days(5));
        warfarin.observable_symptoms = strings(&["bruising", "bleeding gums", "blood in urine", "black stools"]);
        warfarin.suggested_interventions = strings(&[
            "Assess for signs of bleeding",
            "Order INR",
        ]);
        warfarin.risk_factors = vec![RiskFactor::Elderly];

        let mut lisinopril = entry("Lisinopril", "Angioedema", Severity::LifeThreatening);
        lisinopril.drug_class = Some("ACE inhibitor".into());
        lisinopril.likelihood = Some(Likelihood::Rare);
        lisinopril.typical_onset = Some(TypicalOnset::Hours(24));
        lisinopril.observable_symptoms = strings(&["facial swelling", "tongue swelling", "difficulty breathing"]);
        lisinopril.suggested_interventions = strings(&["Monitor airway", "Discontinue medication"]);

        let mut morphine = entry("Morphine", "Respiratory depression", Severity::Major);
        morphine.drug_class = Some("Opioid analgesic".into());
        morphine.typical_onset = Some(TypicalOnset::Hours(2));
        morphine.observable_symptoms = strings(&["drowsiness", "pinpoint pupils"]);
        morphine.vital_sign_changes = vitals(&[
            (VitalSignKind::RespiratoryRate, VitalDirection::Decreased),
            (VitalSignKind::OxygenSaturation, VitalDirection::Decreased),
        ]);
        morphine.behavioral_changes = strings(&["sedation", "confusion"]);
        morphine.suggested_interventions = strings(&[
            "Monitor respiratory rate every 15 minutes",
            "Position head of bed elevated",
        ]);
        morphine.risk_factors = vec![RiskFactor::Elderly];

        let mut furosemide = entry("Furosemide", "Hypokalemia", Severity::Moderate);
        furosemide.drug_class = Some("Loop diuretic".into());
        furosemide.likelihood = Some(Likelihood::VeryCommon);
        furosemide.typical_onset = Some(TypicalOnset::Days(7));
        furosemide.observable_symptoms = strings(&["muscle cramps", "weakness", "nausea"]);
        furosemide.suggested_interventions = strings(&[
            "Encourage potassium-rich foods",
            "Order basic metabolic panel",
        ]);

        Self {
            entries: vec![digoxin, warfarin, lisinopril, morphine, furosemide],
        }
    }

    /// Insert every entry into an empty knowledge base. A populated table is
    /// left alone. Returns the number of entries inserted.
    pub fn seed(&self, conn: &Connection, now: NaiveDateTime) -> Result<usize, SurveillanceError> {
        if count_known_reactions(conn)? > 0 {
            tracing::debug!("Knowledge base already seeded");
            return Ok(0);
        }
        let tx = conn.unchecked_transaction()?;
        for seed in &self.entries {
            let reaction = seed.clone().into_reaction(Uuid::new_v4(), now);
            insert_known_reaction(&tx, &reaction)?;
        }
        tx.commit()?;
        tracing::info!(inserted = self.entries.len(), "Knowledge base seeded");
        Ok(self.entries.len())
    }
}

fn entry(medication: &str, reaction: &str, severity: Severity) -> KnownAdverseReactionSeed {
    KnownAdverseReactionSeed {
        medication_name: medication.into(),
        generic_name: None,
        drug_class: None,
        reaction_name: reaction.into(),
        reaction_description: None,
        severity,
        likelihood: None,
        typical_onset: None,
        observable_symptoms: vec![],
        vital_sign_changes: BTreeMap::new(),
        behavioral_changes: vec![],
        monitoring_recommendations: None,
        suggested_interventions: vec![],
        provider_notification_guidance: None,
        escalation_guidance: None,
        risk_factors: vec![],
        reference_source: None,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn vitals(items: &[(VitalSignKind, VitalDirection)]) -> BTreeMap<VitalSignKind, VitalDirection> {
    items.iter().cloned().collect()
}
