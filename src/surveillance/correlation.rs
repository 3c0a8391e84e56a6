//! Lexical correlation between one observation and one knowledge-base entry.
//!
//! Pure functions only; the engine handles persistence.

use chrono::NaiveDate;

use crate::models::enums::{ConfidenceLevel, ObservationType};
use crate::models::{KnownAdverseReaction, Medication, Observation, Patient, RiskFactor, TypicalOnset};

const SYMPTOM_WEIGHT: f64 = 3.0;
const VITAL_WEIGHT: f64 = 2.0;
const BEHAVIOR_WEIGHT: f64 = 2.0;
const ONSET_BOOST: f64 = 0.10;
const RISK_FACTOR_BOOST: f64 = 0.05;
const MIN_SIGNAL_MATCHES: usize = 2;

/// Outcome of a correlation that passed the emit gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub matching_symptoms: Vec<String>,
    pub matching_vital_signs: Vec<String>,
    pub matching_behaviors: Vec<String>,
    /// Final score after boosts, in [0, 1].
    pub score: f64,
    pub confidence: ConfidenceLevel,
    pub days_since_start: Option<i64>,
    pub expected_onset_match: bool,
    pub risk_factors_present: Vec<RiskFactor>,
}

/// Raw lexical overlap before the gate and boosts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlap {
    pub matching_symptoms: Vec<String>,
    pub matching_vital_signs: Vec<String>,
    pub matching_behaviors: Vec<String>,
    pub numerator: f64,
    pub denominator: f64,
}

impl Overlap {
    /// numerator / denominator clamped to [0, 1]; 0 without a denominator.
    pub fn score(&self) -> f64 {
        if self.denominator > 0.0 {
            clamp_unit(self.numerator / self.denominator)
        } else {
            0.0
        }
    }

    /// At least one symptom, or two vital/behavior signals combined.
    pub fn passes_gate(&self) -> bool {
        !self.matching_symptoms.is_empty()
            || self.matching_vital_signs.len() + self.matching_behaviors.len() >= MIN_SIGNAL_MATCHES
    }
}

/// Whether a knowledge-base entry applies to a medication: any of name,
/// generic name or drug class, case-insensitive substring.
pub fn reaction_applies_to(reaction: &KnownAdverseReaction, medication: &Medication) -> bool {
    if reaction.retired {
        return false;
    }
    field_contains(Some(&reaction.medication_name), Some(&medication.name))
        || field_contains(reaction.generic_name.as_ref(), medication.generic_name.as_ref())
        || field_contains(reaction.drug_class.as_ref(), medication.drug_class.as_ref())
}

fn field_contains(haystack: Option<&String>, needle: Option<&String>) -> bool {
    match (haystack, needle) {
        (Some(h), Some(n)) => {
            let n = n.trim().to_lowercase();
            !n.is_empty() && h.to_lowercase().contains(&n)
        }
        _ => false,
    }
}

/// Weighted lexical overlap between an observation and a candidate.
pub fn measure_overlap(observation: &Observation, reaction: &KnownAdverseReaction) -> Overlap {
    let mut overlap = Overlap::default();

    // Symptoms
    let mut candidate_symptoms: Vec<String> = Vec::new();
    for s in &reaction.observable_symptoms {
        let s = s.trim().to_lowercase();
        if !s.is_empty() && !candidate_symptoms.contains(&s) {
            candidate_symptoms.push(s);
        }
    }
    let observed: Vec<String> = observation
        .standardized_terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();
    for symptom in &candidate_symptoms {
        if observed.contains(symptom) {
            overlap.matching_symptoms.push(symptom.clone());
        }
    }
    if !overlap.matching_symptoms.is_empty() {
        overlap.numerator += overlap.matching_symptoms.len() as f64 * SYMPTOM_WEIGHT;
        overlap.denominator += candidate_symptoms.len() as f64 * SYMPTOM_WEIGHT;
    }

    // Vital signs
    if let Some(snapshot) = observation.vital_signs.as_ref().filter(|s| !s.is_empty()) {
        for (kind, direction) in &reaction.vital_sign_changes {
            overlap.denominator += VITAL_WEIGHT;
            if let Some(reading) = snapshot.reading(kind) {
                if direction.matches_reading(reading) {
                    overlap.matching_vital_signs.push(kind.as_str().to_string());
                    overlap.numerator += VITAL_WEIGHT;
                }
            }
        }
    }

    // Behaviors
    if observation.observation_type == ObservationType::Behavior {
        let text = observation.text.to_lowercase();
        for behavior in &reaction.behavioral_changes {
            let b = behavior.trim().to_lowercase();
            if !b.is_empty() && text.contains(&b) {
                overlap.matching_behaviors.push(behavior.clone());
                overlap.numerator += BEHAVIOR_WEIGHT;
                overlap.denominator += BEHAVIOR_WEIGHT;
            }
        }
    }

    overlap
}

/// Whether `days_since_start` falls inside the candidate's onset window.
///
/// Days: |days - onset| <= max(onset / 2, 2).
/// Hours: |days * 24 - onset| <= max(onset / 2, 12).
pub fn onset_matches(onset: TypicalOnset, days_since_start: i64) -> bool {
    match onset {
        TypicalOnset::Days(d) => {
            let onset = f64::from(d);
            let margin = (onset * 0.5).max(2.0);
            (days_since_start as f64 - onset).abs() <= margin
        }
        TypicalOnset::Hours(h) => {
            let onset = f64::from(h);
            let margin = (onset * 0.5).max(12.0);
            ((days_since_start * 24) as f64 - onset).abs() <= margin
        }
    }
}

/// Risk factors the patient demonstrably has on `on`.
pub fn patient_risk_factors(
    reaction: &KnownAdverseReaction,
    patient: &Patient,
    on: NaiveDate,
    elderly_age_years: u32,
) -> Vec<RiskFactor> {
    reaction
        .risk_factors
        .iter()
        .filter(|factor| match factor {
            RiskFactor::Elderly => patient
                .age_on(on)
                .is_some_and(|age| age >= elderly_age_years),
            // No patient data for these yet.
            RiskFactor::RenalImpairment
            | RiskFactor::HepaticImpairment
            | RiskFactor::ConcurrentDiuretics
            | RiskFactor::Other(_) => false,
        })
        .cloned()
        .collect()
}

/// Tier a final score. Monotonic in `score`.
pub fn confidence_for(score: f64) -> ConfidenceLevel {
    if score >= 0.75 {
        ConfidenceLevel::VeryHigh
    } else if score >= 0.5 {
        ConfidenceLevel::High
    } else if score >= 0.3 {
        ConfidenceLevel::Moderate
    } else {
        ConfidenceLevel::Low
    }
}

/// Full correlation: overlap, gate, onset and risk boosts, confidence.
/// `None` when the gate rejects the candidate.
pub fn correlate(
    observation: &Observation,
    medication: &Medication,
    reaction: &KnownAdverseReaction,
    patient: &Patient,
    elderly_age_years: u32,
) -> Option<Correlation> {
    let overlap = measure_overlap(observation, reaction);
    let mut score = overlap.score();

    tracing::debug!(
        reaction = %reaction.reaction_name,
        medication = %medication.name,
        symptoms = overlap.matching_symptoms.len(),
        vitals = overlap.matching_vital_signs.len(),
        behaviors = overlap.matching_behaviors.len(),
        score,
        "Scored candidate"
    );

    if !overlap.passes_gate() {
        return None;
    }

    let observed_on = observation.observed_at.date();
    let days_since_start = medication
        .start_date
        .map(|start| (observed_on - start).num_days());

    let expected_onset_match = match (reaction.typical_onset, days_since_start) {
        (Some(onset), Some(days)) => onset_matches(onset, days),
        _ => false,
    };
    if expected_onset_match {
        score = clamp_unit(score + ONSET_BOOST);
    }

    let risk_factors_present = patient_risk_factors(reaction, patient, observed_on, elderly_age_years);
    for _ in &risk_factors_present {
        score = clamp_unit(score + RISK_FACTOR_BOOST);
    }

    Some(Correlation {
        matching_symptoms: overlap.matching_symptoms,
        matching_vital_signs: overlap.matching_vital_signs,
        matching_behaviors: overlap.matching_behaviors,
        score,
        confidence: confidence_for(score),
        days_since_start,
        expected_onset_match,
        risk_factors_present,
    })
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
