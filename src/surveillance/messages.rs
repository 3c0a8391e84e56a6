use crate::models::{KnownAdverseReaction, Medication, Patient};

/// Summary text builder for ADR alerts.
pub struct MessageTemplates;

impl MessageTemplates {
    /// Human-readable alert summary. Paragraphs are separated by a blank line.
    pub fn alert_summary(
        patient: &Patient,
        medication: &Medication,
        reaction: &KnownAdverseReaction,
        matching_symptoms: &[String],
        matching_vital_signs: &[String],
        matching_behaviors: &[String],
    ) -> String {
        let comfort = patient.is_comfort_focused();
        let mut parts: Vec<String> = Vec::new();

        if comfort {
            parts.push(format!(
                "HOSPICE PATIENT - comfort-focused care\nPotential adverse reaction to {}: {}",
                medication.name, reaction.reaction_name,
            ));
            parts.push("Focus: symptom management and comfort measures per hospice goals".into());
        } else {
            parts.push(format!(
                "Potential adverse reaction to {}: {}",
                medication.name, reaction.reaction_name,
            ));
        }

        if !matching_symptoms.is_empty() {
            parts.push(format!("Patient experiencing: {}", matching_symptoms.join(", ")));
        }
        if !matching_vital_signs.is_empty() {
            parts.push(format!("Vital sign changes: {}", matching_vital_signs.join(", ")));
        }
        if !matching_behaviors.is_empty() {
            parts.push(format!("Behavioral changes: {}", matching_behaviors.join(", ")));
        }

        parts.push(format!(
            "Severity: {} | Likelihood: {}",
            reaction.severity,
            reaction.likelihood.map(|l| l.as_str()).unwrap_or("Unknown"),
        ));

        if comfort {
            parts.push("Do not hospitalize, per advance directives".into());
            if let Some(agency) = &patient.hospice_agency {
                parts.push(format!("Hospice agency: {agency}"));
                if let Some(phone) = &patient.hospice_nurse_phone {
                    parts.push(format!(
                        "Hospice nurse: {} - {}",
                        patient.hospice_nurse_name.as_deref().unwrap_or("On-call"),
                        phone,
                    ));
                }
            }
        }

        if let Some(monitoring) = &reaction.monitoring_recommendations {
            parts.push(format!("Monitor for: {monitoring}"));
        }

        parts.join("\n\n")
    }

    /// Timestamped line appended to investigation notes on provider contact.
    pub fn provider_contact(stamp: &str, method: &str, provider: &str, response: Option<&str>) -> String {
        match response {
            Some(r) if !r.trim().is_empty() => {
                format!("[{stamp}] Provider {provider} notified via {method}. Response: {r}")
            }
            _ => format!("[{stamp}] Provider {provider} notified via {method}."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{Likelihood, MedicationStatus, Severity};
    use crate::models::KnownAdverseReactionSeed;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn patient(hospice: bool) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            facility_id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Moreau".into(),
            date_of_birth: None,
            is_hospice: hospice,
            comfort_measures_only: false,
            hospice_agency: hospice.then(|| "Valley Hospice".into()),
            hospice_nurse_name: None,
            hospice_nurse_phone: hospice.then(|| "555-0142".into()),
        }
    }

    fn medication() -> Medication {
        Medication {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            name: "Digoxin".into(),
            generic_name: None,
            drug_class: None,
            dose: None,
            start_date: None,
            status: MedicationStatus::Active,
        }
    }

    fn reaction() -> KnownAdverseReaction {
        let seed: KnownAdverseReactionSeed = serde_json::from_value(serde_json::json!({
            "medication_name": "Digoxin",
            "reaction_name": "Digoxin toxicity",
            "severity": "MAJOR",
            "likelihood": "COMMON",
            "monitoring_recommendations": "apical pulse below 60"
        }))
        .unwrap();
        seed.into_reaction(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn standard_summary_names_medication_and_matches() {
        let r = reaction();
        assert_eq!(r.likelihood, Some(Likelihood::Common));
        let text = MessageTemplates::alert_summary(
            &patient(false),
            &medication(),
            &r,
            &["nausea".into()],
            &["heart_rate".into()],
            &[],
        );
        assert!(text.starts_with("Potential adverse reaction to Digoxin: Digoxin toxicity"));
        assert!(text.contains("Patient experiencing: nausea"));
        assert!(text.contains("Vital sign changes: heart_rate"));
        assert!(!text.contains("Behavioral changes"));
        assert!(text.contains(&format!("Severity: {} | Likelihood: COMMON", Severity::Major)));
        assert!(text.contains("Monitor for: apical pulse below 60"));
        assert!(!text.contains("HOSPICE"));
    }

    #[test]
    fn hospice_summary_has_comfort_framing_and_contacts() {
        let text = MessageTemplates::alert_summary(
            &patient(true),
            &medication(),
            &reaction(),
            &["nausea".into()],
            &[],
            &[],
        );
        assert!(text.starts_with("HOSPICE PATIENT"));
        assert!(text.contains("Do not hospitalize"));
        assert!(text.contains("Hospice agency: Valley Hospice"));
        assert!(text.contains("Hospice nurse: On-call - 555-0142"));
    }

    #[test]
    fn provider_contact_line() {
        let line = MessageTemplates::provider_contact("2024-06-01 10:00:00", "phone", "Dr. Chen", Some("Hold x24h"));
        assert_eq!(
            line,
            "[2024-06-01 10:00:00] Provider Dr. Chen notified via phone. Response: Hold x24h"
        );
    }
}
