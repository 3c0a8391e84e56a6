//! Urgency classification and the nursing/provider split of suggested
//! interventions.

use crate::models::enums::{NotificationUrgency, Severity};

const NURSING_KEYWORDS: &[&str] = &[
    "assess",
    "monitor",
    "check",
    "observe",
    "document",
    "notify",
    "measure",
    "evaluate",
    "report",
    "increase frequency",
    "watch for",
    "comfort",
    "position",
    "encourage",
    "assist",
    "ensure",
    "review",
];

/// Wording that puts an item out of nursing scope when no nursing keyword is present.
const ORDERING_WORDS: &[&str] = &[
    "order",
    "prescribe",
    "change dose",
    "start medication",
    "stop medication",
];

const PROVIDER_KEYWORDS: &[&str] = &[
    "order",
    "lab",
    "test",
    "x-ray",
    "imaging",
    "prescribe",
    "change dose",
    "adjust",
    "discontinue",
    "start",
    "add medication",
    "consult",
    "refer",
    "diagnosis",
];

/// Urgency fixed at alert creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyDecision {
    pub urgency: NotificationUrgency,
    pub requires_immediate_action: bool,
}

/// Classify notification urgency. Comfort-focused patients are never STAT.
pub fn classify_urgency(severity: Severity, score: f64, comfort_focused: bool) -> UrgencyDecision {
    use NotificationUrgency::{Routine, Stat, Urgent};

    let (urgency, requires_immediate_action) = if comfort_focused {
        match severity {
            Severity::LifeThreatening if score >= 0.5 => (Urgent, true),
            Severity::Major | Severity::Moderate if score >= 0.6 => (Urgent, false),
            _ => (Routine, false),
        }
    } else {
        match severity {
            Severity::LifeThreatening if score >= 0.5 => (Stat, true),
            Severity::Major if score >= 0.6 => (Urgent, true),
            Severity::Major | Severity::Moderate => (Urgent, false),
            _ => (Routine, false),
        }
    };

    UrgencyDecision {
        urgency,
        requires_immediate_action,
    }
}

/// Interventions split by scope of practice. An item may appear in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSplit {
    pub nursing: Vec<String>,
    pub provider: Vec<String>,
}

pub fn split_interventions(interventions: &[String]) -> ActionSplit {
    let mut split = ActionSplit::default();
    for item in interventions {
        if is_nursing_action(item) {
            split.nursing.push(item.clone());
        }
        if is_provider_action(item) {
            split.provider.push(item.clone());
        }
    }
    split
}

/// Nursing keyword present, or no ordering wording at all.
pub fn is_nursing_action(item: &str) -> bool {
    let lower = item.to_lowercase();
    contains_any(&lower, NURSING_KEYWORDS) || !contains_any(&lower, ORDERING_WORDS)
}

pub fn is_provider_action(item: &str) -> bool {
    contains_any(&item.to_lowercase(), PROVIDER_KEYWORDS)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(sev: Severity, score: f64, hospice: bool) -> (NotificationUrgency, bool) {
        let d = classify_urgency(sev, score, hospice);
        (d.urgency, d.requires_immediate_action)
    }

    #[test]
    fn non_hospice_table() {
        use NotificationUrgency::*;
        assert_eq!(decide(Severity::LifeThreatening, 0.5, false), (Stat, true));
        assert_eq!(decide(Severity::LifeThreatening, 0.49, false), (Routine, false));
        assert_eq!(decide(Severity::Major, 0.6, false), (Urgent, true));
        assert_eq!(decide(Severity::Major, 0.59, false), (Urgent, false));
        assert_eq!(decide(Severity::Moderate, 0.1, false), (Urgent, false));
        assert_eq!(decide(Severity::Minor, 1.0, false), (Routine, false));
    }

    #[test]
    fn hospice_is_never_stat() {
        use NotificationUrgency::*;
        assert_eq!(decide(Severity::LifeThreatening, 0.9, true), (Urgent, true));
        assert_eq!(decide(Severity::LifeThreatening, 0.4, true), (Routine, false));
        assert_eq!(decide(Severity::Major, 0.6, true), (Urgent, false));
        assert_eq!(decide(Severity::Moderate, 0.59, true), (Routine, false));
        assert_eq!(decide(Severity::Minor, 1.0, true), (Routine, false));
        for sev in [Severity::Minor, Severity::Moderate, Severity::Major, Severity::LifeThreatening] {
            for i in 0..=10 {
                assert_ne!(classify_urgency(sev, i as f64 / 10.0, true).urgency, Stat);
            }
        }
    }

    #[test]
    fn interventions_split_by_scope() {
        let items: Vec<String> = [
            "Monitor apical pulse before each dose",
            "Order serum digoxin level",
            "Hold next dose and notify provider",
            "Provide small frequent meals",
            "Adjust dose for renal function",
            "Check potassium; order BMP if low",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let split = split_interventions(&items);
        assert_eq!(
            split.nursing,
            vec![
                "Monitor apical pulse before each dose",
                "Hold next dose and notify provider",
                "Provide small frequent meals",
                "Adjust dose for renal function",
                "Check potassium; order BMP if low",
            ]
        );
        assert_eq!(
            split.provider,
            vec![
                "Order serum digoxin level",
                "Adjust dose for renal function",
                "Check potassium; order BMP if low",
            ]
        );
    }

    #[test]
    fn ordering_only_item_is_provider_only() {
        assert!(!is_nursing_action("Prescribe antiemetic"));
        assert!(is_provider_action("Prescribe antiemetic"));
    }
}
