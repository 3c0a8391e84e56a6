use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Declaration order is clinical order: later variants are worse / higher.
str_enum!(Severity {
    Minor => "MINOR",
    Moderate => "MODERATE",
    Major => "MAJOR",
    LifeThreatening => "LIFE_THREATENING",
});

impl Severity {
    /// MAJOR and LIFE_THREATENING count toward high-severity sweep totals.
    pub fn is_high(&self) -> bool {
        matches!(self, Self::Major | Self::LifeThreatening)
    }
}

str_enum!(Likelihood {
    VeryCommon => "VERY_COMMON",
    Common => "COMMON",
    Uncommon => "UNCOMMON",
    Rare => "RARE",
});

str_enum!(ObservationType {
    Symptom => "SYMPTOM",
    VitalSign => "VITAL_SIGN",
    Behavior => "BEHAVIOR",
    PhysicalFinding => "PHYSICAL_FINDING",
    LabResult => "LAB_RESULT",
    FunctionalChange => "FUNCTIONAL_CHANGE",
});

str_enum!(ConfidenceLevel {
    Low => "LOW",
    Moderate => "MODERATE",
    High => "HIGH",
    VeryHigh => "VERY_HIGH",
});

str_enum!(NotificationUrgency {
    Routine => "ROUTINE",
    Urgent => "URGENT",
    Stat => "STAT",
});

str_enum!(AlertStatus {
    New => "NEW",
    Acknowledged => "ACKNOWLEDGED",
    Investigating => "INVESTIGATING",
    ConfirmedAdr => "CONFIRMED_ADR",
    NotAdr => "NOT_ADR",
    Dismissed => "DISMISSED",
});

impl AlertStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::New | Self::Acknowledged | Self::Investigating)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

str_enum!(AcknowledgmentAction {
    Acknowledged => "ACKNOWLEDGED",
    HoldMedication => "HOLD_MEDICATION",
});

str_enum!(MedicationStatus {
    Active => "ACTIVE",
    Held => "HELD",
    Discontinued => "DISCONTINUED",
});

str_enum!(RunType {
    RealTime => "REAL_TIME",
    Batch => "BATCH",
    Manual => "MANUAL",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn alert_status_round_trip() {
        for (variant, s) in [
            (AlertStatus::New, "NEW"),
            (AlertStatus::Acknowledged, "ACKNOWLEDGED"),
            (AlertStatus::Investigating, "INVESTIGATING"),
            (AlertStatus::ConfirmedAdr, "CONFIRMED_ADR"),
            (AlertStatus::NotAdr, "NOT_ADR"),
            (AlertStatus::Dismissed, "DISMISSED"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AlertStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn only_open_statuses_are_active() {
        assert!(AlertStatus::New.is_active());
        assert!(AlertStatus::Acknowledged.is_active());
        assert!(AlertStatus::Investigating.is_active());
        assert!(AlertStatus::ConfirmedAdr.is_terminal());
        assert!(AlertStatus::NotAdr.is_terminal());
        assert!(AlertStatus::Dismissed.is_terminal());
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&Severity::LifeThreatening).unwrap();
        assert_eq!(json, format!("\"{}\"", Severity::LifeThreatening.as_str()));

        let json = serde_json::to_string(&AcknowledgmentAction::HoldMedication).unwrap();
        assert_eq!(json, "\"HOLD_MEDICATION\"");
    }

    #[test]
    fn severity_ordering_is_clinical() {
        assert!(Severity::Minor < Severity::Moderate);
        assert!(Severity::Major < Severity::LifeThreatening);
        assert!(Severity::Major.is_high());
        assert!(!Severity::Moderate.is_high());
    }

    #[test]
    fn confidence_ordering() {
        assert!(ConfidenceLevel::Low < ConfidenceLevel::Moderate);
        assert!(ConfidenceLevel::High < ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(AlertStatus::from_str("CLOSED").is_err());
        assert!(Severity::from_str("severe").is_err());
        assert!(ObservationType::from_str("").is_err());
    }
}
