use uuid::Uuid;

use super::enums::{ConfidenceLevel, Severity};

/// Which alerts a dashboard query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertScope {
    Patient(Uuid),
    Facility(Uuid),
}

#[derive(Debug, Default, Clone)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub confidence: Option<ConfidenceLevel>,
}
