//! Staff attribution seam.
//!
//! Authentication and role checks live in the calling layer. The engine only
//! needs to know who is acting so acknowledgments and resolutions can be
//! attributed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clinical role of a staff member, as reported by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Rn,
    Lpn,
    Cna,
    Pharmacist,
    Provider,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub display_name: String,
    pub role: StaffRole,
    pub facility_id: Uuid,
}

/// Resolves the staff member behind the current request.
pub trait IdentityResolver: Send + Sync {
    /// `None` when no staff member is signed in.
    fn current_staff(&self) -> Option<StaffMember>;
}

/// Resolver that always returns the same staff member (kiosk sessions, tests).
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub Option<StaffMember>);

impl IdentityResolver for FixedIdentity {
    fn current_staff(&self) -> Option<StaffMember> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_identity_returns_member() {
        let member = StaffMember {
            id: Uuid::new_v4(),
            display_name: "R. Okafor".into(),
            role: StaffRole::Rn,
            facility_id: Uuid::new_v4(),
        };
        let resolver = FixedIdentity(Some(member.clone()));
        assert_eq!(resolver.current_staff(), Some(member));
    }

    #[test]
    fn signed_out_identity_is_none() {
        assert!(FixedIdentity(None).current_staff().is_none());
    }

    #[test]
    fn role_serializes_screaming_snake() {
        let json = serde_json::to_string(&StaffRole::Pharmacist).unwrap();
        assert_eq!(json, "\"PHARMACIST\"");
    }
}
