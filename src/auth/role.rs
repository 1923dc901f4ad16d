//! Role derivation.
//!
//! Roles are never stored and never accepted from the client. Every code path
//! that needs one calls a [`RolePolicy`] with the authenticated email.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse authorization tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Placement,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Placement => "placement",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "placement" => Ok(Role::Placement),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// Maps an authenticated email to a role.
///
/// Implementations must be pure: the same email always yields the same role.
pub trait RolePolicy: Send + Sync {
    fn determine_role(&self, email: &str) -> Role;
}

/// Emails starting with "placement" (any case) get [`Role::Placement`];
/// everything else is a [`Role::Student`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailPrefixPolicy;

const PLACEMENT_PREFIX: &str = "placement";

impl RolePolicy for EmailPrefixPolicy {
    fn determine_role(&self, email: &str) -> Role {
        determine_role(email)
    }
}

/// The default role mapping, usable without a policy object.
pub fn determine_role(email: &str) -> Role {
    let is_placement = email
        .get(..PLACEMENT_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PLACEMENT_PREFIX));

    if is_placement {
        Role::Placement
    } else {
        Role::Student
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_prefix_any_case() {
        for email in [
            "placement.hr@co.com",
            "Placement@co.com",
            "PLACEMENTcell@univ.edu",
            "placement",
        ] {
            assert_eq!(determine_role(email), Role::Placement, "{email}");
        }
    }

    #[test]
    fn test_everything_else_is_student() {
        for email in [
            "student42@univ.edu",
            "hr.placement@co.com",
            "placemen@co.com",
            "",
            " placement@co.com",
            "plácement@co.com",
        ] {
            assert_eq!(determine_role(email), Role::Student, "{email}");
        }
    }

    #[test]
    fn test_policy_is_deterministic() {
        let policy = EmailPrefixPolicy;
        let first = policy.determine_role("placement.hr@co.com");
        for _ in 0..10 {
            assert_eq!(policy.determine_role("placement.hr@co.com"), first);
        }
    }

    #[test]
    fn test_role_serde_and_parse() {
        assert_eq!(serde_json::to_string(&Role::Placement).unwrap(), "\"placement\"");
        let parsed: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(parsed, Role::Student);

        assert_eq!("placement".parse::<Role>().unwrap(), Role::Placement);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Student.to_string(), "student");
    }
}
