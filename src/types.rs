//! NewType wrappers for strong typing throughout the tracker.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a provider name where an email is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Employee email address as supplied at login or by the identity provider.
    ///
    /// This is the JWT subject. It is not guaranteed unique in storage, see
    /// `pick_canonical` in the employee store for how duplicates resolve.
    Email
);

newtype_string!(
    /// Registered name of an OAuth2 identity provider (e.g., "google").
    ///
    /// Appears in the `/oauth2/authorization/{provider}` and
    /// `/login/oauth2/code/{provider}` paths.
    ProviderName
);

newtype_string!(
    /// Short, non-reversible fingerprint of a bearer token for log correlation.
    TokenFingerprint
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_creation() {
        let email = Email::new("placement.hr@co.com");
        assert_eq!(email.as_str(), "placement.hr@co.com");
        assert_eq!(email.to_string(), "placement.hr@co.com");
    }

    #[test]
    fn test_email_from_string() {
        let email: Email = "a@b.c".into();
        assert_eq!(email.as_str(), "a@b.c");

        let email: Email = String::from("x@y.z").into();
        assert_eq!(email.into_inner(), "x@y.z");
    }

    #[test]
    fn test_email_serde() {
        let email = Email::new("student42@univ.edu");
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"student42@univ.edu\"");

        let parsed: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, email);
    }

    #[test]
    fn test_provider_name_borrow() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(ProviderName::new("google"), 1);
        assert_eq!(map.get("google"), Some(&1));
    }
}
