//! Error types for federated login.

use std::fmt;

/// Reasons a federated login attempt ends on the failure redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// No provider registered under this name.
    UnknownProvider(String),
    /// The provider redirected back with `?error=`.
    ProviderDenied(String),
    /// Callback arrived without an authorization code.
    MissingCode,
    /// `state` was missing, forged, expired, or for another provider.
    InvalidState(String),
    /// Token endpoint or userinfo call failed.
    Exchange(String),
    /// The profile is unusable (no email, or email not verified).
    Profile(String),
    /// Provider registration is broken (bad URL, etc.).
    Config(String),
    /// Token issuance failed after the provider vouched for the user.
    Internal(String),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProvider(name) => write!(f, "Unknown OAuth2 provider: {}", name),
            Self::ProviderDenied(reason) => write!(f, "Provider denied the login: {}", reason),
            Self::MissingCode => write!(f, "Callback is missing the authorization code"),
            Self::InvalidState(msg) => write!(f, "Invalid OAuth2 state: {}", msg),
            Self::Exchange(msg) => write!(f, "Code exchange failed: {}", msg),
            Self::Profile(msg) => write!(f, "Unusable provider profile: {}", msg),
            Self::Config(msg) => write!(f, "OAuth2 provider misconfigured: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for OAuthError {}

pub type OAuthResult<T> = Result<T, OAuthError>;
