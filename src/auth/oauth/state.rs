//! Stateless CSRF `state` for the authorization-code round trip.
//!
//! The state is a short-lived JWT signed with the access-token key and bound
//! to the provider name, so the server keeps nothing between the redirect out
//! and the callback.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::oauth::error::{OAuthError, OAuthResult};
use crate::auth::token::TokenService;

const STATE_PURPOSE: &str = "oauth2-state";

/// How long a user may spend at the provider before the state expires.
pub const STATE_TTL_SECONDS: i64 = 600;

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    purpose: String,
    provider: String,
    nonce: String,
    iat: i64,
    exp: i64,
}

pub fn issue_state(tokens: &TokenService, provider: &str) -> OAuthResult<String> {
    let now = Utc::now();
    let claims = StateClaims {
        purpose: STATE_PURPOSE.to_string(),
        provider: provider.to_string(),
        nonce: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(STATE_TTL_SECONDS)).timestamp(),
    };

    tokens
        .sign(&claims)
        .map_err(|e| OAuthError::Internal(e.to_string()))
}

pub fn verify_state(tokens: &TokenService, state: &str, provider: &str) -> OAuthResult<()> {
    let claims: StateClaims = tokens.verify(state, &["exp"]).map_err(|e| match e {
        AuthError::TokenExpired => OAuthError::InvalidState("expired".to_string()),
        AuthError::SignatureInvalid => OAuthError::InvalidState("bad signature".to_string()),
        _ => OAuthError::InvalidState("unreadable".to_string()),
    })?;

    if claims.purpose != STATE_PURPOSE {
        return Err(OAuthError::InvalidState("not a state token".to_string()));
    }

    if claims.provider != provider {
        return Err(OAuthError::InvalidState(format!(
            "issued for {}, returned via {}",
            claims.provider, provider
        )));
    }

    Ok(())
}
