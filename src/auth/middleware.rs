//! Request-entry auth gate.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::context::AuthenticatedIdentity;
use crate::auth::error::AuthError;
use crate::auth::policy::AccessPolicy;
use crate::auth::role::RolePolicy;
use crate::auth::token::{TokenService, fingerprint};

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::MissingToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = parts
        .next()
        .ok_or_else(|| AuthError::TokenMalformed("empty bearer token".to_string()))?;

    if parts.next().is_some() {
        return Err(AuthError::TokenMalformed(
            "unexpected data after bearer token".to_string(),
        ));
    }

    Ok(token)
}

/// Everything the gate needs, shared read-only across requests.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    roles: Arc<dyn RolePolicy>,
    policy: Arc<AccessPolicy>,
}

impl AuthGate {
    pub fn new(
        tokens: Arc<TokenService>,
        roles: Arc<dyn RolePolicy>,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            tokens,
            roles,
            policy,
        }
    }

    /// Decide whether a request for `path` may proceed.
    ///
    /// Returns `Ok(None)` for public paths and `Ok(Some(identity))` for
    /// protected paths carrying a valid token.
    pub fn authorize(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Option<AuthenticatedIdentity>, AuthError> {
        if self.policy.is_public(path) {
            return Ok(None);
        }

        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = bearer_token_from_header(header)?;
        let identity = self.tokens.validate(token)?;

        // The role inside the token is only a hint; the policy has the final say.
        let derived = self.roles.determine_role(identity.email().as_str());
        if derived != identity.role() {
            warn!(
                token = %fingerprint(token),
                claimed = %identity.role(),
                derived = %derived,
                "token role disagrees with role policy"
            );
            return Err(AuthError::TokenMalformed("role claim mismatch".to_string()));
        }

        debug!(token = %fingerprint(token), email = %identity.email(), "request authenticated");
        Ok(Some(identity))
    }
}

/// Authentication middleware.
///
/// Rejects requests to protected paths before any handler runs and injects
/// [`AuthenticatedIdentity`] into the request extensions on success.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let identity = gate
        .authorize(req.uri().path(), authorization)
        .inspect_err(|e| debug!(path = %req.uri().path(), error = %e, "request rejected"))?;

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}
