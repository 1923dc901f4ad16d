//! Request-scoped identity.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::auth::role::Role;
use crate::types::Email;

/// Identity attached to a request after its bearer token validated.
///
/// Lives in the request extensions and is dropped with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    email: Email,
    role: Role,
    expires_at: DateTime<Utc>,
}

impl AuthenticatedIdentity {
    pub fn new(email: Email, role: Role, expires_at: DateTime<Utc>) -> Self {
        Self {
            email,
            role,
            expires_at,
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// When the token backing this identity stops being accepted.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the auth gate ran for this route.
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn identity() -> AuthenticatedIdentity {
        AuthenticatedIdentity::new(
            Email::new("placement.hr@co.com"),
            Role::Placement,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_extract_from_extensions() {
        let mut req = Request::builder().uri("/api/me").body(()).unwrap();
        req.extensions_mut().insert(identity());
        let (mut parts, _) = req.into_parts();

        let extracted = AuthenticatedIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted.email().as_str(), "placement.hr@co.com");
        assert_eq!(extracted.role(), Role::Placement);
    }

    #[tokio::test]
    async fn test_extract_without_gate_is_rejected() {
        let req = Request::builder().uri("/api/me").body(()).unwrap();
        let (mut parts, _) = req.into_parts();

        let result = AuthenticatedIdentity::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), AuthError::MissingToken);
    }
}
