//! Authentication errors.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Authentication errors.
///
/// The `Display` output is for logs. Clients only ever see the generic
/// message from [`AuthError::public_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password. Callers must not be able to tell
    /// the two apart.
    InvalidCredentials,
    /// Protected route reached without a bearer token.
    MissingToken,
    /// Token signature checked out but `exp` has passed.
    TokenExpired,
    /// Token could not be parsed, or its claims are unusable.
    TokenMalformed(String),
    /// Token was not signed with our key.
    SignatureInvalid,
    /// Credential store failure.
    Store(String),
    /// Anything else that went wrong server-side.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::MissingToken => write!(f, "Missing bearer token"),
            Self::TokenExpired => write!(f, "Token has expired"),
            Self::TokenMalformed(msg) => write!(f, "Malformed token: {}", msg),
            Self::SignatureInvalid => write!(f, "Token signature is invalid"),
            Self::Store(msg) => write!(f, "Credential store error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal auth error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// `{message}` body used for every auth failure.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Never includes store or parser detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid email or password",
            Self::MissingToken => "Authentication required",
            Self::TokenExpired => "Token has expired",
            Self::TokenMalformed(_) | Self::SignatureInvalid => "Invalid token",
            Self::Store(_) | Self::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(MessageResponse {
            message: self.public_message().to_string(),
        });

        if status == StatusCode::UNAUTHORIZED && self != Self::InvalidCredentials {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}
