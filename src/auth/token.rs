//! JWT issuance and validation.
//!
//! Tokens are HS256-signed and fully stateless. There is no revocation list:
//! a token that leaks stays valid until its `exp`, so keep the lifetime short.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::auth::context::AuthenticatedIdentity;
use crate::auth::error::AuthError;
use crate::auth::role::Role;
use crate::types::{Email, TokenFingerprint};

/// Minimum accepted length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default access token lifetime (10 hours).
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 36_000;

/// Longest accepted access token lifetime (30 days).
pub const MAX_TOKEN_TTL_SECONDS: u64 = 30 * 24 * 3600;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the employee email.
    pub sub: String,
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Signing material and lifetimes, fixed at startup.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    leeway_seconds: u64,
}

impl TokenService {
    /// Build from a shared secret. Rejects secrets shorter than
    /// [`MIN_SECRET_LEN`].
    pub fn new(secret: &[u8], ttl_seconds: u64, leeway_seconds: u64) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Internal(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if ttl_seconds == 0 || ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(AuthError::Internal(format!(
                "token TTL must be between 1 and {} seconds",
                MAX_TOKEN_TTL_SECONDS
            )));
        }

        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::Internal("token TTL out of range".to_string()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            leeway_seconds,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue an access token valid from now.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue an access token as if it had been minted at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        self.sign(&claims)
    }

    /// Verify signature and expiry, then hand back the embedded identity.
    pub fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let claims: Claims = self.verify(token, &["exp", "sub"])?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthError::TokenMalformed("exp out of range".to_string()))?;

        Ok(AuthenticatedIdentity::new(
            Email::new(claims.sub),
            claims.role,
            expires_at,
        ))
    }

    pub(crate) fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {}", e)))
    }

    pub(crate) fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        required_claims: &[&str],
    ) -> Result<T, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_seconds;
        validation.set_required_spec_claims(required_claims);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                _ => AuthError::TokenMalformed(e.to_string()),
            })
    }
}

/// Fingerprint a token for logs so the raw value never reaches them.
pub fn fingerprint(token: &str) -> TokenFingerprint {
    let digest = Sha256::digest(token.as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    TokenFingerprint::new(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"an-adequately-long-test-signing-secret!!";

    fn service() -> TokenService {
        TokenService::new(SECRET, 3600, 0).unwrap()
    }

    #[test]
    fn test_issue_then_validate_round_trips() {
        let tokens = service();
        let token = tokens.issue("placement.hr@co.com", Role::Placement).unwrap();

        let identity = tokens.validate(&token).unwrap();
        assert_eq!(identity.email().as_str(), "placement.hr@co.com");
        assert_eq!(identity.role(), Role::Placement);
        assert!(identity.expires_at() > Utc::now());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at(
                "student42@univ.edu",
                Role::Student,
                Utc::now() - Duration::hours(2),
            )
            .unwrap();

        assert_eq!(tokens.validate(&token).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn test_leeway_accepts_recently_expired_token() {
        let tokens = TokenService::new(SECRET, 60, 300).unwrap();
        let token = tokens
            .issue_at("student42@univ.edu", Role::Student, Utc::now() - Duration::seconds(120))
            .unwrap();

        assert!(tokens.validate(&token).is_ok());
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let ours = service();
        let theirs =
            TokenService::new(b"some-other-secret-that-is-long-enough!!", 3600, 0).unwrap();
        let token = theirs.issue("student42@univ.edu", Role::Student).unwrap();

        assert_eq!(ours.validate(&token).unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service();
        for token in ["", "not-a-jwt", "a.b.c"] {
            assert!(
                matches!(tokens.validate(token), Err(AuthError::TokenMalformed(_))),
                "{token} should be malformed"
            );
        }
    }

    #[test]
    fn test_unknown_role_claim_is_malformed() {
        #[derive(Serialize)]
        struct Forged<'a> {
            sub: &'a str,
            role: &'a str,
            iat: i64,
            exp: i64,
        }

        let tokens = service();
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Forged {
                sub: "student42@univ.edu",
                role: "admin",
                iat: now,
                exp: now + 600,
            })
            .unwrap();

        assert!(matches!(tokens.validate(&token), Err(AuthError::TokenMalformed(_))));
    }

    #[test]
    fn test_out_of_range_ttl_is_rejected() {
        let out_of_range = [
            0,
            MAX_TOKEN_TTL_SECONDS + 1,
            10_000_000_000_000,
            i64::MAX as u64,
            u64::MAX,
        ];
        for ttl in out_of_range {
            assert!(
                matches!(TokenService::new(SECRET, ttl, 0), Err(AuthError::Internal(_))),
                "ttl {ttl} should be rejected"
            );
        }

        let longest = TokenService::new(SECRET, MAX_TOKEN_TTL_SECONDS, 0).unwrap();
        let token = longest.issue("student42@univ.edu", Role::Student).unwrap();
        assert!(longest.validate(&token).is_ok());
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let tokens = service();
        let result =
            tokens.issue_at("student42@univ.edu", Role::Student, DateTime::<Utc>::MAX_UTC);
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(TokenService::new(b"too-short", 3600, 0).is_err());
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = fingerprint("header.payload.signature");
        let b = fingerprint("header.payload.signature");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 12);
        assert_ne!(a, fingerprint("header.payload.other"));
    }
}
