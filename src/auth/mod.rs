//! Authentication and authorization.
//!
//! Two ways in, one token out:
//!
//! - **Password**: `PasswordAuthenticator` checks email/password against the
//!   bcrypt hash in the credential store.
//! - **OAuth2**: `OAuthFlow` trusts an identity provider's profile and
//!   best-effort provisions a local employee.
//!
//! Both paths derive the role through the same `RolePolicy` and sign a JWT with
//! `TokenService`. On the way back in, `require_auth` runs ahead of every
//! handler, consults the `AccessPolicy` table and attaches an
//! `AuthenticatedIdentity` to protected requests.
//!
//! ## Limitations
//!
//! Tokens are stateless. There is no revocation; a token is good until `exp`.

mod context;
mod employee_store;
mod error;
mod middleware;
pub mod oauth;
mod password;
mod policy;
mod role;
mod token;

pub use context::AuthenticatedIdentity;
pub use employee_store::{
    CredentialStore, EmployeeStore, FederatedProfile, Provisioned, pick_canonical,
};
pub use error::{AuthError, MessageResponse};
pub use middleware::{AuthGate, require_auth};
pub use password::{PasswordAuthenticator, hash_password};
pub use policy::{AccessPolicy, DEFAULT_PUBLIC_PATHS, PathPattern};
pub use role::{EmailPrefixPolicy, Role, RolePolicy, determine_role};
pub use token::{
    Claims, DEFAULT_TOKEN_TTL_SECONDS, MAX_TOKEN_TTL_SECONDS, MIN_SECRET_LEN, TokenService,
    fingerprint,
};
