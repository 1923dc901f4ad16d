//! OAuth2 federated login (authorization-code flow).

mod error;
mod flow;
mod provider;
mod state;

pub use error::{OAuthError, OAuthResult};
pub use flow::{
    ACCESS_DENIED, CallbackParams, FrontendRedirects, OAuthFlow, OAuthOutcome,
    ProvisioningWarning,
};
pub use provider::{HttpOAuthProvider, OAuthProvider, OAuthProviderConfig, ProviderProfile};
pub use state::{STATE_TTL_SECONDS, issue_state, verify_state};
