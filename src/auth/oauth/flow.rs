//! Federated login outcomes.
//!
//! An attempt ends in exactly one of two places: the success redirect with
//! `?token=`, or the failure redirect with `?error=access_denied`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::auth::employee_store::{CredentialStore, FederatedProfile, Provisioned};
use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::provider::{OAuthProvider, ProviderProfile};
use crate::auth::oauth::state::{issue_state, verify_state};
use crate::auth::role::{Role, RolePolicy};
use crate::auth::token::{TokenService, fingerprint};
use crate::types::{Email, ProviderName};

/// Error marker appended to the failure redirect.
pub const ACCESS_DENIED: &str = "access_denied";

/// Front-end landing pages for both outcomes.
#[derive(Debug, Clone)]
pub struct FrontendRedirects {
    pub success: Url,
    pub failure: Url,
}

/// Query parameters a provider sends back to the callback URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Local employee bookkeeping that did not work out. Never blocks the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningWarning {
    /// Lookup-only mode and no employee has this email.
    EmployeeNotFound,
    /// The store errored while finding or creating the employee.
    StoreFailure(String),
}

impl std::fmt::Display for ProvisioningWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmployeeNotFound => write!(f, "no local employee record"),
            Self::StoreFailure(msg) => write!(f, "employee store failed: {}", msg),
        }
    }
}

/// Where a federated login attempt ended up.
#[derive(Debug, Clone)]
pub enum OAuthOutcome {
    Authenticated {
        redirect: Url,
        email: Email,
        role: Role,
        warning: Option<ProvisioningWarning>,
    },
    Denied {
        redirect: Url,
        reason: OAuthError,
    },
}

impl OAuthOutcome {
    pub fn redirect(&self) -> &Url {
        match self {
            Self::Authenticated { redirect, .. } | Self::Denied { redirect, .. } => redirect,
        }
    }
}

/// Drives the authorization-code flow for every registered provider.
pub struct OAuthFlow {
    tokens: Arc<TokenService>,
    roles: Arc<dyn RolePolicy>,
    store: Arc<dyn CredentialStore>,
    redirects: FrontendRedirects,
    providers: BTreeMap<ProviderName, Arc<dyn OAuthProvider>>,
    provision_employees: bool,
}

impl OAuthFlow {
    pub fn new(
        tokens: Arc<TokenService>,
        roles: Arc<dyn RolePolicy>,
        store: Arc<dyn CredentialStore>,
        redirects: FrontendRedirects,
    ) -> Self {
        Self {
            tokens,
            roles,
            store,
            redirects,
            providers: BTreeMap::new(),
            provision_employees: true,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.providers.insert(provider.name().clone(), provider);
        self
    }

    /// When false, the success path only looks employees up and reports a
    /// missing record as a warning instead of creating one.
    pub fn with_provisioning(mut self, enabled: bool) -> Self {
        self.provision_employees = enabled;
        self
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &ProviderName> {
        self.providers.keys()
    }

    /// Authorization URL to send the user agent to.
    pub fn begin(&self, provider: &str) -> Result<Url, OAuthError> {
        let handler = self
            .providers
            .get(provider)
            .ok_or_else(|| OAuthError::UnknownProvider(provider.to_string()))?;

        let state = issue_state(&self.tokens, provider)?;
        handler.authorization_url(&state)
    }

    /// Handle the provider callback. Never fails: problems become a
    /// [`OAuthOutcome::Denied`].
    pub async fn complete(&self, provider: &str, params: CallbackParams) -> OAuthOutcome {
        match self.resolve_profile(provider, params).await {
            Ok(profile) => self.on_success(profile).await,
            Err(reason) => self.on_failure(reason),
        }
    }

    async fn resolve_profile(
        &self,
        provider: &str,
        params: CallbackParams,
    ) -> Result<FederatedProfile, OAuthError> {
        if let Some(error) = params.error {
            let detail = params
                .error_description
                .map(|d| format!("{}: {}", error, d))
                .unwrap_or(error);
            return Err(OAuthError::ProviderDenied(detail));
        }

        let handler = self
            .providers
            .get(provider)
            .ok_or_else(|| OAuthError::UnknownProvider(provider.to_string()))?;

        let state = params
            .state
            .ok_or_else(|| OAuthError::InvalidState("missing".to_string()))?;
        verify_state(&self.tokens, &state, provider)?;

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(OAuthError::MissingCode)?;

        let profile = handler.exchange_code(&code).await?;
        federated_profile(profile)
    }

    /// Success handler: role, best-effort employee upsert, token, redirect.
    pub async fn on_success(&self, profile: FederatedProfile) -> OAuthOutcome {
        let role = self.roles.determine_role(&profile.email);
        let warning = self.provision(&profile).await;

        if let Some(warning) = &warning {
            warn!(
                email = %profile.email,
                warning = %warning,
                "employee provisioning failed; continuing federated login"
            );
        }

        let token = match self.tokens.issue(&profile.email, role) {
            Ok(token) => token,
            Err(e) => return self.on_failure(OAuthError::Internal(e.to_string())),
        };

        info!(
            email = %profile.email,
            role = %role,
            token = %fingerprint(&token),
            "federated login succeeded"
        );

        let mut redirect = self.redirects.success.clone();
        redirect.query_pairs_mut().append_pair("token", &token);

        OAuthOutcome::Authenticated {
            redirect,
            email: Email::new(profile.email),
            role,
            warning,
        }
    }

    /// Failure handler: no token, no identity, just the error marker.
    pub fn on_failure(&self, reason: OAuthError) -> OAuthOutcome {
        warn!(reason = %reason, "federated login denied");

        let mut redirect = self.redirects.failure.clone();
        redirect.query_pairs_mut().append_pair("error", ACCESS_DENIED);

        OAuthOutcome::Denied { redirect, reason }
    }

    async fn provision(&self, profile: &FederatedProfile) -> Option<ProvisioningWarning> {
        if self.provision_employees {
            return match self.store.find_or_create(profile).await {
                Ok(Provisioned::Created(e)) => {
                    info!(employee = %e.id, "provisioned employee from federated login");
                    None
                }
                Ok(Provisioned::Existing(_)) => None,
                Err(e) => Some(ProvisioningWarning::StoreFailure(e.to_string())),
            };
        }

        match self.store.find_one(&profile.email).await {
            Ok(Some(_)) => None,
            Ok(None) => Some(ProvisioningWarning::EmployeeNotFound),
            Err(e) => Some(ProvisioningWarning::StoreFailure(e.to_string())),
        }
    }
}

fn federated_profile(profile: ProviderProfile) -> Result<FederatedProfile, OAuthError> {
    let email = profile
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| OAuthError::Profile("no email".to_string()))?;

    if profile.email_verified == Some(false) {
        return Err(OAuthError::Profile("email not verified".to_string()));
    }

    Ok(FederatedProfile {
        email,
        given_name: profile.given_name,
        family_name: profile.family_name,
    })
}
