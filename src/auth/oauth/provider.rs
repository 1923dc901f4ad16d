//! Identity provider clients.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::oauth::error::{OAuthError, OAuthResult};
use crate::types::ProviderName;

/// Registration of one authorization-code provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where we send the user agent to sign in.
    #[serde(default = "google_authorization_url")]
    pub authorization_url: String,
    #[serde(default = "google_token_url")]
    pub token_url: String,
    #[serde(default = "google_userinfo_url")]
    pub userinfo_url: String,
    /// Our `/login/oauth2/code/{provider}` URL as registered with the provider.
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn google_authorization_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn google_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "email".to_string(), "profile".to_string()]
}

impl OAuthProviderConfig {
    /// Google registration with the standard endpoints and scopes.
    pub fn google(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            authorization_url: google_authorization_url(),
            token_url: google_token_url(),
            userinfo_url: google_userinfo_url(),
            redirect_uri,
            scopes: default_scopes(),
        }
    }
}

/// Userinfo fields we care about (OIDC standard claim names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

/// An OAuth2 authorization-code identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &ProviderName;

    /// URL that starts the sign-in at the provider, carrying `state`.
    fn authorization_url(&self, state: &str) -> OAuthResult<Url>;

    /// Trade the callback `code` for the signed-in user's profile.
    async fn exchange_code(&self, code: &str) -> OAuthResult<ProviderProfile>;
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
}

/// [`OAuthProvider`] talking to real HTTP endpoints.
pub struct HttpOAuthProvider {
    name: ProviderName,
    config: OAuthProviderConfig,
    client: reqwest::Client,
}

impl HttpOAuthProvider {
    pub fn new(name: ProviderName, config: OAuthProviderConfig) -> OAuthResult<Self> {
        for (field, value) in [
            ("authorization_url", &config.authorization_url),
            ("token_url", &config.token_url),
            ("userinfo_url", &config.userinfo_url),
            ("redirect_uri", &config.redirect_uri),
        ] {
            Url::parse(value)
                .map_err(|e| OAuthError::Config(format!("{} for {}: {}", field, name, e)))?;
        }

        if config.client_id.is_empty() {
            return Err(OAuthError::Config(format!("client_id for {} is empty", name)));
        }

        Ok(Self {
            name,
            config,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl OAuthProvider for HttpOAuthProvider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    fn authorization_url(&self, state: &str) -> OAuthResult<Url> {
        let mut url = Url::parse(&self.config.authorization_url)
            .map_err(|e| OAuthError::Config(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> OAuthResult<ProviderProfile> {
        let token: TokenEndpointResponse = self
            .client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OAuthError::Exchange(format!("token endpoint: {}", e)))?
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(format!("token response: {}", e)))?;

        debug!(provider = %self.name, "authorization code exchanged");

        self.client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OAuthError::Exchange(format!("userinfo endpoint: {}", e)))?
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(format!("userinfo response: {}", e)))
    }
}
