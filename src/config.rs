use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, env, fs, path::{Path, PathBuf}};
use url::Url;

use crate::auth::oauth::{FrontendRedirects, OAuthProviderConfig};
use crate::auth::{AccessPolicy, DEFAULT_TOKEN_TTL_SECONDS, MAX_TOKEN_TTL_SECONDS, TokenService};
use crate::db::DatabaseConfig;

/// Top-level configuration document (`placement.json`).
///
/// Every section is optional; missing fields fall back to local-development
/// defaults. String values may reference environment variables as `${NAME}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthSettings,
    pub frontend: FrontendConfig,
    pub oauth: OAuthConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:9191".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for signing tokens. Required to serve.
    pub jwt_secret: Option<String>,
    pub token_ttl_seconds: u64,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_seconds: u64,
    /// Paths reachable without a token.
    pub access_policy: AccessPolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            leeway_seconds: 0,
            access_policy: AccessPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Where a successful federated login lands (`?token=` is appended).
    pub success_redirect: String,
    /// Where a failed federated login lands (`?error=access_denied` is appended).
    pub failure_redirect: String,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            success_redirect: "http://localhost:3000/login".to_string(),
            failure_redirect: "http://localhost:3000/login".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:9191".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Create employee records on first federated login.
    pub provision_employees: bool,
    /// Registered providers keyed by the name used in URLs.
    pub providers: BTreeMap<String, OAuthProviderConfig>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provision_employees: true,
            providers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or use defaults when there is no file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&raw, |name| env::var(name).ok())
            .with_context(|| format!("parsing config {}", path.display()))
    }

    fn from_json_str(
        raw: &str,
        lookup: impl Fn(&str) -> Option<String> + Copy,
    ) -> anyhow::Result<Self> {
        let mut value: Value = serde_json::from_str(raw)?;
        expand_value(&mut value, lookup);
        Ok(serde_json::from_value(value)?)
    }

    /// Signing service built from `auth`. Fails if no usable secret is set.
    pub fn token_service(&self) -> anyhow::Result<TokenService> {
        let secret = self
            .auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow!("auth.jwt_secret is not set (use --jwt-secret or PLACEMENT_JWT_SECRET)")
            })?;

        TokenService::new(
            secret.as_bytes(),
            self.auth.token_ttl_seconds,
            self.auth.leeway_seconds,
        )
        .map_err(|e| anyhow!("{}", e))
    }

    pub fn frontend_redirects(&self) -> anyhow::Result<FrontendRedirects> {
        Ok(FrontendRedirects {
            success: Url::parse(&self.frontend.success_redirect)
                .context("frontend.success_redirect")?,
            failure: Url::parse(&self.frontend.failure_redirect)
                .context("frontend.failure_redirect")?,
        })
    }

    /// Check everything the server needs before binding.
    pub fn validate(&self) -> anyhow::Result<()> {
        let ttl = self.auth.token_ttl_seconds;
        if ttl == 0 || ttl > MAX_TOKEN_TTL_SECONDS {
            return Err(anyhow!(
                "auth.token_ttl_seconds must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECONDS,
                ttl
            ));
        }

        self.token_service()?;
        self.frontend_redirects()?;

        for origin in &self.frontend.allowed_origins {
            Url::parse(origin).with_context(|| format!("frontend.allowed_origins: {}", origin))?;
        }

        Ok(())
    }
}

/// Pick the config file: explicit flag, then `PLACEMENT_CONFIG`, then
/// `./placement.json` if present.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p);
    }

    if let Ok(p) = env::var("PLACEMENT_CONFIG") {
        return Some(PathBuf::from(p));
    }

    let candidate = PathBuf::from("placement.json");
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

fn expand_value(value: &mut Value, lookup: impl Fn(&str) -> Option<String> + Copy) {
    match value {
        Value::String(s) => *s = expand_env_vars(s, lookup),
        Value::Array(items) => items.iter_mut().for_each(|v| expand_value(v, lookup)),
        Value::Object(map) => map.values_mut().for_each(|v| expand_value(v, lookup)),
        _ => {}
    }
}

/// Replace `${NAME}` with the variable's value. Unknown variables are left as-is.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            match lookup(&name) {
                Some(val) if closed => out.push_str(&val),
                _ => {
                    out.push_str("${");
                    out.push_str(&name);
                    if closed {
                        out.push('}');
                    }
                }
            }
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "JWT_SECRET" => Some("0123456789abcdef0123456789abcdef".to_string()),
            "GOOGLE_ID" => Some("google-client".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_env_vars() {
        assert_eq!(expand_env_vars("${GOOGLE_ID}", lookup), "google-client");
        assert_eq!(expand_env_vars("id=${GOOGLE_ID}!", lookup), "id=google-client!");
        assert_eq!(expand_env_vars("${MISSING}", lookup), "${MISSING}");
        assert_eq!(expand_env_vars("${GOOGLE_ID", lookup), "${GOOGLE_ID");
        assert_eq!(expand_env_vars("$5 and {x}", lookup), "$5 and {x}");
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:9191");
        assert_eq!(config.auth.token_ttl_seconds, DEFAULT_TOKEN_TTL_SECONDS);
        assert!(config.oauth.provision_employees);
        assert!(config.oauth.providers.is_empty());
        assert_eq!(config.frontend.allowed_origins.len(), 2);
        assert!(config.auth.access_policy.is_public("/api/auth/login"));
    }

    #[test]
    fn test_defaults_do_not_validate_without_secret() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_parse_with_expansion() {
        let raw = r#"{
            "auth": { "jwt_secret": "${JWT_SECRET}", "token_ttl_seconds": 900 },
            "frontend": { "success_redirect": "https://app.example.edu/login" },
            "oauth": {
                "provision_employees": false,
                "providers": {
                    "google": {
                        "client_id": "${GOOGLE_ID}",
                        "client_secret": "${GOOGLE_SECRET}",
                        "redirect_uri": "https://api.example.edu/login/oauth2/code/google"
                    }
                }
            }
        }"#;

        let config = AppConfig::from_json_str(raw, lookup).unwrap();
        assert_eq!(
            config.auth.jwt_secret.as_deref(),
            Some("0123456789abcdef0123456789abcdef")
        );
        assert_eq!(config.auth.token_ttl_seconds, 900);
        assert!(!config.oauth.provision_employees);
        assert_eq!(config.oauth.providers["google"].client_id, "google-client");
        assert_eq!(config.oauth.providers["google"].client_secret, "${GOOGLE_SECRET}");
        // untouched sections keep their defaults
        assert_eq!(config.frontend.failure_redirect, "http://localhost:3000/login");
        assert_eq!(config.server.bind, "0.0.0.0:9191");

        config.validate().unwrap();
        assert_eq!(config.token_service().unwrap().ttl().num_seconds(), 900);
    }

    #[test]
    fn test_custom_public_paths() {
        let raw = r#"{ "auth": { "access_policy": { "public": ["/health", "/api/auth/**"] } } }"#;
        let config = AppConfig::from_json_str(raw, lookup).unwrap();

        assert!(config.auth.access_policy.is_public("/health"));
        assert!(!config.auth.access_policy.is_public("/oauth2/authorization/google"));
    }

    #[test]
    fn test_bad_public_path_is_rejected() {
        let raw = r#"{ "auth": { "access_policy": { "public": ["api/**"] } } }"#;
        assert!(AppConfig::from_json_str(raw, lookup).is_err());
    }

    #[test]
    fn test_bad_redirect_fails_validation() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = lookup("JWT_SECRET");
        config.frontend.success_redirect = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = lookup("JWT_SECRET");

        for ttl in [0, MAX_TOKEN_TTL_SECONDS + 1, 10_000_000_000_000, i64::MAX as u64] {
            config.auth.token_ttl_seconds = ttl;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("token_ttl_seconds"), "ttl {ttl}: {err}");
        }

        config.auth.token_ttl_seconds = MAX_TOKEN_TTL_SECONDS;
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "server": {{ "bind": "127.0.0.1:8088" }} }}"#).unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8088");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9191");
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.json"))).is_err());
    }
}
