//! Route access policy.
//!
//! One table decides which paths skip the auth gate. Anything not listed
//! needs a valid bearer token.

use serde::{Deserialize, Serialize};

/// A single allow-list entry.
///
/// Patterns use the familiar glob shorthand: a trailing `/**` matches the
/// prefix itself and everything below it; any other pattern matches exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if !pattern.starts_with('/') {
            return Err(format!("path pattern must start with '/': {}", pattern));
        }

        if let Some(prefix) = pattern.strip_suffix("/**") {
            if prefix.contains('*') {
                return Err(format!("wildcards are only allowed as a trailing /**: {}", pattern));
            }
            return Ok(Self::Subtree(prefix.to_string()));
        }

        if pattern.contains('*') {
            return Err(format!("wildcards are only allowed as a trailing /**: {}", pattern));
        }

        Ok(Self::Exact(pattern.to_string()))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Subtree(prefix) => {
                if prefix.is_empty() {
                    return true;
                }
                match path.strip_prefix(prefix.as_str()) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                }
            }
        }
    }
}

impl TryFrom<String> for PathPattern {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(pattern: PathPattern) -> Self {
        match pattern {
            PathPattern::Exact(p) => p,
            PathPattern::Subtree(prefix) => format!("{}/**", prefix),
        }
    }
}

/// Public routes served without authentication.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    // password login and provider listing
    "/api/auth/**",
    "/api/v1/auth/**",
    // OAuth2 entry and provider callbacks
    "/oauth2/**",
    "/login/oauth2/**",
    // API documentation
    "/v3/api-docs/**",
    "/swagger-ui/**",
    "/swagger-ui.html",
    // informational
    "/health",
];

/// Allow-list of public paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    public: Vec<PathPattern>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from_patterns(DEFAULT_PUBLIC_PATHS.iter().copied())
            .expect("built-in public path table is valid")
    }
}

impl AccessPolicy {
    pub fn from_patterns<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        let public = patterns
            .into_iter()
            .map(PathPattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { public })
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|p| p.matches(path))
    }

    pub fn requires_auth(&self, path: &str) -> bool {
        !self.is_public(path)
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.public
    }
}
