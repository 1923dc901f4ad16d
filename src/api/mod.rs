// HTTP surface: login, OAuth2 redirects, student queries

mod error;

pub use error::ApiError;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::Redirect,
    routing::{get, post},
};
use http::{HeaderValue, Method, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::oauth::{CallbackParams, HttpOAuthProvider, OAuthFlow};
use crate::auth::{
    AuthError, AuthGate, AuthenticatedIdentity, CredentialStore, EmailPrefixPolicy, EmployeeStore,
    PasswordAuthenticator, Role, RolePolicy, TokenService, fingerprint, require_auth,
};
use crate::config::AppConfig;
use crate::db::Db;
use crate::students::{StudentDirectory, StudentPlacement};
use crate::types::ProviderName;

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub roles: Arc<dyn RolePolicy>,
    pub passwords: Arc<PasswordAuthenticator>,
    pub oauth: Arc<OAuthFlow>,
    pub students: StudentDirectory,
    pub gate: AuthGate,
}

impl AppState {
    /// Wire every service from configuration over an open database.
    pub fn from_config(config: &AppConfig, db: Db) -> anyhow::Result<Self> {
        let tokens = Arc::new(config.token_service()?);
        let roles: Arc<dyn RolePolicy> = Arc::new(EmailPrefixPolicy);
        let store: Arc<dyn CredentialStore> = Arc::new(EmployeeStore::new(db.clone()));

        let mut oauth = OAuthFlow::new(
            tokens.clone(),
            roles.clone(),
            store.clone(),
            config.frontend_redirects()?,
        )
        .with_provisioning(config.oauth.provision_employees);

        for (name, registration) in &config.oauth.providers {
            let provider =
                HttpOAuthProvider::new(ProviderName::new(name.clone()), registration.clone())?;
            info!(provider = %name, "registered OAuth2 provider");
            oauth = oauth.with_provider(Arc::new(provider));
        }

        let gate = AuthGate::new(
            tokens.clone(),
            roles.clone(),
            Arc::new(config.auth.access_policy.clone()),
        );

        Ok(Self {
            tokens,
            roles,
            passwords: Arc::new(PasswordAuthenticator::new(store)),
            oauth: Arc::new(oauth),
            students: StudentDirectory::new(db),
            gate,
        })
    }
}

/// CORS for the configured front-end origins, with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Build the application router.
///
/// The auth gate wraps every route (and the fallback), so a protected path
/// is rejected before routing. CORS sits outside the gate so preflight
/// requests never need a token.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(login))
        .route("/api/auth/providers", get(list_providers))
        .route("/api/me", get(me))
        .route("/student", get(list_students))
        .route("/student/", get(list_students))
        .route("/student/{keyword}", get(search_students))
        .route("/oauth2/authorization/{provider}", get(oauth_begin))
        .route("/login/oauth2/code/{provider}", get(oauth_callback))
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_auth,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub role: Role,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let employee = state
        .passwords
        .authenticate(&req.email, &req.password)
        .await
        .inspect_err(|e| warn!(error = %e, "password login failed"))?;

    let role = state.roles.determine_role(&employee.email);
    let token = state.tokens.issue(&employee.email, role)?;

    info!(
        employee = %employee.id,
        role = %role,
        token = %fingerprint(&token),
        "password login succeeded"
    );

    Ok(Json(LoginResponse {
        token,
        email: employee.email,
        role,
    }))
}

async fn list_providers(State(state): State<AppState>) -> Json<Value> {
    let providers: Vec<&str> = state.oauth.provider_names().map(|p| p.as_str()).collect();
    Json(serde_json::json!({ "providers": providers }))
}

async fn me(identity: AuthenticatedIdentity) -> Json<Value> {
    Json(serde_json::json!({
        "email": identity.email(),
        "role": identity.role(),
        "expiresAt": identity.expires_at().to_rfc3339(),
    }))
}

async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentPlacement>>, ApiError> {
    Ok(Json(state.students.all().await?))
}

async fn search_students(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> Result<Json<Vec<StudentPlacement>>, ApiError> {
    Ok(Json(state.students.by_keyword(&keyword).await?))
}

async fn oauth_begin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, ApiError> {
    let url = state.oauth.begin(&provider)?;
    Ok(Redirect::to(url.as_str()))
}

async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let outcome = state.oauth.complete(&provider, params).await;
    Redirect::to(outcome.redirect().as_str())
}
