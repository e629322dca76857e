use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::error::AppError;
use crate::services::auth::{AuthService, SessionInfo};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub session: SessionInfo,
}

async fn issue_session(state: &Arc<AppState>, user: User) -> Result<Json<AuthResponse>, AppError> {
    let token = AuthService::create_jwt(state, &user.id)?;
    let session = AuthService::session_info(state, user).await?;

    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: state.config.jwt.expiration_hours * 3600,
        session,
    }))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = AuthService::register(
        &state,
        &request.email,
        &request.password,
        request.display_name.as_deref(),
    )
    .await?;
    issue_session(&state, user).await
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = AuthService::login(&state, &request.email, &request.password).await?;
    tracing::info!("User {} logged in", user.id);
    issue_session(&state, user).await
}

/// Current user, family and roles
async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<SessionInfo>, AppError> {
    Ok(Json(AuthService::session_info(&state, user).await?))
}

// ============================================================================
// Auth Extractor
// ============================================================================

/// Extractor for the authenticated user. Use `Option<AuthUser>` where
/// authentication is optional.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    tracing::debug!("Missing or invalid Authorization header: {}", e);
                    AppError::Unauthorized
                })?;

        let token = bearer.token().trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let user = AuthService::get_user_from_token(state, token)
            .await
            .map_err(|e| {
                tracing::debug!("Failed to get user from token: {:?}", e);
                e
            })?;

        tracing::debug!("Authenticated user: {}", user.id);
        Ok(AuthUser(user))
    }
}
