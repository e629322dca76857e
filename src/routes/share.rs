use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::ShareToken;
use crate::error::AppError;
use crate::i18n;
use crate::routes::auth::AuthUser;
use crate::routes::SuccessResponse;
use crate::services::share::{IssuedToken, SharedPetView, ShareTokenService};
use crate::AppState;

/// Authenticated management endpoints, nested under `/api/pets`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/:id/share",
        get(list_tokens).post(issue_token).delete(revoke_token),
    )
}

/// Public read-only view, mounted at `/share`.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new().route("/:token", get(resolve_token))
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueRequest {
    #[serde(rename = "expirationDays", alias = "expiration_days")]
    pub expiration_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeQuery {
    #[serde(rename = "tokenId", alias = "token_id")]
    pub token_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenList {
    pub tokens: Vec<ShareToken>,
}

/// An empty body means "use the defaults"; anything else must be a valid
/// `IssueRequest`.
fn parse_issue_request(body: &[u8]) -> Result<IssueRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(IssueRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::Validation(i18n::t_with(
            "validation.invalid_body",
            &[("reason", &e.to_string())],
        ))
    })
}

async fn issue_token(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    body: Bytes,
) -> Result<Json<IssuedToken>, AppError> {
    let request = parse_issue_request(&body)?;
    Ok(Json(
        ShareTokenService::issue(&state, &user, &pet_id, request.expiration_days).await?,
    ))
}

async fn list_tokens(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
) -> Result<Json<TokenList>, AppError> {
    let tokens = ShareTokenService::list(&state, &user, &pet_id).await?;
    Ok(Json(TokenList { tokens }))
}

async fn revoke_token(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Query(query): Query<RevokeQuery>,
) -> Result<Json<SuccessResponse>, AppError> {
    let token_id = query
        .token_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(i18n::t("bad_request.token_id_required")))?;

    ShareTokenService::revoke(&state, &user, &pet_id, &token_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Every failure looks the same to the link holder.
async fn resolve_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<SharedPetView>, AppError> {
    ShareTokenService::resolve(&state, &token)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(i18n::t("not_found.share_link")))
}
