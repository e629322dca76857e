use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::Banner;
use crate::error::AppError;
use crate::routes::SuccessResponse;
use crate::services::banners::BannerService;
use crate::AppState;

/// Public banner feed. No session needed.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_banners))
        .route("/:id/click", post(record_click))
}

#[derive(Debug, Deserialize)]
pub struct BannerQuery {
    pub position: Option<String>,
}

async fn list_banners(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BannerQuery>,
) -> Result<Json<Vec<Banner>>, AppError> {
    Ok(Json(
        BannerService::list_public(&state, query.position.as_deref()).await?,
    ))
}

async fn record_click(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    BannerService::record_click(&state, &id).await?;
    Ok(Json(SuccessResponse::ok()))
}
