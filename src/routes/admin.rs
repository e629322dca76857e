//! System administration: catalog, banners and statistics.
//! Every route except `/check` requires a system admin.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{
    Banner, BannerInput, FoodProduct, FoodProductFilter, FoodProductInput, MoveDirection,
    SystemStatistics,
};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::{read_upload, SuccessResponse};
use crate::services::admin::{AdminCheck, AdminService};
use crate::services::banners::BannerService;
use crate::services::food_products::FoodProductService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/check", get(check))
        .route("/stats", get(stats))
        .route("/food-products", get(list_products).post(create_product))
        .route("/food-products/:id", put(update_product).delete(delete_product))
        .route("/food-products/:id/image", post(upload_product_image))
        .route("/banners", get(list_banners).post(create_banner))
        .route("/banners/:id", put(update_banner).delete(delete_banner))
        .route("/banners/:id/toggle", post(toggle_banner))
        .route("/banners/:id/move", post(move_banner))
        .route("/banners/:id/image", post(upload_banner_image))
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: MoveDirection,
}

async fn check(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
) -> Result<Json<AdminCheck>, AppError> {
    let user = user.map(|AuthUser(u)| u);
    Ok(Json(AdminService::check(&state, user.as_ref()).await?))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<SystemStatistics>, AppError> {
    Ok(Json(AdminService::stats(&state, &user).await?))
}

// ============================================================================
// Food product catalog
// ============================================================================

async fn list_products(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<FoodProductFilter>,
) -> Result<Json<Vec<FoodProduct>>, AppError> {
    Ok(Json(FoodProductService::admin_list(&state, &user, &filter).await?))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<FoodProductInput>,
) -> Result<Json<FoodProduct>, AppError> {
    Ok(Json(FoodProductService::admin_create(&state, &user, &input).await?))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<FoodProductInput>,
) -> Result<Json<FoodProduct>, AppError> {
    Ok(Json(
        FoodProductService::admin_update(&state, &user, &id, &input).await?,
    ))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    FoodProductService::admin_delete(&state, &user, &id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn upload_product_image(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<FoodProduct>, AppError> {
    let (filename, data) = read_upload(multipart).await?;
    Ok(Json(
        FoodProductService::admin_upload_image(&state, &user, &id, &filename, data).await?,
    ))
}

// ============================================================================
// Banners
// ============================================================================

async fn list_banners(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Banner>>, AppError> {
    Ok(Json(BannerService::admin_list(&state, &user).await?))
}

async fn create_banner(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>, AppError> {
    Ok(Json(BannerService::create(&state, &user, &input).await?))
}

async fn update_banner(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>, AppError> {
    Ok(Json(BannerService::update(&state, &user, &id, &input).await?))
}

async fn delete_banner(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    BannerService::delete(&state, &user, &id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn toggle_banner(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Banner>, AppError> {
    Ok(Json(BannerService::toggle(&state, &user, &id).await?))
}

async fn move_banner(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Vec<Banner>>, AppError> {
    Ok(Json(
        BannerService::move_banner(&state, &user, &id, request.direction).await?,
    ))
}

async fn upload_banner_image(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Banner>, AppError> {
    let (filename, data) = read_upload(multipart).await?;
    Ok(Json(
        BannerService::upload_image(&state, &user, &id, &filename, data).await?,
    ))
}
