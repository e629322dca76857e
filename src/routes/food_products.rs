use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{FoodProduct, FoodProductFilter, FoodProductInput};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::SuccessResponse;
use crate::services::food_products::{CaloriePreview, FoodProductService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
        .route("/:id/calories", post(preview_calories))
}

#[derive(Debug, Deserialize)]
pub struct CaloriesRequest {
    #[serde(alias = "amountGrams")]
    pub amount_grams: f64,
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<FoodProductFilter>,
) -> Result<Json<Vec<FoodProduct>>, AppError> {
    Ok(Json(FoodProductService::list_visible(&state, &user, &filter).await?))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<FoodProductInput>,
) -> Result<Json<FoodProduct>, AppError> {
    Ok(Json(FoodProductService::create_private(&state, &user, &input).await?))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<FoodProductInput>,
) -> Result<Json<FoodProduct>, AppError> {
    Ok(Json(FoodProductService::update_own(&state, &user, &id, &input).await?))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    FoodProductService::delete_own(&state, &user, &id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn preview_calories(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CaloriesRequest>,
) -> Result<Json<CaloriePreview>, AppError> {
    Ok(Json(
        FoodProductService::preview_calories(&state, &user, &id, request.amount_grams).await?,
    ))
}
