use std::sync::Arc;

use axum::body::Bytes;
use serde::Serialize;

use crate::db::{FoodProduct, FoodProductFilter, FoodProductInput, FoodProductRepository, User};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::AccessService;
use crate::services::calories;
use crate::services::storage::{self, BUCKET_MEAL_IMAGES};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CaloriePreview {
    pub food_product_id: String,
    pub calories_per_100g: f64,
    pub amount_grams: f64,
    pub calories: f64,
}

fn not_found() -> AppError {
    AppError::NotFound(i18n::t("not_found.food_product"))
}

fn validate(input: &FoodProductInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation(i18n::t_with(
            "validation.required",
            &[("field", "name")],
        )));
    }
    calories::check_non_negative("calories_per_100g", input.calories_per_100g)
}

pub struct FoodProductService;

impl FoodProductService {
    // ========================================================================
    // User catalog
    // ========================================================================

    pub async fn list_visible(
        state: &Arc<AppState>,
        user: &User,
        filter: &FoodProductFilter,
    ) -> AppResult<Vec<FoodProduct>> {
        FoodProductRepository::list_visible(&state.db, &user.id, filter).await
    }

    /// Users can only add private products; `is_public` is ignored.
    pub async fn create_private(
        state: &Arc<AppState>,
        user: &User,
        input: &FoodProductInput,
    ) -> AppResult<FoodProduct> {
        validate(input)?;
        let product = FoodProductRepository::create(&state.db, input, false, Some(&user.id)).await?;
        tracing::info!("User {} added private food product {}", user.id, product.id);
        Ok(product)
    }

    /// The caller's own private product, or NOT_FOUND.
    async fn own_private(state: &Arc<AppState>, user: &User, id: &str) -> AppResult<FoodProduct> {
        FoodProductRepository::find_by_id(&state.db, id)
            .await?
            .filter(|p| !p.is_public && p.created_by.as_deref() == Some(user.id.as_str()))
            .ok_or_else(not_found)
    }

    pub async fn update_own(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        input: &FoodProductInput,
    ) -> AppResult<FoodProduct> {
        let product = Self::own_private(state, user, id).await?;
        validate(input)?;
        FoodProductRepository::update(&state.db, &product.id, input, false)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete_own(state: &Arc<AppState>, user: &User, id: &str) -> AppResult<()> {
        let product = Self::own_private(state, user, id).await?;
        FoodProductRepository::delete(&state.db, &product.id).await?;
        storage::remove_replaced(state.storage.as_ref(), product.image_url.as_deref()).await;
        Ok(())
    }

    pub async fn preview_calories(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        amount_grams: f64,
    ) -> AppResult<CaloriePreview> {
        let product = FoodProductRepository::find_by_id(&state.db, id)
            .await?
            .filter(|p| p.is_visible_to(&user.id))
            .ok_or_else(not_found)?;

        Ok(CaloriePreview {
            calories: calories::compute(product.calories_per_100g, amount_grams)?,
            food_product_id: product.id,
            calories_per_100g: product.calories_per_100g,
            amount_grams,
        })
    }

    // ========================================================================
    // Admin catalog
    // ========================================================================

    pub async fn admin_list(
        state: &Arc<AppState>,
        user: &User,
        filter: &FoodProductFilter,
    ) -> AppResult<Vec<FoodProduct>> {
        AccessService::require_system_admin(state, user).await?;
        FoodProductRepository::list_all(&state.db, filter).await
    }

    pub async fn admin_create(
        state: &Arc<AppState>,
        user: &User,
        input: &FoodProductInput,
    ) -> AppResult<FoodProduct> {
        AccessService::require_system_admin(state, user).await?;
        validate(input)?;
        let product = FoodProductRepository::create(
            &state.db,
            input,
            input.is_public.unwrap_or(true),
            Some(&user.id),
        )
        .await?;
        tracing::info!("Admin {} created food product {}", user.id, product.id);
        Ok(product)
    }

    pub async fn admin_update(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        input: &FoodProductInput,
    ) -> AppResult<FoodProduct> {
        AccessService::require_system_admin(state, user).await?;
        validate(input)?;
        let existing = FoodProductRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(not_found)?;

        FoodProductRepository::update(
            &state.db,
            &existing.id,
            input,
            input.is_public.unwrap_or(existing.is_public),
        )
        .await?
        .ok_or_else(not_found)
    }

    pub async fn admin_delete(state: &Arc<AppState>, user: &User, id: &str) -> AppResult<()> {
        AccessService::require_system_admin(state, user).await?;
        let product = FoodProductRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(not_found)?;

        FoodProductRepository::delete(&state.db, &product.id).await?;
        storage::remove_replaced(state.storage.as_ref(), product.image_url.as_deref()).await;
        tracing::info!("Admin {} deleted food product {}", user.id, product.id);
        Ok(())
    }

    pub async fn admin_upload_image(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        filename: &str,
        data: Bytes,
    ) -> AppResult<FoodProduct> {
        AccessService::require_system_admin(state, user).await?;
        let product = FoodProductRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(not_found)?;

        let url = storage::store_image(
            state.storage.as_ref(),
            BUCKET_MEAL_IMAGES,
            None,
            filename,
            data,
            state.config.storage.max_upload_bytes,
        )
        .await?;

        let updated = FoodProductRepository::set_image(&state.db, &product.id, &url)
            .await?
            .ok_or_else(not_found)?;
        storage::remove_replaced(state.storage.as_ref(), product.image_url.as_deref()).await;
        Ok(updated)
    }
}
