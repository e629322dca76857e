//! Per-pet logs: walks, meals, health checks, medications, traits and custom fields.
//!
//! Every operation requires membership of the pet's family. Updates and
//! deletes are scoped by pet id, so a record id from another pet is NOT_FOUND.

use std::sync::Arc;

use crate::db::{
    DateRange, FoodProductRepository, HealthRecord, HealthRecordInput, HealthRecordRepository,
    Meal, MealInput, MealRepository, MedicationInput, MedicationLog, MedicationLogInput,
    MedicationRepository, MedicationWithLogs, Medication, Pet, PetMeta, PetMetaInput,
    PetMetaRepository, PetTrait, PetTraitInput, PetTraitRepository, User, Walk, WalkInput,
    WalkRepository,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::{AccessService, Role};
use crate::services::calories;
use crate::AppState;

/// Logs shown with each medication.
pub const RECENT_MEDICATION_LOGS: i64 = 5;

fn record_not_found() -> AppError {
    AppError::NotFound(i18n::t("not_found.record"))
}

fn required(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(i18n::t_with(
            "validation.required",
            &[("field", field)],
        )));
    }
    Ok(())
}

fn non_negative_int(field: &str, value: Option<i64>) -> AppResult<()> {
    match value {
        Some(v) if v < 0 => Err(AppError::Validation(i18n::t_with(
            "validation.non_negative",
            &[("field", field)],
        ))),
        _ => Ok(()),
    }
}

fn non_negative_float(field: &str, value: Option<f64>) -> AppResult<()> {
    match value {
        Some(v) => calories::check_non_negative(field, v),
        None => Ok(()),
    }
}

fn level(field: &str, value: Option<i64>) -> AppResult<()> {
    match value {
        Some(v) if !(1..=5).contains(&v) => Err(AppError::Validation(i18n::t_with(
            "validation.level_out_of_range",
            &[("field", field)],
        ))),
        _ => Ok(()),
    }
}

fn validate_walk(input: &WalkInput) -> AppResult<()> {
    non_negative_int("duration_minutes", input.duration_minutes)?;
    non_negative_float("distance_km", input.distance_km)
}

fn validate_health(input: &HealthRecordInput) -> AppResult<()> {
    level("appetite_level", input.appetite_level)?;
    level("mood_level", input.mood_level)?;
    level("activity_level", input.activity_level)?;
    non_negative_int("bathroom_times", input.bathroom_times)
}

fn validate_medication(input: &MedicationInput) -> AppResult<()> {
    required("medication_name", &input.medication_name)?;
    if let Some(end) = input.end_date {
        if end < input.start_date {
            return Err(AppError::Validation(i18n::t("validation.end_before_start")));
        }
    }
    Ok(())
}

pub struct RecordService;

impl RecordService {
    async fn pet(state: &Arc<AppState>, user: &User, pet_id: &str) -> AppResult<Pet> {
        AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await
    }

    // ------------------------------------------------------------------------
    // Walks
    // ------------------------------------------------------------------------

    pub async fn list_walks(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<Walk>> {
        let pet = Self::pet(state, user, pet_id).await?;
        WalkRepository::list(&state.db, &pet.id, range, None).await
    }

    pub async fn create_walk(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        input: &WalkInput,
    ) -> AppResult<Walk> {
        let pet = Self::pet(state, user, pet_id).await?;
        validate_walk(input)?;
        WalkRepository::create(&state.db, &pet.id, input).await
    }

    pub async fn update_walk(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        walk_id: &str,
        input: &WalkInput,
    ) -> AppResult<Walk> {
        let pet = Self::pet(state, user, pet_id).await?;
        validate_walk(input)?;
        WalkRepository::update(&state.db, &pet.id, walk_id, input)
            .await?
            .ok_or_else(record_not_found)
    }

    pub async fn delete_walk(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        walk_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        if !WalkRepository::delete(&state.db, &pet.id, walk_id).await? {
            return Err(record_not_found());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Meals
    // ------------------------------------------------------------------------

    /// Calories to store for a meal: derived when a product and gram amount
    /// are both given (the product must be usable by the caller), otherwise
    /// the manual entry.
    async fn meal_calories(
        state: &Arc<AppState>,
        user: &User,
        input: &MealInput,
    ) -> AppResult<Option<f64>> {
        non_negative_float("amount_grams", input.amount_grams)?;
        non_negative_float("calories", input.calories)?;

        let product_id = input
            .food_product_id
            .as_deref()
            .filter(|id| !id.is_empty());

        let Some(product_id) = product_id else {
            return Ok(input.calories);
        };

        let product = FoodProductRepository::find_by_id(&state.db, product_id)
            .await?
            .filter(|p| p.is_visible_to(&user.id))
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.food_product")))?;

        match input.amount_grams {
            Some(grams) => Ok(Some(calories::compute(product.calories_per_100g, grams)?)),
            None => Ok(input.calories),
        }
    }

    pub async fn list_meals(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<Meal>> {
        let pet = Self::pet(state, user, pet_id).await?;
        MealRepository::list(&state.db, &pet.id, range, None).await
    }

    pub async fn create_meal(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        input: &MealInput,
    ) -> AppResult<Meal> {
        let pet = Self::pet(state, user, pet_id).await?;
        let calories = Self::meal_calories(state, user, input).await?;
        MealRepository::create(&state.db, &pet.id, input, calories).await
    }

    pub async fn update_meal(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        meal_id: &str,
        input: &MealInput,
    ) -> AppResult<Meal> {
        let pet = Self::pet(state, user, pet_id).await?;
        let calories = Self::meal_calories(state, user, input).await?;
        MealRepository::update(&state.db, &pet.id, meal_id, input, calories)
            .await?
            .ok_or_else(record_not_found)
    }

    pub async fn delete_meal(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        meal_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        if !MealRepository::delete(&state.db, &pet.id, meal_id).await? {
            return Err(record_not_found());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Health records
    // ------------------------------------------------------------------------

    pub async fn list_health(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<HealthRecord>> {
        let pet = Self::pet(state, user, pet_id).await?;
        HealthRecordRepository::list(&state.db, &pet.id, range).await
    }

    pub async fn create_health(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        input: &HealthRecordInput,
    ) -> AppResult<HealthRecord> {
        let pet = Self::pet(state, user, pet_id).await?;
        validate_health(input)?;
        HealthRecordRepository::create(&state.db, &pet.id, input).await
    }

    pub async fn update_health(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        record_id: &str,
        input: &HealthRecordInput,
    ) -> AppResult<HealthRecord> {
        let pet = Self::pet(state, user, pet_id).await?;
        validate_health(input)?;
        HealthRecordRepository::update(&state.db, &pet.id, record_id, input)
            .await?
            .ok_or_else(record_not_found)
    }

    pub async fn delete_health(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        record_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        if !HealthRecordRepository::delete(&state.db, &pet.id, record_id).await? {
            return Err(record_not_found());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Medications
    // ------------------------------------------------------------------------

    pub async fn list_medications(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
    ) -> AppResult<Vec<MedicationWithLogs>> {
        let pet = Self::pet(state, user, pet_id).await?;
        let medications = MedicationRepository::list(&state.db, &pet.id).await?;

        let mut out = Vec::with_capacity(medications.len());
        for medication in medications {
            let logs =
                MedicationRepository::recent_logs(&state.db, &medication.id, RECENT_MEDICATION_LOGS)
                    .await?;
            out.push(MedicationWithLogs { medication, logs });
        }
        Ok(out)
    }

    pub async fn create_medication(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        input: &MedicationInput,
    ) -> AppResult<Medication> {
        let pet = Self::pet(state, user, pet_id).await?;
        validate_medication(input)?;
        MedicationRepository::create(&state.db, &pet.id, input).await
    }

    pub async fn update_medication(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        medication_id: &str,
        input: &MedicationInput,
    ) -> AppResult<Medication> {
        let pet = Self::pet(state, user, pet_id).await?;
        validate_medication(input)?;
        MedicationRepository::update(&state.db, &pet.id, medication_id, input)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.medication")))
    }

    pub async fn delete_medication(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        medication_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        if !MedicationRepository::delete(&state.db, &pet.id, medication_id).await? {
            return Err(AppError::NotFound(i18n::t("not_found.medication")));
        }
        Ok(())
    }

    pub async fn add_medication_log(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        medication_id: &str,
        input: &MedicationLogInput,
    ) -> AppResult<MedicationLog> {
        let pet = Self::pet(state, user, pet_id).await?;
        let medication = MedicationRepository::find(&state.db, &pet.id, medication_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.medication")))?;

        let given_at = input
            .given_at
            .unwrap_or_else(|| state.clock.now().naive_utc());
        MedicationRepository::add_log(&state.db, &medication.id, given_at, input.notes.as_deref())
            .await
    }

    pub async fn delete_medication_log(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        medication_id: &str,
        log_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        let medication = MedicationRepository::find(&state.db, &pet.id, medication_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.medication")))?;

        if !MedicationRepository::delete_log(&state.db, &medication.id, log_id).await? {
            return Err(record_not_found());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Traits
    // ------------------------------------------------------------------------

    pub async fn list_traits(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
    ) -> AppResult<Vec<PetTrait>> {
        let pet = Self::pet(state, user, pet_id).await?;
        PetTraitRepository::list(&state.db, &pet.id).await
    }

    pub async fn create_trait(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        input: &PetTraitInput,
    ) -> AppResult<PetTrait> {
        let pet = Self::pet(state, user, pet_id).await?;
        required("trait_name", &input.trait_name)?;
        required("trait_value", &input.trait_value)?;
        PetTraitRepository::create(&state.db, &pet.id, input).await
    }

    pub async fn update_trait(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        trait_id: &str,
        input: &PetTraitInput,
    ) -> AppResult<PetTrait> {
        let pet = Self::pet(state, user, pet_id).await?;
        required("trait_name", &input.trait_name)?;
        required("trait_value", &input.trait_value)?;
        PetTraitRepository::update(&state.db, &pet.id, trait_id, input)
            .await?
            .ok_or_else(record_not_found)
    }

    pub async fn delete_trait(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        trait_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        if !PetTraitRepository::delete(&state.db, &pet.id, trait_id).await? {
            return Err(record_not_found());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Custom fields
    // ------------------------------------------------------------------------

    pub async fn list_meta(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
    ) -> AppResult<Vec<PetMeta>> {
        let pet = Self::pet(state, user, pet_id).await?;
        PetMetaRepository::list(&state.db, &pet.id).await
    }

    pub async fn create_meta(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        input: &PetMetaInput,
    ) -> AppResult<PetMeta> {
        let pet = Self::pet(state, user, pet_id).await?;
        required("meta_key", &input.meta_key)?;
        required("meta_value", &input.meta_value)?;
        PetMetaRepository::create(&state.db, &pet.id, input).await
    }

    pub async fn update_meta(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        meta_id: &str,
        input: &PetMetaInput,
    ) -> AppResult<PetMeta> {
        let pet = Self::pet(state, user, pet_id).await?;
        required("meta_key", &input.meta_key)?;
        required("meta_value", &input.meta_value)?;
        PetMetaRepository::update(&state.db, &pet.id, meta_id, input)
            .await?
            .ok_or_else(record_not_found)
    }

    pub async fn delete_meta(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        meta_id: &str,
    ) -> AppResult<()> {
        let pet = Self::pet(state, user, pet_id).await?;
        if !PetMetaRepository::delete(&state.db, &pet.id, meta_id).await? {
            return Err(record_not_found());
        }
        Ok(())
    }
}
