//! Per-pet record endpoints, nested under `/api/pets/:id`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::db::{
    DateRange, HealthRecord, HealthRecordInput, Meal, MealInput, Medication, MedicationInput,
    MedicationLog, MedicationLogInput, MedicationWithLogs, PetMeta, PetMetaInput, PetTrait,
    PetTraitInput, Walk, WalkInput,
};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::SuccessResponse;
use crate::services::records::RecordService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id/walks", get(list_walks).post(create_walk))
        .route("/:id/walks/:record_id", put(update_walk).delete(delete_walk))
        .route("/:id/meals", get(list_meals).post(create_meal))
        .route("/:id/meals/:record_id", put(update_meal).delete(delete_meal))
        .route("/:id/health", get(list_health).post(create_health))
        .route("/:id/health/:record_id", put(update_health).delete(delete_health))
        .route("/:id/medications", get(list_medications).post(create_medication))
        .route(
            "/:id/medications/:record_id",
            put(update_medication).delete(delete_medication),
        )
        .route("/:id/medications/:record_id/logs", post(add_medication_log))
        .route(
            "/:id/medications/:record_id/logs/:log_id",
            delete(delete_medication_log),
        )
        .route("/:id/traits", get(list_traits).post(create_trait))
        .route("/:id/traits/:record_id", put(update_trait).delete(delete_trait))
        .route("/:id/meta", get(list_meta).post(create_meta))
        .route("/:id/meta/:record_id", put(update_meta).delete(delete_meta))
}

// ============================================================================
// Walks
// ============================================================================

async fn list_walks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Walk>>, AppError> {
    Ok(Json(RecordService::list_walks(&state, &user, &pet_id, &range).await?))
}

async fn create_walk(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Json(input): Json<WalkInput>,
) -> Result<Json<Walk>, AppError> {
    Ok(Json(RecordService::create_walk(&state, &user, &pet_id, &input).await?))
}

async fn update_walk(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, walk_id)): Path<(String, String)>,
    Json(input): Json<WalkInput>,
) -> Result<Json<Walk>, AppError> {
    Ok(Json(
        RecordService::update_walk(&state, &user, &pet_id, &walk_id, &input).await?,
    ))
}

async fn delete_walk(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, walk_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_walk(&state, &user, &pet_id, &walk_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================================
// Meals
// ============================================================================

async fn list_meals(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Meal>>, AppError> {
    Ok(Json(RecordService::list_meals(&state, &user, &pet_id, &range).await?))
}

async fn create_meal(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Json(input): Json<MealInput>,
) -> Result<Json<Meal>, AppError> {
    Ok(Json(RecordService::create_meal(&state, &user, &pet_id, &input).await?))
}

async fn update_meal(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, meal_id)): Path<(String, String)>,
    Json(input): Json<MealInput>,
) -> Result<Json<Meal>, AppError> {
    Ok(Json(
        RecordService::update_meal(&state, &user, &pet_id, &meal_id, &input).await?,
    ))
}

async fn delete_meal(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, meal_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_meal(&state, &user, &pet_id, &meal_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================================
// Health records
// ============================================================================

async fn list_health(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<HealthRecord>>, AppError> {
    Ok(Json(RecordService::list_health(&state, &user, &pet_id, &range).await?))
}

async fn create_health(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Json(input): Json<HealthRecordInput>,
) -> Result<Json<HealthRecord>, AppError> {
    Ok(Json(RecordService::create_health(&state, &user, &pet_id, &input).await?))
}

async fn update_health(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, record_id)): Path<(String, String)>,
    Json(input): Json<HealthRecordInput>,
) -> Result<Json<HealthRecord>, AppError> {
    Ok(Json(
        RecordService::update_health(&state, &user, &pet_id, &record_id, &input).await?,
    ))
}

async fn delete_health(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, record_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_health(&state, &user, &pet_id, &record_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================================
// Medications
// ============================================================================

async fn list_medications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<MedicationWithLogs>>, AppError> {
    Ok(Json(RecordService::list_medications(&state, &user, &pet_id).await?))
}

async fn create_medication(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Json(input): Json<MedicationInput>,
) -> Result<Json<Medication>, AppError> {
    Ok(Json(
        RecordService::create_medication(&state, &user, &pet_id, &input).await?,
    ))
}

async fn update_medication(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, medication_id)): Path<(String, String)>,
    Json(input): Json<MedicationInput>,
) -> Result<Json<Medication>, AppError> {
    Ok(Json(
        RecordService::update_medication(&state, &user, &pet_id, &medication_id, &input).await?,
    ))
}

async fn delete_medication(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, medication_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_medication(&state, &user, &pet_id, &medication_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn add_medication_log(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, medication_id)): Path<(String, String)>,
    input: Option<Json<MedicationLogInput>>,
) -> Result<Json<MedicationLog>, AppError> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    Ok(Json(
        RecordService::add_medication_log(&state, &user, &pet_id, &medication_id, &input).await?,
    ))
}

async fn delete_medication_log(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, medication_id, log_id)): Path<(String, String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_medication_log(&state, &user, &pet_id, &medication_id, &log_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================================
// Traits and custom fields
// ============================================================================

async fn list_traits(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<PetTrait>>, AppError> {
    Ok(Json(RecordService::list_traits(&state, &user, &pet_id).await?))
}

async fn create_trait(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Json(input): Json<PetTraitInput>,
) -> Result<Json<PetTrait>, AppError> {
    Ok(Json(RecordService::create_trait(&state, &user, &pet_id, &input).await?))
}

async fn update_trait(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, trait_id)): Path<(String, String)>,
    Json(input): Json<PetTraitInput>,
) -> Result<Json<PetTrait>, AppError> {
    Ok(Json(
        RecordService::update_trait(&state, &user, &pet_id, &trait_id, &input).await?,
    ))
}

async fn delete_trait(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, trait_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_trait(&state, &user, &pet_id, &trait_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn list_meta(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<PetMeta>>, AppError> {
    Ok(Json(RecordService::list_meta(&state, &user, &pet_id).await?))
}

async fn create_meta(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(pet_id): Path<String>,
    Json(input): Json<PetMetaInput>,
) -> Result<Json<PetMeta>, AppError> {
    Ok(Json(RecordService::create_meta(&state, &user, &pet_id, &input).await?))
}

async fn update_meta(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, meta_id)): Path<(String, String)>,
    Json(input): Json<PetMetaInput>,
) -> Result<Json<PetMeta>, AppError> {
    Ok(Json(
        RecordService::update_meta(&state, &user, &pet_id, &meta_id, &input).await?,
    ))
}

async fn delete_meta(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((pet_id, meta_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    RecordService::delete_meta(&state, &user, &pet_id, &meta_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_client::{bearer, send};
    use crate::services::test_support;

    #[tokio::test]
    async fn walk_filters_include_the_whole_end_day() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;
        let token = bearer(&app, &admin.id);

        for at in ["2025-03-01T06:00", "2025-03-31T23:30", "2025-04-01T00:00"] {
            let reply = send(
                &app,
                Method::POST,
                &format!("/api/pets/{}/walks", pet.id),
                Some(&token),
                Some(json!({ "walked_at": at, "duration_minutes": 20 })),
            )
            .await;
            assert_eq!(reply.status, StatusCode::OK);
        }

        let march = send(
            &app,
            Method::GET,
            &format!(
                "/api/pets/{}/walks?start_date=2025-03-01&end_date=2025-03-31",
                pet.id
            ),
            Some(&token),
            None,
        )
        .await;
        let walks = march.json();
        let walks = walks.as_array().unwrap();
        assert_eq!(walks.len(), 2);
        assert_eq!(walks[0]["walked_at"], "2025-03-31T23:30:00");
    }

    #[tokio::test]
    async fn medication_logs_default_their_time() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;
        let token = bearer(&app, &admin.id);

        let med = send(
            &app,
            Method::POST,
            &format!("/api/pets/{}/medications", pet.id),
            Some(&token),
            Some(json!({ "medication_name": "Heartworm", "start_date": "2025-05-01" })),
        )
        .await;
        assert_eq!(med.status, StatusCode::OK);
        let med_id = med.json()["id"].as_str().unwrap().to_string();

        let log = send(
            &app,
            Method::POST,
            &format!("/api/pets/{}/medications/{}/logs", pet.id, med_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(log.status, StatusCode::OK);
        assert_eq!(log.json()["given_at"], "2025-06-01T12:00:00");

        let listed = send(
            &app,
            Method::GET,
            &format!("/api/pets/{}/medications", pet.id),
            Some(&token),
            None,
        )
        .await;
        let listed = listed.json();
        assert_eq!(listed[0]["medication_name"], "Heartworm");
        assert_eq!(listed[0]["logs"].as_array().unwrap().len(), 1);
    }
}
