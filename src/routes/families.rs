use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::db::FamilyMember;
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::SuccessResponse;
use crate::services::families::{FamilyOverview, FamilyService, MemberUpdate};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_family))
        .route("/me", get(get_my_family).put(rename_family))
        .route("/join", post(join_family))
        .route("/me/leave", post(leave_family))
        .route(
            "/me/members/:member_id",
            put(update_member).delete(remove_member),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
    pub relation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFamilyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinFamilyRequest {
    #[serde(alias = "familyId")]
    pub family_id: String,
    pub relation: Option<String>,
}

async fn create_family(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateFamilyRequest>,
) -> Result<Json<FamilyOverview>, AppError> {
    let overview =
        FamilyService::create(&state, &user, &request.name, request.relation.as_deref()).await?;
    Ok(Json(overview))
}

async fn get_my_family(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<FamilyOverview>, AppError> {
    Ok(Json(FamilyService::get_mine(&state, &user).await?))
}

async fn rename_family(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<RenameFamilyRequest>,
) -> Result<Json<FamilyOverview>, AppError> {
    Ok(Json(FamilyService::rename(&state, &user, &request.name).await?))
}

async fn join_family(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<JoinFamilyRequest>,
) -> Result<Json<FamilyOverview>, AppError> {
    let overview =
        FamilyService::join(&state, &user, &request.family_id, request.relation.as_deref()).await?;
    Ok(Json(overview))
}

async fn leave_family(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<SuccessResponse>, AppError> {
    FamilyService::leave(&state, &user).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn update_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(member_id): Path<String>,
    Json(update): Json<MemberUpdate>,
) -> Result<Json<FamilyMember>, AppError> {
    Ok(Json(
        FamilyService::update_member(&state, &user, &member_id, &update).await?,
    ))
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(member_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    FamilyService::remove_member(&state, &user, &member_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_client::{bearer, send};
    use crate::services::test_support;

    #[tokio::test]
    async fn create_join_and_manage_over_http() {
        let app = test_support::app().await;
        let mom = test_support::user(&app.state, "mom@example.com").await;
        let kid = test_support::user(&app.state, "kid@example.com").await;
        let mom_token = bearer(&app, &mom.id);
        let kid_token = bearer(&app, &kid.id);

        let created = send(
            &app,
            Method::POST,
            "/api/families",
            Some(&mom_token),
            Some(json!({ "name": "Parks", "relation": "mother" })),
        )
        .await;
        assert_eq!(created.status, StatusCode::OK);
        let family_id = created.json()["family"]["id"].as_str().unwrap().to_string();

        let joined = send(
            &app,
            Method::POST,
            "/api/families/join",
            Some(&kid_token),
            Some(json!({ "familyId": family_id, "relation": "son" })),
        )
        .await;
        assert_eq!(joined.status, StatusCode::OK);
        assert_eq!(joined.json()["my_role"], "family_member");
        let kid_member = joined.json()["my_member_id"].as_str().unwrap().to_string();

        let forbidden = send(
            &app,
            Method::PUT,
            "/api/families/me",
            Some(&kid_token),
            Some(json!({ "name": "Kid's" })),
        )
        .await;
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let removed = send(
            &app,
            Method::DELETE,
            &format!("/api/families/me/members/{}", kid_member),
            Some(&mom_token),
            None,
        )
        .await;
        assert_eq!(removed.status, StatusCode::OK);
        assert_eq!(removed.json()["success"], true);

        let gone = send(&app, Method::GET, "/api/families/me", Some(&kid_token), None).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }
}
