use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::db::{DateRange, Pet, PetInput};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::{read_upload, SuccessResponse};
use crate::services::pdf::PdfExportService;
use crate::services::pets::PetService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_pets).post(create_pet))
        .route("/:id", get(get_pet).put(update_pet).delete(delete_pet))
        .route("/:id/avatar", post(upload_avatar))
        .route("/:id/pdf", get(export_pdf))
}

async fn list_pets(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Pet>>, AppError> {
    Ok(Json(PetService::list(&state, &user).await?))
}

async fn create_pet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<PetInput>,
) -> Result<Json<Pet>, AppError> {
    Ok(Json(PetService::create(&state, &user, input).await?))
}

async fn get_pet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Pet>, AppError> {
    Ok(Json(PetService::get(&state, &user, &id).await?))
}

async fn update_pet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<PetInput>,
) -> Result<Json<Pet>, AppError> {
    Ok(Json(PetService::update(&state, &user, &id, input).await?))
}

async fn delete_pet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    PetService::delete(&state, &user, &id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Pet>, AppError> {
    let (filename, data) = read_upload(multipart).await?;
    Ok(Json(
        PetService::upload_avatar(&state, &user, &id, &filename, data).await?,
    ))
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*`.
fn content_disposition(filename: &str) -> Result<HeaderValue, AppError> {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    );
    HeaderValue::from_str(&value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid Content-Disposition: {}", e)))
}

async fn export_pdf(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Response, AppError> {
    let (filename, bytes) = PdfExportService::export(&state, &user, &id, range).await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)?),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes::test_client::{bearer, router, send};
    use crate::services::test_support;

    #[test]
    fn disposition_keeps_utf8_name() {
        let value = content_disposition("ポチ-records.pdf").unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("attachment; filename=\"__-records.pdf\""));
        assert!(value.contains("filename*=UTF-8''%E3%83%9D%E3%83%81-records.pdf"));
    }

    #[tokio::test]
    async fn pet_crud_and_pdf_download() {
        let app = test_support::app().await;
        let (admin, _) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let token = bearer(&app, &admin.id);

        let created = send(
            &app,
            Method::POST,
            "/api/pets",
            Some(&token),
            Some(json!({ "name": "Rex", "species": "dog", "gender": "male" })),
        )
        .await;
        assert_eq!(created.status, StatusCode::OK);
        let pet_id = created.json()["id"].as_str().unwrap().to_string();

        let listed = send(&app, Method::GET, "/api/pets", Some(&token), None).await;
        assert_eq!(listed.json().as_array().unwrap().len(), 1);

        let invalid = send(
            &app,
            Method::POST,
            "/api/pets",
            Some(&token),
            Some(json!({ "name": "Rex", "species": "unicorn" })),
        )
        .await;
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.json()["error"]["code"], "VALIDATION_ERROR");

        let pdf = send(
            &app,
            Method::GET,
            &format!("/api/pets/{}/pdf?start_date=2025-01-01&end_date=2025-12-31", pet_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(pdf.status, StatusCode::OK);
        assert_eq!(pdf.headers[header::CONTENT_TYPE], "application/pdf");
        assert!(pdf.headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("Rex-records.pdf"));
        assert!(pdf.body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn avatar_upload_over_multipart() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;
        let token = bearer(&app, &admin.id);

        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"rex.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/pets/{}/avatar", pet.id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let response = router(&app).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = PetService::get(&app.state, &admin, &pet.id).await.unwrap();
        assert!(stored
            .avatar_url
            .unwrap()
            .ends_with(".png"));
    }
}
