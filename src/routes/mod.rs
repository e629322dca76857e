pub mod admin;
pub mod auth;
pub mod banners;
pub mod families;
pub mod food_products;
pub mod health;
pub mod pets;
pub mod records;
pub mod share;

use std::sync::Arc;

use axum::{body::Bytes, extract::Multipart, routing::get, Router};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::AppState;

/// Everything except `/api/auth`, which `main` mounts behind the rate limiter.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/families", families::router())
        .nest(
            "/api/pets",
            pets::router().merge(records::router()).merge(share::router()),
        )
        .nest("/api/food-products", food_products::router())
        .nest("/api/banners", banners::router())
        .nest("/api/admin", admin::router())
        .nest("/share", share::public_router())
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Read the multipart field named `file`, returning its file name and contents.
pub async fn read_upload(mut multipart: Multipart) -> AppResult<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok((filename, data));
    }

    Err(AppError::Validation(i18n::t("validation.missing_file")))
}

#[cfg(test)]
pub(crate) mod test_client {
    //! Drives the full router in-process.

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::services::auth::AuthService;
    use crate::services::test_support::TestApp;

    pub struct Reply {
        pub status: StatusCode,
        pub headers: axum::http::HeaderMap,
        pub body: Vec<u8>,
    }

    impl Reply {
        pub fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap_or(Value::Null)
        }
    }

    pub fn router(app: &TestApp) -> axum::Router {
        super::api_router()
            .nest("/api/auth", super::auth::router())
            .with_state(app.state.clone())
    }

    pub fn bearer(app: &TestApp, user_id: &str) -> String {
        AuthService::create_jwt(&app.state, user_id).unwrap()
    }

    pub async fn send(
        app: &TestApp,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router(app).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        Reply {
            status,
            headers,
            body,
        }
    }
}
