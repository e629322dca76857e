use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .map_err(|e| tracing::warn!("Health check database ping failed: {}", e))
        .is_ok();

    let (code, status, database) = if database_ok {
        (StatusCode::OK, "healthy", "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable")
    };

    let response = HealthResponse {
        status,
        database,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.clock.now().to_rfc3339(),
    };

    (code, Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::test_client::send;
    use crate::services::test_support;

    #[tokio::test]
    async fn reports_database_status() {
        let app = test_support::app().await;
        let reply = send(&app, Method::GET, "/health", None, None).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json()["status"], "healthy");
        assert_eq!(reply.json()["database"], "ok");
    }
}
