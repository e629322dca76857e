use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::ShareToken;
use crate::error::{AppError, AppResult};

// ============================================================================
// Share Token Repository
// ============================================================================

pub struct ShareTokenRepository;

impl ShareTokenRepository {
    pub async fn create(
        pool: &SqlitePool,
        pet_id: &str,
        token: &str,
        created_by: &str,
        expires_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> AppResult<ShareToken> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, ShareToken>(
            r#"
            INSERT INTO share_tokens (id, pet_id, token, created_by, expires_at, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, 1, ?)
            RETURNING id, pet_id, token, created_by, expires_at, is_active, created_at
            "#,
        )
        .bind(&id)
        .bind(pet_id)
        .bind(token)
        .bind(created_by)
        .bind(expires_at)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Active tokens of a pet that have not expired at `now`, newest first.
    pub async fn list_active(
        pool: &SqlitePool,
        pet_id: &str,
        now: NaiveDateTime,
    ) -> AppResult<Vec<ShareToken>> {
        sqlx::query_as::<_, ShareToken>(
            r#"
            SELECT id, pet_id, token, created_by, expires_at, is_active, created_at
            FROM share_tokens
            WHERE pet_id = ? AND is_active = 1 AND expires_at >= ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(pet_id)
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Exact lookup; validity is checked by the caller.
    pub async fn find_by_token(pool: &SqlitePool, token: &str) -> AppResult<Option<ShareToken>> {
        sqlx::query_as::<_, ShareToken>(
            r#"
            SELECT id, pet_id, token, created_by, expires_at, is_active, created_at
            FROM share_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Deactivate a token of `pet_id`. Returns false when no such token exists for that pet.
    pub async fn deactivate(pool: &SqlitePool, token_id: &str, pet_id: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE share_tokens SET is_active = 0 WHERE id = ? AND pet_id = ?")
            .bind(token_id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
