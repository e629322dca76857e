use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{PetMeta, PetMetaInput};
use crate::error::{AppError, AppResult};

/// Custom key/value fields attached to a pet.
pub struct PetMetaRepository;

impl PetMetaRepository {
    pub async fn list(pool: &SqlitePool, pet_id: &str) -> AppResult<Vec<PetMeta>> {
        sqlx::query_as::<_, PetMeta>(
            r#"
            SELECT id, pet_id, meta_key, meta_value, created_at
            FROM pet_meta
            WHERE pet_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(pet_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn create(pool: &SqlitePool, pet_id: &str, input: &PetMetaInput) -> AppResult<PetMeta> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, PetMeta>(
            r#"
            INSERT INTO pet_meta (id, pet_id, meta_key, meta_value, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, pet_id, meta_key, meta_value, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(pet_id)
        .bind(input.meta_key.trim())
        .bind(input.meta_value.trim())
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        pet_id: &str,
        id: &str,
        input: &PetMetaInput,
    ) -> AppResult<Option<PetMeta>> {
        sqlx::query_as::<_, PetMeta>(
            r#"
            UPDATE pet_meta SET meta_key = ?, meta_value = ?
            WHERE id = ? AND pet_id = ?
            RETURNING id, pet_id, meta_key, meta_value, created_at
            "#,
        )
        .bind(input.meta_key.trim())
        .bind(input.meta_value.trim())
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_meta WHERE id = ? AND pet_id = ?")
            .bind(id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
