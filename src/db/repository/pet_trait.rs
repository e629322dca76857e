use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{PetTrait, PetTraitInput};
use crate::error::{AppError, AppResult};

pub struct PetTraitRepository;

impl PetTraitRepository {
    pub async fn list(pool: &SqlitePool, pet_id: &str) -> AppResult<Vec<PetTrait>> {
        sqlx::query_as::<_, PetTrait>(
            r#"
            SELECT id, pet_id, trait_name, trait_value, notes, created_at
            FROM pet_traits
            WHERE pet_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(pet_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn create(pool: &SqlitePool, pet_id: &str, input: &PetTraitInput) -> AppResult<PetTrait> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, PetTrait>(
            r#"
            INSERT INTO pet_traits (id, pet_id, trait_name, trait_value, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, pet_id, trait_name, trait_value, notes, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(pet_id)
        .bind(input.trait_name.trim())
        .bind(input.trait_value.trim())
        .bind(&input.notes)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        pet_id: &str,
        id: &str,
        input: &PetTraitInput,
    ) -> AppResult<Option<PetTrait>> {
        sqlx::query_as::<_, PetTrait>(
            r#"
            UPDATE pet_traits SET trait_name = ?, trait_value = ?, notes = ?
            WHERE id = ? AND pet_id = ?
            RETURNING id, pet_id, trait_name, trait_value, notes, created_at
            "#,
        )
        .bind(input.trait_name.trim())
        .bind(input.trait_value.trim())
        .bind(&input.notes)
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_traits WHERE id = ? AND pet_id = ?")
            .bind(id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
