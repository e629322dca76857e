use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{Pet, PetInput};
use crate::error::{AppError, AppResult};

const PET_COLUMNS: &str = "id, family_id, name, species, breed, birth_date, gender, avatar_url, notes, created_at, updated_at";

pub struct PetRepository;

impl PetRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Pet>> {
        sqlx::query_as::<_, Pet>(&format!("SELECT {} FROM pets WHERE id = ?", PET_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_by_family(pool: &SqlitePool, family_id: &str) -> AppResult<Vec<Pet>> {
        sqlx::query_as::<_, Pet>(&format!(
            "SELECT {} FROM pets WHERE family_id = ? ORDER BY created_at ASC, rowid ASC",
            PET_COLUMNS
        ))
        .bind(family_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// `input` must already be validated; `gender` falls back to "unknown".
    pub async fn create(pool: &SqlitePool, family_id: &str, input: &PetInput) -> AppResult<Pet> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Pet>(&format!(
            r#"
            INSERT INTO pets (id, family_id, name, species, breed, birth_date, gender, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PET_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(family_id)
        .bind(input.name.trim())
        .bind(&input.species)
        .bind(&input.breed)
        .bind(input.birth_date)
        .bind(input.gender.as_deref().unwrap_or("unknown"))
        .bind(&input.notes)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(pool: &SqlitePool, id: &str, input: &PetInput) -> AppResult<Pet> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Pet>(&format!(
            r#"
            UPDATE pets
            SET name = ?, species = ?, breed = ?, birth_date = ?, gender = ?, notes = ?, updated_at = ?
            WHERE id = ?
            RETURNING {}
            "#,
            PET_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.species)
        .bind(&input.breed)
        .bind(input.birth_date)
        .bind(input.gender.as_deref().unwrap_or("unknown"))
        .bind(&input.notes)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn set_avatar(pool: &SqlitePool, id: &str, avatar_url: &str) -> AppResult<Pet> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Pet>(&format!(
            "UPDATE pets SET avatar_url = ?, updated_at = ? WHERE id = ? RETURNING {}",
            PET_COLUMNS
        ))
        .bind(avatar_url)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Records and share tokens go with the pet (ON DELETE CASCADE).
    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM pets WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
