use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::push_date_range;
use crate::db::models::{DateRange, Walk, WalkInput};
use crate::error::{AppError, AppResult};

pub struct WalkRepository;

impl WalkRepository {
    /// Newest first. `limit` of `None` returns everything in range.
    pub async fn list(
        pool: &SqlitePool,
        pet_id: &str,
        range: &DateRange,
        limit: Option<i64>,
    ) -> AppResult<Vec<Walk>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, pet_id, walked_at, duration_minutes, distance_km, notes, created_at \
             FROM pet_walks WHERE pet_id = ",
        );
        qb.push_bind(pet_id);
        push_date_range(&mut qb, "walked_at", range);
        qb.push(" ORDER BY walked_at DESC, rowid DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        qb.build_query_as::<Walk>()
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn create(pool: &SqlitePool, pet_id: &str, input: &WalkInput) -> AppResult<Walk> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Walk>(
            r#"
            INSERT INTO pet_walks (id, pet_id, walked_at, duration_minutes, distance_km, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, pet_id, walked_at, duration_minutes, distance_km, notes, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(pet_id)
        .bind(input.walked_at)
        .bind(input.duration_minutes)
        .bind(input.distance_km)
        .bind(&input.notes)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Returns `None` when no walk with this id belongs to `pet_id`.
    pub async fn update(
        pool: &SqlitePool,
        pet_id: &str,
        id: &str,
        input: &WalkInput,
    ) -> AppResult<Option<Walk>> {
        sqlx::query_as::<_, Walk>(
            r#"
            UPDATE pet_walks
            SET walked_at = ?, duration_minutes = ?, distance_km = ?, notes = ?
            WHERE id = ? AND pet_id = ?
            RETURNING id, pet_id, walked_at, duration_minutes, distance_km, notes, created_at
            "#,
        )
        .bind(input.walked_at)
        .bind(input.duration_minutes)
        .bind(input.distance_km)
        .bind(&input.notes)
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_walks WHERE id = ? AND pet_id = ?")
            .bind(id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
