use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::push_date_range;
use crate::db::models::{DateRange, HealthRecord, HealthRecordInput};
use crate::error::{AppError, AppResult};

const HEALTH_COLUMNS: &str = "id, pet_id, recorded_at, appetite_level, bathroom_times, bathroom_notes, mood_level, activity_level, health_notes, created_at";

/// Level used when the client leaves a 1-5 scale unset.
pub const DEFAULT_LEVEL: i64 = 3;

pub struct HealthRecordRepository;

impl HealthRecordRepository {
    pub async fn list(
        pool: &SqlitePool,
        pet_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<HealthRecord>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM pet_health_records WHERE pet_id = ",
            HEALTH_COLUMNS
        ));
        qb.push_bind(pet_id);
        push_date_range(&mut qb, "recorded_at", range);
        qb.push(" ORDER BY recorded_at DESC, rowid DESC");

        qb.build_query_as::<HealthRecord>()
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn create(
        pool: &SqlitePool,
        pet_id: &str,
        input: &HealthRecordInput,
    ) -> AppResult<HealthRecord> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, HealthRecord>(&format!(
            r#"
            INSERT INTO pet_health_records (
                id, pet_id, recorded_at, appetite_level, bathroom_times, bathroom_notes,
                mood_level, activity_level, health_notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            HEALTH_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(pet_id)
        .bind(input.recorded_at)
        .bind(input.appetite_level.unwrap_or(DEFAULT_LEVEL))
        .bind(input.bathroom_times)
        .bind(&input.bathroom_notes)
        .bind(input.mood_level.unwrap_or(DEFAULT_LEVEL))
        .bind(input.activity_level.unwrap_or(DEFAULT_LEVEL))
        .bind(&input.health_notes)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        pet_id: &str,
        id: &str,
        input: &HealthRecordInput,
    ) -> AppResult<Option<HealthRecord>> {
        sqlx::query_as::<_, HealthRecord>(&format!(
            r#"
            UPDATE pet_health_records
            SET recorded_at = ?, appetite_level = ?, bathroom_times = ?, bathroom_notes = ?,
                mood_level = ?, activity_level = ?, health_notes = ?
            WHERE id = ? AND pet_id = ?
            RETURNING {}
            "#,
            HEALTH_COLUMNS
        ))
        .bind(input.recorded_at)
        .bind(input.appetite_level.unwrap_or(DEFAULT_LEVEL))
        .bind(input.bathroom_times)
        .bind(&input.bathroom_notes)
        .bind(input.mood_level.unwrap_or(DEFAULT_LEVEL))
        .bind(input.activity_level.unwrap_or(DEFAULT_LEVEL))
        .bind(&input.health_notes)
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_health_records WHERE id = ? AND pet_id = ?")
            .bind(id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
