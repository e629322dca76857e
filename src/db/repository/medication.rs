use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{Medication, MedicationInput, MedicationLog};
use crate::error::{AppError, AppResult};

const MEDICATION_COLUMNS: &str =
    "id, pet_id, medication_name, dosage, frequency, start_date, end_date, notes, is_active, created_at";

// ============================================================================
// Medication Repository (medications + administration logs)
// ============================================================================

pub struct MedicationRepository;

impl MedicationRepository {
    pub async fn list(pool: &SqlitePool, pet_id: &str) -> AppResult<Vec<Medication>> {
        sqlx::query_as::<_, Medication>(&format!(
            "SELECT {} FROM pet_medications WHERE pet_id = ? ORDER BY start_date DESC, rowid DESC",
            MEDICATION_COLUMNS
        ))
        .bind(pet_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<Option<Medication>> {
        sqlx::query_as::<_, Medication>(&format!(
            "SELECT {} FROM pet_medications WHERE id = ? AND pet_id = ?",
            MEDICATION_COLUMNS
        ))
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn create(
        pool: &SqlitePool,
        pet_id: &str,
        input: &MedicationInput,
    ) -> AppResult<Medication> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Medication>(&format!(
            r#"
            INSERT INTO pet_medications (
                id, pet_id, medication_name, dosage, frequency, start_date, end_date, notes, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            MEDICATION_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(pet_id)
        .bind(input.medication_name.trim())
        .bind(&input.dosage)
        .bind(&input.frequency)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.notes)
        .bind(input.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        pet_id: &str,
        id: &str,
        input: &MedicationInput,
    ) -> AppResult<Option<Medication>> {
        sqlx::query_as::<_, Medication>(&format!(
            r#"
            UPDATE pet_medications
            SET medication_name = ?, dosage = ?, frequency = ?, start_date = ?, end_date = ?,
                notes = ?, is_active = ?
            WHERE id = ? AND pet_id = ?
            RETURNING {}
            "#,
            MEDICATION_COLUMNS
        ))
        .bind(input.medication_name.trim())
        .bind(&input.dosage)
        .bind(&input.frequency)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.notes)
        .bind(input.is_active.unwrap_or(true))
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Logs are removed by cascade.
    pub async fn delete(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_medications WHERE id = ? AND pet_id = ?")
            .bind(id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn recent_logs(
        pool: &SqlitePool,
        medication_id: &str,
        limit: i64,
    ) -> AppResult<Vec<MedicationLog>> {
        sqlx::query_as::<_, MedicationLog>(
            r#"
            SELECT id, medication_id, given_at, notes, created_at
            FROM pet_medication_logs
            WHERE medication_id = ?
            ORDER BY given_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(medication_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn add_log(
        pool: &SqlitePool,
        medication_id: &str,
        given_at: NaiveDateTime,
        notes: Option<&str>,
    ) -> AppResult<MedicationLog> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, MedicationLog>(
            r#"
            INSERT INTO pet_medication_logs (id, medication_id, given_at, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, medication_id, given_at, notes, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(medication_id)
        .bind(given_at)
        .bind(notes)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete_log(pool: &SqlitePool, medication_id: &str, log_id: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM pet_medication_logs WHERE id = ? AND medication_id = ?")
                .bind(log_id)
                .bind(medication_id)
                .execute(pool)
                .await
                .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
