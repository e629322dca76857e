use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::push_date_range;
use crate::db::models::{DateRange, Meal, MealInput};
use crate::error::{AppError, AppResult};

const MEAL_COLUMNS: &str =
    "id, pet_id, fed_at, food_type, amount, food_product_id, amount_grams, calories, notes, created_at";

pub struct MealRepository;

impl MealRepository {
    pub async fn list(
        pool: &SqlitePool,
        pet_id: &str,
        range: &DateRange,
        limit: Option<i64>,
    ) -> AppResult<Vec<Meal>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM pet_meals WHERE pet_id = ",
            MEAL_COLUMNS
        ));
        qb.push_bind(pet_id);
        push_date_range(&mut qb, "fed_at", range);
        qb.push(" ORDER BY fed_at DESC, rowid DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        qb.build_query_as::<Meal>()
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)
    }

    /// `calories` is the final value to store (derived or manual), not `input.calories`.
    pub async fn create(
        pool: &SqlitePool,
        pet_id: &str,
        input: &MealInput,
        calories: Option<f64>,
    ) -> AppResult<Meal> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Meal>(&format!(
            r#"
            INSERT INTO pet_meals (id, pet_id, fed_at, food_type, amount, food_product_id, amount_grams, calories, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            MEAL_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(pet_id)
        .bind(input.fed_at)
        .bind(&input.food_type)
        .bind(&input.amount)
        .bind(&input.food_product_id)
        .bind(input.amount_grams)
        .bind(calories)
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
        input: &MealInput,
        calories: Option<f64>,
    ) -> AppResult<Option<Meal>> {
        sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE pet_meals
            SET fed_at = ?, food_type = ?, amount = ?, food_product_id = ?, amount_grams = ?, calories = ?, notes = ?
            WHERE id = ? AND pet_id = ?
            RETURNING {}
            "#,
            MEAL_COLUMNS
        ))
        .bind(input.fed_at)
        .bind(&input.food_type)
        .bind(&input.amount)
        .bind(&input.food_product_id)
        .bind(input.amount_grams)
        .bind(calories)
        .bind(&input.notes)
        .bind(id)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, pet_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_meals WHERE id = ? AND pet_id = ?")
            .bind(id)
            .bind(pet_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
