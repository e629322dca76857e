use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{
    Banner, BannerInput, DEFAULT_BANNER_BACKGROUND, DEFAULT_BANNER_TEXT_COLOR,
};
use crate::error::{AppError, AppResult};

const BANNER_COLUMNS: &str = "id, title, description, image_url, link_url, is_active, display_position, display_order, background_color, text_color, start_date, end_date, click_count, created_at";

// ============================================================================
// Banner Repository
// ============================================================================

pub struct BannerRepository;

impl BannerRepository {
    /// Active banners for `position` (or "both") whose date window contains `today`.
    pub async fn list_public(
        pool: &SqlitePool,
        position: &str,
        today: NaiveDate,
    ) -> AppResult<Vec<Banner>> {
        sqlx::query_as::<_, Banner>(&format!(
            r#"
            SELECT {}
            FROM ad_banners
            WHERE is_active = 1
              AND (display_position = ? OR display_position = 'both')
              AND (start_date IS NULL OR start_date <= ?)
              AND (end_date IS NULL OR end_date >= ?)
            ORDER BY display_order ASC, rowid ASC
            "#,
            BANNER_COLUMNS
        ))
        .bind(position)
        .bind(today)
        .bind(today)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Banner>> {
        sqlx::query_as::<_, Banner>(&format!(
            "SELECT {} FROM ad_banners ORDER BY display_order ASC, rowid ASC",
            BANNER_COLUMNS
        ))
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Banner>> {
        sqlx::query_as::<_, Banner>(&format!(
            "SELECT {} FROM ad_banners WHERE id = ?",
            BANNER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// New banners go to the end of the display order.
    pub async fn create(pool: &SqlitePool, input: &BannerInput) -> AppResult<Banner> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Banner>(&format!(
            r#"
            INSERT INTO ad_banners (
                id, title, description, image_url, link_url, is_active, display_position,
                display_order, background_color, text_color, start_date, end_date, created_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?,
                (SELECT COALESCE(MAX(display_order), -1) + 1 FROM ad_banners),
                ?, ?, ?, ?, ?
            )
            RETURNING {}
            "#,
            BANNER_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.link_url.trim())
        .bind(input.is_active.unwrap_or(true))
        .bind(input.display_position.as_deref().unwrap_or("both"))
        .bind(
            input
                .background_color
                .as_deref()
                .unwrap_or(DEFAULT_BANNER_BACKGROUND),
        )
        .bind(input.text_color.as_deref().unwrap_or(DEFAULT_BANNER_TEXT_COLOR))
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(pool: &SqlitePool, id: &str, input: &BannerInput) -> AppResult<Option<Banner>> {
        sqlx::query_as::<_, Banner>(&format!(
            r#"
            UPDATE ad_banners
            SET title = ?, description = ?, image_url = COALESCE(?, image_url), link_url = ?,
                is_active = ?, display_position = ?, background_color = ?, text_color = ?,
                start_date = ?, end_date = ?
            WHERE id = ?
            RETURNING {}
            "#,
            BANNER_COLUMNS
        ))
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.link_url.trim())
        .bind(input.is_active.unwrap_or(true))
        .bind(input.display_position.as_deref().unwrap_or("both"))
        .bind(
            input
                .background_color
                .as_deref()
                .unwrap_or(DEFAULT_BANNER_BACKGROUND),
        )
        .bind(input.text_color.as_deref().unwrap_or(DEFAULT_BANNER_TEXT_COLOR))
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn set_active(pool: &SqlitePool, id: &str, is_active: bool) -> AppResult<Option<Banner>> {
        sqlx::query_as::<_, Banner>(&format!(
            "UPDATE ad_banners SET is_active = ? WHERE id = ? RETURNING {}",
            BANNER_COLUMNS
        ))
        .bind(is_active)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn set_order(pool: &SqlitePool, id: &str, display_order: i64) -> AppResult<()> {
        sqlx::query("UPDATE ad_banners SET display_order = ? WHERE id = ?")
            .bind(display_order)
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_image(pool: &SqlitePool, id: &str, image_url: &str) -> AppResult<Option<Banner>> {
        sqlx::query_as::<_, Banner>(&format!(
            "UPDATE ad_banners SET image_url = ? WHERE id = ? RETURNING {}",
            BANNER_COLUMNS
        ))
        .bind(image_url)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Returns false when the banner does not exist.
    pub async fn increment_click(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE ad_banners SET click_count = click_count + 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM ad_banners WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
