use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::AdminUser;
use crate::error::{AppError, AppResult};

pub struct AdminUserRepository;

impl AdminUserRepository {
    pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> AppResult<Option<AdminUser>> {
        sqlx::query_as::<_, AdminUser>(
            "SELECT id, user_id, is_system_only, created_at FROM admin_users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Grant system-admin standing. Granting twice keeps the first row.
    pub async fn grant(pool: &SqlitePool, user_id: &str, is_system_only: bool) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO admin_users (id, user_id, is_system_only, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(is_system_only)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
