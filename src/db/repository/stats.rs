use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatistics {
    pub total_users: i64,
    pub total_families: i64,
    pub total_pets: i64,
    pub total_food_products: i64,
    pub public_food_products: i64,
    pub active_share_tokens: i64,
    pub total_banners: i64,
}

pub struct StatsRepository;

impl StatsRepository {
    pub async fn system_statistics(pool: &SqlitePool, now: NaiveDateTime) -> AppResult<SystemStatistics> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM families) AS total_families,
                (SELECT COUNT(*) FROM pets) AS total_pets,
                (SELECT COUNT(*) FROM pet_food_products) AS total_food_products,
                (SELECT COUNT(*) FROM pet_food_products WHERE is_public = 1) AS public_food_products,
                (SELECT COUNT(*) FROM share_tokens WHERE is_active = 1 AND expires_at > ?) AS active_share_tokens,
                (SELECT COUNT(*) FROM ad_banners) AS total_banners
            "#,
        )
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(SystemStatistics {
            total_users: row.get("total_users"),
            total_families: row.get("total_families"),
            total_pets: row.get("total_pets"),
            total_food_products: row.get("total_food_products"),
            public_food_products: row.get("public_food_products"),
            active_share_tokens: row.get("active_share_tokens"),
            total_banners: row.get("total_banners"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{test_db, UserRepository};

    #[tokio::test]
    async fn counts_an_empty_and_populated_database() {
        let pool = test_db::pool().await;
        let now = chrono::Utc::now().naive_utc();

        let empty = StatsRepository::system_statistics(&pool, now).await.unwrap();
        assert_eq!(empty.total_users, 0);
        assert_eq!(empty.active_share_tokens, 0);

        UserRepository::create(&pool, "s@example.com", "h", None)
            .await
            .unwrap();
        let stats = StatsRepository::system_statistics(&pool, now).await.unwrap();
        assert_eq!(stats.total_users, 1);
    }
}
