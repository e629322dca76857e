pub mod admin_user;
pub mod banner;
pub mod family;
pub mod food_product;
pub mod health_record;
pub mod meal;
pub mod medication;
pub mod pet;
pub mod pet_meta;
pub mod pet_trait;
pub mod share_token;
pub mod stats;
pub mod user;
pub mod walk;

pub use admin_user::AdminUserRepository;
pub use banner::BannerRepository;
pub use family::{FamilyMemberRepository, FamilyRepository};
pub use food_product::FoodProductRepository;
pub use health_record::HealthRecordRepository;
pub use meal::MealRepository;
pub use medication::MedicationRepository;
pub use pet::PetRepository;
pub use pet_meta::PetMetaRepository;
pub use pet_trait::PetTraitRepository;
pub use share_token::ShareTokenRepository;
pub use stats::{StatsRepository, SystemStatistics};
pub use user::UserRepository;
pub use walk::WalkRepository;

use sqlx::{QueryBuilder, Sqlite};

use crate::db::models::DateRange;

/// Appends `AND column >= ? AND column < ?` for whichever bounds are set.
pub(crate) fn push_date_range(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, range: &DateRange) {
    if let Some(lower) = range.lower() {
        qb.push(format!(" AND {} >= ", column)).push_bind(lower);
    }
    if let Some(upper) = range.upper() {
        qb.push(format!(" AND {} < ", column)).push_bind(upper);
    }
}

#[cfg(test)]
pub(crate) mod test_db {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// Fresh in-memory database with the real migrations applied.
    pub async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .expect("foreign keys");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }
}
