use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::models::{FoodProduct, FoodProductFilter, FoodProductInput, Visibility};
use crate::error::{AppError, AppResult};

const PRODUCT_COLUMNS: &str = "id, name, brand, calories_per_100g, product_type, species, notes, image_url, is_public, created_by, created_at, updated_at";

pub struct FoodProductRepository;

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &FoodProductFilter) {
    if let Some(species) = filter.species.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND species = ").push_bind(species.to_string());
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", q.to_lowercase());
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(brand, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl FoodProductRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<FoodProduct>> {
        sqlx::query_as::<_, FoodProduct>(&format!(
            "SELECT {} FROM pet_food_products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Public products plus the user's own, public ones first.
    pub async fn list_visible(
        pool: &SqlitePool,
        user_id: &str,
        filter: &FoodProductFilter,
    ) -> AppResult<Vec<FoodProduct>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM pet_food_products WHERE (is_public = 1 OR created_by = ",
            PRODUCT_COLUMNS
        ));
        qb.push_bind(user_id).push(")");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY is_public DESC, name ASC");

        qb.build_query_as::<FoodProduct>()
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)
    }

    /// Whole catalog for administrators.
    pub async fn list_all(
        pool: &SqlitePool,
        filter: &FoodProductFilter,
    ) -> AppResult<Vec<FoodProduct>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM pet_food_products WHERE 1 = 1",
            PRODUCT_COLUMNS
        ));
        push_filters(&mut qb, filter);
        match filter.visibility {
            Some(Visibility::Public) => {
                qb.push(" AND is_public = 1");
            }
            Some(Visibility::Private) => {
                qb.push(" AND is_public = 0");
            }
            None => {}
        }
        qb.push(" ORDER BY name ASC");

        qb.build_query_as::<FoodProduct>()
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn create(
        pool: &SqlitePool,
        input: &FoodProductInput,
        is_public: bool,
        created_by: Option<&str>,
    ) -> AppResult<FoodProduct> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, FoodProduct>(&format!(
            r#"
            INSERT INTO pet_food_products (
                id, name, brand, calories_per_100g, product_type, species, notes,
                is_public, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(input.calories_per_100g)
        .bind(&input.product_type)
        .bind(&input.species)
        .bind(&input.notes)
        .bind(is_public)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        input: &FoodProductInput,
        is_public: bool,
    ) -> AppResult<Option<FoodProduct>> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, FoodProduct>(&format!(
            r#"
            UPDATE pet_food_products
            SET name = ?, brand = ?, calories_per_100g = ?, product_type = ?, species = ?,
                notes = ?, is_public = ?, updated_at = ?
            WHERE id = ?
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(input.calories_per_100g)
        .bind(&input.product_type)
        .bind(&input.species)
        .bind(&input.notes)
        .bind(is_public)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn set_image(pool: &SqlitePool, id: &str, image_url: &str) -> AppResult<Option<FoodProduct>> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, FoodProduct>(&format!(
            "UPDATE pet_food_products SET image_url = ?, updated_at = ? WHERE id = ? RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(image_url)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Meals keep their history; `food_product_id` is nulled by the foreign key.
    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pet_food_products WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{test_db, UserRepository};

    fn product(name: &str, brand: Option<&str>) -> FoodProductInput {
        FoodProductInput {
            name: name.to_string(),
            brand: brand.map(str::to_string),
            calories_per_100g: 350.0,
            product_type: Some("dry".into()),
            species: Some("dog".into()),
            notes: None,
            is_public: None,
        }
    }

    #[tokio::test]
    async fn visible_list_hides_other_users_private_products() {
        let pool = test_db::pool().await;
        let alice = UserRepository::create(&pool, "alice@example.com", "h", None)
            .await
            .unwrap();
        let bob = UserRepository::create(&pool, "bob@example.com", "h", None)
            .await
            .unwrap();

        FoodProductRepository::create(&pool, &product("Zeta Kibble", None), true, None)
            .await
            .unwrap();
        FoodProductRepository::create(&pool, &product("Alice Mix", None), false, Some(&alice.id))
            .await
            .unwrap();
        FoodProductRepository::create(&pool, &product("Bob Mix", None), false, Some(&bob.id))
            .await
            .unwrap();

        let visible = FoodProductRepository::list_visible(&pool, &alice.id, &FoodProductFilter::default())
            .await
            .unwrap();
        let names: Vec<_> = visible.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta Kibble", "Alice Mix"]);
    }

    #[tokio::test]
    async fn search_matches_name_or_brand_case_insensitively() {
        let pool = test_db::pool().await;
        FoodProductRepository::create(&pool, &product("Senior Formula", Some("Acme")), true, None)
            .await
            .unwrap();
        FoodProductRepository::create(&pool, &product("Puppy Chow", None), true, None)
            .await
            .unwrap();

        let filter = FoodProductFilter {
            q: Some("ACME".into()),
            ..Default::default()
        };
        let found = FoodProductRepository::list_all(&pool, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Senior Formula");

        let private_only = FoodProductFilter {
            visibility: Some(Visibility::Private),
            ..Default::default()
        };
        assert!(FoodProductRepository::list_all(&pool, &private_only)
            .await
            .unwrap()
            .is_empty());
    }
}
