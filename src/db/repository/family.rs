use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{Family, FamilyMember, FamilyMemberWithUser};
use crate::error::{AppError, AppResult};

// ============================================================================
// Family Repository
// ============================================================================

pub struct FamilyRepository;

impl FamilyRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Family>> {
        sqlx::query_as::<_, Family>(
            "SELECT id, name, created_at, updated_at FROM families WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Create a family and make `admin_user_id` its first (admin) member in one transaction.
    pub async fn create_with_admin(
        pool: &SqlitePool,
        name: &str,
        admin_user_id: &str,
        relation: &str,
    ) -> AppResult<(Family, FamilyMember)> {
        let now = chrono::Utc::now().naive_utc();
        let mut tx = pool.begin().await.map_err(AppError::Database)?;

        let family = sqlx::query_as::<_, Family>(
            r#"
            INSERT INTO families (id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let member = sqlx::query_as::<_, FamilyMember>(
            r#"
            INSERT INTO family_members (id, family_id, user_id, relation, is_admin, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            RETURNING id, family_id, user_id, relation, is_admin, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&family.id)
        .bind(admin_user_id)
        .bind(relation)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok((family, member))
    }

    pub async fn rename(pool: &SqlitePool, id: &str, name: &str) -> AppResult<Option<Family>> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Family>(
            r#"
            UPDATE families SET name = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}

// ============================================================================
// Family Member Repository
// ============================================================================

pub struct FamilyMemberRepository;

impl FamilyMemberRepository {
    pub async fn add(
        pool: &SqlitePool,
        family_id: &str,
        user_id: &str,
        relation: &str,
        is_admin: bool,
    ) -> AppResult<FamilyMember> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, FamilyMember>(
            r#"
            INSERT INTO family_members (id, family_id, user_id, relation, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, family_id, user_id, relation, is_admin, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(family_id)
        .bind(user_id)
        .bind(relation)
        .bind(is_admin)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// A user belongs to at most one family.
    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> AppResult<Option<FamilyMember>> {
        sqlx::query_as::<_, FamilyMember>(
            r#"
            SELECT id, family_id, user_id, relation, is_admin, created_at
            FROM family_members
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_in_family(
        pool: &SqlitePool,
        family_id: &str,
        member_id: &str,
    ) -> AppResult<Option<FamilyMember>> {
        sqlx::query_as::<_, FamilyMember>(
            r#"
            SELECT id, family_id, user_id, relation, is_admin, created_at
            FROM family_members
            WHERE id = ? AND family_id = ?
            "#,
        )
        .bind(member_id)
        .bind(family_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_with_users(
        pool: &SqlitePool,
        family_id: &str,
    ) -> AppResult<Vec<FamilyMemberWithUser>> {
        sqlx::query_as::<_, FamilyMemberWithUser>(
            r#"
            SELECT
                m.id, m.family_id, m.user_id, m.relation, m.is_admin, m.created_at,
                u.email, u.display_name
            FROM family_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.family_id = ?
            ORDER BY m.created_at ASC, m.rowid ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        member_id: &str,
        relation: &str,
        is_admin: bool,
    ) -> AppResult<FamilyMember> {
        sqlx::query_as::<_, FamilyMember>(
            r#"
            UPDATE family_members SET relation = ?, is_admin = ?
            WHERE id = ?
            RETURNING id, family_id, user_id, relation, is_admin, created_at
            "#,
        )
        .bind(relation)
        .bind(is_admin)
        .bind(member_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, member_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM family_members WHERE id = ?")
            .bind(member_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{test_db, UserRepository};

    #[tokio::test]
    async fn family_creator_is_admin_member() {
        let pool = test_db::pool().await;
        let user = UserRepository::create(&pool, "p@example.com", "h", None)
            .await
            .unwrap();

        let (family, member) = FamilyRepository::create_with_admin(&pool, "Smiths", &user.id, "father")
            .await
            .unwrap();

        assert!(member.is_admin);
        assert_eq!(member.family_id, family.id);

        let members = FamilyMemberRepository::list_with_users(&pool, &family.id)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].email, "p@example.com");
    }

    #[tokio::test]
    async fn member_lookup_is_scoped_to_family() {
        let pool = test_db::pool().await;
        let a = UserRepository::create(&pool, "a@example.com", "h", None)
            .await
            .unwrap();
        let b = UserRepository::create(&pool, "b@example.com", "h", None)
            .await
            .unwrap();
        let (fam_a, member_a) = FamilyRepository::create_with_admin(&pool, "A", &a.id, "other")
            .await
            .unwrap();
        let (fam_b, _) = FamilyRepository::create_with_admin(&pool, "B", &b.id, "other")
            .await
            .unwrap();

        assert!(FamilyMemberRepository::find_in_family(&pool, &fam_a.id, &member_a.id)
            .await
            .unwrap()
            .is_some());
        assert!(FamilyMemberRepository::find_in_family(&pool, &fam_b.id, &member_a.id)
            .await
            .unwrap()
            .is_none());
    }
}
