use std::sync::Arc;

use serde::Serialize;

use crate::db::{StatsRepository, SystemStatistics, User};
use crate::error::AppResult;
use crate::services::access::AccessService;
use crate::AppState;

/// Answer to "may I open the admin panel?", usable without a session.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AdminCheck {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_system_only: bool,
}

pub struct AdminService;

impl AdminService {
    pub async fn check(state: &Arc<AppState>, user: Option<&User>) -> AppResult<AdminCheck> {
        let Some(user) = user else {
            return Ok(AdminCheck {
                authenticated: false,
                user_id: None,
                email: None,
                is_admin: false,
                is_system_only: false,
            });
        };

        let admin = AccessService::system_admin(state, user).await?;
        Ok(AdminCheck {
            authenticated: true,
            user_id: Some(user.id.clone()),
            email: Some(user.email.clone()),
            is_admin: admin.is_some(),
            is_system_only: admin.map(|a| a.is_system_only).unwrap_or(false),
        })
    }

    pub async fn stats(state: &Arc<AppState>, user: &User) -> AppResult<SystemStatistics> {
        AccessService::require_system_admin(state, user).await?;
        StatsRepository::system_statistics(&state.db, state.clock.now().naive_utc()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AdminUserRepository;
    use crate::error::AppError;
    use crate::services::test_support;

    #[tokio::test]
    async fn check_reports_anonymous_and_admin_callers() {
        let app = test_support::app().await;

        let anonymous = AdminService::check(&app.state, None).await.unwrap();
        assert!(!anonymous.authenticated);
        assert!(!anonymous.is_admin);

        let user = test_support::user(&app.state, "ops@example.com").await;
        let before = AdminService::check(&app.state, Some(&user)).await.unwrap();
        assert!(before.authenticated);
        assert!(!before.is_admin);

        AdminUserRepository::grant(&app.state.db, &user.id, true)
            .await
            .unwrap();
        let after = AdminService::check(&app.state, Some(&user)).await.unwrap();
        assert!(after.is_admin);
        assert!(after.is_system_only);
        assert_eq!(after.email.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn stats_are_admin_only() {
        let app = test_support::app().await;
        let (family_admin, family) =
            test_support::family_with_admin(&app.state, "a@example.com").await;
        test_support::pet(&app.state, &family.id, "Rex").await;

        assert!(matches!(
            AdminService::stats(&app.state, &family_admin).await,
            Err(AppError::Forbidden)
        ));

        AdminUserRepository::grant(&app.state.db, &family_admin.id, false)
            .await
            .unwrap();
        let stats = AdminService::stats(&app.state, &family_admin).await.unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_families, 1);
        assert_eq!(stats.total_pets, 1);
    }
}
