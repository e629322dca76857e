use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{AdminUserRepository, Family, FamilyRepository, User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::{AccessService, Role};
use crate::AppState;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Everything the client needs after login to pick a landing area.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: User,
    pub family: Option<Family>,
    pub family_role: Option<Role>,
    pub is_family_admin: bool,
    pub is_system_admin: bool,
    pub is_system_only: bool,
    /// `/admin` for system-only administrators, `/app` otherwise.
    pub landing: &'static str,
}

pub struct AuthService;

impl AuthService {
    pub fn normalize_email(email: &str) -> AppResult<String> {
        let email = email.trim().to_lowercase();
        let valid = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        };
        if !valid {
            return Err(AppError::Validation(i18n::t("validation.email_invalid")));
        }
        Ok(email)
    }

    pub async fn register(
        state: &Arc<AppState>,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AppResult<User> {
        let email = Self::normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(i18n::t_with(
                "validation.password_too_short",
                &[("min", &MIN_PASSWORD_LENGTH.to_string())],
            )));
        }

        if UserRepository::find_by_email(&state.db, &email).await?.is_some() {
            return Err(AppError::Conflict(i18n::t("conflict.email_taken")));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt: {}", e)))?;

        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());
        let user = UserRepository::create(&state.db, &email, &password_hash, display_name).await?;

        if state.config.admin.bootstrap_emails.contains(&email) {
            AdminUserRepository::grant(&state.db, &user.id, state.config.admin.system_only).await?;
            tracing::info!("Granted system admin to bootstrap account {}", user.id);
        }

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(state: &Arc<AppState>, email: &str, password: &str) -> AppResult<User> {
        let invalid = || AppError::InvalidCredentials;
        let email = Self::normalize_email(email).map_err(|_| invalid())?;

        let Some(user) = UserRepository::find_by_email(&state.db, &email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(invalid());
        };

        let matches = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
        if !matches {
            tracing::debug!("Wrong password for user {}", user.id);
            return Err(invalid());
        }

        Ok(user)
    }

    /// Create a signed JWT for a user id. Uses wall-clock time since
    /// `jsonwebtoken` validates `exp` against it.
    pub fn create_jwt(state: &Arc<AppState>, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(state.config.jwt.expiration_hours);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT, returning the claims
    pub fn decode_jwt(state: &Arc<AppState>, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub async fn get_user_from_token(state: &Arc<AppState>, token: &str) -> AppResult<User> {
        let claims = Self::decode_jwt(state, token)?;
        UserRepository::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    pub async fn session_info(state: &Arc<AppState>, user: User) -> AppResult<SessionInfo> {
        let membership = AccessService::family_role(state, &user).await?;
        let family = match &membership {
            Some((member, _)) => FamilyRepository::find_by_id(&state.db, &member.family_id).await?,
            None => None,
        };
        let family_role = membership.map(|(_, role)| role);
        let admin = AccessService::system_admin(state, &user).await?;
        let is_system_only = admin.as_ref().map(|a| a.is_system_only).unwrap_or(false);

        Ok(SessionInfo {
            user,
            family,
            family_role,
            is_family_admin: family_role == Some(Role::FamilyAdmin),
            is_system_admin: admin.is_some(),
            is_system_only,
            landing: if is_system_only { "/admin" } else { "/app" },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    #[test]
    fn normalizes_email() {
        assert_eq!(
            AuthService::normalize_email("  Mom@Example.COM ").unwrap(),
            "mom@example.com"
        );
        assert!(AuthService::normalize_email("no-at-sign").is_err());
        assert!(AuthService::normalize_email("@example.com").is_err());
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = test_support::app().await;

        let user = AuthService::register(&app.state, "Dad@Example.com", "correct horse", Some(" Dad "))
            .await
            .unwrap();
        assert_eq!(user.email, "dad@example.com");
        assert_eq!(user.display_name.as_deref(), Some("Dad"));

        let logged_in = AuthService::login(&app.state, "dad@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let token = AuthService::create_jwt(&app.state, &user.id).unwrap();
        let resolved = AuthService::get_user_from_token(&app.state, &token)
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let app = test_support::app().await;

        assert!(matches!(
            AuthService::register(&app.state, "a@example.com", "short", None).await,
            Err(AppError::Validation(_))
        ));
        AuthService::register(&app.state, "a@example.com", "long enough", None)
            .await
            .unwrap();
        assert!(matches!(
            AuthService::register(&app.state, "A@example.com", "long enough", None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = test_support::app().await;
        AuthService::register(&app.state, "kid@example.com", "password1", None)
            .await
            .unwrap();

        let wrong_password = AuthService::login(&app.state, "kid@example.com", "password2")
            .await
            .unwrap_err();
        let unknown = AuthService::login(&app.state, "nobody@example.com", "password1")
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn bootstrap_emails_become_system_admins() {
        let mut config = test_support::test_config();
        config.admin.bootstrap_emails = vec!["ops@example.com".to_string()];
        config.admin.system_only = true;
        let app = test_support::app_with_config(config).await;

        let admin = AuthService::register(&app.state, "OPS@example.com", "password1", None)
            .await
            .unwrap();
        let info = AuthService::session_info(&app.state, admin).await.unwrap();
        assert!(info.is_system_admin);
        assert_eq!(info.landing, "/admin");

        let regular = AuthService::register(&app.state, "user@example.com", "password1", None)
            .await
            .unwrap();
        let info = AuthService::session_info(&app.state, regular).await.unwrap();
        assert!(!info.is_system_admin);
        assert_eq!(info.landing, "/app");
        assert!(info.family.is_none());
    }
}
