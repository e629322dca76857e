//! Time-limited, read-only share links for a single pet.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;

use crate::db::{
    DateRange, Meal, MealRepository, Pet, PetMeta, PetMetaRepository, PetRepository, PetTrait,
    PetTraitRepository, ShareToken, ShareTokenRepository, User, Walk, WalkRepository,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::{AccessService, Role};
use crate::AppState;

const TOKEN_BYTES: usize = 32;
/// Walks and meals included in a shared view.
pub const SHARED_RECENT_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub id: String,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub share_url: String,
}

/// Everything an anonymous holder of a share link can see.
#[derive(Debug, Serialize)]
pub struct SharedPetView {
    pub pet: Pet,
    pub walks: Vec<Walk>,
    pub meals: Vec<Meal>,
    pub traits: Vec<PetTrait>,
    pub meta: Vec<PetMeta>,
    pub expires_at: NaiveDateTime,
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

pub struct ShareTokenService;

impl ShareTokenService {
    fn expiration_days(state: &Arc<AppState>, requested: Option<i64>) -> AppResult<i64> {
        let max = state.config.share.max_expiration_days;
        match requested {
            None | Some(0) => Ok(state.config.share.default_expiration_days),
            Some(days) if days < 0 || days > max => Err(AppError::Validation(i18n::t_with(
                "validation.expiration_days_range",
                &[("max", &max.to_string())],
            ))),
            Some(days) => Ok(days),
        }
    }

    pub async fn issue(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        expiration_days: Option<i64>,
    ) -> AppResult<IssuedToken> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await?;
        let days = Self::expiration_days(state, expiration_days)?;

        let now = state.clock.now().naive_utc();
        let expires_at = now + Duration::days(days);
        let token = generate_token();

        let stored =
            ShareTokenRepository::create(&state.db, &pet.id, &token, &user.id, expires_at, now)
                .await?;
        tracing::info!(
            "User {} shared pet {} until {} (token {})",
            user.id,
            pet.id,
            stored.expires_at,
            stored.id
        );

        Ok(IssuedToken {
            share_url: state.config.share_url(&stored.token),
            id: stored.id,
            token: stored.token,
            expires_at: stored.expires_at,
        })
    }

    pub async fn list(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
    ) -> AppResult<Vec<ShareToken>> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await?;
        ShareTokenRepository::list_active(&state.db, &pet.id, state.clock.now().naive_utc()).await
    }

    /// Family admins only, although any member may issue.
    pub async fn revoke(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        token_id: &str,
    ) -> AppResult<()> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyAdmin).await?;

        if !ShareTokenRepository::deactivate(&state.db, token_id, &pet.id).await? {
            return Err(AppError::NotFound(i18n::t("not_found.share_token")));
        }

        tracing::info!("User {} revoked share token {} of pet {}", user.id, token_id, pet.id);
        Ok(())
    }

    /// The shared view for a bearer token, or `None` when the token is
    /// malformed, unknown, revoked or expired.
    pub async fn resolve(state: &Arc<AppState>, token: &str) -> AppResult<Option<SharedPetView>> {
        if !is_well_formed(token) {
            return Ok(None);
        }

        let Some(share) = ShareTokenRepository::find_by_token(&state.db, token).await? else {
            return Ok(None);
        };
        if !share.is_valid_at(state.clock.now().naive_utc()) {
            tracing::debug!("Share token {} is revoked or expired", share.id);
            return Ok(None);
        }

        let Some(pet) = PetRepository::find_by_id(&state.db, &share.pet_id).await? else {
            return Ok(None);
        };

        let all = DateRange::default();
        let walks = WalkRepository::list(&state.db, &pet.id, &all, Some(SHARED_RECENT_LIMIT)).await?;
        let meals = MealRepository::list(&state.db, &pet.id, &all, Some(SHARED_RECENT_LIMIT)).await?;
        let traits = PetTraitRepository::list(&state.db, &pet.id).await?;
        let meta = PetMetaRepository::list(&state.db, &pet.id).await?;

        Ok(Some(SharedPetView {
            pet,
            walks,
            meals,
            traits,
            meta,
            expires_at: share.expires_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::datetime::parse_datetime;
    use crate::db::WalkInput;
    use crate::services::clock::Clock;
    use crate::services::test_support;

    #[tokio::test]
    async fn tokens_are_64_lowercase_hex_and_unique() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        let first = ShareTokenService::issue(&app.state, &admin, &pet.id, None)
            .await
            .unwrap();
        let second = ShareTokenService::issue(&app.state, &admin, &pet.id, None)
            .await
            .unwrap();

        for issued in [&first, &second] {
            assert_eq!(issued.token.len(), 64);
            assert!(is_well_formed(&issued.token));
            assert!(issued.share_url.ends_with(&format!("/share/{}", issued.token)));
        }
        assert_ne!(first.token, second.token);
        assert_eq!(
            first.expires_at,
            app.clock.now().naive_utc() + Duration::days(7)
        );
    }

    #[test]
    fn generated_tokens_never_repeat() {
        let tokens: std::collections::HashSet<String> = (0..200).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 200);
    }

    #[tokio::test]
    async fn expiration_days_are_bounded() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        for bad in [-1, 366] {
            assert!(matches!(
                ShareTokenService::issue(&app.state, &admin, &pet.id, Some(bad)).await,
                Err(AppError::Validation(_))
            ));
        }
        let zero = ShareTokenService::issue(&app.state, &admin, &pet.id, Some(0))
            .await
            .unwrap();
        assert_eq!(
            zero.expires_at,
            app.clock.now().naive_utc() + Duration::days(7)
        );
    }

    #[tokio::test]
    async fn end_to_end_expiry() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;
        WalkRepository::create(
            &app.state.db,
            &pet.id,
            &WalkInput {
                walked_at: parse_datetime("2025-06-01T07:00").unwrap(),
                duration_minutes: Some(30),
                distance_km: Some(2.5),
                notes: None,
            },
        )
        .await
        .unwrap();

        let issued = ShareTokenService::issue(&app.state, &admin, &pet.id, Some(1))
            .await
            .unwrap();

        let view = ShareTokenService::resolve(&app.state, &issued.token)
            .await
            .unwrap()
            .expect("fresh token resolves");
        assert_eq!(view.pet.id, pet.id);
        assert_eq!(view.walks.len(), 1);
        assert_eq!(view.expires_at, issued.expires_at);

        app.clock.advance(Duration::days(1) + Duration::seconds(1));
        assert!(ShareTokenService::resolve(&app.state, &issued.token)
            .await
            .unwrap()
            .is_none());
        assert!(ShareTokenService::list(&app.state, &admin, &pet.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_includes_the_expiry_instant() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        let mut issued = Vec::new();
        for _ in 0..3 {
            issued.push(
                ShareTokenService::issue(&app.state, &admin, &pet.id, Some(1))
                    .await
                    .unwrap(),
            );
            app.clock.advance(Duration::hours(1));
        }

        let listed: Vec<String> = ShareTokenService::list(&app.state, &admin, &pet.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        let newest_first: Vec<String> = issued.iter().rev().map(|t| t.id.clone()).collect();
        assert_eq!(listed, newest_first);

        // Land exactly on the oldest token's expiry.
        let oldest = &issued[0];
        let until_expiry = oldest.expires_at - app.clock.now().naive_utc();
        app.clock.advance(until_expiry);
        assert_eq!(app.clock.now().naive_utc(), oldest.expires_at);

        let listed = ShareTokenService::list(&app.state, &admin, &pet.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[2].id, oldest.id);
        assert!(ShareTokenService::resolve(&app.state, &oldest.token)
            .await
            .unwrap()
            .is_none());
        assert!(ShareTokenService::resolve(&app.state, &issued[1].token)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn revoked_tokens_stop_resolving() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        let issued = ShareTokenService::issue(&app.state, &admin, &pet.id, None)
            .await
            .unwrap();
        assert_eq!(
            ShareTokenService::list(&app.state, &admin, &pet.id)
                .await
                .unwrap()
                .len(),
            1
        );

        ShareTokenService::revoke(&app.state, &admin, &pet.id, &issued.id)
            .await
            .unwrap();
        assert!(ShareTokenService::resolve(&app.state, &issued.token)
            .await
            .unwrap()
            .is_none());
        assert!(ShareTokenService::list(&app.state, &admin, &pet.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn members_share_but_only_admins_revoke() {
        let app = test_support::app().await;
        let (_, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let kid = test_support::member(&app.state, &family.id, "k@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        let issued = ShareTokenService::issue(&app.state, &kid, &pet.id, None)
            .await
            .unwrap();
        assert_eq!(
            ShareTokenService::list(&app.state, &kid, &pet.id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            ShareTokenService::revoke(&app.state, &kid, &pet.id, &issued.id).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn outsiders_and_foreign_tokens() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let (outsider, other_family) =
            test_support::family_with_admin(&app.state, "b@example.com").await;
        let rex = test_support::pet(&app.state, &family.id, "Rex").await;
        let tama = test_support::pet(&app.state, &other_family.id, "Tama").await;

        assert!(matches!(
            ShareTokenService::issue(&app.state, &outsider, &rex.id, None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            ShareTokenService::list(&app.state, &outsider, &rex.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            ShareTokenService::revoke(&app.state, &outsider, &rex.id, "whatever").await,
            Err(AppError::Forbidden)
        ));

        let tama_token = ShareTokenService::issue(&app.state, &outsider, &tama.id, None)
            .await
            .unwrap();
        assert!(matches!(
            ShareTokenService::revoke(&app.state, &admin, &rex.id, &tama_token.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_tokens_resolve_to_nothing() {
        let app = test_support::app().await;
        let candidates = [
            String::new(),
            "abc".to_string(),
            "g".repeat(64),
            "A".repeat(64),
            "0".repeat(64),
        ];
        for token in &candidates {
            assert!(ShareTokenService::resolve(&app.state, token)
                .await
                .unwrap()
                .is_none());
        }
    }
}
