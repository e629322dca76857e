use std::sync::Arc;

use axum::body::Bytes;
use url::Url;

use crate::db::{Banner, BannerInput, BannerRepository, MoveDirection, User, BANNER_POSITIONS};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::AccessService;
use crate::services::storage::{self, BUCKET_AD_BANNERS};
use crate::AppState;

pub const DEFAULT_POSITION: &str = "dashboard";

fn not_found() -> AppError {
    AppError::NotFound(i18n::t("not_found.banner"))
}

fn validate_position(position: &str) -> AppResult<()> {
    if BANNER_POSITIONS.contains(&position) {
        Ok(())
    } else {
        Err(AppError::Validation(i18n::t_with(
            "validation.invalid_choice",
            &[
                ("field", "display_position"),
                ("choices", &BANNER_POSITIONS.join(", ")),
            ],
        )))
    }
}

fn validate(input: &BannerInput) -> AppResult<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation(i18n::t_with(
            "validation.required",
            &[("field", "title")],
        )));
    }

    let link_ok = Url::parse(input.link_url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !link_ok {
        return Err(AppError::Validation(i18n::t("validation.invalid_link_url")));
    }

    if let Some(position) = input.display_position.as_deref() {
        validate_position(position)?;
    }

    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            return Err(AppError::Validation(i18n::t("validation.end_before_start")));
        }
    }
    Ok(())
}

pub struct BannerService;

impl BannerService {
    /// Banners currently running at `position`.
    pub async fn list_public(state: &Arc<AppState>, position: Option<&str>) -> AppResult<Vec<Banner>> {
        let position = position.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_POSITION);
        validate_position(position)?;

        let today = state.clock.now().date_naive();
        BannerRepository::list_public(&state.db, position, today).await
    }

    pub async fn record_click(state: &Arc<AppState>, id: &str) -> AppResult<()> {
        if !BannerRepository::increment_click(&state.db, id).await? {
            return Err(not_found());
        }
        Ok(())
    }

    pub async fn admin_list(state: &Arc<AppState>, user: &User) -> AppResult<Vec<Banner>> {
        AccessService::require_system_admin(state, user).await?;
        BannerRepository::list_all(&state.db).await
    }

    pub async fn create(state: &Arc<AppState>, user: &User, input: &BannerInput) -> AppResult<Banner> {
        AccessService::require_system_admin(state, user).await?;
        validate(input)?;
        let banner = BannerRepository::create(&state.db, input).await?;
        tracing::info!("Admin {} created banner {}", user.id, banner.id);
        Ok(banner)
    }

    pub async fn update(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        input: &BannerInput,
    ) -> AppResult<Banner> {
        AccessService::require_system_admin(state, user).await?;
        validate(input)?;
        BannerRepository::update(&state.db, id, input)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(state: &Arc<AppState>, user: &User, id: &str) -> AppResult<()> {
        AccessService::require_system_admin(state, user).await?;
        let banner = BannerRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(not_found)?;

        BannerRepository::delete(&state.db, &banner.id).await?;
        storage::remove_replaced(state.storage.as_ref(), banner.image_url.as_deref()).await;
        tracing::info!("Admin {} deleted banner {}", user.id, banner.id);
        Ok(())
    }

    pub async fn toggle(state: &Arc<AppState>, user: &User, id: &str) -> AppResult<Banner> {
        AccessService::require_system_admin(state, user).await?;
        let banner = BannerRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(not_found)?;

        BannerRepository::set_active(&state.db, &banner.id, !banner.is_active)
            .await?
            .ok_or_else(not_found)
    }

    /// Swap `display_order` with the neighbour in `direction`. Moving past
    /// either end leaves the order unchanged. Returns the full ordering.
    pub async fn move_banner(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        direction: MoveDirection,
    ) -> AppResult<Vec<Banner>> {
        AccessService::require_system_admin(state, user).await?;
        let banners = BannerRepository::list_all(&state.db).await?;
        let index = banners.iter().position(|b| b.id == id).ok_or_else(not_found)?;

        let neighbour = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|i| *i < banners.len()),
        };

        if let Some(other) = neighbour {
            let (current, swap_with) = (&banners[index], &banners[other]);
            // Two independent updates; concurrent reorders are last-write-wins.
            BannerRepository::set_order(&state.db, &current.id, swap_with.display_order).await?;
            BannerRepository::set_order(&state.db, &swap_with.id, current.display_order).await?;
        }

        BannerRepository::list_all(&state.db).await
    }

    pub async fn upload_image(
        state: &Arc<AppState>,
        user: &User,
        id: &str,
        filename: &str,
        data: Bytes,
    ) -> AppResult<Banner> {
        AccessService::require_system_admin(state, user).await?;
        let banner = BannerRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(not_found)?;

        let url = storage::store_image(
            state.storage.as_ref(),
            BUCKET_AD_BANNERS,
            None,
            filename,
            data,
            state.config.storage.max_upload_bytes,
        )
        .await?;

        let updated = BannerRepository::set_image(&state.db, &banner.id, &url)
            .await?
            .ok_or_else(not_found)?;
        storage::remove_replaced(state.storage.as_ref(), banner.image_url.as_deref()).await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AdminUserRepository;
    use crate::services::test_support;
    use chrono::{Duration, NaiveDate};

    fn input(title: &str) -> BannerInput {
        BannerInput {
            title: title.to_string(),
            description: None,
            image_url: None,
            link_url: "https://example.com/promo".to_string(),
            is_active: None,
            display_position: None,
            background_color: None,
            text_color: None,
            start_date: None,
            end_date: None,
        }
    }

    async fn system_admin(state: &Arc<AppState>) -> User {
        let admin = test_support::user(state, "ops@example.com").await;
        AdminUserRepository::grant(&state.db, &admin.id, false)
            .await
            .unwrap();
        admin
    }

    fn titles(banners: &[Banner]) -> Vec<&str> {
        banners.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn move_swaps_with_neighbour_and_stops_at_the_ends() {
        let app = test_support::app().await;
        let admin = system_admin(&app.state).await;
        let a = BannerService::create(&app.state, &admin, &input("A")).await.unwrap();
        BannerService::create(&app.state, &admin, &input("B")).await.unwrap();
        let c = BannerService::create(&app.state, &admin, &input("C")).await.unwrap();

        let order = BannerService::move_banner(&app.state, &admin, &c.id, MoveDirection::Up)
            .await
            .unwrap();
        assert_eq!(titles(&order), ["A", "C", "B"]);

        let order = BannerService::move_banner(&app.state, &admin, &a.id, MoveDirection::Up)
            .await
            .unwrap();
        assert_eq!(titles(&order), ["A", "C", "B"]);

        let order = BannerService::move_banner(&app.state, &admin, &a.id, MoveDirection::Down)
            .await
            .unwrap();
        assert_eq!(titles(&order), ["C", "A", "B"]);

        let last = order.last().unwrap().id.clone();
        let order = BannerService::move_banner(&app.state, &admin, &last, MoveDirection::Down)
            .await
            .unwrap();
        assert_eq!(titles(&order), ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn public_listing_respects_position_window_and_active_flag() {
        let app = test_support::app().await;
        let admin = system_admin(&app.state).await;
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let mut dashboard = input("Dashboard");
        dashboard.display_position = Some("dashboard".into());
        BannerService::create(&app.state, &admin, &dashboard).await.unwrap();

        let mut detail = input("Detail");
        detail.display_position = Some("pet_detail".into());
        BannerService::create(&app.state, &admin, &detail).await.unwrap();

        BannerService::create(&app.state, &admin, &input("Everywhere")).await.unwrap();

        let mut future = input("Future");
        future.start_date = Some(today + Duration::days(1));
        BannerService::create(&app.state, &admin, &future).await.unwrap();

        let mut ended = input("Ended");
        ended.end_date = Some(today - Duration::days(1));
        BannerService::create(&app.state, &admin, &ended).await.unwrap();

        let hidden = BannerService::create(&app.state, &admin, &input("Hidden")).await.unwrap();
        let toggled = BannerService::toggle(&app.state, &admin, &hidden.id).await.unwrap();
        assert!(!toggled.is_active);

        let shown = BannerService::list_public(&app.state, Some("dashboard")).await.unwrap();
        assert_eq!(titles(&shown), ["Dashboard", "Everywhere"]);

        let shown = BannerService::list_public(&app.state, Some("pet_detail")).await.unwrap();
        assert_eq!(titles(&shown), ["Detail", "Everywhere"]);

        assert!(matches!(
            BannerService::list_public(&app.state, Some("sidebar")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn validates_links_and_requires_admin() {
        let app = test_support::app().await;
        let admin = system_admin(&app.state).await;
        let user = test_support::user(&app.state, "u@example.com").await;

        let mut bad_link = input("Promo");
        bad_link.link_url = "javascript:alert(1)".into();
        assert!(matches!(
            BannerService::create(&app.state, &admin, &bad_link).await,
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            BannerService::create(&app.state, &user, &input("Promo")).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            BannerService::admin_list(&app.state, &user).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn clicks_are_counted() {
        let app = test_support::app().await;
        let admin = system_admin(&app.state).await;
        let banner = BannerService::create(&app.state, &admin, &input("Promo")).await.unwrap();

        BannerService::record_click(&app.state, &banner.id).await.unwrap();
        BannerService::record_click(&app.state, &banner.id).await.unwrap();
        let all = BannerService::admin_list(&app.state, &admin).await.unwrap();
        assert_eq!(all[0].click_count, 2);

        assert!(matches!(
            BannerService::record_click(&app.state, "missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
