use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::{
    Family, FamilyMember, FamilyMemberRepository, FamilyMemberWithUser, FamilyRepository, User,
    FAMILY_RELATIONS,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::{AccessService, Role};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FamilyOverview {
    pub family: Family,
    pub members: Vec<FamilyMemberWithUser>,
    pub my_member_id: String,
    pub my_role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberUpdate {
    pub relation: Option<String>,
    pub is_admin: Option<bool>,
}

fn required_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(i18n::t_with(
            "validation.required",
            &[("field", "name")],
        )));
    }
    Ok(name)
}

pub fn validate_relation(relation: Option<&str>) -> AppResult<&str> {
    let relation = relation.map(str::trim).filter(|r| !r.is_empty()).unwrap_or("other");
    if FAMILY_RELATIONS.contains(&relation) {
        Ok(relation)
    } else {
        Err(AppError::Validation(i18n::t_with(
            "validation.invalid_choice",
            &[("field", "relation"), ("choices", &FAMILY_RELATIONS.join(", "))],
        )))
    }
}

pub struct FamilyService;

impl FamilyService {
    pub async fn create(
        state: &Arc<AppState>,
        user: &User,
        name: &str,
        relation: Option<&str>,
    ) -> AppResult<FamilyOverview> {
        let name = required_name(name)?;
        let relation = validate_relation(relation)?;

        if FamilyMemberRepository::find_by_user(&state.db, &user.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(i18n::t("conflict.already_in_family")));
        }

        let (family, _) =
            FamilyRepository::create_with_admin(&state.db, name, &user.id, relation).await?;
        tracing::info!("User {} created family {}", user.id, family.id);

        Self::get_mine(state, user).await
    }

    pub async fn join(
        state: &Arc<AppState>,
        user: &User,
        family_id: &str,
        relation: Option<&str>,
    ) -> AppResult<FamilyOverview> {
        let relation = validate_relation(relation)?;

        let family = FamilyRepository::find_by_id(&state.db, family_id.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.family")))?;

        if FamilyMemberRepository::find_by_user(&state.db, &user.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(i18n::t("conflict.already_in_family")));
        }

        FamilyMemberRepository::add(&state.db, &family.id, &user.id, relation, false).await?;
        tracing::info!("User {} joined family {}", user.id, family.id);

        Self::get_mine(state, user).await
    }

    pub async fn get_mine(state: &Arc<AppState>, user: &User) -> AppResult<FamilyOverview> {
        let member = AccessService::require_family_role(state, user, Role::FamilyMember).await?;
        Self::overview(state, member).await
    }

    async fn overview(state: &Arc<AppState>, member: FamilyMember) -> AppResult<FamilyOverview> {
        let family = FamilyRepository::find_by_id(&state.db, &member.family_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.family")))?;
        let members = FamilyMemberRepository::list_with_users(&state.db, &family.id).await?;

        Ok(FamilyOverview {
            family,
            members,
            my_role: if member.is_admin {
                Role::FamilyAdmin
            } else {
                Role::FamilyMember
            },
            my_member_id: member.id,
        })
    }

    pub async fn rename(state: &Arc<AppState>, user: &User, name: &str) -> AppResult<FamilyOverview> {
        let name = required_name(name)?;
        let member = AccessService::require_family_role(state, user, Role::FamilyAdmin).await?;

        FamilyRepository::rename(&state.db, &member.family_id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.family")))?;

        Self::overview(state, member).await
    }

    pub async fn leave(state: &Arc<AppState>, user: &User) -> AppResult<()> {
        let member = AccessService::require_family_role(state, user, Role::FamilyMember).await?;
        FamilyMemberRepository::delete(&state.db, &member.id).await?;
        tracing::info!("User {} left family {}", user.id, member.family_id);
        Ok(())
    }

    /// Change a member's relation label and/or family-admin standing.
    /// Concurrent edits are last-write-wins.
    pub async fn update_member(
        state: &Arc<AppState>,
        user: &User,
        member_id: &str,
        update: &MemberUpdate,
    ) -> AppResult<FamilyMember> {
        let me = AccessService::require_family_role(state, user, Role::FamilyAdmin).await?;
        let target = FamilyMemberRepository::find_in_family(&state.db, &me.family_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.member")))?;

        let relation = match update.relation.as_deref() {
            Some(r) => validate_relation(Some(r))?.to_string(),
            None => target.relation.clone(),
        };
        let is_admin = update.is_admin.unwrap_or(target.is_admin);

        let updated = FamilyMemberRepository::update(&state.db, &target.id, &relation, is_admin).await?;
        tracing::info!(
            "User {} updated member {} (relation={}, is_admin={})",
            user.id,
            updated.id,
            updated.relation,
            updated.is_admin
        );
        Ok(updated)
    }

    pub async fn remove_member(state: &Arc<AppState>, user: &User, member_id: &str) -> AppResult<()> {
        let me = AccessService::require_family_role(state, user, Role::FamilyAdmin).await?;
        if me.id == member_id {
            return Err(AppError::Validation(i18n::t("validation.cannot_remove_self")));
        }

        let target = FamilyMemberRepository::find_in_family(&state.db, &me.family_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.member")))?;

        FamilyMemberRepository::delete(&state.db, &target.id).await?;
        tracing::info!("User {} removed member {} from family {}", user.id, target.id, me.family_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    #[tokio::test]
    async fn create_and_join() {
        let app = test_support::app().await;
        let mom = test_support::user(&app.state, "mom@example.com").await;
        let kid = test_support::user(&app.state, "kid@example.com").await;

        let created = FamilyService::create(&app.state, &mom, "  The Parks ", Some("mother"))
            .await
            .unwrap();
        assert_eq!(created.family.name, "The Parks");
        assert_eq!(created.my_role, Role::FamilyAdmin);

        let joined = FamilyService::join(&app.state, &kid, &created.family.id, Some("son"))
            .await
            .unwrap();
        assert_eq!(joined.my_role, Role::FamilyMember);
        assert_eq!(joined.members.len(), 2);

        assert!(matches!(
            FamilyService::create(&app.state, &kid, "Another", None).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            FamilyService::join(&app.state, &kid, &created.family.id, None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn join_validates_family_and_relation() {
        let app = test_support::app().await;
        let (_, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let newcomer = test_support::user(&app.state, "n@example.com").await;

        assert!(matches!(
            FamilyService::join(&app.state, &newcomer, "no-such-family", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            FamilyService::join(&app.state, &newcomer, &family.id, Some("uncle")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_admins_manage_members() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let kid = test_support::member(&app.state, &family.id, "k@example.com").await;

        let overview = FamilyService::get_mine(&app.state, &admin).await.unwrap();
        let kid_member = overview
            .members
            .iter()
            .find(|m| m.user_id == kid.id)
            .unwrap()
            .id
            .clone();

        assert!(matches!(
            FamilyService::rename(&app.state, &kid, "Mine now").await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            FamilyService::remove_member(&app.state, &kid, &overview.my_member_id).await,
            Err(AppError::Forbidden)
        ));

        let promoted = FamilyService::update_member(
            &app.state,
            &admin,
            &kid_member,
            &MemberUpdate {
                relation: Some("daughter".into()),
                is_admin: Some(true),
            },
        )
        .await
        .unwrap();
        assert!(promoted.is_admin);
        assert_eq!(promoted.relation, "daughter");

        // Now an admin, the kid can rename.
        let renamed = FamilyService::rename(&app.state, &kid, "Renamed").await.unwrap();
        assert_eq!(renamed.family.name, "Renamed");
    }

    #[tokio::test]
    async fn removing_members() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let kid = test_support::member(&app.state, &family.id, "k@example.com").await;
        let overview = FamilyService::get_mine(&app.state, &admin).await.unwrap();

        assert!(matches!(
            FamilyService::remove_member(&app.state, &admin, &overview.my_member_id).await,
            Err(AppError::Validation(_))
        ));

        let kid_member = FamilyService::get_mine(&app.state, &kid).await.unwrap().my_member_id;
        FamilyService::remove_member(&app.state, &admin, &kid_member)
            .await
            .unwrap();
        assert!(matches!(
            FamilyService::get_mine(&app.state, &kid).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            FamilyService::remove_member(&app.state, &admin, &kid_member).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn leaving_a_family() {
        let app = test_support::app().await;
        let (_, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let kid = test_support::member(&app.state, &family.id, "k@example.com").await;

        FamilyService::leave(&app.state, &kid).await.unwrap();
        assert!(matches!(
            FamilyService::leave(&app.state, &kid).await,
            Err(AppError::NotFound(_))
        ));
    }
}
