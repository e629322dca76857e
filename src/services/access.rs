//! Role resolution shared by every service.
//!
//! Two independent axes: family standing (member / admin, read from
//! `family_members.is_admin`) and system administration (`admin_users`).
//! A family admin satisfies a member requirement; system admins get the admin
//! panel but no access to tenant data by virtue of that role.

use std::sync::Arc;

use serde::Serialize;

use crate::db::{
    AdminUser, AdminUserRepository, FamilyMember, FamilyMemberRepository, Pet, PetRepository,
    User,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FamilyMember,
    FamilyAdmin,
    SystemAdmin,
}

impl Role {
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::FamilyMember => matches!(self, Role::FamilyMember | Role::FamilyAdmin),
            Role::FamilyAdmin => self == Role::FamilyAdmin,
            Role::SystemAdmin => self == Role::SystemAdmin,
        }
    }

    fn of_membership(member: &FamilyMember) -> Role {
        if member.is_admin {
            Role::FamilyAdmin
        } else {
            Role::FamilyMember
        }
    }
}

pub struct AccessService;

impl AccessService {
    /// The caller's membership and family role, if they belong to a family.
    pub async fn family_role(
        state: &Arc<AppState>,
        user: &User,
    ) -> AppResult<Option<(FamilyMember, Role)>> {
        let member = FamilyMemberRepository::find_by_user(&state.db, &user.id).await?;
        Ok(member.map(|m| {
            let role = Role::of_membership(&m);
            (m, role)
        }))
    }

    pub async fn system_admin(state: &Arc<AppState>, user: &User) -> AppResult<Option<AdminUser>> {
        AdminUserRepository::find_by_user_id(&state.db, &user.id).await
    }

    pub async fn is_system_admin(state: &Arc<AppState>, user: &User) -> AppResult<bool> {
        Ok(Self::system_admin(state, user).await?.is_some())
    }

    pub async fn require_system_admin(state: &Arc<AppState>, user: &User) -> AppResult<AdminUser> {
        Self::system_admin(state, user).await?.ok_or_else(|| {
            tracing::warn!("User {} denied admin panel access", user.id);
            AppError::Forbidden
        })
    }

    /// Caller's membership, requiring at least `required` standing.
    /// No family at all is NOT_FOUND; insufficient standing is FORBIDDEN.
    pub async fn require_family_role(
        state: &Arc<AppState>,
        user: &User,
        required: Role,
    ) -> AppResult<FamilyMember> {
        let (member, role) = Self::family_role(state, user)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.family")))?;

        if !role.satisfies(required) {
            tracing::warn!(
                "User {} has {:?} in family {}, {:?} required",
                user.id,
                role,
                member.family_id,
                required
            );
            return Err(AppError::Forbidden);
        }

        Ok(member)
    }

    /// Load a pet the caller may act on with `required` standing in the pet's family.
    ///
    /// Outsiders get NOT_FOUND for member-level operations so pet ids do not
    /// leak across families, and FORBIDDEN for admin-level ones.
    pub async fn require_pet_role(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        required: Role,
    ) -> AppResult<Pet> {
        let pet = PetRepository::find_by_id(&state.db, pet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.pet")))?;

        let role = match Self::family_role(state, user).await? {
            Some((member, role)) if member.family_id == pet.family_id => Some(role),
            _ => None,
        };

        match role {
            Some(role) if role.satisfies(required) => Ok(pet),
            Some(role) => {
                tracing::warn!(
                    "User {} has {:?} for pet {}, {:?} required",
                    user.id,
                    role,
                    pet.id,
                    required
                );
                Err(AppError::Forbidden)
            }
            None if required == Role::FamilyMember => {
                tracing::debug!("User {} is not in the family of pet {}", user.id, pet.id);
                Err(AppError::NotFound(i18n::t("not_found.pet")))
            }
            None => {
                tracing::warn!("User {} is not in the family of pet {}", user.id, pet.id);
                Err(AppError::Forbidden)
            }
        }
    }
}
