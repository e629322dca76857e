use std::sync::Arc;

use axum::body::Bytes;

use crate::db::{Pet, PetInput, PetRepository, User, PET_GENDERS, PET_SPECIES};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::{AccessService, Role};
use crate::services::storage::{self, BUCKET_PET_AVATARS};
use crate::AppState;

fn validate(input: &mut PetInput) -> AppResult<()> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::Validation(i18n::t_with(
            "validation.required",
            &[("field", "name")],
        )));
    }

    input.species = input.species.trim().to_lowercase();
    if !PET_SPECIES.contains(&input.species.as_str()) {
        return Err(AppError::Validation(i18n::t_with(
            "validation.invalid_choice",
            &[("field", "species"), ("choices", &PET_SPECIES.join(", "))],
        )));
    }

    if let Some(gender) = input.gender.as_mut() {
        *gender = gender.trim().to_lowercase();
        if !PET_GENDERS.contains(&gender.as_str()) {
            return Err(AppError::Validation(i18n::t_with(
                "validation.invalid_choice",
                &[("field", "gender"), ("choices", &PET_GENDERS.join(", "))],
            )));
        }
    }

    Ok(())
}

pub struct PetService;

impl PetService {
    /// Pets of the caller's family; empty when the caller has no family.
    pub async fn list(state: &Arc<AppState>, user: &User) -> AppResult<Vec<Pet>> {
        match AccessService::family_role(state, user).await? {
            Some((member, _)) => PetRepository::list_by_family(&state.db, &member.family_id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(state: &Arc<AppState>, user: &User, pet_id: &str) -> AppResult<Pet> {
        AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await
    }

    pub async fn create(state: &Arc<AppState>, user: &User, mut input: PetInput) -> AppResult<Pet> {
        let member = AccessService::require_family_role(state, user, Role::FamilyMember).await?;
        validate(&mut input)?;

        let pet = PetRepository::create(&state.db, &member.family_id, &input).await?;
        tracing::info!("User {} added pet {} to family {}", user.id, pet.id, pet.family_id);
        Ok(pet)
    }

    pub async fn update(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        mut input: PetInput,
    ) -> AppResult<Pet> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await?;
        validate(&mut input)?;
        PetRepository::update(&state.db, &pet.id, &input).await
    }

    pub async fn delete(state: &Arc<AppState>, user: &User, pet_id: &str) -> AppResult<()> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyAdmin).await?;
        PetRepository::delete(&state.db, &pet.id).await?;
        storage::remove_replaced(state.storage.as_ref(), pet.avatar_url.as_deref()).await;
        tracing::info!("User {} deleted pet {}", user.id, pet.id);
        Ok(())
    }

    pub async fn upload_avatar(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        filename: &str,
        data: Bytes,
    ) -> AppResult<Pet> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await?;

        let url = storage::store_image(
            state.storage.as_ref(),
            BUCKET_PET_AVATARS,
            Some(&pet.family_id),
            filename,
            data,
            state.config.storage.max_upload_bytes,
        )
        .await?;

        let updated = PetRepository::set_avatar(&state.db, &pet.id, &url).await?;
        storage::remove_replaced(state.storage.as_ref(), pet.avatar_url.as_deref()).await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn input(name: &str, species: &str) -> PetInput {
        PetInput {
            name: name.to_string(),
            species: species.to_string(),
            breed: None,
            birth_date: None,
            gender: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn members_create_and_list_family_pets() {
        let app = test_support::app().await;
        let (_, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let kid = test_support::member(&app.state, &family.id, "k@example.com").await;

        let pet = PetService::create(&app.state, &kid, input(" Mochi ", "Cat"))
            .await
            .unwrap();
        assert_eq!(pet.name, "Mochi");
        assert_eq!(pet.species, "cat");
        assert_eq!(pet.gender, "unknown");

        let pets = PetService::list(&app.state, &kid).await.unwrap();
        assert_eq!(pets.len(), 1);

        let loner = test_support::user(&app.state, "l@example.com").await;
        assert!(PetService::list(&app.state, &loner).await.unwrap().is_empty());
        assert!(matches!(
            PetService::create(&app.state, &loner, input("Rex", "dog")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn validates_species_and_gender() {
        let app = test_support::app().await;
        let (admin, _) = test_support::family_with_admin(&app.state, "a@example.com").await;

        assert!(matches!(
            PetService::create(&app.state, &admin, input("Rex", "dragon")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            PetService::create(&app.state, &admin, input("  ", "dog")).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_gender = input("Rex", "dog");
        bad_gender.gender = Some("robot".into());
        assert!(matches!(
            PetService::create(&app.state, &admin, bad_gender).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_family_admins_delete_pets() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let kid = test_support::member(&app.state, &family.id, "k@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        assert!(matches!(
            PetService::delete(&app.state, &kid, &pet.id).await,
            Err(AppError::Forbidden)
        ));
        PetService::delete(&app.state, &admin, &pet.id).await.unwrap();
        assert!(matches!(
            PetService::get(&app.state, &admin, &pet.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn avatar_upload_replaces_previous_file() {
        let app = test_support::app().await;
        let (admin, family) = test_support::family_with_admin(&app.state, "a@example.com").await;
        let pet = test_support::pet(&app.state, &family.id, "Rex").await;

        let first = PetService::upload_avatar(&app.state, &admin, &pet.id, "a.png", Bytes::from_static(b"one"))
            .await
            .unwrap();
        let first_url = first.avatar_url.clone().unwrap();
        assert!(first_url.contains(&format!("/uploads/pet-avatars/{}/", family.id)));

        let second = PetService::upload_avatar(&app.state, &admin, &pet.id, "b.jpg", Bytes::from_static(b"two"))
            .await
            .unwrap();
        assert_ne!(second.avatar_url, first.avatar_url);

        let old_path = app.state.storage.path_from_public_url(&first_url).unwrap();
        assert!(!app.state.storage.exists(&old_path).await.unwrap());
    }
}
