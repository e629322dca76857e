//! Fixtures for service and router tests: in-memory database, manual clock,
//! throwaway upload directory.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::db::repository::test_db;
use crate::db::{Family, FamilyMemberRepository, FamilyRepository, Pet, PetInput, PetRepository, User, UserRepository};
use crate::services::clock::ManualClock;
use crate::services::storage::LocalStorage;
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.jwt.secret = TEST_JWT_SECRET.to_string();
    config.storage.base_path = std::env::temp_dir()
        .join(format!("record-pet-test-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    config
}

pub async fn app() -> TestApp {
    app_with_config(test_config()).await
}

pub async fn app_with_config(config: Config) -> TestApp {
    let start = Utc
        .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid start time");
    let clock = Arc::new(ManualClock::new(start));
    let storage = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        &config.server.public_base_url,
    ));

    let state = Arc::new(AppState {
        db: test_db::pool().await,
        config,
        clock: clock.clone(),
        storage,
    });

    TestApp { state, clock }
}

pub async fn user(state: &Arc<AppState>, email: &str) -> User {
    UserRepository::create(&state.db, email, "not-a-real-hash", None)
        .await
        .expect("create user")
}

pub async fn family_with_admin(state: &Arc<AppState>, email: &str) -> (User, Family) {
    let admin = user(state, email).await;
    let (family, _) = FamilyRepository::create_with_admin(&state.db, "Family", &admin.id, "other")
        .await
        .expect("create family");
    (admin, family)
}

pub async fn member(state: &Arc<AppState>, family_id: &str, email: &str) -> User {
    let member = user(state, email).await;
    FamilyMemberRepository::add(&state.db, family_id, &member.id, "other", false)
        .await
        .expect("add member");
    member
}

pub async fn pet(state: &Arc<AppState>, family_id: &str, name: &str) -> Pet {
    let input = PetInput {
        name: name.to_string(),
        species: "dog".to_string(),
        breed: Some("Shiba".to_string()),
        birth_date: None,
        gender: None,
        notes: None,
    };
    PetRepository::create(&state.db, family_id, &input)
        .await
        .expect("create pet")
}
