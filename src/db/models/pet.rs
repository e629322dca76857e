use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const PET_SPECIES: &[&str] = &["dog", "cat", "bird", "fish", "rabbit", "hamster", "other"];
pub const PET_GENDERS: &[&str] = &["male", "female", "unknown"];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: String,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Create/update payload for a pet. The family is never taken from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct PetInput {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub notes: Option<String>,
}
