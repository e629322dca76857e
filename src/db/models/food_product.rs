use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FoodProduct {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub calories_per_100g: f64,
    pub product_type: Option<String>,
    pub species: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FoodProduct {
    /// Public products are usable by everyone, private ones only by their creator.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_public || self.created_by.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodProductInput {
    pub name: String,
    pub brand: Option<String>,
    pub calories_per_100g: f64,
    pub product_type: Option<String>,
    pub species: Option<String>,
    pub notes: Option<String>,
    /// Only honoured on the admin catalog.
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodProductFilter {
    pub species: Option<String>,
    pub q: Option<String>,
    pub visibility: Option<Visibility>,
}
