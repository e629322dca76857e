use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const BANNER_POSITIONS: &[&str] = &["dashboard", "pet_detail", "both"];
pub const DEFAULT_BANNER_BACKGROUND: &str = "from-blue-50 to-purple-50";
pub const DEFAULT_BANNER_TEXT_COLOR: &str = "text-gray-800";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link_url: String,
    pub is_active: bool,
    pub display_position: String,
    pub display_order: i64,
    pub background_color: String,
    pub text_color: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub click_count: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerInput {
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link_url: String,
    pub is_active: Option<bool>,
    pub display_position: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}
