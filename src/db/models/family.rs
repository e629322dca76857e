use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Descriptive labels a member may carry inside a family. They carry no permissions;
/// admin standing is tracked separately by `FamilyMember::is_admin`.
pub const FAMILY_RELATIONS: &[&str] = &["father", "mother", "son", "daughter", "other"];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: String,
    pub family_id: String,
    pub user_id: String,
    pub relation: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

/// Member row joined with the account it belongs to, for member listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FamilyMemberWithUser {
    pub id: String,
    pub family_id: String,
    pub user_id: String,
    pub relation: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub email: String,
    pub display_name: Option<String>,
}
