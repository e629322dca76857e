use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Share Token Models
// ============================================================================

/// Bearer token granting read-only, unauthenticated access to one pet.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShareToken {
    pub id: String,
    pub pet_id: String,
    pub token: String,
    pub created_by: String,
    pub expires_at: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl ShareToken {
    pub fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        self.is_active && now < self.expires_at
    }
}
