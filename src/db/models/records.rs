use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::datetime;

// ============================================================================
// Walks
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Walk {
    pub id: String,
    pub pet_id: String,
    pub walked_at: NaiveDateTime,
    pub duration_minutes: Option<i64>,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkInput {
    #[serde(deserialize_with = "datetime::deserialize")]
    pub walked_at: NaiveDateTime,
    pub duration_minutes: Option<i64>,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}

// ============================================================================
// Meals
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub pet_id: String,
    pub fed_at: NaiveDateTime,
    pub food_type: Option<String>,
    /// Free-text amount ("1 cup"), kept alongside the gram figure.
    pub amount: Option<String>,
    pub food_product_id: Option<String>,
    pub amount_grams: Option<f64>,
    pub calories: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealInput {
    #[serde(deserialize_with = "datetime::deserialize")]
    pub fed_at: NaiveDateTime,
    pub food_type: Option<String>,
    pub amount: Option<String>,
    pub food_product_id: Option<String>,
    pub amount_grams: Option<f64>,
    /// Manual entry. Ignored whenever calories can be derived from a product.
    pub calories: Option<f64>,
    pub notes: Option<String>,
}

// ============================================================================
// Health records
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: String,
    pub pet_id: String,
    pub recorded_at: NaiveDateTime,
    pub appetite_level: i64,
    pub bathroom_times: Option<i64>,
    pub bathroom_notes: Option<String>,
    pub mood_level: i64,
    pub activity_level: i64,
    pub health_notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthRecordInput {
    #[serde(deserialize_with = "datetime::deserialize")]
    pub recorded_at: NaiveDateTime,
    pub appetite_level: Option<i64>,
    pub bathroom_times: Option<i64>,
    pub bathroom_notes: Option<String>,
    pub mood_level: Option<i64>,
    pub activity_level: Option<i64>,
    pub health_notes: Option<String>,
}

// ============================================================================
// Medications
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub pet_id: String,
    pub medication_name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicationInput {
    pub medication_name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MedicationLog {
    pub id: String,
    pub medication_id: String,
    pub given_at: NaiveDateTime,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicationLogInput {
    /// Defaults to the time the log is written.
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub given_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

/// A medication with its most recent administrations.
#[derive(Debug, Clone, Serialize)]
pub struct MedicationWithLogs {
    #[serde(flatten)]
    pub medication: Medication,
    pub logs: Vec<MedicationLog>,
}

// ============================================================================
// Traits and custom fields
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PetTrait {
    pub id: String,
    pub pet_id: String,
    pub trait_name: String,
    pub trait_value: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetTraitInput {
    pub trait_name: String,
    pub trait_value: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PetMeta {
    pub id: String,
    pub pet_id: String,
    pub meta_key: String,
    pub meta_value: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetMetaInput {
    pub meta_key: String,
    pub meta_value: String,
}

/// Optional whole-day window used by record listings and PDF export.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRange {
    #[serde(alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "endDate")]
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    /// Inclusive lower bound (start of `start_date`).
    pub fn lower(&self) -> Option<NaiveDateTime> {
        self.start_date.and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    /// Exclusive upper bound (start of the day after `end_date`), so the whole
    /// end day is included.
    pub fn upper(&self) -> Option<NaiveDateTime> {
        self.end_date
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    pub fn is_filtered(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}
