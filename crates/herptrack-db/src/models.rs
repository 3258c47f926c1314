//! Store-side input/row types. Animal and history rows are returned as the
//! shared `herptrack_types::models` records; only the user row stays
//! db-local because it carries the password hash.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string, never serialized outward.
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Validated fields for a new animal.
#[derive(Debug, Clone)]
pub struct NewAnimal {
    pub name: String,
    pub breed: Option<String>,
    pub morph: Option<String>,
    pub weight: Option<Decimal>,
    pub last_feeding_date: Option<DateTime<Utc>>,
    pub feeding_frequency_days: i64,
}

/// Partial update; `None` leaves the current value untouched.
#[derive(Debug, Clone, Default)]
pub struct AnimalPatch {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub morph: Option<String>,
    pub weight: Option<Decimal>,
    pub last_feeding_date: Option<DateTime<Utc>>,
    pub feeding_frequency_days: Option<i64>,
}
