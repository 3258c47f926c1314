//! Domain records shared by the store and API layers.

use chrono::{DateTime, Utc};
use herptrack_schedule::FeedingSchedule;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Animal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub breed: Option<String>,
    pub morph: Option<String>,
    /// Grams, two fractional digits, within [0.01, 9999999.99].
    pub weight: Option<Decimal>,
    pub last_feeding_date: Option<DateTime<Utc>>,
    pub feeding_frequency_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedingSchedule for Animal {
    fn last_feeding_date(&self) -> Option<DateTime<Utc>> {
        self.last_feeding_date
    }

    fn feeding_frequency_days(&self) -> i64 {
        self.feeding_frequency_days
    }
}

/// Append-only weight log row; one entry per observed weight change.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub weight: Decimal,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedingEvent {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub feeding_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
