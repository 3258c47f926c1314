use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herptrack_schedule::{FeedingStatus, classify};

use crate::models::{Animal, FeedingEvent, WeightEntry};

// -- JWT Claims --

/// Canonical claims definition, shared by token issuance and the REST
/// middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

/// Public user shape; the password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// -- Animals --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalDto {
    pub id: Uuid,
    pub name: String,
    pub breed: Option<String>,
    pub morph: Option<String>,
    pub weight: Option<Decimal>,
    pub last_feeding_date: Option<DateTime<Utc>>,
    pub feeding_frequency_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived per request from the feeding schedule; never persisted.
    pub feeding_status: FeedingStatus,
}

impl AnimalDto {
    /// Build the outward shape from an already-computed status, so the
    /// upcoming-feedings queue applies its shared `now` exactly once.
    pub fn with_status(animal: Animal, status: FeedingStatus) -> Self {
        Self {
            id: animal.id,
            name: animal.name,
            breed: animal.breed,
            morph: animal.morph,
            weight: animal.weight,
            last_feeding_date: animal.last_feeding_date,
            feeding_frequency_days: animal.feeding_frequency_days,
            created_at: animal.created_at,
            updated_at: animal.updated_at,
            feeding_status: status,
        }
    }

    pub fn from_model(animal: Animal, now: DateTime<Utc>) -> Self {
        let status = classify(
            animal.last_feeding_date,
            animal.feeding_frequency_days,
            now,
        );
        Self::with_status(animal, status)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnimalRequest {
    pub name: String,
    pub breed: Option<String>,
    pub morph: Option<String>,
    pub weight: Option<Decimal>,
    pub last_feeding_date: Option<DateTime<Utc>>,
    /// Defaults to 7 when omitted, for older clients.
    pub feeding_frequency_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAnimalRequest {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub morph: Option<String>,
    pub weight: Option<Decimal>,
    pub last_feeding_date: Option<DateTime<Utc>>,
    pub feeding_frequency_days: Option<i64>,
}

// -- History --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightHistoryDto {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub weight: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl From<WeightEntry> for WeightHistoryDto {
    fn from(entry: WeightEntry) -> Self {
        Self {
            id: entry.id,
            animal_id: entry.animal_id,
            weight: entry.weight,
            recorded_at: entry.recorded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedingHistoryDto {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub feeding_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FeedingEvent> for FeedingHistoryDto {
    fn from(event: FeedingEvent) -> Self {
        Self {
            id: event.id,
            animal_id: event.animal_id,
            feeding_date: event.feeding_date,
            notes: event.notes,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFeedingRequest {
    pub animal_id: Uuid,
    pub feeding_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use herptrack_schedule::FeedingUrgency;
    use rust_decimal_macros::dec;

    fn animal() -> Animal {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Animal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Nagini".into(),
            breed: Some("Ball Python".into()),
            morph: None,
            weight: Some(dec!(1520.50)),
            last_feeding_date: Some(created),
            feeding_frequency_days: 7,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn dto_carries_status_computed_at_the_given_instant() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let dto = AnimalDto::from_model(animal(), now);
        assert_eq!(dto.feeding_status.status, FeedingUrgency::Overdue);
        assert_eq!(dto.feeding_status.days_since_last_fed, Some(9));
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let value = serde_json::to_value(AnimalDto::from_model(animal(), now)).unwrap();
        assert_eq!(value["feeding_status"]["status"], "overdue");
        assert_eq!(value["feeding_status"]["priority"], 3);
        assert_eq!(value["feeding_status"]["is_due_today"], true);
    }
}
