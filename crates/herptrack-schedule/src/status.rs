use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Day counts are elapsed wall-clock time truncated to whole days,
/// not calendar-day boundaries.
const MS_PER_DAY: i64 = 86_400_000;

/// Urgency bands for one animal's feeding schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedingUrgency {
    NeverFed,
    Overdue,
    DueToday,
    DueSoon,
    Recent,
}

impl FeedingUrgency {
    /// Sort key for the upcoming-feedings queue. `NeverFed` outranks every
    /// other band; `Recent` is the only band the queue drops.
    pub fn priority(self) -> u8 {
        match self {
            FeedingUrgency::NeverFed => 4,
            FeedingUrgency::Overdue => 3,
            FeedingUrgency::DueToday => 2,
            FeedingUrgency::DueSoon => 1,
            FeedingUrgency::Recent => 0,
        }
    }
}

/// Computed schedule state for one animal at one instant. Derived per
/// request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedingStatus {
    pub status: FeedingUrgency,
    pub priority: u8,
    pub days_since_last_fed: Option<i64>,
    pub days_overdue: Option<i64>,
    /// True for `Overdue` as well as `DueToday`: the flag signals feeding
    /// action is needed now.
    pub is_due_today: bool,
}

/// Classify one animal's feeding urgency at `now`.
///
/// Total over its inputs and deterministic; callers inject `now` instead of
/// this function reading a wall clock. A `feeding_frequency_days` outside
/// [1, 365] is a validation-layer bug upstream.
pub fn classify(
    last_feeding_date: Option<DateTime<Utc>>,
    feeding_frequency_days: i64,
    now: DateTime<Utc>,
) -> FeedingStatus {
    debug_assert!((1..=365).contains(&feeding_frequency_days));

    let Some(last) = last_feeding_date else {
        return FeedingStatus {
            status: FeedingUrgency::NeverFed,
            priority: FeedingUrgency::NeverFed.priority(),
            days_since_last_fed: None,
            days_overdue: None,
            is_due_today: false,
        };
    };

    let days_since_last_fed = (now - last).num_milliseconds() / MS_PER_DAY;
    let days_overdue = days_since_last_fed - feeding_frequency_days;

    let status = if days_overdue >= 0 {
        FeedingUrgency::Overdue
    } else if days_overdue >= -1 {
        FeedingUrgency::DueToday
    } else if days_overdue >= -2 {
        FeedingUrgency::DueSoon
    } else {
        FeedingUrgency::Recent
    };

    FeedingStatus {
        status,
        priority: status.priority(),
        days_since_last_fed: Some(days_since_last_fed),
        days_overdue: Some(days_overdue),
        is_due_today: days_overdue >= 0,
    }
}
