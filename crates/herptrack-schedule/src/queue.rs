use chrono::{DateTime, Utc};

use crate::status::{FeedingStatus, classify};

/// Anything with a feeding schedule. Keeps the queue builder independent of
/// the storage and API layers.
pub trait FeedingSchedule {
    fn last_feeding_date(&self) -> Option<DateTime<Utc>>;
    fn feeding_frequency_days(&self) -> i64;
}

#[derive(Debug, Clone)]
pub struct QueueEntry<T> {
    pub subject: T,
    pub status: FeedingStatus,
}

/// Project a snapshot of animals into the prioritized "needs attention"
/// queue: everything at priority >= 1, descending by priority. Never-fed
/// animals carry priority 4 and are always kept; only `Recent` drops out.
/// Ties keep the input order: the sort is stable and there is no secondary
/// key.
pub fn build_feeding_queue<T: FeedingSchedule>(
    subjects: impl IntoIterator<Item = T>,
    now: DateTime<Utc>,
) -> Vec<QueueEntry<T>> {
    let mut queue: Vec<QueueEntry<T>> = subjects
        .into_iter()
        .map(|subject| {
            let status = classify(
                subject.last_feeding_date(),
                subject.feeding_frequency_days(),
                now,
            );
            QueueEntry { subject, status }
        })
        .filter(|entry| entry.status.priority >= 1)
        .collect();

    queue.sort_by_key(|entry| std::cmp::Reverse(entry.status.priority));
    queue
}
