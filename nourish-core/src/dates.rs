//! Local-date helpers for day-scoped cache invalidation.
//!
//! Day-scoped stores ("today's progress") stamp their cached envelope with
//! the local calendar date; a read on a later date is a miss regardless of
//! TTL. Dates are local, not UTC: the user's day rolls over at their
//! midnight.

use chrono::{Local, NaiveDate};

/// Format a date as the canonical `YYYY-MM-DD` day key.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's day key in the local timezone.
pub fn today_local() -> String {
    day_key(Local::now().date_naive())
}

/// Whether the given day key is today (local time).
pub fn is_today(day: &str) -> bool {
    day == today_local()
}
