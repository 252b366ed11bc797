//! Feed staleness detection.
//!
//! Tank sensors report every ~20 seconds. A feed that stops updating still
//! produces a perfectly plausible report from its old readings, so the
//! newest reading's age is checked separately.
//!
//! # Clock injection
//! Functions take `now` rather than calling `Utc::now()`, which keeps the
//! checks deterministic in tests.

use chrono::{DateTime, FixedOffset, Utc};

/// Age in whole minutes of `last_reading_at` relative to `now`.
///
/// Negative when the reading is timestamped in the future (clock skew).
pub fn feed_age_minutes(last_reading_at: DateTime<FixedOffset>, now: DateTime<Utc>) -> i64 {
    (now - last_reading_at.with_timezone(&Utc)).num_minutes()
}

/// Returns `true` if the feed's newest reading is older than
/// `max_age_minutes`. Age equal to the threshold is not stale.
///
/// A feed with no readings at all is stale.
pub fn is_stale_at(
    last_reading_at: Option<DateTime<FixedOffset>>,
    max_age_minutes: u64,
    now: DateTime<Utc>,
) -> bool {
    match last_reading_at {
        Some(ts) => feed_age_minutes(ts, now) > i64::try_from(max_age_minutes).unwrap_or(i64::MAX),
        None => true,
    }
}

/// Convenience wrapper that uses the real current time.
/// Use `is_stale_at` in tests to keep them deterministic.
pub fn is_stale(last_reading_at: Option<DateTime<FixedOffset>>, max_age_minutes: u64) -> bool {
    is_stale_at(last_reading_at, max_age_minutes, Utc::now())
}
