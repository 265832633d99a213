use chrono::{DateTime, Duration, Utc};

/// Length of a prompt day. Days are counted as fixed 24 hour spans, not calendar days.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Converts a whole number of days into milliseconds.
pub fn days_to_millis(days: u32) -> i64 {
    i64::from(days) * MILLIS_PER_DAY
}

/// Converts persisted milliseconds back into a date. `0` is the "not recorded" sentinel.
pub fn millis_to_date(millis: i64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Renders elapsed time since `from` in whole days and hours, e.g. `3d 4h`.
pub fn format_elapsed(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - from).max(Duration::zero());
    format!("{}d {}h", elapsed.num_days(), elapsed.num_hours() % 24)
}
