// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! Set numbering partitions by calendar day using plain epoch truncation,
//! so a "day" is a UTC day regardless of where the server runs.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// First and last second of the UTC day containing `timestamp`.
pub fn day_bounds(timestamp: i64) -> (i64, i64) {
    let start = timestamp - timestamp.rem_euclid(SECONDS_PER_DAY);
    (start, start + SECONDS_PER_DAY - 1)
}

/// Start of the UTC day containing `timestamp`.
pub fn day_start(timestamp: i64) -> i64 {
    day_bounds(timestamp).0
}

/// Format a UTC timestamp as a `YYYY-MM-DD` date.
pub fn format_utc_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Current Unix time in seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_truncate_to_epoch_day() {
        // 2024-01-15T10:00:00Z
        let ts = 1_705_312_800;
        let (start, end) = day_bounds(ts);
        assert_eq!(start, 1_705_276_800);
        assert_eq!(end, 1_705_363_199);
        assert_eq!(day_bounds(start), (start, end));
        assert_eq!(day_bounds(end), (start, end));
        assert_eq!(day_start(end + 1), end + 1);
    }

    #[test]
    fn day_bounds_before_epoch() {
        assert_eq!(day_bounds(-1), (-86_400, -1));
    }

    #[test]
    fn format_date() {
        let date = DateTime::from_timestamp(1_705_312_800, 0).unwrap();
        assert_eq!(format_utc_date(date), "2024-01-15");
    }
}
