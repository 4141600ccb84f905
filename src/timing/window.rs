//! Business window predicate

use chrono::{Datelike, Duration as ChronoDuration, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Forward scan bound when looking for the next open instant
pub const SCAN_LIMIT_HOURS: i64 = 48;

/// Weekday/hour range during which autonomous actions are allowed.
///
/// Open Monday through Friday, `open_hour <= hour < close_hour`, local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessWindow {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for BusinessWindow {
    fn default() -> Self {
        Self {
            open_hour: 9,
            close_hour: 17,
        }
    }
}

impl BusinessWindow {
    pub fn new(open_hour: u32, close_hour: u32) -> Result<Self> {
        if open_hour >= close_hour || close_hour > 24 {
            return Err(Error::configuration(format!(
                "invalid business window {}:00-{}:00",
                open_hour, close_hour
            )));
        }
        Ok(Self {
            open_hour,
            close_hour,
        })
    }

    /// Whether `at` falls inside the window
    pub fn contains(&self, at: &NaiveDateTime) -> bool {
        if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let hour = at.hour();
        hour >= self.open_hour && hour < self.close_hour
    }

    /// Next instant at or after `now` that lies inside the window.
    ///
    /// Candidates are whole hours after `now`, scanned one at a time. When
    /// nothing opens within [`SCAN_LIMIT_HOURS`], the bound itself is returned.
    pub fn next_open(&self, now: NaiveDateTime) -> NaiveDateTime {
        if self.contains(&now) {
            return now;
        }

        let limit = now + ChronoDuration::hours(SCAN_LIMIT_HOURS);
        let mut candidate = truncate_to_hour(now) + ChronoDuration::hours(1);
        while candidate <= limit {
            if self.contains(&candidate) {
                return candidate;
            }
            candidate += ChronoDuration::hours(1);
        }
        limit
    }
}

fn truncate_to_hour(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_hms_opt(at.hour(), 0, 0)
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_contains_weekday_hours() {
        let window = BusinessWindow::default();
        // 2024-06-03 is a Monday
        assert!(window.contains(&at(2024, 6, 3, 9, 0)));
        assert!(window.contains(&at(2024, 6, 3, 16, 59)));
        assert!(!window.contains(&at(2024, 6, 3, 17, 0)));
        assert!(!window.contains(&at(2024, 6, 3, 8, 59)));
        assert!(!window.contains(&at(2024, 6, 8, 10, 0)));
        assert!(!window.contains(&at(2024, 6, 9, 12, 0)));
    }

    #[test]
    fn test_next_open_from_saturday() {
        let window = BusinessWindow::default();
        let next = window.next_open(at(2024, 6, 8, 10, 0));
        assert_eq!(next, at(2024, 6, 10, 9, 0));
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_next_open_aligns_to_hour() {
        let window = BusinessWindow::default();
        assert_eq!(window.next_open(at(2024, 6, 4, 7, 42)), at(2024, 6, 4, 9, 0));
        assert_eq!(window.next_open(at(2024, 6, 4, 17, 5)), at(2024, 6, 5, 9, 0));
    }

    #[test]
    fn test_next_open_inside_window_is_now() {
        let window = BusinessWindow::default();
        let now = at(2024, 6, 5, 11, 15);
        assert_eq!(window.next_open(now), now);
    }

    #[test]
    fn test_next_open_bounded_scan() {
        let window = BusinessWindow::default();
        // Friday evening: Monday morning is beyond the 48 hour bound
        let now = at(2024, 6, 7, 18, 0);
        assert_eq!(window.next_open(now), now + ChronoDuration::hours(SCAN_LIMIT_HOURS));
    }

    #[test]
    fn test_invalid_window() {
        assert!(BusinessWindow::new(17, 9).is_err());
        assert!(BusinessWindow::new(9, 25).is_err());
        assert!(BusinessWindow::new(8, 18).is_ok());
    }
}
