//! Voting-window countdown math.
//!
//! Pure functions of two timestamps; nothing here reads the clock or
//! mutates a record.

use concord_types::Timestamp;

/// The network's standard voting window: 7 days.
pub const DEFAULT_VOTING_WINDOW_SECS: u64 = 7 * 86_400;

/// Remaining time in a voting window, broken down for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRemaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    /// True once the window has fully elapsed, regardless of vote status.
    pub expired: bool,
}

impl TimeRemaining {
    /// The remaining window flattened back to seconds (minute resolution).
    pub fn as_secs(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60
    }
}

/// Compute the remaining voting window at `now` for a vote submitted at
/// `submitted_at` with a fixed window of `window_secs`.
pub fn time_remaining(submitted_at: Timestamp, window_secs: u64, now: Timestamp) -> TimeRemaining {
    if submitted_at.has_expired(window_secs, now) {
        return TimeRemaining {
            days: 0,
            hours: 0,
            minutes: 0,
            expired: true,
        };
    }
    let remaining = window_secs - submitted_at.elapsed_since(now);
    TimeRemaining {
        days: remaining / 86_400,
        hours: (remaining % 86_400) / 3_600,
        minutes: (remaining % 3_600) / 60,
        expired: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_days_two_hours_in_leaves_three_days_twenty_two_hours() {
        let submitted = Timestamp::new(0);
        let now = Timestamp::new(3 * 86_400 + 2 * 3_600);
        let left = time_remaining(submitted, DEFAULT_VOTING_WINDOW_SECS, now);
        assert_eq!(left.days, 3);
        assert_eq!(left.hours, 22);
        assert_eq!(left.minutes, 0);
        assert!(!left.expired);
    }

    #[test]
    fn eight_days_in_is_expired() {
        let submitted = Timestamp::new(0);
        let now = Timestamp::new(8 * 86_400);
        let left = time_remaining(submitted, DEFAULT_VOTING_WINDOW_SECS, now);
        assert!(left.expired);
        assert_eq!(left.as_secs(), 0);
    }

    #[test]
    fn expired_exactly_at_window_boundary() {
        let submitted = Timestamp::new(500);
        let now = Timestamp::new(500 + DEFAULT_VOTING_WINDOW_SECS);
        assert!(time_remaining(submitted, DEFAULT_VOTING_WINDOW_SECS, now).expired);
    }

    #[test]
    fn one_second_before_boundary_is_not_expired() {
        let submitted = Timestamp::new(500);
        let now = Timestamp::new(500 + DEFAULT_VOTING_WINDOW_SECS - 1);
        let left = time_remaining(submitted, DEFAULT_VOTING_WINDOW_SECS, now);
        assert!(!left.expired);
        assert_eq!(left.days, 0);
        assert_eq!(left.hours, 0);
        assert_eq!(left.minutes, 0); // sub-minute remainder rounds down
    }

    #[test]
    fn full_window_remains_at_submission_instant() {
        let submitted = Timestamp::new(9_000);
        let left = time_remaining(submitted, DEFAULT_VOTING_WINDOW_SECS, submitted);
        assert_eq!(left.days, 7);
        assert_eq!(left.hours, 0);
        assert_eq!(left.minutes, 0);
        assert!(!left.expired);
    }

    #[test]
    fn now_before_submission_clamps_to_full_window() {
        // gateway clock skew: now slightly behind submitted_at
        let submitted = Timestamp::new(10_000);
        let left = time_remaining(submitted, 3_600, Timestamp::new(9_990));
        assert!(!left.expired);
        assert_eq!(left.hours, 1);
    }
}
