use chrono::{DateTime, Duration, Utc};

/// Half-open time bucket `[start, end)` for one reminder window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Compute the one-day bucket for a window offset.
///
/// An account scheduled for deletion on a given date is eligible on exactly
/// one calendar day per window, regardless of how often the job runs that
/// day. The `0` window covers "less than 24 hours remaining" rather than a
/// point-in-time match, since deletion timestamps are not aligned to
/// invocation times.
pub fn window_bounds(now: DateTime<Utc>, days_before: u32) -> WindowBounds {
    let start = now + Duration::days(days_before.saturating_sub(1) as i64);
    let end = now + Duration::days(if days_before == 0 { 1 } else { days_before as i64 });
    WindowBounds { start, end }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0, 1)]
    #[case(1, 0, 1)]
    #[case(3, 2, 3)]
    #[case(7, 6, 7)]
    #[case(30, 29, 30)]
    fn test_bucket_offsets(#[case] window: u32, #[case] start_days: i64, #[case] end_days: i64) {
        let now = Utc::now();
        let bounds = window_bounds(now, window);
        assert_eq!(bounds.start, now + Duration::days(start_days));
        assert_eq!(bounds.end, now + Duration::days(end_days));
    }

    #[test]
    fn test_buckets_are_one_day_wide() {
        let now = Utc::now();
        for window in [0, 1, 2, 3, 7, 14, 30] {
            let bounds = window_bounds(now, window);
            assert_eq!(bounds.end - bounds.start, Duration::days(1));
        }
    }
}
