use chrono::{DateTime, Utc};

/// Whole elapsed minutes between two instants, floored. `div_euclid` keeps
/// the floor behaviour for negative spans: 30 seconds of clock skew is
/// already minute -1, not 0.
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().div_euclid(60)
}

/// Human duration label for a record.
///
/// Open records are measured against `now` and flagged "(Active)"; a closed
/// record whose out_time precedes in_time gets "Invalid Timestamps" so the
/// anomaly stays visible instead of rendering as a bogus duration.
pub fn duration_label(
    in_time: DateTime<Utc>,
    out_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    match out_time {
        None => {
            let minutes = elapsed_minutes(in_time, now);
            if minutes < 1 {
                return "Just Now (Active)".to_string();
            }
            format!("{}h {}m (Active)", minutes / 60, minutes % 60)
        }
        Some(out_time) => {
            let minutes = elapsed_minutes(in_time, out_time);
            if minutes < 0 {
                return "Invalid Timestamps".to_string();
            }
            format!("{}h {}m", minutes / 60, minutes % 60)
        }
    }
}

/// Report partition key: the UTC calendar day the session opened.
pub fn date_key(instant: DateTime<Utc>) -> String {
    instant.date_naive().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn closed_ninety_minutes() {
        let end = t0() + Duration::minutes(90);
        assert_eq!(duration_label(t0(), Some(end), end), "1h 30m");
    }

    #[test]
    fn closed_sub_minute_is_zero() {
        let end = t0() + Duration::seconds(59);
        assert_eq!(duration_label(t0(), Some(end), end), "0h 0m");
    }

    #[test]
    fn open_under_a_minute_is_just_now() {
        let now = t0() + Duration::seconds(30);
        assert_eq!(duration_label(t0(), None, now), "Just Now (Active)");
    }

    #[test]
    fn open_long_session_is_active() {
        let now = t0() + Duration::minutes(125);
        assert_eq!(duration_label(t0(), None, now), "2h 5m (Active)");
    }

    #[test]
    fn out_before_in_is_invalid() {
        let end = t0() - Duration::minutes(5);
        assert_eq!(duration_label(t0(), Some(end), end), "Invalid Timestamps");
    }

    #[test]
    fn even_one_second_of_skew_is_invalid() {
        let end = t0() - Duration::seconds(1);
        assert_eq!(elapsed_minutes(t0(), end), -1);
        assert_eq!(duration_label(t0(), Some(end), end), "Invalid Timestamps");
    }

    #[test]
    fn elapsed_minutes_floors() {
        assert_eq!(elapsed_minutes(t0(), t0() + Duration::seconds(179)), 2);
        assert_eq!(elapsed_minutes(t0(), t0() - Duration::seconds(300)), -5);
    }

    #[test]
    fn date_key_is_utc_day_of_in_time() {
        assert_eq!(date_key(t0()), "2025-01-06");
        let just_before_midnight = Utc.with_ymd_and_hms(2025, 1, 6, 23, 59, 59).unwrap();
        assert_eq!(date_key(just_before_midnight), "2025-01-06");
    }
}
