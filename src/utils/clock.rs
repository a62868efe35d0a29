use chrono::{DateTime, SecondsFormat, Utc};

/// Time source for timestamps written by the adapters and repaired by the mapping layer.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn timestamp(&self) -> String {
        format_timestamp(self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Used by tests that assert on timestamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Next `updated_at` for a record last stamped at `previous`; never moves backwards.
pub fn next_timestamp(previous: &str, clock: &dyn Clock) -> String {
    let now = clock.now();
    match parse_timestamp(previous) {
        Some(prev) if prev > now => previous.to_string(),
        _ => format_timestamp(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_matches_iso_millis() {
        let at = Utc.with_ymd_and_hms(2024, 9, 1, 12, 30, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-09-01T12:30:00.000Z");
    }

    #[test]
    fn test_next_timestamp_never_decreases() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let future = "2030-01-01T00:00:00.000Z";
        assert_eq!(next_timestamp(future, &clock), future);

        let past = "2020-01-01T00:00:00.000Z";
        assert_eq!(next_timestamp(past, &clock), "2024-01-01T00:00:00.000Z");

        assert_eq!(next_timestamp("garbage", &clock), "2024-01-01T00:00:00.000Z");
    }
}
