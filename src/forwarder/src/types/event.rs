use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// One service lifecycle event as reported by the orchestration API.
///
/// `id` is the only stable handle: it is unique within a stream and survives
/// refetches, but it carries no ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            message: message.into(),
        }
    }

    /// Creation time as milliseconds since the Unix epoch, the unit the log sink expects.
    pub fn timestamp_millis(&self) -> i64 {
        epoch_millis(&self.created_at)
    }
}

/// Id of the newest event already forwarded for a stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Watermark(String);

impl Watermark {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.0 == event.id
    }
}

impl From<&Event> for Watermark {
    fn from(event: &Event) -> Self {
        Self(event.id.clone())
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds between the Unix epoch and `instant`.
///
/// The instant is moved to UTC first, so whatever offset the source attached
/// is resolved rather than dropped.
pub fn epoch_millis<Tz: TimeZone>(instant: &DateTime<Tz>) -> i64 {
    instant.with_timezone(&Utc).timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use rstest::rstest;

    #[rstest]
    #[case::utc("2024-03-10T09:30:00Z")]
    #[case::pacific_standard("2024-03-10T01:30:00-08:00")]
    #[case::india("2024-03-10T15:00:00+05:30")]
    #[case::far_east("2024-03-10T23:30:00+14:00")]
    fn epoch_millis_ignores_the_zone_label(#[case] rfc3339: &str) {
        let instant: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(rfc3339).unwrap();

        assert_eq!(epoch_millis(&instant), 1_710_063_000_000);
    }

    #[test]
    fn epoch_millis_keeps_sub_second_precision() {
        let instant = DateTime::parse_from_rfc3339("2023-11-14T14:13:20.250-08:00").unwrap();

        assert_eq!(epoch_millis(&instant), 1_700_000_000_250);
    }

    #[test]
    fn event_timestamp_matches_its_creation_instant() {
        let created_at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let event = Event::new("e1", created_at, "service reached a steady state");

        assert_eq!(event.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn watermark_matches_by_id_only() {
        let created_at = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let event = Event::new("e1", created_at, "a");
        let same_text = Event::new("e2", created_at, "a");

        assert!(Watermark::from(&event).matches(&event));
        assert!(!Watermark::from(&event).matches(&same_text));
    }
}
