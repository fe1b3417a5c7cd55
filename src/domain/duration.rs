//! Canonical `HH:MM:SS` duration codec.
//!
//! Durations are whole-second, non-negative spans. Parsing is strict about
//! shape but the storage layer never fails on a bad value: [`parse_or_zero`]
//! substitutes zero, which is the documented recovery policy for malformed
//! duration text.

use crate::error::ParseFailure;
use chrono::Duration;

/// Parse `HH:MM:SS`. Hours may exceed two digits; minutes and seconds must be below 60.
pub fn parse_hms(text: &str) -> Result<Duration, ParseFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::new(text, "empty input"));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() != 3 {
        return Err(ParseFailure::new(text, "expected three fields"));
    }

    let mut fields = [0i64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 9 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseFailure::new(text, "fields must be unsigned integers"));
        }
        *slot = part
            .parse()
            .map_err(|_| ParseFailure::new(text, "fields must be unsigned integers"))?;
    }

    let [hours, minutes, seconds] = fields;
    if minutes >= 60 || seconds >= 60 {
        return Err(ParseFailure::new(text, "minutes and seconds must be below 60"));
    }

    Ok(Duration::seconds(hours * 3600 + minutes * 60 + seconds))
}

/// Parse `HH:MM:SS`, recovering from malformed input with a zero duration.
pub fn parse_or_zero(text: &str) -> Duration {
    match parse_hms(text) {
        Ok(duration) => duration,
        Err(failure) => {
            tracing::debug!(%failure, "duration fell back to 00:00:00");
            Duration::zero()
        }
    }
}

/// Format as zero-padded `HH:MM:SS`. Negative input is clamped to zero first.
pub fn format_hms(duration: Duration) -> String {
    let total = clamp_non_negative(duration).num_seconds();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn clamp_non_negative(duration: Duration) -> Duration {
    std::cmp::max(duration, Duration::zero())
}

/// Sum of two spans, saturating at the largest storable duration.
pub fn add(a: Duration, b: Duration) -> Duration {
    let max = Duration::seconds(MAX_STORED_SECONDS);
    clamp_non_negative(a)
        .checked_add(&clamp_non_negative(b))
        .map_or(max, |sum| sum.min(max))
}

/// One second less, never below zero.
pub fn subtract_one_second(duration: Duration) -> Duration {
    clamp_non_negative(duration - Duration::seconds(1))
}

pub fn add_one_second(duration: Duration) -> Duration {
    add(duration, Duration::seconds(1))
}

/// Largest second count `chrono::Duration` holds
const MAX_STORED_SECONDS: i64 = i64::MAX / 1000;

/// Serde adapter storing a duration as `HH:MM:SS`.
///
/// Deserialization is tolerant: numbers are read as seconds and anything
/// unreadable becomes zero rather than failing the whole document.
pub mod hms {
    use super::{format_hms, parse_or_zero, MAX_STORED_SECONDS};
    use chrono::Duration;
    use serde::{de::IgnoredAny, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum Stored {
        Text(String),
        Seconds(i64),
        Other(IgnoredAny),
    }

    impl Stored {
        pub(super) fn into_duration(self) -> Option<Duration> {
            match self {
                Stored::Text(text) => Some(parse_or_zero(&text)),
                Stored::Seconds(secs) => Some(Duration::seconds(secs.clamp(0, MAX_STORED_SECONDS))),
                Stored::Other(_) => None,
            }
        }
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hms(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let stored = Stored::deserialize(deserializer)?;
        Ok(stored.into_duration().unwrap_or_else(Duration::zero))
    }
}

/// Optional variant of [`hms`]. `null`, missing and malformed values all read as absent.
pub mod hms_opt {
    use super::{format_hms, hms::Stored, parse_hms, MAX_STORED_SECONDS};
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_some(&format_hms(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let stored = Option::<Stored>::deserialize(deserializer)?;
        Ok(match stored {
            Some(Stored::Text(text)) => parse_hms(&text).ok(),
            Some(Stored::Seconds(secs)) => Some(Duration::seconds(secs.clamp(0, MAX_STORED_SECONDS))),
            Some(Stored::Other(_)) | None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_hms("00:00:00").unwrap(), Duration::zero());
        assert_eq!(parse_hms("01:02:03").unwrap(), Duration::seconds(3723));
        assert_eq!(parse_hms(" 00:30:00 ").unwrap(), Duration::minutes(30));
        assert_eq!(parse_hms("125:00:01").unwrap(), Duration::seconds(125 * 3600 + 1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "abc", "10:00", "00:60:00", "00:00:60", "-1:00:00", "1:2:3:4", "00::00"] {
            assert!(parse_hms(bad).is_err(), "expected '{}' to be rejected", bad);
        }
    }

    #[test]
    fn test_parse_or_zero_falls_back() {
        assert_eq!(format_hms(parse_or_zero("not a time")), "00:00:00");
        assert_eq!(parse_or_zero("00:05:30"), Duration::seconds(330));
    }

    #[test]
    fn test_format_pads_and_clamps() {
        assert_eq!(format_hms(Duration::seconds(5)), "00:00:05");
        assert_eq!(format_hms(Duration::seconds(36_000 + 61)), "10:01:01");
        assert_eq!(format_hms(Duration::hours(100)), "100:00:00");
        assert_eq!(format_hms(Duration::seconds(-42)), "00:00:00");
    }

    #[test]
    fn test_round_trip() {
        for secs in [0, 1, 59, 60, 3599, 3600, 86_399, 86_400, 360_000 + 7] {
            let d = Duration::seconds(secs);
            assert_eq!(parse_hms(&format_hms(d)).unwrap(), d);
        }
    }

    #[test]
    fn test_subtract_one_second_is_clamped() {
        assert_eq!(subtract_one_second(Duration::seconds(2)), Duration::seconds(1));

        let mut d = Duration::zero();
        for _ in 0..5 {
            d = subtract_one_second(d);
            assert_eq!(d, Duration::zero());
        }
    }

    #[test]
    fn test_add() {
        assert_eq!(
            add(Duration::minutes(10), Duration::seconds(330)),
            Duration::seconds(930)
        );
        assert_eq!(add(Duration::seconds(-5), Duration::seconds(3)), Duration::seconds(3));
    }

    #[test]
    fn test_add_saturates_at_largest_stored_span() {
        let max = Duration::seconds(MAX_STORED_SECONDS);
        assert_eq!(add(max, max), max);
        assert_eq!(add_one_second(max), max);
        assert_eq!(add(max - Duration::seconds(1), Duration::seconds(1)), max);
    }

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "hms", default = "Duration::zero")]
        spent: Duration,
        #[serde(with = "hms_opt", default)]
        left: Option<Duration>,
    }

    #[test]
    fn test_serde_adapters() {
        let holder = Holder {
            spent: Duration::seconds(90),
            left: None,
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"spent":"00:01:30","left":null}"#);

        let loaded: Holder = serde_json::from_str(r#"{"spent":"garbage","left":"00:00:07"}"#).unwrap();
        assert_eq!(loaded.spent, Duration::zero());
        assert_eq!(loaded.left, Some(Duration::seconds(7)));

        let loaded: Holder = serde_json::from_str(r#"{"spent":12,"left":"bad"}"#).unwrap();
        assert_eq!(loaded.spent, Duration::seconds(12));
        assert_eq!(loaded.left, None);

        let loaded: Holder = serde_json::from_str(r#"{"spent":[1,2]}"#).unwrap();
        assert_eq!(loaded.spent, Duration::zero());
    }
}
