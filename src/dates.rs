// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Timestamp helpers shared by the classifier, the report formatter and the
//! debug artifact.
//!
//! The GitHub REST API serializes event times as `YYYY-MM-DDTHH:MM:SSZ`.
//! Everything in this crate parses those strings into [`DateTime<Utc>`] at the
//! deserialization edge and compares instants chronologically; the fixed
//! format only reappears when records are serialized back out.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Fixed timestamp format used by the GitHub REST API and the debug artifact.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Formats a timestamp with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(date: &DateTime<Utc,>,) -> String
{
    date.format(TIMESTAMP_FORMAT,).to_string()
}

/// Returns the instant `days` whole days before `now`.
pub fn cutoff(now: DateTime<Utc,>, days: i64,) -> DateTime<Utc,>
{
    now - Duration::days(days,)
}

/// Renders a timestamp relative to `now` for human readers.
///
/// Same-day timestamps render as `"today"`, the previous day as
/// `"yesterday"`, and anything older as `"N days ago"`. A missing timestamp
/// renders as `"unknown"`.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use devpulse::relative_display;
///
/// let now = Utc::now();
/// let earlier = now - Duration::days(3,);
/// assert_eq!(relative_display(Some(&earlier,), now,), "3 days ago");
/// assert_eq!(relative_display(None, now,), "unknown");
/// ```
pub fn relative_display(date: Option<&DateTime<Utc,>,>, now: DateTime<Utc,>,) -> String
{
    match date {
        None => "unknown".to_string(),
        Some(date,) => match (now - *date).num_days() {
            0 => "today".to_string(),
            1 => "yesterday".to_string(),
            days => format!("{days} days ago"),
        },
    }
}

/// Serde adapter for `DateTime<Utc>` fields using [`TIMESTAMP_FORMAT`].
pub mod iso
{
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S,>(date: &DateTime<Utc,>, serializer: S,) -> Result<S::Ok, S::Error,>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(TIMESTAMP_FORMAT,).to_string(),)
    }

    pub fn deserialize<'de, D,>(deserializer: D,) -> Result<DateTime<Utc,>, D::Error,>
    where
        D: Deserializer<'de,>,
    {
        let raw = String::deserialize(deserializer,)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT,)
            .map(|naive| naive.and_utc(),)
            .map_err(de::Error::custom,)
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields using
/// [`TIMESTAMP_FORMAT`]. Absent values serialize as `null`, never as empty
/// strings.
pub mod iso_option
{
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S,>(
        date: &Option<DateTime<Utc,>,>,
        serializer: S,
    ) -> Result<S::Ok, S::Error,>
    where
        S: Serializer,
    {
        match date {
            Some(date,) => serializer.serialize_str(&date.format(TIMESTAMP_FORMAT,).to_string(),),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D,>(deserializer: D,) -> Result<Option<DateTime<Utc,>,>, D::Error,>
    where
        D: Deserializer<'de,>,
    {
        let raw: Option<String,> = Option::deserialize(deserializer,)?;
        match raw {
            None => Ok(None,),
            Some(value,) => NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT,)
                .map(|naive| Some(naive.and_utc(),),)
                .map_err(de::Error::custom,),
        }
    }
}

/// Parses a [`TIMESTAMP_FORMAT`] string into a UTC instant.
///
/// Returns `None` when the input does not match the fixed format.
pub fn parse_timestamp(raw: &str,) -> Option<DateTime<Utc,>,>
{
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT,).ok().map(|naive| naive.and_utc(),)
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::*;

    fn base_now() -> DateTime<Utc,>
    {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0,).unwrap()
    }

    proptest! {
        #[test]
        fn relative_display_matches_day_offset(days in 2i64..3650) {
            let now = base_now();
            let date = now - Duration::days(days);
            prop_assert_eq!(relative_display(Some(&date), now), format!("{days} days ago"));
        }
    }

    #[test]
    fn relative_display_handles_missing_date()
    {
        assert_eq!(relative_display(None, base_now(),), "unknown");
    }

    #[test]
    fn relative_display_same_day_is_today()
    {
        let now = base_now();
        let date = now - Duration::hours(5,);
        assert_eq!(relative_display(Some(&date,), now,), "today");
    }

    #[test]
    fn relative_display_previous_day_is_yesterday()
    {
        let now = base_now();
        let date = now - Duration::days(1,);
        assert_eq!(relative_display(Some(&date,), now,), "yesterday");
    }

    #[test]
    fn cutoff_subtracts_whole_days()
    {
        let now = base_now();
        let expected = Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0,).unwrap();
        assert_eq!(cutoff(now, 7,), expected);
    }

    #[test]
    fn format_timestamp_uses_fixed_format()
    {
        let date = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5,).unwrap();
        assert_eq!(format_timestamp(&date,), "2025-01-02T03:04:05Z");
    }

    #[test]
    fn parse_timestamp_round_trips()
    {
        let date = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59,).unwrap();
        let parsed = parse_timestamp(&format_timestamp(&date,),).expect("timestamp should parse",);
        assert_eq!(parsed, date);
    }

    #[test]
    fn parse_timestamp_rejects_other_formats()
    {
        assert!(parse_timestamp("2024-12-31 23:59:59").is_none());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[derive(Debug, Serialize, Deserialize,)]
    struct OptionalStamp
    {
        #[serde(with = "crate::dates::iso_option")]
        value: Option<DateTime<Utc,>,>,
    }

    #[test]
    fn iso_option_serializes_fixed_format_or_null()
    {
        let present = OptionalStamp {
            value: Some(Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7,).unwrap(),),
        };
        let json = serde_json::to_string(&present,).expect("serialization failed",);
        assert_eq!(json, "{\"value\":\"2025-03-04T05:06:07Z\"}");

        let absent = OptionalStamp {
            value: None,
        };
        let json = serde_json::to_string(&absent,).expect("serialization failed",);
        assert_eq!(json, "{\"value\":null}");
    }

    #[test]
    fn iso_option_deserializes_null_and_timestamps()
    {
        let parsed: OptionalStamp =
            serde_json::from_str("{\"value\":\"2025-03-04T05:06:07Z\"}",).expect("parse failed",);
        assert_eq!(parsed.value, Some(Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7,).unwrap()));

        let parsed: OptionalStamp =
            serde_json::from_str("{\"value\":null}",).expect("parse failed",);
        assert_eq!(parsed.value, None);
    }
}
