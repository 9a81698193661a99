//! Common types shared across all models.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{EtlError, Result};

/// External URLs attached to Spotify objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalUrls {
    /// Link to the object on the Spotify web player.
    #[serde(default)]
    pub spotify: Option<String>,
}

/// Parse an album release date.
///
/// Spotify reports release dates with year, month or day precision, so
/// `"1999"`, `"1999-04"` and `"1999-04-12"` are all accepted. Missing
/// components default to the first month/day.
pub fn parse_release_date(date_str: &str) -> Result<NaiveDate> {
    let invalid = || EtlError::FieldType {
        field: "release_date",
        value: date_str.to_string(),
    };

    let parts: Vec<&str> = date_str.trim().split('-').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid());
    }

    let mut numbers = parts.iter().map(|p| p.parse::<u32>().map_err(|_| invalid()));
    let year = numbers.next().ok_or_else(invalid)??;
    let month = numbers.next().transpose()?.unwrap_or(1);
    let day = numbers.next().transpose()?.unwrap_or(1);

    if parts[0].len() != 4 {
        return Err(invalid());
    }

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)
}

/// Parse the `added_at` timestamp of a playlist item (RFC 3339).
pub fn parse_added_at(timestamp: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| EtlError::FieldType {
            field: "song_added",
            value: timestamp.to_string(),
        })
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serde helper writing a date as `YYYY-MM-DD`.
pub(crate) fn serialize_date<S: Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
}

/// Serde helper writing a timestamp with [`format_timestamp`].
pub(crate) fn serialize_timestamp<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_date_full() {
        let date = parse_release_date("2023-05-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 5, 15).unwrap());
    }

    #[test]
    fn test_parse_release_date_year_only() {
        let date = parse_release_date("2020").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_release_date_year_month() {
        let date = parse_release_date("1999-04").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1999, 4, 1).unwrap());
    }

    #[test]
    fn test_parse_release_date_rejects_garbage() {
        for bad in [
            "", "soon", "2020-13-01", "2020-02-30", "20-01-01", "2020-01-01-01",
            "+202", "2020-+1-01", "2020-01-+1", " 2020-1-1x",
        ] {
            let err = parse_release_date(bad).unwrap_err();
            assert!(
                matches!(err, EtlError::FieldType { field: "release_date", .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_added_at_normalizes_to_utc() {
        let dt = parse_added_at("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(&dt), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_added_at_rejects_garbage() {
        let err = parse_added_at("yesterday").unwrap_err();
        assert!(matches!(err, EtlError::FieldType { field: "song_added", .. }));
    }
}
