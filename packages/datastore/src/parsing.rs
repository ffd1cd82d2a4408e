//! Field parsing for incident table rows.
//!
//! Each parser returns `None` when the raw value does not satisfy the
//! record invariants; the caller turns that into a schema error naming the
//! offending column.

use campus_safety_incident_models::IncidentSeverity;
use chrono::{NaiveDate, NaiveDateTime};

/// Date-only layouts accepted in the `date` column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Timestamp layouts accepted in the `date` column. The time of day is
/// discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses an ISO-ish calendar date, with or without a time component.
#[must_use]
pub fn parse_incident_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses an integer severity in 1-5.
#[must_use]
pub fn parse_severity(s: &str) -> Option<IncidentSeverity> {
    let value: u8 = s.trim().parse().ok()?;
    IncidentSeverity::from_value(value).ok()
}

/// Parses a coordinate. Returns `None` if the value is not a finite number.
#[must_use]
pub fn parse_coordinate(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Returns the trimmed label, or `None` if it is empty.
#[must_use]
pub fn parse_label(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_iso_date() {
        let d = parse_incident_date("2024-03-15").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn parses_slash_date() {
        let d = parse_incident_date("2024/12/01").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
    }

    #[test]
    fn drops_time_component() {
        let d = parse_incident_date("2024-01-15T14:30:00.000").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let d = parse_incident_date("2024-01-15 23:59:59").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(parse_incident_date("not-a-date").is_none());
        assert!(parse_incident_date("2024-02-30").is_none());
        assert!(parse_incident_date("").is_none());
    }

    #[test]
    fn severity_bounds() {
        assert_eq!(parse_severity("1"), Some(IncidentSeverity::Minimal));
        assert_eq!(parse_severity(" 5 "), Some(IncidentSeverity::Critical));
        assert!(parse_severity("0").is_none());
        assert!(parse_severity("6").is_none());
        assert!(parse_severity("-1").is_none());
        assert!(parse_severity("2.5").is_none());
        assert!(parse_severity("high").is_none());
    }

    #[test]
    fn coordinates_must_be_finite_numbers() {
        let v = parse_coordinate("40.7128").unwrap();
        assert!((v - 40.7128).abs() < f64::EPSILON);
        assert!(parse_coordinate("NaN").is_none());
        assert!(parse_coordinate("inf").is_none());
        assert!(parse_coordinate("north").is_none());
        assert!(parse_coordinate("").is_none());
    }

    #[test]
    fn labels_are_trimmed_and_non_empty() {
        assert_eq!(parse_label("  Library "), Some("Library"));
        assert!(parse_label("   ").is_none());
    }
}
