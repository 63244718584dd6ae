//! Date parsing and serial numbers
//!
//! Dates are exchanged with formulas as spreadsheet serial numbers: the
//! number of days since 1899-12-30. For every date after 1900-02-28 this
//! matches the spreadsheet 1900 date system (e.g. 2026-02-04 == 46057).
//!
//! Row values reach the engine in many shapes. [`parse_date`] accepts:
//! - numbers below 100000 (other than 0) as serials, negative ones included;
//!   larger numbers as Unix milliseconds
//! - 5-digit numeric strings as serials
//! - `dd/mm/yyyy`, falling back to `mm/dd/yyyy` only when the second part
//!   cannot be a month; two-digit years are taken as 20xx
//! - `yyyy-mm-dd`, optionally followed by a time part
//! - `dd-mm-yyyy`

use crate::value::FieldValue;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use lazy_regex::{regex_captures, regex_is_match};

/// Largest number interpreted as a serial rather than a timestamp
const MAX_SERIAL: f64 = 100_000.0;

/// Serials further from the epoch than this are not calendar dates
const MAX_SERIAL_MAGNITUDE: f64 = 100_000_000.0;

fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Convert a date to its serial number
pub fn date_to_serial(date: NaiveDate) -> i64 {
    (date - serial_epoch()).num_days()
}

/// Convert a serial number to a date; the fractional (time) part is dropped
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_MAGNITUDE {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Interpret a field value as a calendar date
///
/// Returns `None` for empty-looking values (`""`, `0`, `-`, `(Vide)`) and for
/// anything that is not a valid calendar date.
pub fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    match value {
        FieldValue::Empty | FieldValue::Boolean(_) => None,
        FieldValue::Number(n) => date_from_number(*n),
        FieldValue::String(s) => parse_date_str(s),
    }
}

fn date_from_number(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() || n == 0.0 {
        return None;
    }
    if n < MAX_SERIAL {
        serial_to_date(n)
    } else {
        DateTime::from_timestamp_millis(n as i64).map(|dt| dt.date_naive())
    }
}

/// Interpret a string as a calendar date (see the module docs for formats)
pub fn parse_date_str(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() || text == "-" || text == "(Vide)" || text == "null" {
        return None;
    }
    if text.replace(',', ".").parse::<f64>().ok() == Some(0.0) {
        return None;
    }

    if regex_is_match!(r"^\d{5}(\.\d+)?$", text) {
        return text.parse::<f64>().ok().and_then(date_from_number);
    }

    if let Some((_, a, b, y)) = regex_captures!(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$", text) {
        let (a, b, y) = (a.parse().ok()?, b.parse().ok()?, expand_year(y)?);
        // Ambiguous dates are read day-first
        let (day, month) = if a <= 12 && b > 12 { (b, a) } else { (a, b) };
        return NaiveDate::from_ymd_opt(y, month, day);
    }

    if let Some((_, d, m, y)) = regex_captures!(r"^(\d{1,2})-(\d{1,2})-(\d{4})$", text) {
        return NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?);
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y/%m/%d") {
        return Some(date);
    }

    None
}

fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    Some(if year < 100 { 2000 + year } else { year })
}

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serial_roundtrip() {
        assert_eq!(date_to_serial(ymd(2026, 2, 4)), 46057);
        assert_eq!(date_to_serial(ymd(2025, 1, 1)), 45658);
        assert_eq!(serial_to_date(46057.0), Some(ymd(2026, 2, 4)));
        assert_eq!(serial_to_date(46057.75), Some(ymd(2026, 2, 4)));
    }

    #[test]
    fn test_french_dates() {
        assert_eq!(parse_date_str("15/01/2025"), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date_str("01/02/2024"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_date_str("1/2/24"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_date_str("15-01-2025"), Some(ymd(2025, 1, 15)));
    }

    #[test]
    fn test_month_first_when_unambiguous() {
        assert_eq!(parse_date_str("02/15/2024"), Some(ymd(2024, 2, 15)));
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_date_str("2025-01-15"), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date_str("2025-01-15T10:30:00"), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date_str("2025-01-15T10:30:00Z"), Some(ymd(2025, 1, 15)));
    }

    #[test]
    fn test_serial_inputs() {
        assert_eq!(parse_date(&FieldValue::Number(46057.0)), Some(ymd(2026, 2, 4)));
        assert_eq!(parse_date_str("46057"), Some(ymd(2026, 2, 4)));
        assert_eq!(
            parse_date(&FieldValue::Number(1_736_899_200_000.0)),
            Some(ymd(2025, 1, 15))
        );
    }

    #[test]
    fn test_negative_serials_are_dates_before_1900() {
        assert_eq!(date_to_serial(ymd(1800, 1, 1)), -36522);
        assert_eq!(parse_date(&FieldValue::Number(-36522.0)), Some(ymd(1800, 1, 1)));
        assert_eq!(parse_date(&FieldValue::Number(-1.0)), Some(ymd(1899, 12, 29)));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("0"), None);
        assert_eq!(parse_date_str("(Vide)"), None);
        assert_eq!(parse_date_str("31/02/2024"), None);
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date(&FieldValue::Empty), None);
        assert_eq!(parse_date(&FieldValue::Boolean(true)), None);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
    }
}
