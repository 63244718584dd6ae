//! Date and time functions
//!
//! Dates are read from row values with [`rowcalc_core::parse_date`] and
//! returned as serial numbers (days since 1899-12-30).

use super::first_error;
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use chrono::{Datelike, Local, Months, NaiveDate};
use rowcalc_core::{date_to_serial, days_in_month, parse_date, ErrorValue, FieldValue};

/// Largest magnitude accepted for a DATE() component
const MAX_DATE_PART: f64 = 1_000_000.0;

fn to_date(value: &FormulaValue) -> Option<NaiveDate> {
    parse_date(&FieldValue::from(value.clone()))
}

fn date_part(
    args: &[FormulaValue],
    part: impl Fn(NaiveDate) -> i32,
) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    match to_date(&args[0]) {
        Some(date) => Ok(FormulaValue::Number(part(date) as f64)),
        None => Ok(FormulaValue::Error(ErrorValue::Value)),
    }
}

/// YEAR(date)
pub fn fn_year(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    date_part(args, |date| date.year())
}

/// MONTH(date)
pub fn fn_month(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    date_part(args, |date| date.month() as i32)
}

/// DAY(date)
pub fn fn_day(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    date_part(args, |date| date.day() as i32)
}

/// TODAY() - current local date as a whole serial number
pub fn fn_today(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let today = Local::now().date_naive();
    Ok(FormulaValue::Number(date_to_serial(today) as f64))
}

/// DATE(year, month, day)
///
/// Months and days outside their range roll over: DATE(2024, 13, 1) is
/// 2025-01-01 and DATE(2024, 3, 0) is 2024-02-29.
pub fn fn_date(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }

    let year = args[0].to_number().trunc();
    let month = args[1].to_number().trunc();
    let day = args[2].to_number().trunc();
    let in_range = |n: f64| n.is_finite() && n.abs() <= MAX_DATE_PART;
    if !(in_range(year) && in_range(month) && in_range(day)) {
        return Ok(FormulaValue::Error(ErrorValue::Num));
    }

    let months_from_epoch = year as i64 * 12 + (month as i64 - 1);
    let year = months_from_epoch.div_euclid(12);
    let month = months_from_epoch.rem_euclid(12) as u32 + 1;

    let date = i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month, 1))
        .and_then(|first| first.checked_add_signed(chrono::Duration::days(day as i64 - 1)));

    match date {
        Some(date) => Ok(FormulaValue::Number(date_to_serial(date) as f64)),
        None => Ok(FormulaValue::Error(ErrorValue::Num)),
    }
}

/// DATEDIF(start, end, unit)
///
/// Units: `d` (or `j`) days, `m` whole months, `y` (or `a`) whole years,
/// `md` days ignoring months and years, `ym` months ignoring years, `yd`
/// days ignoring years. Reversed dates are swapped, so results are never
/// negative.
pub fn fn_datedif(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }

    let (start, end) = match (to_date(&args[0]), to_date(&args[1])) {
        (Some(start), Some(end)) => (start, end),
        _ => return Ok(FormulaValue::Error(ErrorValue::Value)),
    };

    match datedif(start, end, &args[2].as_string()) {
        Some(n) => Ok(FormulaValue::Number(n as f64)),
        None => Ok(FormulaValue::Error(ErrorValue::Num)),
    }
}

/// Difference between two dates in the given unit, `None` for an unknown unit
pub fn datedif(start: NaiveDate, end: NaiveDate, unit: &str) -> Option<i64> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };

    let result = match unit.trim().to_lowercase().as_str() {
        "d" | "j" => (end - start).num_days(),
        "m" => whole_months(start, end) as i64,
        "y" | "a" => (whole_months(start, end) / 12) as i64,
        "md" => {
            // Days since the last monthly anniversary of start
            let anniversary = start
                .checked_add_months(Months::new(whole_months(start, end)))
                .unwrap_or(end);
            (end - anniversary).num_days()
        }
        "ym" => (whole_months(start, end) % 12) as i64,
        "yd" => {
            let mut projected = project_to_year(end, start.year())?;
            if projected < start {
                projected = project_to_year(end, start.year() + 1)?;
            }
            (projected - start).num_days()
        }
        _ => return None,
    };
    Some(result)
}

/// Complete months from `start` to `end` (`start <= end`)
fn whole_months(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// The same month and day in another year; Feb 29 becomes Feb 28 in common
/// years
fn project_to_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day)
}
