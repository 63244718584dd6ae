//! Math functions
//!
//! Arguments are coerced with smart number parsing, so `"10 €"` counts as 10
//! and non-numeric text as 0.

use super::first_error;
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

/// SUM(number1, ...)
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Number(
        args.iter().map(FormulaValue::to_number).sum(),
    ))
}

/// AVERAGE(number1, ...), 0 without arguments
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    if args.is_empty() {
        return Ok(FormulaValue::Number(0.0));
    }
    let sum: f64 = args.iter().map(FormulaValue::to_number).sum();
    Ok(FormulaValue::Number(sum / args.len() as f64))
}

/// MIN(number1, ...)
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Number(
        args.iter()
            .map(FormulaValue::to_number)
            .fold(f64::INFINITY, f64::min),
    ))
}

/// MAX(number1, ...)
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Number(
        args.iter()
            .map(FormulaValue::to_number)
            .fold(f64::NEG_INFINITY, f64::max),
    ))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Number(args[0].to_number().abs()))
}

/// ROUND(number, [num_digits])
///
/// Halves round up (toward positive infinity): ROUND(-2.5) = -2.
/// Negative digit counts round to tens, hundreds, ...
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }

    let number = args[0].to_number();
    let digits = args.get(1).map(FormulaValue::to_number).unwrap_or(0.0).trunc();

    let rounded = if digits >= 0.0 {
        let factor = 10f64.powi(digits as i32);
        (number * factor + 0.5).floor() / factor
    } else {
        let factor = 10f64.powi(-digits as i32);
        (number / factor + 0.5).floor() * factor
    };
    Ok(FormulaValue::Number(rounded))
}
