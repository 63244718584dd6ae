//! Logical functions

use super::first_error;
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

/// IF(condition, value_if_true, [value_if_false])
///
/// Only the condition's error propagates; the chosen branch is returned as
/// is. Without an else branch a false condition yields null.
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let condition = &args[0];
    if let Some(e) = condition.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    if condition.is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(FormulaValue::Empty))
    }
}

/// AND(value1, ...)
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Boolean(args.iter().all(FormulaValue::is_truthy)))
}

/// OR(value1, ...)
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Boolean(args.iter().any(FormulaValue::is_truthy)))
}

/// NOT(value)
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Boolean(!args[0].is_truthy()))
}
