//! Formula evaluator
//!
//! Evaluates formula ASTs against a data row to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::Function;
use rowcalc_core::{
    date_to_serial, format_number, parse_date, parse_plain_number, parse_smart_number,
    ErrorValue, FieldValue, Row,
};
use std::cmp::Ordering;
use std::fmt;

/// Default limit on nested function calls
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(ErrorValue),
    /// Null: missing field, IF without else branch, non-finite result
    #[default]
    Empty,
}

impl FormulaValue {
    /// Convert to number without lenient text parsing
    ///
    /// Text only converts when it is a plain number such as `"18"` or `" 2.5 "`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::String(s) => parse_plain_number(s),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Error(_) => None,
        }
    }

    /// Coerce to number for arithmetic: text goes through smart number
    /// parsing (`"10 €"` → 10, garbage → 0)
    pub fn to_number(&self) -> f64 {
        match self {
            FormulaValue::String(s) => parse_smart_number(s),
            other => other.as_number().unwrap_or(0.0),
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
        }
    }

    /// Truthiness used by IF, AND, OR and NOT
    ///
    /// Non-zero numbers, non-empty text and TRUE are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FormulaValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FormulaValue::String(s) => !s.is_empty(),
            FormulaValue::Boolean(b) => *b,
            FormulaValue::Error(_) | FormulaValue::Empty => false,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<ErrorValue> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&FieldValue> for FormulaValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Empty => FormulaValue::Empty,
            FieldValue::Boolean(b) => FormulaValue::Boolean(*b),
            FieldValue::Number(n) => FormulaValue::Number(*n),
            FieldValue::String(s) => FormulaValue::String(s.clone()),
        }
    }
}

impl From<FormulaValue> for FieldValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => FieldValue::Empty,
            FormulaValue::Number(n) => FieldValue::Number(n),
            FormulaValue::String(s) => FieldValue::String(s),
            FormulaValue::Boolean(b) => FieldValue::Boolean(b),
            // Rows have no error type; keep the sentinel text
            FormulaValue::Error(e) => FieldValue::String(e.to_string()),
        }
    }
}

/// Requested type of a calculated field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Number,
    Text,
    Boolean,
    /// Date serial number
    Date,
}

impl OutputType {
    /// Parse an output type name (`number`, `text`, `boolean`, `date`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "number" | "nombre" => Some(OutputType::Number),
            "text" | "texte" | "string" => Some(OutputType::Text),
            "boolean" | "booleen" | "bool" => Some(OutputType::Boolean),
            "date" => Some(OutputType::Date),
            _ => None,
        }
    }

    /// Coerce an evaluation result to this type
    ///
    /// Errors pass through unchanged.
    pub fn coerce(&self, value: FormulaValue) -> FormulaValue {
        if value.is_error() {
            return value;
        }
        match self {
            OutputType::Text => FormulaValue::String(value.as_string()),
            OutputType::Boolean => FormulaValue::Boolean(value.is_truthy()),
            OutputType::Number => match value {
                FormulaValue::Empty => FormulaValue::Empty,
                other => FormulaValue::Number(other.to_number()),
            },
            OutputType::Date => {
                let field: FieldValue = value.into();
                match parse_date(&field) {
                    Some(date) => FormulaValue::Number(date_to_serial(date) as f64),
                    None => FormulaValue::Empty,
                }
            }
        }
    }
}

/// Evaluation settings
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOptions {
    /// Maximum depth of nested function calls
    pub max_depth: usize,
    /// Decimal places numeric results are rounded to (`None` keeps full precision)
    pub round_decimals: Option<u32>,
    /// Coerce the result to this type
    pub output_type: Option<OutputType>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            round_decimals: Some(4),
            output_type: None,
        }
    }
}

impl EvaluationOptions {
    /// Set the output type
    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = Some(output_type);
        self
    }

    /// Apply output coercion and numeric finalization to a raw result
    ///
    /// Non-finite numbers become null and numbers are rounded to
    /// `round_decimals`.
    pub fn finalize(&self, value: FormulaValue) -> FormulaValue {
        let value = match self.output_type {
            Some(output_type) => output_type.coerce(value),
            None => value,
        };

        match value {
            FormulaValue::Number(n) if !n.is_finite() => FormulaValue::Empty,
            FormulaValue::Number(n) => match self.round_decimals {
                Some(decimals) => FormulaValue::Number(round_to(n, decimals)),
                None => FormulaValue::Number(n),
            },
            other => other,
        }
    }
}

/// Round half away from zero to a number of decimals
fn round_to(n: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (n * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        n
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Row that field references resolve against
    pub row: &'a Row,
    /// Evaluation settings
    pub options: EvaluationOptions,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context with default options
    pub fn new(row: &'a Row) -> Self {
        Self {
            row,
            options: EvaluationOptions::default(),
        }
    }

    /// Create a context with explicit options
    pub fn with_options(row: &'a Row, options: EvaluationOptions) -> Self {
        Self { row, options }
    }

    /// Resolve a field reference; missing fields are null
    pub fn field_value(&self, name: &str) -> FormulaValue {
        self.row.value(name).into()
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    evaluate_at(expr, ctx, 0)
}

fn evaluate_at(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
    depth: usize,
) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),

        // === References ===
        FormulaExpr::FieldRef(name) => Ok(ctx.field_value(name)),

        // === Operators ===
        FormulaExpr::BinaryOp { .. } => evaluate_operator_chain(expr, ctx, depth),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx, depth),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx, depth + 1),
    }
}

/// Evaluate a left-leaning chain of binary operations
///
/// `[a] + [b] + [c]` parses as `(([a] + [b]) + [c])`. The left spine is
/// walked in a loop so long flat chains do not recurse.
fn evaluate_operator_chain(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
    depth: usize,
) -> FormulaResult<FormulaValue> {
    let mut pending = Vec::new();
    let mut leftmost = expr;
    while let FormulaExpr::BinaryOp { op, left, right } = leftmost {
        pending.push((*op, right.as_ref()));
        leftmost = left;
    }

    let mut value = evaluate_at(leftmost, ctx, depth)?;
    for (op, right) in pending.into_iter().rev() {
        let right_val = evaluate_at(right, ctx, depth)?;
        value = apply_binary_op(op, value, right_val)?;
    }
    Ok(value)
}

/// Apply a binary operator to evaluated operands
fn apply_binary_op(
    op: BinaryOperator,
    left_val: FormulaValue,
    right_val: FormulaValue,
) -> FormulaResult<FormulaValue> {
    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        // Arithmetic operators
        BinaryOperator::Add => Ok(FormulaValue::Number(
            left_val.to_number() + right_val.to_number(),
        )),
        BinaryOperator::Subtract => Ok(FormulaValue::Number(
            left_val.to_number() - right_val.to_number(),
        )),
        BinaryOperator::Multiply => Ok(FormulaValue::Number(
            left_val.to_number() * right_val.to_number(),
        )),
        BinaryOperator::Divide => {
            let r = right_val.to_number();
            // Division by zero yields 0 rather than an error
            if r == 0.0 {
                Ok(FormulaValue::Number(0.0))
            } else {
                Ok(FormulaValue::Number(left_val.to_number() / r))
            }
        }
        BinaryOperator::Power => {
            let result = left_val.to_number().powf(right_val.to_number());
            if result.is_nan() || result.is_infinite() {
                Ok(FormulaValue::Error(ErrorValue::Num))
            } else {
                Ok(FormulaValue::Number(result))
            }
        }

        // Comparison operators
        BinaryOperator::Equal => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Equal,
        )),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Equal,
        )),
        BinaryOperator::LessThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Less,
        )),
        BinaryOperator::LessEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Greater,
        )),
        BinaryOperator::GreaterThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Greater,
        )),
        BinaryOperator::GreaterEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Less,
        )),

        // Concatenation
        BinaryOperator::Concat => {
            let l = left_val.as_string();
            let r = right_val.as_string();
            Ok(FormulaValue::String(l + &r))
        }
    }
}

/// Compare two values for ordering
///
/// Booleans compare FALSE < TRUE. Values that both read as plain numbers
/// (null counts as 0) compare numerically; anything else compares as
/// case-insensitive text.
pub fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    match (left, right) {
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        _ => match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => left
                .as_string()
                .to_lowercase()
                .cmp(&right.as_string().to_lowercase()),
        },
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
    depth: usize,
) -> FormulaResult<FormulaValue> {
    let val = evaluate_at(operand, ctx, depth)?;

    // Propagate errors
    if let Some(e) = val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-val.to_number())),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
    depth: usize,
) -> FormulaResult<FormulaValue> {
    if depth > ctx.options.max_depth {
        return Err(FormulaError::DepthLimit(ctx.options.max_depth));
    }

    // Evaluate arguments, eagerly and left to right, before dispatch
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate_at(arg, ctx, depth)?);
    }

    let func = Function::from_name(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
    let def = func.def();

    // Check argument count
    if args.len() < def.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", def.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = def.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Call the function
    (def.implementation)(&evaluated_args, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn eval_row(formula: &str, row: &Row) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::new(row);
        evaluate(&ast, &ctx)
    }

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        eval_row(formula, &Row::new())
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(
            eval("\"Hello\"").unwrap(),
            FormulaValue::String("Hello".into())
        );
        assert_eq!(eval("VRAI").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_field_refs() {
        let row = Row::new().with("text", "Hello (World)").with("n", 3);
        assert_eq!(
            eval_row("[text]", &row).unwrap(),
            FormulaValue::String("Hello (World)".into())
        );
        assert_eq!(eval_row("[n]", &row).unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval_row("[missing]", &row).unwrap(), FormulaValue::Empty);
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("10-4").unwrap(), FormulaValue::Number(6.0));
        assert_eq!(eval("3*4").unwrap(), FormulaValue::Number(12.0));
        assert_eq!(eval("10/4").unwrap(), FormulaValue::Number(2.5));
        assert_eq!(eval("2^10").unwrap(), FormulaValue::Number(1024.0));
        assert_eq!(eval("1+2*3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("(1+2)*3").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("-5+2").unwrap(), FormulaValue::Number(-3.0));
    }

    #[test]
    fn test_arithmetic_uses_smart_numbers() {
        let row = Row::new().with("Prix", "10 €").with("Qte", 12);
        assert_eq!(
            eval_row("[Prix] * [Qte]", &row).unwrap(),
            FormulaValue::Number(120.0)
        );
        assert_eq!(
            eval_row("[missing] + 1", &row).unwrap(),
            FormulaValue::Number(1.0)
        );
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(eval("1/0").unwrap(), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_power_overflow_is_num_error() {
        assert_eq!(
            eval("10^400").unwrap(),
            FormulaValue::Error(ErrorValue::Num)
        );
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("1<2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("1>2").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("1=1").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("1<>1").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("\"abc\" = \"ABC\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("\"b\" > \"a\"").unwrap(), FormulaValue::Boolean(true));

        let row = Row::new().with("Age", "25").with("Ville", "Paris");
        assert_eq!(eval_row("[Age] > 18", &row).unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval_row("[Age] == 25", &row).unwrap(), FormulaValue::Boolean(true));
        assert_eq!(
            eval_row("[Ville] != 'paris'", &row).unwrap(),
            FormulaValue::Boolean(false)
        );
        assert_eq!(eval_row("[missing] = 0", &row).unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_concatenation() {
        assert_eq!(
            eval("\"Hello\" & \" \" & \"World\"").unwrap(),
            FormulaValue::String("Hello World".into())
        );
        assert_eq!(
            eval("\"Value: \" & 42").unwrap(),
            FormulaValue::String("Value: 42".into())
        );
    }

    #[test]
    fn test_long_flat_chains() {
        let row = Row::new().with("a", 2).with("s", "x");

        let sum = format!("[a]{}", " + [a]".repeat(300));
        assert_eq!(eval_row(&sum, &row).unwrap(), FormulaValue::Number(602.0));

        let text = format!("[s]{}", " & [s]".repeat(300));
        assert_eq!(
            eval_row(&text, &row).unwrap(),
            FormulaValue::String("x".repeat(301))
        );

        // Precedence inside the chain is kept
        assert_eq!(eval("10 - 2 - 3 * 2 + 1").unwrap(), FormulaValue::Number(3.0));
    }

    #[test]
    fn test_errors_propagate_through_operators() {
        assert_eq!(
            eval("(10^400) + 1").unwrap(),
            FormulaValue::Error(ErrorValue::Num)
        );
        assert_eq!(eval("-(10^400)").unwrap(), FormulaValue::Error(ErrorValue::Num));
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            eval("NOPE(1)"),
            Err(FormulaError::UnknownFunction("NOPE".into()))
        );
        assert_eq!(
            eval("NOPE(1)").unwrap_err().error_value(),
            ErrorValue::Name
        );
    }

    #[test]
    fn test_argument_count() {
        let err = eval("REMPLACER(\"a\", \"b\")").unwrap_err();
        assert!(matches!(err, FormulaError::ArgumentCount { actual: 2, .. }));
        assert_eq!(err.error_value(), ErrorValue::Value);
    }

    #[test]
    fn test_arguments_are_evaluated_before_dispatch() {
        // The inner unknown function fails before the outer arity check
        assert_eq!(
            eval("REPLACE(NOPE(1), \"a\")"),
            Err(FormulaError::UnknownFunction("NOPE".into()))
        );
        assert_eq!(
            eval("NOPE(ABS())").unwrap_err().error_value(),
            ErrorValue::Value
        );
    }

    #[test]
    fn test_depth_limit() {
        let nested = |depth: usize| {
            format!("{}[x]{}", "MAJUSCULE(".repeat(depth), ")".repeat(depth))
        };
        let row = Row::new().with("x", "a");

        assert_eq!(
            eval_row(&nested(DEFAULT_MAX_DEPTH), &row).unwrap(),
            FormulaValue::String("A".into())
        );
        assert_eq!(
            eval_row(&nested(DEFAULT_MAX_DEPTH + 1), &row),
            Err(FormulaError::DepthLimit(DEFAULT_MAX_DEPTH))
        );
    }

    #[test]
    fn test_custom_depth_limit() {
        let ast = parse_formula("ABS(ABS(ABS(-1)))").unwrap();
        let row = Row::new();
        let options = EvaluationOptions {
            max_depth: 2,
            ..EvaluationOptions::default()
        };
        let ctx = EvaluationContext::with_options(&row, options);
        assert_eq!(evaluate(&ast, &ctx), Err(FormulaError::DepthLimit(2)));
    }

    #[test]
    fn test_truthiness() {
        assert!(FormulaValue::Number(2.0).is_truthy());
        assert!(!FormulaValue::Number(0.0).is_truthy());
        assert!(FormulaValue::String("0".into()).is_truthy());
        assert!(!FormulaValue::String(String::new()).is_truthy());
        assert!(!FormulaValue::Empty.is_truthy());
    }

    #[test]
    fn test_finalize_rounds_and_nulls() {
        let options = EvaluationOptions::default();
        assert_eq!(
            options.finalize(FormulaValue::Number(1.0 / 3.0)),
            FormulaValue::Number(0.3333)
        );
        assert_eq!(
            options.finalize(FormulaValue::Number(f64::INFINITY)),
            FormulaValue::Empty
        );
        assert_eq!(
            options.finalize(FormulaValue::String("x".into())),
            FormulaValue::String("x".into())
        );
    }

    #[test]
    fn test_output_type_coercion() {
        assert_eq!(
            OutputType::Text.coerce(FormulaValue::Empty),
            FormulaValue::String(String::new())
        );
        assert_eq!(
            OutputType::Text.coerce(FormulaValue::Number(12.0)),
            FormulaValue::String("12".into())
        );
        assert_eq!(
            OutputType::Boolean.coerce(FormulaValue::String("x".into())),
            FormulaValue::Boolean(true)
        );
        assert_eq!(
            OutputType::Number.coerce(FormulaValue::String("1.000,50".into())),
            FormulaValue::Number(1000.5)
        );
        assert_eq!(
            OutputType::Date.coerce(FormulaValue::String("04/02/2026".into())),
            FormulaValue::Number(46057.0)
        );
        assert_eq!(
            OutputType::Date.coerce(FormulaValue::String("soon".into())),
            FormulaValue::Empty
        );
        assert_eq!(
            OutputType::Number.coerce(FormulaValue::Error(ErrorValue::Value)),
            FormulaValue::Error(ErrorValue::Value)
        );
    }

    #[test]
    fn test_output_type_names() {
        assert_eq!(OutputType::from_name("Number"), Some(OutputType::Number));
        assert_eq!(OutputType::from_name("texte"), Some(OutputType::Text));
        assert_eq!(OutputType::from_name("date"), Some(OutputType::Date));
        assert_eq!(OutputType::from_name("matrix"), None);
    }
}
