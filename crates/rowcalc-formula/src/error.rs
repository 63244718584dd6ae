//! Formula error types

use rowcalc_core::ErrorValue;
use std::fmt;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Parse error at position {position}: {kind}")]
    Parse {
        kind: ParseErrorKind,
        /// Byte offset into the formula text
        position: usize,
    },

    /// Generic evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Expression nested deeper than the evaluator allows
    #[error("Formula nesting exceeds the limit of {0} levels")]
    DepthLimit(usize),
}

impl FormulaError {
    pub(crate) fn parse(kind: ParseErrorKind, position: usize) -> Self {
        FormulaError::Parse { kind, position }
    }

    /// The error sentinel an evaluation failure is reported as
    pub fn error_value(&self) -> ErrorValue {
        match self {
            FormulaError::UnknownFunction(_) => ErrorValue::Name,
            FormulaError::DepthLimit(_) => ErrorValue::Calc,
            FormulaError::Parse { .. }
            | FormulaError::Evaluation(_)
            | FormulaError::ArgumentCount { .. } => ErrorValue::Value,
        }
    }
}

/// The malformed construct a parse error points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Nothing but whitespace
    EmptyFormula,
    /// `(` without `)` or a stray `)`
    UnbalancedParenthesis,
    /// String literal without its closing quote
    UnterminatedString,
    /// `[` without `]`
    UnterminatedFieldRef,
    /// Argument list with no function name in front of it
    EmptyFunctionName,
    /// Identifier that is not followed by an argument list
    MissingArgumentList(String),
    /// Token that cannot appear here
    UnexpectedToken(String),
    /// Formula ended in the middle of an expression
    UnexpectedEnd,
    /// Well-formed expression followed by extra text
    TrailingInput(String),
    /// Parser stack guard tripped
    NestingTooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::EmptyFormula => write!(f, "empty formula"),
            ParseErrorKind::UnbalancedParenthesis => write!(f, "unbalanced parentheses"),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ParseErrorKind::UnterminatedFieldRef => {
                write!(f, "unterminated field reference, missing ']'")
            }
            ParseErrorKind::EmptyFunctionName => write!(f, "empty function name"),
            ParseErrorKind::MissingArgumentList(name) => {
                write!(f, "expected '(' after function name '{}'", name)
            }
            ParseErrorKind::UnexpectedToken(token) => write!(f, "unexpected {}", token),
            ParseErrorKind::UnexpectedEnd => write!(f, "unexpected end of formula"),
            ParseErrorKind::TrailingInput(rest) => {
                write!(f, "unexpected characters after expression: '{}'", rest)
            }
            ParseErrorKind::NestingTooDeep => write!(f, "formula is nested too deeply"),
        }
    }
}
