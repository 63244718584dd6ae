//! Field value types

use std::fmt;

/// Represents the value stored in a row field
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// Absent or null value
    #[default]
    Empty,

    /// Boolean value
    Boolean(bool),

    /// Numeric value (dates may also arrive as serial numbers)
    Number(f64),

    /// Text value (dates usually arrive as text, e.g. "15/01/2025")
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Format a number the way a spreadsheet displays it: integers without a
/// fractional part, everything else with the shortest round-tripping form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Empty)
    }
}

/// Error sentinel produced by a formula that could not be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorValue {
    /// #VALUE! - Wrong type of argument, wrong arity or unparsable input
    Value,
    /// #NAME? - Unknown function name
    Name,
    /// #NUM! - Invalid numeric result or option
    Num,
    /// #N/A - Value not available
    Na,
    /// #CALC! - Evaluation aborted (nesting limit)
    Calc,
}

impl ErrorValue {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorValue::Value => "#VALUE!",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Num => "#NUM!",
            ErrorValue::Na => "#N/A",
            ErrorValue::Calc => "#CALC!",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
