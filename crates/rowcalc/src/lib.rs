//! # rowcalc
//!
//! Spreadsheet-style calculated fields for tabular data.
//!
//! A formula such as `REMPLACER([text], "(", "X")` or
//! `DATEDIF([start], [end], "md")` is parsed once and evaluated against each
//! data row. Field references are written `[Field]`; functions answer to
//! their English and French names.
//!
//! ## Features
//!
//! - Text functions with regex-or-literal pattern matching
//! - Calendar arithmetic (`DATEDIF` with `d`, `m`, `y`, `md`, `ym`, `yd`)
//! - Lenient number parsing of display values (`"10 €"`, `"1.000,50"`)
//! - Batch evaluation of calculated fields over rows or CSV files
//!
//! ## Example
//!
//! ```rust
//! use rowcalc::prelude::*;
//!
//! let row = Row::new().with("text", "Hello (World)");
//!
//! let value = evaluate_formula(&row, "REMPLACER([text], \"(\", \"X\")").unwrap();
//! assert_eq!(value, FormulaValue::String("Hello XWorld)".into()));
//!
//! let value = evaluate_formula(&row, "DATEDIF(\"01/01/2023\", \"15/02/2024\", \"md\")").unwrap();
//! assert_eq!(value, FormulaValue::Number(14.0));
//! ```

pub mod calculation;
pub mod prelude;

use thiserror::Error;

// Re-export calculation types
pub use calculation::{CalculatedField, CalculationStats, RowsCalculationExt};

// Re-export core types
pub use rowcalc_core::{
    date_to_serial, parse_date, parse_smart_number, serial_to_date, ErrorValue, FieldValue, Row,
};

// Re-export formula types
pub use rowcalc_formula::{
    evaluate, parse_formula, CompiledFormula, EvaluationContext, EvaluationOptions,
    FormulaCache, FormulaError, FormulaExpr, FormulaResult, FormulaValue, Function, OutputType,
    ParseErrorKind,
};

// Re-export I/O types
#[cfg(feature = "csv")]
pub use calculation::calculate_csv_file;
#[cfg(feature = "csv")]
pub use rowcalc_csv::{
    CsvError, CsvReadOptions, CsvReader, CsvTable, CsvWriteOptions, CsvWriter, LineTerminator,
};

/// Errors from the batch helpers
#[derive(Debug, Error)]
pub enum Error {
    /// The formula does not parse
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Reading or writing CSV failed
    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] CsvError),
}

/// Result type for the batch helpers
pub type Result<T> = std::result::Result<T, Error>;

/// Evaluate a formula against a row
///
/// The parse is cached per formula text. Only a malformed formula is an
/// `Err`; unknown functions, wrong argument counts or unparsable dates come
/// back as [`FormulaValue::Error`]. Numeric results are rounded to four
/// decimals and non-finite numbers become [`FormulaValue::Empty`].
pub fn evaluate_formula(row: &Row, formula: &str) -> FormulaResult<FormulaValue> {
    evaluate_formula_with(row, formula, &EvaluationOptions::default())
}

/// Evaluate a formula against a row with explicit options
///
/// ```rust
/// use rowcalc::{evaluate_formula_with, EvaluationOptions, FormulaValue, OutputType, Row};
///
/// let row = Row::new().with("date1", "15/01/2025");
/// let options = EvaluationOptions::default().with_output_type(OutputType::Date);
/// assert_eq!(
///     evaluate_formula_with(&row, "[date1]", &options).unwrap(),
///     FormulaValue::Number(45672.0)
/// );
/// ```
pub fn evaluate_formula_with(
    row: &Row,
    formula: &str,
    options: &EvaluationOptions,
) -> FormulaResult<FormulaValue> {
    let compiled = CompiledFormula::compile(formula)?;
    Ok(compiled.evaluate_with(row, options))
}
