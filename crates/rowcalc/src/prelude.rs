//! Prelude module - common imports for rowcalc users
//!
//! ```rust
//! use rowcalc::prelude::*;
//! ```

pub use crate::{
    // Entry points
    evaluate_formula,
    evaluate_formula_with,
    // Calculation types
    CalculatedField,
    CalculationStats,
    CompiledFormula,
    // Values
    ErrorValue,
    EvaluationOptions,
    FieldValue,
    FormulaError,
    FormulaValue,
    OutputType,
    Row,
    // Extension traits
    RowsCalculationExt,
};

#[cfg(feature = "csv")]
pub use crate::{CsvReader, CsvTable, CsvWriter};
