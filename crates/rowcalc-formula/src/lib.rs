//! # rowcalc-formula
//!
//! Formula parser and evaluator for rowcalc calculated fields.
//!
//! This crate provides:
//! - Formula parsing (text → AST), with canonical serialization back to text
//! - Formula evaluation against a data row (AST → value)
//! - Built-in functions with French and English names
//! - A parse cache for evaluating one formula over many rows
//!
//! ## Example
//!
//! ```rust
//! use rowcalc_core::Row;
//! use rowcalc_formula::{evaluate, parse_formula, EvaluationContext, FormulaValue};
//!
//! let ast = parse_formula("REMPLACER([text], \"(\", \"X\")").unwrap();
//! let row = Row::new().with("text", "Hello (World)");
//! let ctx = EvaluationContext::new(&row);
//! assert_eq!(
//!     evaluate(&ast, &ctx).unwrap(),
//!     FormulaValue::String("Hello XWorld)".into())
//! );
//! ```

pub mod ast;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use cache::{CompiledFormula, FormulaCache};
pub use error::{FormulaError, FormulaResult, ParseErrorKind};
pub use evaluator::{
    evaluate, EvaluationContext, EvaluationOptions, FormulaValue, OutputType, DEFAULT_MAX_DEPTH,
};
pub use functions::Function;
pub use parser::parse_formula;
