//! # rowcalc-core
//!
//! Core data structures for the rowcalc formula engine.
//!
//! This crate provides the fundamental types used throughout rowcalc:
//! - [`Row`] - A data row mapping field names to values
//! - [`FieldValue`] - A scalar field value (empty, boolean, number, text)
//! - [`ErrorValue`] - The error sentinel returned by failed evaluations
//! - Lenient number parsing ([`parse_smart_number`]) and date parsing
//!   ([`parse_date`]) shared by the formula functions
//!
//! ## Example
//!
//! ```rust
//! use rowcalc_core::{FieldValue, Row};
//!
//! let row = Row::new()
//!     .with("Prix", "10 €")
//!     .with("Qte", 12);
//!
//! assert_eq!(row.value("Qte"), &FieldValue::Number(12.0));
//! assert_eq!(row.value("missing"), &FieldValue::Empty);
//! ```

pub mod date;
pub mod number;
pub mod row;
pub mod value;

// Re-exports for convenience
pub use date::{date_to_serial, days_in_month, parse_date, parse_date_str, serial_to_date};
pub use number::{parse_plain_number, parse_smart_number};
pub use row::Row;
pub use value::{format_number, ErrorValue, FieldValue};
