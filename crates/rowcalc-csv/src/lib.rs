//! # rowcalc-csv
//!
//! CSV reader and writer for rowcalc data rows.
//!
//! The header row supplies the field names of every [`Row`]; the column order
//! is kept in [`CsvTable::headers`] so a table can be written back unchanged,
//! with calculated columns appended.

mod error;
mod options;
mod reader;
mod table;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use table::CsvTable;
pub use writer::CsvWriter;

pub use rowcalc_core::Row;
