//! Rows with a column order

use rowcalc_core::{FieldValue, Row};

/// Data rows read from, or written to, a CSV file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    /// Column names in file order
    pub headers: Vec<String>,
    /// One row per record, keyed by column name
    pub rows: Vec<Row>,
}

impl CsvTable {
    /// Create a table with the given columns and no rows
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a column, unless one with that name exists
    pub fn add_column(&mut self, name: &str) {
        if !self.headers.iter().any(|h| h == name) {
            self.headers.push(name.to_string());
        }
    }

    /// The values of one row in column order
    pub fn record<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.headers.iter().map(move |name| row.value(name))
    }
}
