//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use crate::table::CsvTable;
use rowcalc_core::{parse_plain_number, FieldValue, Row};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into rows
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<CsvTable> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into rows
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<CsvTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut table = CsvTable::default();

        if options.has_header {
            for name in csv_reader.headers()?.iter() {
                let name = name.trim_start_matches('\u{FEFF}').trim();
                if table.headers.iter().any(|h| h == name) {
                    return Err(CsvError::DuplicateColumn(name.to_string()));
                }
                table.headers.push(name.to_string());
            }
        }

        for result in csv_reader.records() {
            let record = result?;

            // Headerless files, or records longer than the header row
            while table.headers.len() < record.len() {
                let name = format!("Column {}", table.headers.len() + 1);
                table.headers.push(name);
            }

            let mut row = Row::new();
            for (name, field) in table.headers.iter().zip(record.iter()) {
                let value = if options.auto_detect_types {
                    Self::detect_type(field)
                } else {
                    FieldValue::String(field.to_string())
                };
                row.insert(name.as_str(), value);
            }
            table.rows.push(row);
        }

        Ok(table)
    }

    /// Detect the type of a field value
    ///
    /// Dates and formatted numbers such as `"10 €"` stay text; formulas
    /// parse them when they need to.
    fn detect_type(field: &str) -> FieldValue {
        let trimmed = field.trim();

        if trimmed.is_empty() {
            return FieldValue::Empty;
        }

        // Try boolean
        match trimmed.to_lowercase().as_str() {
            "true" | "vrai" => return FieldValue::Boolean(true),
            "false" | "faux" => return FieldValue::Boolean(false),
            _ => {}
        }

        // Try number, keeping identifiers with leading zeros as text
        let leading_zero = trimmed.len() > 1
            && trimmed.starts_with('0')
            && !trimmed.starts_with("0.");
        if !leading_zero {
            if let Some(n) = parse_plain_number(trimmed) {
                return FieldValue::Number(n);
            }
        }

        // Default to string
        FieldValue::String(field.to_string())
    }
}
