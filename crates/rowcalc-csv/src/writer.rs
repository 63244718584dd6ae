//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};
use crate::table::CsvTable;

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write rows to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        table: &CsvTable,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(table, file, options)
    }

    /// Write rows to a writer, one record per row in column order
    pub fn write<W: Write>(
        table: &CsvTable,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .from_writer(writer);

        if options.write_header {
            csv_writer.write_record(&table.headers)?;
        }

        for row in &table.rows {
            let record: Vec<String> = table.record(row).map(|value| value.to_string()).collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Row;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_in_column_order() {
        let mut table = CsvTable::new(["name", "total", "ok"]);
        table.rows.push(
            Row::new()
                .with("ok", true)
                .with("total", 120.0)
                .with("name", "Dupont, Jean"),
        );
        table.rows.push(Row::new().with("name", "Martin"));

        let mut out = Vec::new();
        CsvWriter::write(&table, &mut out, &CsvWriteOptions::default()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,total,ok\n\"Dupont, Jean\",120,TRUE\nMartin,,\n"
        );
    }

    #[test]
    fn test_write_options() {
        let mut table = CsvTable::new(["a", "b"]);
        table.rows.push(Row::new().with("a", 1).with("b", 2.5));

        let options = CsvWriteOptions {
            delimiter: b';',
            write_header: false,
            line_terminator: LineTerminator::CRLF,
            ..Default::default()
        };
        let mut out = Vec::new();
        CsvWriter::write(&table, &mut out, &options).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1;2.5\r\n");
    }
}
