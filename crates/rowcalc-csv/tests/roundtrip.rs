use pretty_assertions::assert_eq;
use rowcalc_core::FieldValue;
use rowcalc_csv::{CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter};
use tempfile::TempDir;

#[test]
fn test_file_roundtrip_with_added_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    let output = dir.path().join("output.csv");

    std::fs::write(
        &input,
        "text,start,end\nHello (World),01/01/2023,15/02/2024\n\"a, b\",,\n",
    )
    .unwrap();

    let mut table = CsvReader::read_file(&input, &CsvReadOptions::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[1].value("start"), &FieldValue::Empty);

    table.add_column("days");
    table.rows[0].insert("days", 410);
    CsvWriter::write_file(&table, &output, &CsvWriteOptions::default()).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "text,start,end,days\nHello (World),01/01/2023,15/02/2024,410\n\"a, b\",,,\n"
    );

    let reread = CsvReader::read_file(&output, &CsvReadOptions::default()).unwrap();
    assert_eq!(reread.headers, table.headers);
    assert_eq!(reread.rows[0].value("days"), &FieldValue::Number(410.0));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = CsvReader::read_file(dir.path().join("nope.csv"), &CsvReadOptions::default());
    assert!(matches!(result, Err(rowcalc_csv::CsvError::Io(_))));
}
