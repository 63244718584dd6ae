//! Tests for calculated columns over CSV files

use pretty_assertions::assert_eq;
use rowcalc::prelude::*;
use rowcalc::{calculate_csv_file, CsvReadOptions, CsvWriteOptions, OutputType};
use tempfile::TempDir;

const INPUT: &str = "text,Prix,Qte,debut,fin\n\
Hello (World),10 €,12,01/01/2023,15/02/2024\n\
Hello [World],\"2,5\",4,,\n";

fn fields() -> Vec<CalculatedField> {
    vec![
        CalculatedField::new("Clean", r#"REMPLACER([text], "(", "X")"#).unwrap(),
        CalculatedField::new("Total", "[Prix] * [Qte]").unwrap(),
        CalculatedField::new("Mois", r#"DATEDIF([debut], [fin], "ym")"#).unwrap(),
    ]
}

#[test]
fn test_calculate_csv_file_appends_columns() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    let output = dir.path().join("output.csv");
    std::fs::write(&input, INPUT).unwrap();

    let stats = calculate_csv_file(
        &input,
        &output,
        &fields(),
        &CsvReadOptions::default(),
        &CsvWriteOptions::default(),
    )
    .unwrap();

    assert_eq!(
        stats,
        CalculationStats {
            rows_calculated: 6,
            errors: 1
        }
    );
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "text,Prix,Qte,debut,fin,Clean,Total,Mois\n\
         Hello (World),10 €,12,01/01/2023,15/02/2024,Hello XWorld),120,1\n\
         Hello [World],\"2,5\",4,,,Hello [World],10,#VALUE!\n"
    );
}

#[test]
fn test_calculated_columns_are_not_duplicated() {
    let mut table = CsvReader::read(INPUT.as_bytes(), &CsvReadOptions::default()).unwrap();
    let total = CalculatedField::new("Total", "[Prix] * [Qte]")
        .unwrap()
        .with_output_type(OutputType::Text);

    table.calculate_field(&total);
    table.calculate_field(&total);

    assert_eq!(table.headers.len(), 6);
    assert_eq!(table.rows[0].value("Total"), &FieldValue::from("120"));
}

#[test]
fn test_missing_input_is_csv_error() {
    let dir = TempDir::new().unwrap();
    let result = calculate_csv_file(
        dir.path().join("absent.csv"),
        dir.path().join("out.csv"),
        &fields(),
        &CsvReadOptions::default(),
        &CsvWriteOptions::default(),
    );

    assert!(matches!(result, Err(rowcalc::Error::Csv(_))));
}

#[test]
fn test_semicolon_delimited_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    let output = dir.path().join("output.csv");
    std::fs::write(&input, "a;b\n1,5;2\n").unwrap();

    let read_options = CsvReadOptions {
        delimiter: b';',
        ..Default::default()
    };
    let write_options = CsvWriteOptions {
        delimiter: b';',
        ..Default::default()
    };
    let sum = CalculatedField::new("somme", "SOMME([a], [b])").unwrap();
    calculate_csv_file(&input, &output, &[sum], &read_options, &write_options).unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "a;b;somme\n1,5;2;3.5\n"
    );
}
