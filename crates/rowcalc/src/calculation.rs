//! Calculated fields
//!
//! A [`CalculatedField`] is a named formula. Applying it to a batch of rows
//! evaluates the formula once per row and stores the result under the
//! field's name. Rows that evaluate to an error keep the error text and are
//! counted; the batch always runs to the end.
//!
//! # Example
//!
//! ```rust
//! use rowcalc::prelude::*;
//!
//! let mut rows = vec![
//!     Row::new().with("Prix", "10 €").with("Qte", 12),
//!     Row::new().with("Prix", "2,5").with("Qte", 4),
//! ];
//!
//! let total = CalculatedField::new("Total", "[Prix] * [Qte]").unwrap();
//! let stats = rows.calculate_field(&total);
//!
//! assert_eq!(stats.rows_calculated, 2);
//! assert_eq!(rows[0].value("Total"), &FieldValue::Number(120.0));
//! assert_eq!(rows[1].value("Total"), &FieldValue::Number(10.0));
//! ```

use crate::{CompiledFormula, EvaluationOptions, FieldValue, FormulaResult, FormulaValue, OutputType, Row};
use log::{debug, warn};

/// A named formula evaluated for every row
#[derive(Debug, Clone)]
pub struct CalculatedField {
    /// Field the result is stored under
    pub name: String,
    formula: CompiledFormula,
    /// Evaluation settings (output type, rounding, depth limit)
    pub options: EvaluationOptions,
}

impl CalculatedField {
    /// Parse `formula` for a field called `name`
    pub fn new(name: impl Into<String>, formula: &str) -> FormulaResult<Self> {
        Ok(Self {
            name: name.into(),
            formula: CompiledFormula::compile(formula)?,
            options: EvaluationOptions::default(),
        })
    }

    /// Coerce results to the given type
    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.options.output_type = Some(output_type);
        self
    }

    /// Replace the evaluation settings
    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    /// The parsed formula
    pub fn formula(&self) -> &CompiledFormula {
        &self.formula
    }

    /// Evaluate the field for one row without storing the result
    pub fn evaluate(&self, row: &Row) -> FormulaValue {
        self.formula.evaluate_with(row, &self.options)
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Number of rows calculated
    pub rows_calculated: usize,
    /// Number of rows whose result is an error value
    pub errors: usize,
}

/// Extension trait for row collections to add calculated fields
pub trait RowsCalculationExt {
    /// Evaluate `field` for every row and store the result in the row
    fn calculate_field(&mut self, field: &CalculatedField) -> CalculationStats;

    /// Evaluate several fields in order; later fields can read earlier ones
    fn calculate_fields(&mut self, fields: &[CalculatedField]) -> CalculationStats {
        let mut total = CalculationStats::default();
        for field in fields {
            let stats = self.calculate_field(field);
            total.rows_calculated += stats.rows_calculated;
            total.errors += stats.errors;
        }
        total
    }
}

impl RowsCalculationExt for [Row] {
    fn calculate_field(&mut self, field: &CalculatedField) -> CalculationStats {
        let mut stats = CalculationStats::default();

        for (index, row) in self.iter_mut().enumerate() {
            let value = field.evaluate(row);
            if let Some(error) = value.get_error() {
                warn!(
                    "row {}: calculated field '{}' evaluated to {}",
                    index, field.name, error
                );
                stats.errors += 1;
            }
            row.insert(field.name.as_str(), FieldValue::from(value));
            stats.rows_calculated += 1;
        }

        debug!(
            "calculated field '{}' over {} rows ({} errors)",
            field.name, stats.rows_calculated, stats.errors
        );
        stats
    }
}

impl RowsCalculationExt for Vec<Row> {
    fn calculate_field(&mut self, field: &CalculatedField) -> CalculationStats {
        self.as_mut_slice().calculate_field(field)
    }
}

#[cfg(feature = "csv")]
mod csv_support {
    use super::*;
    use crate::{CsvReadOptions, CsvReader, CsvTable, CsvWriteOptions, CsvWriter};
    use std::path::Path;

    impl RowsCalculationExt for CsvTable {
        /// Evaluate `field` for every row and append it as a column
        fn calculate_field(&mut self, field: &CalculatedField) -> CalculationStats {
            self.add_column(&field.name);
            self.rows.calculate_field(field)
        }
    }

    /// Read a CSV file, add calculated columns and write the result
    pub fn calculate_csv_file<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        fields: &[CalculatedField],
        read_options: &CsvReadOptions,
        write_options: &CsvWriteOptions,
    ) -> crate::Result<CalculationStats> {
        let mut table = CsvReader::read_file(input, read_options)?;
        let stats = table.calculate_fields(fields);
        CsvWriter::write_file(&table, output, write_options)?;
        Ok(stats)
    }
}

#[cfg(feature = "csv")]
pub use csv_support::calculate_csv_file;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_calculate_field_counts_errors() {
        let mut rows = vec![
            Row::new().with("d", "15/01/2025"),
            Row::new().with("d", "pas une date"),
            Row::new(),
        ];
        let field = CalculatedField::new("annee", "ANNEE([d])").unwrap();
        let stats = rows.calculate_field(&field);

        assert_eq!(
            stats,
            CalculationStats {
                rows_calculated: 3,
                errors: 2
            }
        );
        assert_eq!(rows[0].value("annee"), &FieldValue::Number(2025.0));
        assert_eq!(
            rows[1].value("annee"),
            &FieldValue::String(ErrorValue::Value.to_string())
        );
    }

    #[test]
    fn test_later_fields_read_earlier_ones() {
        let mut rows = vec![Row::new().with("Prix", 10).with("Qte", 3)];
        let fields = [
            CalculatedField::new("HT", "[Prix] * [Qte]").unwrap(),
            CalculatedField::new("TTC", "ARRONDI([HT] * 1.2, 2)").unwrap(),
        ];
        let stats = rows.calculate_fields(&fields);

        assert_eq!(stats.rows_calculated, 2);
        assert_eq!(rows[0].value("TTC"), &FieldValue::Number(36.0));
    }

    #[test]
    fn test_output_type_applies_to_every_row() {
        let mut rows = vec![Row::new().with("n", 5), Row::new()];
        let field = CalculatedField::new("label", "[n]")
            .unwrap()
            .with_output_type(OutputType::Text);
        rows.calculate_field(&field);

        assert_eq!(rows[0].value("label"), &FieldValue::from("5"));
        assert_eq!(rows[1].value("label"), &FieldValue::from(""));
    }

    #[test]
    fn test_parse_error_is_reported_up_front() {
        assert!(CalculatedField::new("x", "SOMME([a]").is_err());
    }
}
