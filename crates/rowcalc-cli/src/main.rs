//! rowcalc CLI - evaluate calculated fields against rows and CSV files

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rowcalc::prelude::*;
use rowcalc::{calculate_csv_file, parse_formula, CsvReadOptions, CsvWriteOptions, Function};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rowcalc")]
#[command(author, version, about = "Spreadsheet-style calculated fields for tabular data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against a JSON row or every row of a CSV file
    #[command(alias = "calc")]
    Eval {
        /// Formula text, e.g. 'DATEDIF([debut], [fin], "m")'
        formula: String,

        /// Row as a JSON object (default: empty row)
        #[arg(short, long, conflicts_with = "input")]
        row: Option<String>,

        /// Input CSV file; the result is added as a new column
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long, requires = "input")]
        output: Option<PathBuf>,

        /// Name of the calculated column
        #[arg(short, long, default_value = "result")]
        name: String,

        /// Coerce the result: number, text, boolean or date
        #[arg(short = 't', long)]
        output_type: Option<String>,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// Parse a formula and show its canonical form
    Check {
        /// Formula text
        formula: String,
    },

    /// List the available functions
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            formula,
            row,
            input,
            output,
            name,
            output_type,
            delimiter,
        } => {
            let mut field = CalculatedField::new(name, &formula)
                .with_context(|| format!("Invalid formula '{}'", formula))?;
            if let Some(output_type) = output_type {
                field = field.with_output_type(parse_output_type(&output_type)?);
            }

            match input {
                Some(input) => eval_csv(&input, output.as_deref(), &field, delimiter),
                None => eval_row(row.as_deref(), &field),
            }
        }
        Commands::Check { formula } => check_formula(&formula),
        Commands::Functions => list_functions(),
    }
}

fn parse_output_type(name: &str) -> Result<OutputType> {
    match OutputType::from_name(name) {
        Some(output_type) => Ok(output_type),
        None => bail!(
            "Unknown output type '{}' (expected number, text, boolean or date)",
            name
        ),
    }
}

fn eval_row(row: Option<&str>, field: &CalculatedField) -> Result<()> {
    let row: Row = match row {
        Some(json) => serde_json::from_str(json).context("Row must be a JSON object")?,
        None => Row::new(),
    };

    println!("{}", field.evaluate(&row));
    Ok(())
}

fn eval_csv(
    input: &Path,
    output: Option<&Path>,
    field: &CalculatedField,
    delimiter: char,
) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let read_options = CsvReadOptions {
        delimiter: delimiter as u8,
        ..Default::default()
    };
    let write_options = CsvWriteOptions {
        delimiter: delimiter as u8,
        ..Default::default()
    };

    let stats = match output {
        Some(output) => calculate_csv_file(
            input,
            output,
            std::slice::from_ref(field),
            &read_options,
            &write_options,
        )
        .with_context(|| format!("Failed to process '{}'", input.display()))?,
        None => {
            let mut table = CsvReader::read_file(input, &read_options)
                .with_context(|| format!("Failed to read '{}'", input.display()))?;
            let stats = table.calculate_field(field);
            CsvWriter::write(&table, io::stdout().lock(), &write_options)
                .context("Failed to write to stdout")?;
            stats
        }
    };

    eprintln!(
        "Calculated '{}' for {} rows ({} errors)",
        field.name, stats.rows_calculated, stats.errors
    );
    if let Some(output) = output {
        eprintln!("Wrote '{}'", output.display());
    }
    Ok(())
}

fn check_formula(formula: &str) -> Result<()> {
    let expr = parse_formula(formula).with_context(|| format!("Invalid formula '{}'", formula))?;

    println!("Formula: {}", expr);
    let fields = expr.field_refs();
    if fields.is_empty() {
        println!("Fields: none");
    } else {
        println!("Fields: {}", fields.join(", "));
    }
    Ok(())
}

fn list_functions() -> Result<()> {
    for function in Function::ALL {
        let def = function.def();
        let arity = match def.max_args {
            Some(max) if max == def.min_args => format!("{}", max),
            Some(max) => format!("{}-{}", def.min_args, max),
            None => format!("{}+", def.min_args),
        };
        println!("{}\t{}\t{}", def.name, arity, def.aliases.join(", "));
    }
    Ok(())
}
