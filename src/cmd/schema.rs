//! Schema command - print expected input formats

use crate::core::{Expense, ReturnRequest, ValidatorRequest};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which input document to describe
    #[arg(value_enum, default_value = "returns")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the `parse` input (array of expenses)
    Expenses,
    /// JSON Schema for the `validate` and `filter` input
    Validator,
    /// JSON Schema for the `returns` input
    Returns,
    /// CSV header row accepted by `parse`
    CsvHeader,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.format {
            SchemaFormat::Expenses => schema_for!(Vec<Expense>),
            SchemaFormat::Validator => schema_for!(ValidatorRequest),
            SchemaFormat::Returns => schema_for!(ReturnRequest),
            SchemaFormat::CsvHeader => {
                println!("{}", CSV_COLUMNS.join(","));
                return Ok(());
            }
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}

const CSV_COLUMNS: &[&str] = &["amount", "date"];
