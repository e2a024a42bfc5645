//! Validate command - reject duplicates, negative amounts and cap overruns

use crate::cmd::display::print_report;
use crate::cmd::{print_json, read_request};
use crate::core::{normalize_records, validate, NormalizeOptions, ValidatorRequest};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// JSON validator request ({wage, transactions}), or "-" for stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl ValidateCommand {
    pub fn exec(&self, options: NormalizeOptions) -> anyhow::Result<()> {
        let request: ValidatorRequest = read_request(&self.input)?;
        let transactions = normalize_records(&request.transactions, options)?;
        let report = validate(transactions, request.wage);
        log::info!(
            "Validated: {} valid, {} invalid",
            report.valid.len(),
            report.invalid.len()
        );

        if self.json {
            print_json(&report)
        } else {
            print_report(&report);
            Ok(())
        }
    }
}
