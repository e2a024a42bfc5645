//! Filter command - validation with the Q/P/K temporal rules applied

use crate::cmd::display::print_report;
use crate::cmd::{print_json, read_request};
use crate::core::{normalize_records, validate_with_constraints, NormalizeOptions, ValidatorRequest};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FilterCommand {
    /// JSON validator request ({wage, q, p, k, transactions}), or "-" for stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl FilterCommand {
    pub fn exec(&self, options: NormalizeOptions) -> anyhow::Result<()> {
        let request: ValidatorRequest = read_request(&self.input)?;
        let transactions = normalize_records(&request.transactions, options)?;
        log::info!(
            "Applying {} q, {} p and {} k windows",
            request.constraints.q.len(),
            request.constraints.p.len(),
            request.constraints.k.len()
        );
        let report = validate_with_constraints(transactions, request.wage, &request.constraints)?;

        if self.json {
            print_json(&report)
        } else {
            print_report(&report);
            Ok(())
        }
    }
}
