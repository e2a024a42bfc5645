//! Parse command - round expenses up to the next hundred and compute remanents

use crate::cmd::display::{print_transactions, TransactionRow};
use crate::cmd::{open_input, print_json};
use crate::core::{
    normalize_expenses, read_expenses_csv, read_expenses_json, Expense, NormalizeOptions,
};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ParseCommand {
    /// JSON array or CSV file (amount,date) of expenses, or "-" for JSON on stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Output as JSON instead of a formatted table
    #[arg(long)]
    json: bool,
}

impl ParseCommand {
    pub fn exec(&self, options: NormalizeOptions) -> anyhow::Result<()> {
        let expenses = read_expenses(&self.input)?;
        let transactions = normalize_expenses(&expenses, options)?;
        log::info!("Parsed {} expenses", transactions.len());

        if self.json {
            print_json(&transactions)
        } else {
            print_transactions(transactions.iter().map(|tx| TransactionRow::new(tx, None)));
            Ok(())
        }
    }
}

fn read_expenses(path: &Path) -> anyhow::Result<Vec<Expense>> {
    let reader = open_input(path)?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_expenses_csv(reader)
    } else {
        read_expenses_json(reader)
    }
}
