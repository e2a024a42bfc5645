//! Returns command - project inflation-adjusted returns per K window

use crate::cmd::display::{format_money, render};
use crate::cmd::{print_json, read_request};
use crate::core::returns::{investment_years, normalize_inflation};
use crate::core::{
    calculate_returns, format_timestamp, NormalizeOptions, ReturnReport, ReturnRequest,
    ReturnType,
};
use clap::{Args, ValueEnum};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct ReturnsCommand {
    /// JSON return request ({age, inflation, wage, q, p, k, transactions}), or "-" for stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Investment product
    #[arg(short = 't', long = "type", value_enum, default_value_t = ReturnTypeArg::Nps)]
    return_type: ReturnTypeArg,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ReturnTypeArg {
    #[default]
    Nps,
    Index,
}

impl From<ReturnTypeArg> for ReturnType {
    fn from(arg: ReturnTypeArg) -> Self {
        match arg {
            ReturnTypeArg::Nps => ReturnType::Nps,
            ReturnTypeArg::Index => ReturnType::IndexFund,
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct SavingsRow {
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Invested")]
    amount: String,
    #[tabled(rename = "Real Profit")]
    profits: String,
    #[tabled(rename = "Tax Benefit")]
    tax_benefit: String,
}

impl ReturnsCommand {
    pub fn exec(&self, options: NormalizeOptions) -> anyhow::Result<()> {
        let request: ReturnRequest = read_request(&self.input)?;
        let return_type: ReturnType = self.return_type.into();
        let report = calculate_returns(&request, return_type, options)?;
        log::info!(
            "Projected {} windows for {}",
            report.savings_by_dates.len(),
            return_type
        );

        if self.json {
            print_json(&report)
        } else {
            self.print_summary(&request, return_type, &report);
            Ok(())
        }
    }

    fn print_summary(
        &self,
        request: &ReturnRequest,
        return_type: ReturnType,
        report: &ReturnReport,
    ) {
        println!();
        println!(
            "RETURNS ({} @ {:.2}%)",
            return_type,
            return_type.rate() * dec!(100)
        );
        // calculate_returns has already rejected a request without these
        if let (Some(age), Some(inflation)) = (request.age, request.inflation) {
            println!(
                "  Horizon: {} years | Inflation: {:.2}%",
                investment_years(age),
                normalize_inflation(inflation) * dec!(100)
            );
        }
        println!(
            "  Total amount: {} | Total ceiling: {}",
            format_money(report.transactions_total_amount),
            format_money(report.transactions_total_ceiling)
        );
        println!();

        if report.savings_by_dates.is_empty() {
            println!("No K windows to project");
            return;
        }

        let rows: Vec<SavingsRow> = report
            .savings_by_dates
            .iter()
            .map(|s| SavingsRow {
                start: format_timestamp(&s.start),
                end: format_timestamp(&s.end),
                amount: format_money(s.amount),
                profits: format_money(s.profits),
                tax_benefit: s.tax_benefit.map_or("-".to_string(), format_money),
            })
            .collect();
        println!("{}", render(&rows, 2..=4));
        println!();
    }
}
