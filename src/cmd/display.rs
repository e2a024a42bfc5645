//! Table rendering shared by the transaction commands

use crate::core::{format_timestamp, InvalidTransaction, Transaction, ValidationReport};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Debug, Clone, Tabled)]
pub struct TransactionRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Ceiling")]
    pub ceiling: String,
    #[tabled(rename = "Remanent")]
    pub remanent: String,
    #[tabled(rename = "In K")]
    pub in_k_period: String,
}

impl TransactionRow {
    pub fn new(tx: &Transaction, in_k_period: Option<bool>) -> Self {
        TransactionRow {
            index: tx.source_index,
            date: format_timestamp(&tx.date),
            amount: format_money(tx.amount),
            ceiling: format_money(tx.ceiling),
            remanent: format_money(tx.remanent),
            in_k_period: match in_k_period {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => "-".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct InvalidRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

impl From<&InvalidTransaction> for InvalidRow {
    fn from(invalid: &InvalidTransaction) -> Self {
        InvalidRow {
            index: invalid.transaction.source_index,
            date: format_timestamp(&invalid.transaction.date),
            amount: format_money(invalid.transaction.amount),
            reason: invalid.reason.to_string(),
            message: invalid.message.clone(),
        }
    }
}

pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Right-align the numeric columns in `numeric`
pub fn render<T: Tabled>(rows: &[T], numeric: std::ops::RangeInclusive<usize>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(numeric)).with(Alignment::right()))
        .to_string()
}

pub fn print_transactions<I>(rows: I)
where
    I: IntoIterator<Item = TransactionRow>,
{
    let rows: Vec<TransactionRow> = rows.into_iter().collect();
    if rows.is_empty() {
        println!("No transactions");
        return;
    }
    println!("{}", render(&rows, 2..=4));
}

pub fn print_report(report: &ValidationReport) {
    println!();
    println!("VALID ({})", report.valid.len());
    print_transactions(
        report
            .valid
            .iter()
            .map(|v| TransactionRow::new(&v.transaction, v.in_k_period)),
    );

    println!();
    println!("INVALID ({})", report.invalid.len());
    if report.invalid.is_empty() {
        println!("\u{2713} No issues found.");
    } else {
        let rows: Vec<InvalidRow> = report.invalid.iter().map(InvalidRow::from).collect();
        println!("{}", render(&rows, 2..=2));
    }
    println!();
}
