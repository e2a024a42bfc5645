use super::decimal::DecimalSchema;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Ceilings are rounded up to a multiple of this.
pub const ROUNDING_UNIT: Decimal = dec!(100);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("failed to build normalization worker pool: {0}")]
    WorkerPool(String),
    #[error("amount {0} is too large to round up to a multiple of 100")]
    CeilingOverflow(Decimal),
    #[error("arithmetic overflow adding {1} to {0}")]
    SumOverflow(Decimal, Decimal),
}

/// A raw expense as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Expense {
    #[schemars(with = "DecimalSchema")]
    pub amount: Decimal,
    /// `yyyy-MM-dd HH:mm:ss[.SSS]`
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub date: NaiveDateTime,
}

/// A transaction as supplied to the validators. Ceiling and remanent may
/// arrive pre-computed from an earlier `parse`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TransactionRecord {
    #[schemars(with = "DecimalSchema")]
    pub amount: Decimal,
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub date: NaiveDateTime,
    #[serde(default)]
    #[schemars(with = "Option<DecimalSchema>")]
    pub ceiling: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<DecimalSchema>")]
    pub remanent: Option<Decimal>,
}

/// A normalized transaction. `amount` and `date` never change after
/// construction; `remanent` is refined by the temporal overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Position of the originating record in the input sequence
    pub source_index: usize,
    #[schemars(with = "DecimalSchema")]
    pub amount: Decimal,
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub date: NaiveDateTime,
    #[schemars(with = "DecimalSchema")]
    pub ceiling: Decimal,
    #[schemars(with = "DecimalSchema")]
    pub remanent: Decimal,
}

impl Transaction {
    /// Build a transaction with its ceiling and remanent computed from `amount`.
    pub fn new(
        source_index: usize,
        amount: Decimal,
        date: NaiveDateTime,
    ) -> Result<Self, TransactionError> {
        let ceiling = ceiling_of(amount)?;
        Ok(Transaction {
            source_index,
            amount,
            date,
            ceiling,
            // always in [0, 100)
            remanent: ceiling - amount,
        })
    }

    /// Keep pre-computed values only when both are present; otherwise both are
    /// recomputed.
    pub fn from_record(
        source_index: usize,
        record: &TransactionRecord,
    ) -> Result<Self, TransactionError> {
        match (record.ceiling, record.remanent) {
            (Some(ceiling), Some(remanent)) => Ok(Transaction {
                source_index,
                amount: record.amount,
                date: record.date,
                ceiling,
                remanent,
            }),
            _ => Transaction::new(source_index, record.amount, record.date),
        }
    }

    /// Copy of this transaction carrying a different remanent
    pub fn with_remanent(&self, remanent: Decimal) -> Self {
        Transaction {
            remanent,
            ..self.clone()
        }
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        TransactionRecord {
            amount: tx.amount,
            date: tx.date,
            ceiling: Some(tx.ceiling),
            remanent: Some(tx.remanent),
        }
    }
}

/// `amount` rounded toward positive infinity to a multiple of 100. Fails when
/// the rounded value is beyond the range of `Decimal`.
pub fn ceiling_of(amount: Decimal) -> Result<Decimal, TransactionError> {
    // the remainder takes the sign of `amount`, so this truncates toward zero
    let remainder = amount % ROUNDING_UNIT;
    let truncated = amount - remainder;
    if remainder > Decimal::ZERO {
        truncated
            .checked_add(ROUNDING_UNIT)
            .ok_or(TransactionError::CeilingOverflow(amount))
    } else {
        Ok(truncated)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Size of the worker pool; `None` uses the global rayon pool
    pub workers: Option<usize>,
}

/// Normalize raw expenses in parallel. The result preserves input order.
pub fn normalize_expenses(
    expenses: &[Expense],
    options: NormalizeOptions,
) -> Result<Vec<Transaction>, TransactionError> {
    run_in_pool(options, || {
        expenses
            .par_iter()
            .enumerate()
            .map(|(i, e)| Transaction::new(i, e.amount, e.date))
            .collect::<Result<Vec<_>, _>>()
    })?
}

/// Normalize validator input, keeping fully pre-computed records as they are.
pub fn normalize_records(
    records: &[TransactionRecord],
    options: NormalizeOptions,
) -> Result<Vec<Transaction>, TransactionError> {
    run_in_pool(options, || {
        records
            .par_iter()
            .enumerate()
            .map(|(i, r)| Transaction::from_record(i, r))
            .collect::<Result<Vec<_>, _>>()
    })?
}

fn run_in_pool<T, F>(options: NormalizeOptions, op: F) -> Result<T, TransactionError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match options.workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|err| TransactionError::WorkerPool(err.to_string()))?;
            log::debug!("Normalizing on a pool of {} workers", workers);
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}

/// Read a JSON array of expenses
pub fn read_expenses_json<R: Read>(reader: R) -> anyhow::Result<Vec<Expense>> {
    let expenses: Vec<Expense> = serde_json::from_reader(reader)?;
    Ok(expenses)
}

/// Read expenses from CSV with an `amount,date` header
pub fn read_expenses_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Expense>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let expenses: Result<Vec<Expense>, _> = rdr.deserialize::<Expense>().collect();
    Ok(expenses?)
}
