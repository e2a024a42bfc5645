//! Inflation-adjusted return projection per reporting window, with the NPS
//! tax deduction benefit.

use super::decimal::{checked_sum, DecimalSchema};
use super::tax::calculate_tax;
use super::transaction::{normalize_expenses, Expense, NormalizeOptions, TransactionError};
use super::validation::{validate_with_constraints, ValidTransaction};
use super::window::{Constraints, ReportWindow, Window};
use chrono::NaiveDateTime;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const RETIREMENT_AGE: i64 = 60;
pub const MIN_INVESTMENT_YEARS: i64 = 5;
pub const NPS_DEDUCTION_CAP: Decimal = dec!(200000);
pub const NPS_DEDUCTION_SHARE_OF_WAGE: Decimal = dec!(0.10);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReturnError {
    #[error("user age must be provided for return calculations")]
    MissingAge,
    #[error("inflation rate must be provided for return calculations")]
    MissingInflation,
    #[error("arithmetic overflow compounding {0} over {1} years")]
    Overflow(Decimal, u64),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// Investment product. Rates are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ReturnType {
    #[serde(rename = "NPS")]
    Nps,
    #[serde(rename = "INDEX_FUND")]
    IndexFund,
}

impl ReturnType {
    pub fn rate(&self) -> Decimal {
        match self {
            ReturnType::Nps => dec!(0.0711),
            ReturnType::IndexFund => dec!(0.1449),
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            ReturnType::Nps => "NPS",
            ReturnType::IndexFund => "Index Fund",
        }
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Request document for a return projection
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReturnRequest {
    #[serde(default)]
    pub age: Option<i32>,
    /// Either a fraction (0.055) or a percentage (5.5)
    #[serde(default)]
    #[schemars(with = "Option<DecimalSchema>")]
    pub inflation: Option<Decimal>,
    /// Annual income; also the investment cap
    #[serde(default)]
    #[schemars(with = "Option<DecimalSchema>")]
    pub wage: Option<Decimal>,
    #[serde(flatten)]
    pub constraints: Constraints,
    #[serde(default, deserialize_with = "super::window::null_as_empty")]
    pub transactions: Vec<Expense>,
}

/// Projection for a single K window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub start: NaiveDateTime,
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub end: NaiveDateTime,
    #[schemars(with = "DecimalSchema")]
    pub amount: Decimal,
    #[schemars(with = "DecimalSchema")]
    pub profits: Decimal,
    /// NPS only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<DecimalSchema>")]
    pub tax_benefit: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReport {
    #[schemars(with = "DecimalSchema")]
    pub transactions_total_amount: Decimal,
    #[schemars(with = "DecimalSchema")]
    pub transactions_total_ceiling: Decimal,
    pub savings_by_dates: Vec<Savings>,
}

/// Inputs shared by every window of one projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub return_type: ReturnType,
    pub years: u64,
    pub inflation: Decimal,
    pub wage: Option<Decimal>,
}

impl Projection {
    /// Fails when age or inflation is missing.
    pub fn new(
        return_type: ReturnType,
        age: Option<i32>,
        inflation: Option<Decimal>,
        wage: Option<Decimal>,
    ) -> Result<Self, ReturnError> {
        let age = age.ok_or(ReturnError::MissingAge)?;
        let inflation = inflation.ok_or(ReturnError::MissingInflation)?;
        Ok(Projection {
            return_type,
            years: investment_years(age),
            inflation: normalize_inflation(inflation),
            wage,
        })
    }

    /// Project one K window over the valid transactions
    pub fn savings_for(
        &self,
        window: &ReportWindow,
        valid: &[ValidTransaction],
    ) -> Result<Savings, ReturnError> {
        let principal = checked_sum(
            valid
                .iter()
                .filter(|v| window.contains(v.transaction.date))
                .map(|v| v.transaction.remanent),
        )?;

        let real = real_value(principal, self.return_type.rate(), self.inflation, self.years)?;
        let profits = real
            .checked_sub(principal)
            .ok_or(TransactionError::SumOverflow(real, -principal))?;

        let tax_benefit = match self.return_type {
            ReturnType::Nps => Some(round_money(nps_tax_benefit(principal, self.wage)?)),
            ReturnType::IndexFund => None,
        };

        Ok(Savings {
            start: window.start,
            end: window.end,
            amount: round_money(principal),
            profits: round_money(profits),
            tax_benefit,
        })
    }
}

/// Years until retirement, never fewer than the minimum horizon
pub fn investment_years(age: i32) -> u64 {
    let years = (RETIREMENT_AGE - i64::from(age)).max(MIN_INVESTMENT_YEARS);
    years.unsigned_abs()
}

/// Values above 1 in magnitude are percentages. Exactly 1 stays as 100%.
pub fn normalize_inflation(inflation: Decimal) -> Decimal {
    if inflation.abs() > Decimal::ONE {
        log::debug!("Treating inflation {} as a percentage", inflation);
        inflation / dec!(100)
    } else {
        inflation
    }
}

/// `principal * ((1 + rate) / (1 + inflation))^years`, or zero when
/// `1 + inflation` is zero. Results beyond the range of `Decimal` are errors.
pub fn real_value(
    principal: Decimal,
    rate: Decimal,
    inflation: Decimal,
    years: u64,
) -> Result<Decimal, ReturnError> {
    let deflator = Decimal::ONE
        .checked_add(inflation)
        .ok_or(ReturnError::Overflow(inflation, years))?;
    if deflator.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let ratio = Decimal::ONE
        .checked_add(rate)
        .and_then(|growth| growth.checked_div(deflator))
        .ok_or(ReturnError::Overflow(inflation, years))?;
    let factor = ratio
        .checked_powu(years)
        .ok_or(ReturnError::Overflow(ratio, years))?;
    principal
        .checked_mul(factor)
        .ok_or(ReturnError::Overflow(ratio, years))
}

/// Tax saved by deducting the eligible NPS contribution from the wage. A
/// negative principal makes the deduction negative.
pub fn nps_tax_benefit(
    invested: Decimal,
    wage: Option<Decimal>,
) -> Result<Decimal, TransactionError> {
    let wage = match wage {
        Some(w) if w > Decimal::ZERO => w,
        _ => return Ok(Decimal::ZERO),
    };

    let eligible = invested
        .min(wage * NPS_DEDUCTION_SHARE_OF_WAGE)
        .min(NPS_DEDUCTION_CAP);
    let reduced = wage
        .checked_sub(eligible)
        .ok_or(TransactionError::SumOverflow(wage, -eligible))?;

    Ok(calculate_tax(Some(wage)) - calculate_tax(Some(reduced)))
}

/// Two decimal places, half away from zero. The scale is always 2 so that
/// `50` is emitted as `50.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Normalize, validate (wage as cap, with temporal rules) and project every
/// K window in input order.
pub fn calculate_returns(
    request: &ReturnRequest,
    return_type: ReturnType,
    options: NormalizeOptions,
) -> Result<ReturnReport, ReturnError> {
    let projection = Projection::new(return_type, request.age, request.inflation, request.wage)?;

    let transactions = normalize_expenses(&request.transactions, options)?;
    let report = validate_with_constraints(transactions, request.wage, &request.constraints)?;
    log::info!(
        "{} valid, {} invalid transactions",
        report.valid.len(),
        report.invalid.len()
    );

    let total_amount = checked_sum(report.valid.iter().map(|v| v.transaction.amount))?;
    let total_ceiling = checked_sum(report.valid.iter().map(|v| v.transaction.ceiling))?;

    let savings_by_dates = request
        .constraints
        .k
        .iter()
        .map(|window| projection.savings_for(window, &report.valid))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReturnReport {
        transactions_total_amount: round_money(total_amount),
        transactions_total_ceiling: round_money(total_ceiling),
        savings_by_dates,
    })
}
