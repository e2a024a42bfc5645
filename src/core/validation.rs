//! Duplicate/negative screening and chronological investment-cap allocation.

use super::decimal::DecimalSchema;
use super::overlay::{self, Overlaid};
use super::transaction::{Transaction, TransactionError, TransactionRecord};
use super::window::{null_as_empty, Constraints};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request document for the validators. The constraint sets are only read
/// when temporal rules are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidatorRequest {
    /// Investment cap; absent means uncapped
    #[serde(default)]
    #[schemars(with = "Option<DecimalSchema>")]
    pub wage: Option<Decimal>,
    #[serde(flatten)]
    pub constraints: Constraints,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transactions: Vec<TransactionRecord>,
}

/// Why a transaction was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidReason {
    Duplicate,
    NegativeAmount,
    CapExceeded,
}

impl InvalidReason {
    pub fn message(&self) -> &'static str {
        match self {
            InvalidReason::Duplicate => "Duplicate transaction",
            InvalidReason::NegativeAmount => "Negative amounts are not allowed",
            InvalidReason::CapExceeded => "Investment exceeds maximum allowed amount",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::Duplicate => "DUPLICATE",
            InvalidReason::NegativeAmount => "NEGATIVE_AMOUNT",
            InvalidReason::CapExceeded => "CAP_EXCEEDED",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Present only when temporal constraints were evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_k_period: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InvalidTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub reason: InvalidReason,
    pub message: String,
}

impl InvalidTransaction {
    pub fn new(transaction: Transaction, reason: InvalidReason) -> Self {
        InvalidTransaction {
            transaction,
            reason,
            message: reason.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ValidationReport {
    pub valid: Vec<ValidTransaction>,
    pub invalid: Vec<InvalidTransaction>,
}

/// Output of the first pass
#[derive(Debug, Clone, Default)]
pub struct Screened {
    pub candidates: Vec<Transaction>,
    pub invalid: Vec<InvalidTransaction>,
}

/// A transaction entering the cap pass
#[derive(Debug, Clone)]
pub struct Candidate {
    pub transaction: Transaction,
    pub in_k_period: Option<bool>,
}

impl From<Overlaid> for Candidate {
    fn from(o: Overlaid) -> Self {
        Candidate {
            transaction: o.transaction,
            in_k_period: Some(o.in_k_period),
        }
    }
}

/// First pass: within each `(amount, date)` group the first transaction is the
/// original and the rest are duplicates, whatever their sign. Originals with a
/// negative amount are then rejected.
///
/// Groups are formed in input order. Duplicates are reported before negatives.
pub fn screen(transactions: Vec<Transaction>) -> Screened {
    let mut index: HashMap<(Decimal, NaiveDateTime), usize> = HashMap::new();
    let mut groups: Vec<Vec<Transaction>> = Vec::new();

    for tx in transactions {
        match index.get(&(tx.amount, tx.date)) {
            Some(&g) => groups[g].push(tx),
            None => {
                index.insert((tx.amount, tx.date), groups.len());
                groups.push(vec![tx]);
            }
        }
    }

    let mut invalid = Vec::new();
    let mut originals = Vec::with_capacity(groups.len());
    for group in groups {
        let mut members = group.into_iter();
        if let Some(original) = members.next() {
            originals.push(original);
        }
        for dup in members {
            log::debug!("Duplicate #{}: {} at {}", dup.source_index, dup.amount, dup.date);
            invalid.push(InvalidTransaction::new(dup, InvalidReason::Duplicate));
        }
    }

    let mut candidates = Vec::with_capacity(originals.len());
    for tx in originals {
        if tx.amount < Decimal::ZERO {
            log::debug!("Negative amount #{}: {}", tx.source_index, tx.amount);
            invalid.push(InvalidTransaction::new(tx, InvalidReason::NegativeAmount));
        } else {
            candidates.push(tx);
        }
    }

    Screened {
        candidates,
        invalid,
    }
}

/// Second pass: accept candidates in date order while the running total of
/// raw amounts stays within `cap`. Without a cap every candidate is accepted.
///
/// `prior_invalid` is placed ahead of the cap rejections.
pub fn allocate_cap(
    mut candidates: Vec<Candidate>,
    cap: Option<Decimal>,
    prior_invalid: Vec<InvalidTransaction>,
) -> ValidationReport {
    // stable: equal dates keep their relative order
    candidates.sort_by_key(|c| c.transaction.date);

    let mut valid = Vec::with_capacity(candidates.len());
    let mut invalid = prior_invalid;
    let mut invested = Decimal::ZERO;

    for Candidate {
        transaction,
        in_k_period,
    } in candidates
    {
        // a total beyond the range of Decimal is above any cap
        let accepted = match cap {
            Some(cap) => invested
                .checked_add(transaction.amount)
                .is_some_and(|total| total <= cap),
            None => true,
        };

        if accepted {
            // exact whenever a cap applies
            invested = invested.saturating_add(transaction.amount);
            valid.push(ValidTransaction {
                transaction,
                in_k_period,
            });
        } else {
            log::debug!(
                "Cap exceeded by #{}: invested {} + {} > {:?}",
                transaction.source_index,
                invested,
                transaction.amount,
                cap
            );
            invalid.push(InvalidTransaction::new(transaction, InvalidReason::CapExceeded));
        }
    }

    ValidationReport { valid, invalid }
}

/// Screen and cap without temporal rules; `in_k_period` stays absent.
pub fn validate(transactions: Vec<Transaction>, cap: Option<Decimal>) -> ValidationReport {
    let Screened {
        candidates,
        invalid,
    } = screen(transactions);

    let candidates = candidates
        .into_iter()
        .map(|transaction| Candidate {
            transaction,
            in_k_period: None,
        })
        .collect();

    allocate_cap(candidates, cap, invalid)
}

/// Screen, apply the temporal rules to the survivors, then cap.
pub fn validate_with_constraints(
    transactions: Vec<Transaction>,
    cap: Option<Decimal>,
    constraints: &Constraints,
) -> Result<ValidationReport, TransactionError> {
    let Screened {
        candidates,
        invalid,
    } = screen(transactions);

    let candidates = overlay::apply_all(&candidates, constraints)?
        .into_iter()
        .map(Candidate::from)
        .collect();

    Ok(allocate_cap(candidates, cap, invalid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamp::parse_timestamp;
    use crate::core::window::{ExtraWindow, ReportWindow};
    use rust_decimal_macros::dec;

    fn tx(index: usize, amount: Decimal, date: &str) -> Transaction {
        Transaction::new(index, amount, parse_timestamp(date).unwrap()).unwrap()
    }

    fn reasons(report: &ValidationReport) -> Vec<(usize, InvalidReason)> {
        report
            .invalid
            .iter()
            .map(|i| (i.transaction.source_index, i.reason))
            .collect()
    }

    fn valid_indices(report: &ValidationReport) -> Vec<usize> {
        report
            .valid
            .iter()
            .map(|v| v.transaction.source_index)
            .collect()
    }

    #[test]
    fn second_of_identical_pair_is_duplicate() {
        let report = validate(
            vec![
                tx(0, dec!(250), "2023-10-12 20:15:30"),
                tx(1, dec!(250), "2023-10-12 20:15:30"),
            ],
            Some(dec!(50000)),
        );
        assert_eq!(valid_indices(&report), vec![0]);
        assert_eq!(reasons(&report), vec![(1, InvalidReason::Duplicate)]);
    }

    #[test]
    fn duplicate_detection_compares_amounts_numerically() {
        let report = validate(
            vec![
                tx(0, dec!(250), "2023-10-12 20:15:30"),
                tx(1, dec!(250.00), "2023-10-12 20:15:30"),
            ],
            None,
        );
        assert_eq!(reasons(&report), vec![(1, InvalidReason::Duplicate)]);
    }

    #[test]
    fn negative_duplicates_are_reported_as_duplicates() {
        let report = validate(
            vec![
                tx(0, dec!(-10), "2023-10-12 20:15:30"),
                tx(1, dec!(-10), "2023-10-12 20:15:30"),
                tx(2, dec!(300), "2023-10-13 20:15:30"),
            ],
            Some(dec!(50000)),
        );
        assert_eq!(valid_indices(&report), vec![2]);
        assert_eq!(
            reasons(&report),
            vec![(1, InvalidReason::Duplicate), (0, InvalidReason::NegativeAmount)]
        );
    }

    #[test]
    fn same_amount_different_date_is_not_duplicate() {
        let report = validate(
            vec![
                tx(0, dec!(250), "2023-10-12 20:15:30"),
                tx(1, dec!(250), "2023-10-12 20:15:31"),
            ],
            None,
        );
        assert_eq!(valid_indices(&report), vec![0, 1]);
        assert!(report.invalid.is_empty());
    }

    #[test]
    fn zero_amount_is_not_negative() {
        let report = validate(vec![tx(0, dec!(0), "2023-10-12 20:15:30")], None);
        assert_eq!(valid_indices(&report), vec![0]);
    }

    #[test]
    fn cap_allocates_chronologically_by_amount() {
        // input order is not date order
        let report = validate(
            vec![
                tx(0, dec!(600), "2023-03-01 00:00:00"),
                tx(1, dec!(500), "2023-01-01 00:00:00"),
                tx(2, dec!(400), "2023-02-01 00:00:00"),
                tx(3, dec!(100), "2023-04-01 00:00:00"),
            ],
            Some(dec!(1000)),
        );
        assert_eq!(valid_indices(&report), vec![1, 2, 3]);
        assert_eq!(reasons(&report), vec![(0, InvalidReason::CapExceeded)]);
    }

    #[test]
    fn cap_is_inclusive() {
        let report = validate(
            vec![
                tx(0, dec!(500), "2023-01-01 00:00:00"),
                tx(1, dec!(500), "2023-01-02 00:00:00"),
            ],
            Some(dec!(1000)),
        );
        assert_eq!(valid_indices(&report), vec![0, 1]);
    }

    #[test]
    fn missing_cap_accepts_everything() {
        let report = validate(
            vec![
                tx(0, dec!(1_000_000), "2023-01-01 00:00:00"),
                tx(1, dec!(9_000_000), "2023-01-02 00:00:00"),
            ],
            None,
        );
        assert_eq!(report.valid.len(), 2);
        assert!(report.valid.iter().all(|v| v.in_k_period.is_none()));
    }

    #[test]
    fn total_beyond_decimal_range_exceeds_the_cap() {
        let huge = Decimal::MAX - dec!(1000);
        let report = validate(
            vec![
                tx(0, huge, "2023-01-01 00:00:00"),
                tx(1, huge, "2023-01-02 00:00:00"),
                tx(2, dec!(1000), "2023-01-03 00:00:00"),
            ],
            Some(Decimal::MAX),
        );
        assert_eq!(valid_indices(&report), vec![0, 2]);
        assert_eq!(reasons(&report), vec![(1, InvalidReason::CapExceeded)]);
    }

    #[test]
    fn uncapped_total_beyond_decimal_range_is_accepted() {
        let huge = Decimal::MAX - dec!(1000);
        let report = validate(
            vec![
                tx(0, huge, "2023-01-01 00:00:00"),
                tx(1, huge, "2023-01-02 00:00:00"),
            ],
            None,
        );
        assert_eq!(valid_indices(&report), vec![0, 1]);
    }

    #[test]
    fn overflowing_overlay_is_an_error() {
        let d = "2023-10-12 20:15:30";
        let constraints = Constraints {
            p: vec![
                ExtraWindow {
                    start: parse_timestamp(d).unwrap(),
                    end: parse_timestamp(d).unwrap(),
                    extra: Decimal::MAX,
                },
                ExtraWindow {
                    start: parse_timestamp(d).unwrap(),
                    end: parse_timestamp(d).unwrap(),
                    extra: dec!(1),
                },
            ],
            ..Default::default()
        };
        let result = validate_with_constraints(vec![tx(0, dec!(250), d)], None, &constraints);
        assert_eq!(result, Err(TransactionError::SumOverflow(Decimal::MAX, dec!(1))));
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let report = validate(
            vec![
                tx(0, dec!(700), "2023-01-01 00:00:00"),
                tx(1, dec!(400), "2023-01-01 00:00:00"),
            ],
            Some(dec!(1000)),
        );
        assert_eq!(valid_indices(&report), vec![0]);
        assert_eq!(reasons(&report), vec![(1, InvalidReason::CapExceeded)]);
    }

    #[test]
    fn raising_the_cap_only_extends_the_accepted_chronological_prefix() {
        let txs = vec![
            tx(0, dec!(300), "2023-01-05 00:00:00"),
            tx(1, dec!(900), "2023-01-02 00:00:00"),
            tx(2, dec!(150), "2023-01-03 00:00:00"),
            tx(3, dec!(50), "2023-01-04 00:00:00"),
        ];
        // candidates accepted before the first cap rejection, in date order
        let prefix = |cap: Decimal| -> Vec<usize> {
            let report = validate(txs.clone(), Some(cap));
            let first_rejected = report
                .invalid
                .iter()
                .map(|i| i.transaction.date)
                .min();
            report
                .valid
                .iter()
                .filter(|v| first_rejected.is_none_or(|d| v.transaction.date < d))
                .map(|v| v.transaction.source_index)
                .collect()
        };

        let mut previous: Vec<usize> = Vec::new();
        for cap in [dec!(0), dec!(100), dec!(500), dec!(1000), dec!(1200), dec!(1400)] {
            let accepted = prefix(cap);
            assert!(previous.iter().all(|i| accepted.contains(i)), "cap {cap}");
            previous = accepted;
        }
        assert_eq!(previous, vec![1, 2, 3, 0]);
    }

    #[test]
    fn revalidating_a_valid_set_is_stable() {
        let txs = vec![
            tx(0, dec!(300), "2023-01-05 00:00:00"),
            tx(1, dec!(900), "2023-01-02 00:00:00"),
        ];
        let first = validate(txs, Some(dec!(1000)));
        let again = validate(
            first.valid.iter().map(|v| v.transaction.clone()).collect(),
            Some(dec!(1000)),
        );
        assert_eq!(first.valid, again.valid);
        assert!(again.invalid.is_empty());
    }

    #[test]
    fn constraints_adjust_remanent_and_tag_k() {
        let d = "2023-10-12 20:15:30";
        let constraints = Constraints {
            p: vec![ExtraWindow {
                start: parse_timestamp("2023-10-01").unwrap(),
                end: parse_timestamp("2023-10-31").unwrap(),
                extra: dec!(30),
            }],
            k: vec![ReportWindow {
                start: parse_timestamp("2023-10-12").unwrap(),
                end: parse_timestamp("2023-10-13").unwrap(),
            }],
            ..Default::default()
        };
        let report = validate_with_constraints(
            vec![tx(0, dec!(250), d), tx(1, dec!(-5), d)],
            Some(dec!(1000)),
            &constraints,
        )
        .unwrap();

        assert_eq!(report.valid.len(), 1);
        assert_eq!(report.valid[0].transaction.remanent, dec!(80));
        assert_eq!(report.valid[0].in_k_period, Some(true));
        // rejected transactions are never overlaid
        assert_eq!(report.invalid[0].transaction.remanent, dec!(5));
    }

    #[test]
    fn validator_request_accepts_precomputed_records() {
        let json = r#"{
            "wage": 50000,
            "transactions": [
                {"amount": 250, "date": "2023-10-12 20:15:30", "ceiling": 300, "remanent": 50},
                {"amount": 375, "date": "2023-02-28 15:49:20"}
            ]
        }"#;
        let request: ValidatorRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.wage, Some(dec!(50000)));
        assert_eq!(request.transactions[0].remanent, Some(dec!(50)));
        assert_eq!(request.transactions[1].ceiling, None);
        assert_eq!(request.constraints, Constraints::default());
    }

    #[test]
    fn serialized_valid_transaction_omits_absent_k_flag() {
        let v = ValidTransaction {
            transaction: tx(0, dec!(250), "2023-10-12 20:15:30"),
            in_k_period: None,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert!(json.get("inKPeriod").is_none());
        assert_eq!(json["date"], "2023-10-12 20:15:30");

        let tagged = ValidTransaction {
            in_k_period: Some(false),
            ..v
        };
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["inKPeriod"], false);
    }

    #[test]
    fn serialized_invalid_transaction_carries_reason_and_message() {
        let i = InvalidTransaction::new(
            tx(0, dec!(-10), "2023-10-12 20:15:30"),
            InvalidReason::NegativeAmount,
        );
        let json = serde_json::to_value(&i).unwrap();
        assert_eq!(json["reason"], "NEGATIVE_AMOUNT");
        assert_eq!(json["message"], "Negative amounts are not allowed");
    }
}
