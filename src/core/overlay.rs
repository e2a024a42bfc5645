//! Temporal rules applied to each surviving transaction before cap allocation.
//!
//! Precedence is fixed: a Q override replaces the remanent, every matching P
//! window then adds its extra on top, and finally K membership is tagged.

use super::decimal::checked_sum;
use super::transaction::{Transaction, TransactionError};
use super::window::{Constraints, ExtraWindow, FixedWindow, ReportWindow, Window};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// A transaction after the temporal rules, tagged with K membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlaid {
    pub transaction: Transaction,
    pub in_k_period: bool,
}

/// The Q window governing `date`: latest start wins, first in input order on ties.
pub fn governing_override(date: NaiveDateTime, q: &[FixedWindow]) -> Option<&FixedWindow> {
    q.iter()
        .filter(|w| w.contains(date))
        .fold(None, |chosen: Option<&FixedWindow>, w| match chosen {
            Some(c) if c.start >= w.start => Some(c),
            _ => Some(w),
        })
}

/// Sum of `extra` over every P window containing `date`
pub fn total_extra(date: NaiveDateTime, p: &[ExtraWindow]) -> Result<Decimal, TransactionError> {
    checked_sum(p.iter().filter(|w| w.contains(date)).map(|w| w.extra))
}

pub fn in_any_period(date: NaiveDateTime, k: &[ReportWindow]) -> bool {
    k.iter().any(|w| w.contains(date))
}

/// Apply Q then P to the remanent and tag K membership
pub fn apply(tx: &Transaction, constraints: &Constraints) -> Result<Overlaid, TransactionError> {
    let mut remanent = tx.remanent;

    if let Some(q) = governing_override(tx.date, &constraints.q) {
        log::debug!(
            "Q override on #{} ({}): remanent {} -> {}",
            tx.source_index,
            tx.date,
            remanent,
            q.fixed
        );
        remanent = q.fixed;
    }

    let extra = total_extra(tx.date, &constraints.p)?;
    if !extra.is_zero() {
        log::debug!("P extra on #{} ({}): +{}", tx.source_index, tx.date, extra);
    }
    let remanent = remanent
        .checked_add(extra)
        .ok_or(TransactionError::SumOverflow(remanent, extra))?;

    Ok(Overlaid {
        transaction: tx.with_remanent(remanent),
        in_k_period: in_any_period(tx.date, &constraints.k),
    })
}

pub fn apply_all(
    txs: &[Transaction],
    constraints: &Constraints,
) -> Result<Vec<Overlaid>, TransactionError> {
    txs.iter().map(|tx| apply(tx, constraints)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamp::parse_timestamp;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn dt(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn q(start: NaiveDateTime, end: NaiveDateTime, fixed: Decimal) -> FixedWindow {
        FixedWindow { start, end, fixed }
    }

    fn p(start: NaiveDateTime, end: NaiveDateTime, extra: Decimal) -> ExtraWindow {
        ExtraWindow { start, end, extra }
    }

    fn tx_at(date: NaiveDateTime, amount: Decimal) -> Transaction {
        Transaction::new(0, amount, date).unwrap()
    }

    #[test]
    fn later_starting_q_window_wins() {
        let d = dt("2023-07-15 10:30:00");
        let constraints = Constraints {
            q: vec![
                q(d - Duration::days(10), d + Duration::days(10), dec!(100)),
                q(d - Duration::days(5), d + Duration::days(5), dec!(0)),
            ],
            ..Default::default()
        };

        let out = apply(&tx_at(d, dec!(250)), &constraints).unwrap();
        assert_eq!(out.transaction.remanent, dec!(0));
    }

    #[test]
    fn equal_start_q_windows_resolve_to_first() {
        let d = dt("2023-07-15 10:30:00");
        let windows = vec![
            q(d - Duration::days(5), d + Duration::days(1), dec!(11)),
            q(d - Duration::days(5), d + Duration::days(9), dec!(22)),
        ];
        assert_eq!(governing_override(d, &windows).map(|w| w.fixed), Some(dec!(11)));
    }

    #[test]
    fn p_windows_accumulate() {
        let d = dt("2023-10-12 20:15:30");
        let constraints = Constraints {
            p: vec![
                p(d - Duration::days(1), d + Duration::days(1), dec!(25)),
                p(d - Duration::days(30), d, dec!(10)),
            ],
            ..Default::default()
        };

        // amount 250 -> remanent 50
        let out = apply(&tx_at(d, dec!(250)), &constraints).unwrap();
        assert_eq!(out.transaction.remanent, dec!(85.0));
    }

    #[test]
    fn p_is_added_on_top_of_q() {
        let d = dt("2023-10-12 20:15:30");
        let constraints = Constraints {
            q: vec![q(d, d, dec!(-40))],
            p: vec![p(d, d, dec!(15))],
            ..Default::default()
        };

        let out = apply(&tx_at(d, dec!(250)), &constraints).unwrap();
        assert_eq!(out.transaction.remanent, dec!(-25));
        // amount and ceiling are untouched
        assert_eq!(out.transaction.amount, dec!(250));
        assert_eq!(out.transaction.ceiling, dec!(300));
    }

    #[test]
    fn windows_outside_the_date_are_ignored() {
        let d = dt("2023-10-12 20:15:30");
        let constraints = Constraints {
            q: vec![q(d + Duration::seconds(1), d + Duration::days(1), dec!(0))],
            p: vec![p(d - Duration::days(2), d - Duration::seconds(1), dec!(25))],
            k: vec![ReportWindow {
                start: d + Duration::days(1),
                end: d + Duration::days(2),
            }],
        };

        let out = apply(&tx_at(d, dec!(250)), &constraints).unwrap();
        assert_eq!(out.transaction.remanent, dec!(50));
        assert!(!out.in_k_period);
    }

    #[test]
    fn k_tagging_does_not_filter() {
        let d = dt("2023-10-12 20:15:30");
        let constraints = Constraints {
            k: vec![ReportWindow { start: d, end: d }],
            ..Default::default()
        };
        let out = apply_all(
            &[tx_at(d, dec!(250)), tx_at(d + Duration::days(1), dec!(120))],
            &constraints,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].in_k_period);
        assert!(!out[1].in_k_period);
    }

    #[test]
    fn overflowing_p_extras_are_an_error() {
        let d = dt("2023-10-12 20:15:30");
        let windows = vec![p(d, d, Decimal::MAX), p(d, d, dec!(1))];
        assert_eq!(
            total_extra(d, &windows),
            Err(TransactionError::SumOverflow(Decimal::MAX, dec!(1)))
        );
    }

    #[test]
    fn overflowing_remanent_is_an_error() {
        let d = dt("2023-10-12 20:15:30");
        let constraints = Constraints {
            q: vec![q(d, d, Decimal::MAX)],
            p: vec![p(d, d, dec!(25))],
            ..Default::default()
        };
        assert_eq!(
            apply(&tx_at(d, dec!(250)), &constraints),
            Err(TransactionError::SumOverflow(Decimal::MAX, dec!(25)))
        );
    }
}
