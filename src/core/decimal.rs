//! Overflow-checked helpers for money values.

use super::transaction::TransactionError;
use rust_decimal::Decimal;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Metadata, Schema, SchemaObject};
use schemars::JsonSchema;

/// Sum of `values`, or an error instead of a panic when the total leaves the
/// representable range.
pub fn checked_sum<I>(values: I) -> Result<Decimal, TransactionError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |total, value| {
        total
            .checked_add(value)
            .ok_or(TransactionError::SumOverflow(total, value))
    })
}

/// Schema stand-in for `Decimal` fields.
///
/// JSON numbers pass through `f64` on the way in, so only about 15 significant
/// digits survive. Strings are parsed exactly.
pub struct DecimalSchema;

impl JsonSchema for DecimalSchema {
    fn schema_name() -> String {
        "Decimal".to_string()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(vec![InstanceType::Number, InstanceType::String].into()),
            metadata: Some(Box::new(Metadata {
                description: Some(
                    "Decimal amount. Numbers keep about 15 significant digits; \
                     pass a string such as \"1234.56\" for exact values."
                        .to_string(),
                ),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}
