use super::decimal::DecimalSchema;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Q window: overrides the remanent with `fixed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FixedWindow {
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub start: NaiveDateTime,
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub end: NaiveDateTime,
    #[schemars(with = "DecimalSchema")]
    pub fixed: Decimal,
}

/// P window: adds `extra` to the remanent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtraWindow {
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub start: NaiveDateTime,
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub end: NaiveDateTime,
    #[schemars(with = "DecimalSchema")]
    pub extra: Decimal,
}

/// K window: reporting period, no payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportWindow {
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub start: NaiveDateTime,
    #[serde(with = "super::timestamp")]
    #[schemars(with = "String")]
    pub end: NaiveDateTime,
}

/// Inclusive on both ends
pub fn is_within(date: NaiveDateTime, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    date >= start && date <= end
}

pub trait Window {
    fn start(&self) -> NaiveDateTime;
    fn end(&self) -> NaiveDateTime;

    fn contains(&self, date: NaiveDateTime) -> bool {
        is_within(date, self.start(), self.end())
    }
}

macro_rules! impl_window {
    ($($ty:ty),*) => {
        $(impl Window for $ty {
            fn start(&self) -> NaiveDateTime {
                self.start
            }

            fn end(&self) -> NaiveDateTime {
                self.end
            }
        })*
    };
}

impl_window!(FixedWindow, ExtraWindow, ReportWindow);

/// The three rule sets applied to a request. Each set is optional on the
/// wire and treated as empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Constraints {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub q: Vec<FixedWindow>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub p: Vec<ExtraWindow>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub k: Vec<ReportWindow>,
}

pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<T>> = Deserialize::deserialize(deserializer)?;
    Ok(items.unwrap_or_default())
}
