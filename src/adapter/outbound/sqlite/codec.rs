//! Column encodings shared by the stores.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::money::{format_money, Money};
use crate::error::{Error, Result};

pub(crate) fn encode_money(value: Money) -> String {
    format_money(value)
}

pub(crate) fn decode_money(text: &str) -> Result<Money> {
    Decimal::from_str(text).map_err(|e| Error::Parse(format!("money '{text}': {e}")))
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn encode_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub(crate) fn decode_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp '{text}': {e}")))
}

pub(crate) fn encode_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| Error::Parse(format!("date '{text}': {e}")))
}

pub(crate) fn encode_set(values: &BTreeSet<String>) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

pub(crate) fn decode_set(text: &str) -> Result<BTreeSet<String>> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a stored enum value.
pub(crate) fn decode<T>(text: &str) -> Result<T>
where
    T: FromStr,
    Error: From<T::Err>,
{
    Ok(text.parse::<T>()?)
}

pub(crate) fn to_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn from_count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
