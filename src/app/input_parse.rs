use std::str::FromStr;

use rust_decimal::Decimal;
use time::Date;

use crate::util::{date::parse_standard_date, decimal::GreaterEqualZeroDecimal};

pub type Error = String;

/// Parses a list of YYYY-MM-DD dates, such as the values of --split-date.
pub fn parse_split_dates(date_strs: &[String]) -> Result<Vec<Date>, Error> {
    date_strs
        .iter()
        .map(|s| {
            parse_standard_date(s)
                .map_err(|e| format!("Invalid split date '{s}' (expected YYYY-MM-DD): {e}"))
        })
        .collect()
}

/// Parses an amount which may not be negative, such as a carried-over loss.
/// Thousands separators are accepted.
pub fn parse_non_negative_amount(amount_str: &str) -> Result<GreaterEqualZeroDecimal, Error> {
    let cleaned = amount_str.trim().replace(',', "");
    let amount = Decimal::from_str(&cleaned)
        .map_err(|e| format!("Invalid amount '{amount_str}': {e}"))?;
    GreaterEqualZeroDecimal::try_from(amount)
        .map_err(|_| format!("Amount {amount} must not be negative"))
}
