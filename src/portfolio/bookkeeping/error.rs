use rust_decimal::Decimal;
use time::Date;

use crate::fx::RateNotFound;

/// Errors of the gain computation. None of them are retryable: each one means
/// the inputs are incomplete or inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("no USD/ILS exchange rate found in the {lookback_days} days up to {date}. \
             Extend the rate source to cover this date")]
    RateNotFound { date: Date, lookback_days: u32 },

    #[error("inconsistent gain components (nominal {nominal}, inflationary {inflation}, \
             real {real}). This is a bug")]
    InvariantViolation { nominal: Decimal, inflation: Decimal, real: Decimal },

    #[error("closing trade of {symbol} on {date} has {uncovered_shares} share(s) not covered \
             by any opening trade. Are opening trades from previous years missing?")]
    UnbalancedLedger { symbol: String, date: Date, uncovered_shares: u64 },

    #[error("invalid trade: {0}")]
    InvalidTrade(String),
}

impl From<RateNotFound> for CalcError {
    fn from(e: RateNotFound) -> Self {
        CalcError::RateNotFound { date: e.date, lookback_days: e.lookback_days }
    }
}
