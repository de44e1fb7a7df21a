use std::collections::BTreeMap;
use std::fmt::Display;

use rust_decimal::Decimal;
use time::{Date, Duration};
use tracing::trace;

use crate::util::decimal::is_positive;

/// Bank of Israel rates are not published on weekends and holidays.
/// Looking back this many days (the requested date included) covers the
/// usual closures; anything longer means the rate source is incomplete.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 5;

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DailyRate {
    pub date: Date,
    pub foreign_to_local_rate: Decimal,
}

impl DailyRate {
    pub fn new(date: Date, foreign_to_local_rate: Decimal) -> DailyRate {
        DailyRate { date, foreign_to_local_rate }
    }
}

// Auto-implements to_string()
impl Display for DailyRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.date, self.foreign_to_local_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no USD/ILS exchange rate found in the {lookback_days} days up to {date}")]
pub struct RateNotFound {
    pub date: Date,
    pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateTableError {
    #[error("exchange rate for {date} must be positive (was {rate})")]
    NonPositiveRate { date: Date, rate: Decimal },
    #[error("conflicting exchange rates for {date}: {first} and {second}")]
    ConflictingRates { date: Date, first: Decimal, second: Decimal },
}

/// Daily USD -> ILS conversion rates, keyed by date.
///
/// Immutable once built. Lookups for a date with no published rate resolve to
/// the closest preceding date that has one, within `lookback_days`.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: BTreeMap<Date, Decimal>,
    lookback_days: u32,
}

impl RateTable {
    pub fn new(rates: Vec<DailyRate>, lookback_days: u32) -> Result<RateTable, RateTableError> {
        let mut map = BTreeMap::new();
        for rate in rates {
            if !is_positive(&rate.foreign_to_local_rate) {
                return Err(RateTableError::NonPositiveRate {
                    date: rate.date,
                    rate: rate.foreign_to_local_rate,
                });
            }
            if let Some(existing) = map.get(&rate.date) {
                if *existing != rate.foreign_to_local_rate {
                    return Err(RateTableError::ConflictingRates {
                        date: rate.date,
                        first: *existing,
                        second: rate.foreign_to_local_rate,
                    });
                }
                continue;
            }
            map.insert(rate.date, rate.foreign_to_local_rate);
        }
        Ok(RateTable { rates: map, lookback_days })
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn first_date(&self) -> Option<Date> {
        self.rates.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<Date> {
        self.rates.keys().next_back().copied()
    }

    /// Resolves the rate in effect on `date`.
    ///
    /// The returned DailyRate carries the date the rate was actually published
    /// for, which is `date` itself or up to `lookback_days - 1` days before it.
    pub fn rate_for(&self, date: Date) -> Result<DailyRate, RateNotFound> {
        let not_found = || RateNotFound { date, lookback_days: self.lookback_days };
        for days_back in 0..self.lookback_days {
            let candidate = date
                .checked_sub(Duration::days(days_back as i64))
                .ok_or_else(not_found)?;
            if let Some(rate) = self.rates.get(&candidate) {
                if days_back > 0 {
                    trace!(requested = %date, resolved = %candidate,
                           "RateTable::rate_for using preceding rate");
                }
                return Ok(DailyRate::new(candidate, *rate));
            }
        }
        Err(not_found())
    }
}
