use std::{collections::HashSet, fmt::Display, rc::Rc};

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::portfolio::Trade;

use super::CalcError;

/// What to do with a closing trade whose shares cannot all be covered by
/// opening trades of the same symbol.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedClosePolicy {
    #[default]
    Fail,
    Warn,
}

impl Display for UnmatchedClosePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnmatchedClosePolicy::Fail => write!(f, "fail"),
            UnmatchedClosePolicy::Warn => write!(f, "warn"),
        }
    }
}

/// A closing trade paired with (part of) an opening lot.
///
/// A trade split across several records has its commission allocated by
/// exactly one of them: the first one in match order.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MatchRecord {
    pub closing: Rc<Trade>,
    pub opening: Rc<Trade>,
    pub shares_covered: u64,
    pub allocates_closing_commission: bool,
    pub allocates_opening_commission: bool,
}

impl MatchRecord {
    pub fn closing_commission(&self) -> Decimal {
        if self.allocates_closing_commission {
            self.closing.commission
        } else {
            Decimal::ZERO
        }
    }

    pub fn opening_commission(&self) -> Decimal {
        if self.allocates_opening_commission {
            self.opening.commission
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct UnmatchedClose {
    pub closing: Rc<Trade>,
    pub uncovered_shares: u64,
}

impl UnmatchedClose {
    pub fn to_error(&self) -> CalcError {
        CalcError::UnbalancedLedger {
            symbol: self.closing.symbol.clone(),
            date: self.closing.trade_date,
            uncovered_shares: self.uncovered_shares,
        }
    }
}

/// Shares of an opening trade still held after all closes were matched.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct OpenLotBalance {
    pub opening: Rc<Trade>,
    pub shares_remaining: u64,
}

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct MatchResult {
    pub matches: Vec<MatchRecord>,
    pub unmatched: Vec<UnmatchedClose>,
    pub open_lots: Vec<OpenLotBalance>,
}

/// FIFO matching of closing trades against opening lots, one symbol at a time.
pub struct LotMatcher {
    policy: UnmatchedClosePolicy,
}

impl LotMatcher {
    pub fn new(policy: UnmatchedClosePolicy) -> LotMatcher {
        LotMatcher { policy }
    }

    pub fn policy(&self) -> UnmatchedClosePolicy {
        self.policy
    }

    fn check_trades(symbol: &str, trades: &[Rc<Trade>]) -> Result<(), CalcError> {
        let mut seen_indexes = HashSet::new();
        for t in trades {
            t.validate().map_err(CalcError::InvalidTrade)?;
            if t.symbol != symbol {
                return Err(CalcError::InvalidTrade(format!(
                    "trade #{} of {} found among trades of {}",
                    t.read_index, t.symbol, symbol
                )));
            }
            if !seen_indexes.insert(t.read_index) {
                return Err(CalcError::InvalidTrade(format!(
                    "duplicate read index {} among trades of {}",
                    t.read_index, symbol
                )));
            }
        }
        Ok(())
    }

    /// Matches the trades of one symbol, which must be in ledger order.
    ///
    /// Closes are taken in ledger order. Each one drains the earliest opening
    /// lots which still have shares, emitting one record per lot touched.
    /// A close left with uncovered shares is handled per the policy: an
    /// UnbalancedLedger error (Fail), or listed in `unmatched` (Warn).
    pub fn match_symbol(
        &self,
        symbol: &str,
        trades: &[Rc<Trade>],
    ) -> Result<MatchResult, CalcError> {
        LotMatcher::check_trades(symbol, trades)?;

        let mut opens: Vec<(Rc<Trade>, u64)> = trades
            .iter()
            .filter(|t| t.is_open())
            .map(|t| (t.clone(), t.share_magnitude()))
            .collect();

        let mut commission_allocated: HashSet<u32> = HashSet::new();
        let mut result = MatchResult::default();

        for closing in trades.iter().filter(|t| t.is_close()) {
            let mut close_remaining = closing.share_magnitude();

            for (opening, open_remaining) in opens.iter_mut() {
                if close_remaining == 0 {
                    break;
                }
                if *open_remaining == 0 {
                    continue;
                }

                let shares_covered = (*open_remaining).min(close_remaining);
                *open_remaining -= shares_covered;
                close_remaining -= shares_covered;

                if opening.trade_date > closing.trade_date {
                    warn!(
                        "{}: close on {} (#{}) is covered by a later open on {} (#{})",
                        symbol, closing.trade_date, closing.read_index,
                        opening.trade_date, opening.read_index
                    );
                }

                let record = MatchRecord {
                    closing: closing.clone(),
                    opening: opening.clone(),
                    shares_covered,
                    allocates_closing_commission: commission_allocated
                        .insert(closing.read_index),
                    allocates_opening_commission: commission_allocated
                        .insert(opening.read_index),
                };
                debug!(
                    "{}: matched {} share(s) closed on {} (#{}) against open on {} (#{})",
                    symbol, shares_covered, closing.trade_date, closing.read_index,
                    opening.trade_date, opening.read_index
                );
                result.matches.push(record);
            }

            if close_remaining > 0 {
                result.unmatched.push(UnmatchedClose {
                    closing: closing.clone(),
                    uncovered_shares: close_remaining,
                });
            }
        }

        if let Some(first) = result.unmatched.first() {
            match self.policy {
                UnmatchedClosePolicy::Fail => return Err(first.to_error()),
                UnmatchedClosePolicy::Warn => {
                    for u in &result.unmatched {
                        warn!("{}", u.to_error());
                    }
                }
            }
        }

        result.open_lots = opens
            .into_iter()
            .filter(|(_, remaining)| *remaining > 0)
            .map(|(opening, shares_remaining)| OpenLotBalance { opening, shares_remaining })
            .collect();

        Ok(result)
    }
}
