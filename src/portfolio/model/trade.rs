use std::{collections::BTreeMap, fmt::Display, rc::Rc};

use itertools::Itertools;
use rust_decimal::Decimal;
use time::Date;

use crate::util::decimal::is_negative;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TradeAction {
    Open,
    Close,
}

impl TradeAction {
    fn pretty_str(&self) -> &str {
        match self {
            TradeAction::Open => "Open",
            TradeAction::Close => "Close",
        }
    }
}

impl Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_str())
    }
}

/// A single ledger entry, either opening a lot or closing (part of) a position.
///
/// Trades are immutable. How many of a trade's shares have been matched so far
/// is tracked by the LotMatcher, not on the trade itself.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Trade {
    pub symbol: String,
    pub trade_date: Date,
    pub action: TradeAction,
    // Positive for opens, negative for closes.
    pub shares: i64,
    // In trade currency (USD)
    pub unit_price: Decimal,
    // In trade currency. Always non-negative.
    pub commission: Decimal,
    // As reported by the broker. Informational only.
    pub realized_pl: Option<Decimal>,

    // The absolute order in which the trade was read from the ledger.
    // Used as a tiebreak in sorting, and identifies the trade during matching.
    pub read_index: u32,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.action == TradeAction::Open
    }

    pub fn is_close(&self) -> bool {
        self.action == TradeAction::Close
    }

    pub fn share_magnitude(&self) -> u64 {
        self.shares.unsigned_abs()
    }

    /// Checks the record shape. Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let err = |msg: String| {
            Err(format!(
                "{} trade of {} on {} (#{}): {}",
                self.action, self.symbol, self.trade_date, self.read_index, msg
            ))
        };

        if self.shares == 0 {
            return err("share count is zero".to_string());
        }
        match self.action {
            TradeAction::Open if self.shares < 0 => {
                return err(format!(
                    "opening trades must have a positive share count (found {}). \
                     Short positions are not supported",
                    self.shares
                ));
            }
            TradeAction::Close if self.shares > 0 => {
                return err(format!(
                    "closing trades must have a negative share count (found {})",
                    self.shares
                ));
            }
            _ => (),
        }
        if is_negative(&self.commission) {
            return err(format!("commission is negative ({})", self.commission));
        }
        if is_negative(&self.unit_price) {
            return err(format!("unit price is negative ({})", self.unit_price));
        }
        Ok(())
    }
}

impl PartialOrd for Trade {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Trade {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.trade_date
            .cmp(&other.trade_date)
            .then(self.read_index.cmp(&other.read_index))
    }
}

/// Groups trades by symbol (symbols in sorted order).
/// Within a symbol, trades are stably ordered by trade date, so that trades on
/// the same date keep their ledger order.
pub fn split_trades_by_symbol(trades: Vec<Trade>) -> BTreeMap<String, Vec<Rc<Trade>>> {
    let mut by_symbol: BTreeMap<String, Vec<Rc<Trade>>> = BTreeMap::new();
    for (symbol, group) in &trades
        .into_iter()
        .sorted_by(|a, b| a.symbol.cmp(&b.symbol).then(a.cmp(b)))
        .chunk_by(|t| t.symbol.clone())
    {
        by_symbol.insert(symbol, group.map(Rc::new).collect());
    }
    by_symbol
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        portfolio::pub_testlib::{TTrade, DEFAULT_SYMBOL},
        testlib::assert_re,
        util::date::pub_testlib::doy_date,
    };

    use super::{split_trades_by_symbol, Trade, TradeAction};

    #[test]
    fn test_trade_order() {
        let mk = |doy, read_index| -> Trade {
            TTrade { tdate: doy_date(2019, doy), read_index, ..TTrade::d() }.x()
        };
        let mut trades = vec![mk(4, 2), mk(5, 1), mk(2, 4), mk(4, 3), mk(1, 5)];
        trades.sort();
        let order: Vec<u32> = trades.iter().map(|t| t.read_index).collect();
        assert_eq!(order, vec![5, 4, 2, 3, 1]);
    }

    #[test]
    fn test_split_trades_by_symbol() {
        let t = |sym: &str, doy, read_index| -> Trade {
            TTrade { sym: sym.to_string(), tdate: doy_date(2019, doy), read_index, ..TTrade::d() }
                .x()
        };
        let split = split_trades_by_symbol(vec![
            t("ZZZ", 3, 0),
            t("AAA", 5, 1),
            t("ZZZ", 1, 2),
            t("AAA", 5, 3),
            t("AAA", 2, 4),
        ]);
        assert_eq!(split.keys().cloned().collect::<Vec<String>>(), vec!["AAA", "ZZZ"]);
        let idxs = |sym: &str| -> Vec<u32> {
            split[sym].iter().map(|t| t.read_index).collect()
        };
        assert_eq!(idxs("AAA"), vec![4, 1, 3]);
        assert_eq!(idxs("ZZZ"), vec![2, 0]);
    }

    #[test]
    fn test_validate() {
        let ok = TTrade { shares: 10, ..TTrade::d() }.x();
        assert_eq!(ok.validate(), Ok(()));
        assert_eq!(ok.symbol, DEFAULT_SYMBOL);

        let close = TTrade { act: TradeAction::Close, shares: -10, price: dec!(0), ..TTrade::d() }.x();
        // A worthless close is fine
        assert_eq!(close.validate(), Ok(()));

        let zero = TTrade { shares: 0, ..TTrade::d() }.x();
        assert_re("share count is zero", &zero.validate().unwrap_err());

        let short = TTrade { shares: -3, ..TTrade::d() }.x();
        assert_re("Short positions are not supported", &short.validate().unwrap_err());

        let bad_close = TTrade { act: TradeAction::Close, shares: 3, ..TTrade::d() }.x();
        assert_re("must have a negative share count", &bad_close.validate().unwrap_err());

        let neg_comm = TTrade { comm: dec!(-1), ..TTrade::d() }.x();
        assert_re("^Open trade of FOO on .*commission is negative", &neg_comm.validate().unwrap_err());

        let free = TTrade { price: dec!(0), comm: dec!(1), ..TTrade::d() }.x();
        assert_eq!(free.validate(), Ok(()));

        let neg_price = TTrade { price: dec!(-1), ..TTrade::d() }.x();
        assert_re("unit price is negative", &neg_price.validate().unwrap_err());
    }
}
