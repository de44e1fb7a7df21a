// Builders shared by unit tests and (through the testlib feature) the
// integration tests.
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::Date;

use crate::{
    fx::{DailyRate, RateTable, DEFAULT_LOOKBACK_DAYS},
    util::date::pub_testlib::doy_date,
};

use super::{Trade, TradeAction};

pub const DEFAULT_SYMBOL: &str = "FOO";

/// Test Trade. Fill in what matters, and take the rest from TTrade::d().
#[derive(Clone, Debug)]
pub struct TTrade {
    pub sym: String,
    pub tdate: Date,
    pub act: TradeAction,
    pub shares: i64,
    pub price: Decimal,
    pub comm: Decimal,
    pub realized: Option<Decimal>,
    pub read_index: u32,
}

impl TTrade {
    pub fn d() -> TTrade {
        TTrade {
            sym: DEFAULT_SYMBOL.to_string(),
            tdate: doy_date(2019, 10),
            act: TradeAction::Open,
            shares: 10,
            price: dec!(10),
            comm: dec!(0),
            realized: None,
            read_index: 0,
        }
    }

    pub fn x(self) -> Trade {
        Trade {
            symbol: self.sym,
            trade_date: self.tdate,
            action: self.act,
            shares: self.shares,
            unit_price: self.price,
            commission: self.comm,
            realized_pl: self.realized,
            read_index: self.read_index,
        }
    }
}

pub fn open(tdate: Date, shares: i64, price: Decimal, comm: Decimal) -> TTrade {
    TTrade { tdate, act: TradeAction::Open, shares, price, comm, ..TTrade::d() }
}

/// `shares` is the number of shares sold (positive). The resulting trade
/// carries the negated count.
pub fn close(tdate: Date, shares: i64, price: Decimal, comm: Decimal) -> TTrade {
    TTrade { tdate, act: TradeAction::Close, shares: -shares, price, comm, ..TTrade::d() }
}

/// Builds the trades, assigning read_index in the order given.
pub fn ledger(trades: Vec<TTrade>) -> Vec<Trade> {
    trades
        .into_iter()
        .enumerate()
        .map(|(i, t)| TTrade { read_index: i as u32, ..t }.x())
        .collect()
}

pub fn rate_table(rates: &[(Date, Decimal)]) -> RateTable {
    RateTable::new(
        rates.iter().map(|(d, r)| DailyRate::new(*d, *r)).collect(),
        DEFAULT_LOOKBACK_DAYS,
    )
    .unwrap()
}
