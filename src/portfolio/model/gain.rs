use rust_decimal::Decimal;
use time::Date;

use crate::util::decimal::is_negative;

/// The realized gain of one match record, in both currencies.
///
/// Produced by the taxable gain calculation; never modified afterwards.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct GainEntry {
    pub symbol: String,
    pub shares_covered: u64,
    pub sale_value_trade_currency: Decimal,
    pub purchase_date: Date,
    pub purchase_rate: Decimal,
    // Cost basis including allocated commissions, at purchase-date rates
    // (the closing commission at the sale-date rate).
    pub orig_price_reporting_currency: Decimal,
    // Sale-date rate / purchase-date rate
    pub fx_ratio_at_realization: Decimal,
    // adjusted_price / orig_price_reporting_currency
    pub fx_ratio_effective: Decimal,
    pub adjusted_price: Decimal,
    pub sale_date: Date,
    pub sale_rate: Decimal,
    pub sale_value_reporting_currency: Decimal,
    pub taxable_profit_loss: Decimal,
}

impl GainEntry {
    pub fn nominal_gain(&self) -> Decimal {
        self.sale_value_reporting_currency - self.orig_price_reporting_currency
    }

    pub fn is_loss(&self) -> bool {
        is_negative(&self.taxable_profit_loss)
    }
}
