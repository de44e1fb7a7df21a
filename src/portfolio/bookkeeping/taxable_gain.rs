use rust_decimal::Decimal;
use tracing::trace;

use crate::{
    fx::RateTable,
    portfolio::GainEntry,
    util::decimal::is_non_negative,
};

use super::{CalcError, MatchRecord};

// Zero counts as a profit throughout.
fn decide(nominal: Decimal, inflation: Decimal, real: Decimal) -> Result<Decimal, CalcError> {
    let taxable = match (
        is_non_negative(&nominal),
        is_non_negative(&inflation),
        is_non_negative(&real),
    ) {
        // Nominal profit, of which only the real part is taxed.
        (true, true, true) => real,
        // The currency lost value, so all of the nominal profit is real.
        (true, false, true) => nominal,
        // Nominal loss caused by the currency alone.
        (false, false, true) => Decimal::ZERO,
        (false, false, false) => real,
        (false, true, false) => nominal,
        // Nominal profit smaller than the inflationary gain.
        (true, true, false) => Decimal::ZERO,
        // real == nominal - inflation rules these out.
        (false, true, true) | (true, false, false) => {
            return Err(CalcError::InvariantViolation { nominal, inflation, real });
        }
    };
    Ok(taxable)
}

/// The taxable part of a nominal gain (in reporting currency), given the
/// part of it which is inflationary (due only to the exchange rate moving).
pub fn taxable_profit_loss(nominal: Decimal, inflation: Decimal) -> Result<Decimal, CalcError> {
    let real = nominal - inflation;
    let taxable = decide(nominal, inflation, real)?;
    trace!(%nominal, %inflation, %real, %taxable, "taxable_profit_loss");
    Ok(taxable)
}

/// Converts match records into gain entries, valued at the exchange rates of
/// the trade dates.
pub struct TaxableGainCalculator<'a> {
    rates: &'a RateTable,
}

impl<'a> TaxableGainCalculator<'a> {
    pub fn new(rates: &'a RateTable) -> TaxableGainCalculator<'a> {
        TaxableGainCalculator { rates }
    }

    pub fn gain_entry(&self, m: &MatchRecord) -> Result<GainEntry, CalcError> {
        let sale_rate = self.rates.rate_for(m.closing.trade_date)?.foreign_to_local_rate;
        let purchase_rate = self.rates.rate_for(m.opening.trade_date)?.foreign_to_local_rate;
        let shares = Decimal::from(m.shares_covered);

        let sale_value_trade_currency = m.closing.unit_price * shares;
        let orig_price_reporting_currency = m.opening.unit_price * shares * purchase_rate
            + m.closing_commission() * sale_rate
            + m.opening_commission() * purchase_rate;
        let sale_value_reporting_currency = sale_value_trade_currency * sale_rate;
        let fx_ratio = sale_rate / purchase_rate;

        let nominal = sale_value_reporting_currency - orig_price_reporting_currency;
        let inflation = orig_price_reporting_currency * (fx_ratio - Decimal::ONE);
        let taxable = taxable_profit_loss(nominal, inflation)?;

        let adjusted_price = sale_value_reporting_currency - taxable;
        let fx_ratio_effective = if orig_price_reporting_currency.is_zero() {
            fx_ratio
        } else {
            adjusted_price / orig_price_reporting_currency
        };

        Ok(GainEntry {
            symbol: m.closing.symbol.clone(),
            shares_covered: m.shares_covered,
            sale_value_trade_currency,
            purchase_date: m.opening.trade_date,
            purchase_rate,
            orig_price_reporting_currency,
            fx_ratio_at_realization: fx_ratio,
            fx_ratio_effective,
            adjusted_price,
            sale_date: m.closing.trade_date,
            sale_rate,
            sale_value_reporting_currency,
            taxable_profit_loss: taxable,
        })
    }

    /// One entry per record, in the order given.
    pub fn gain_entries(&self, matches: &[MatchRecord]) -> Result<Vec<GainEntry>, CalcError> {
        matches.iter().map(|m| self.gain_entry(m)).collect()
    }
}
