use rust_decimal::Decimal;
use time::Date;

use crate::{portfolio::GainEntry, util::decimal::is_non_negative};

/// Gain entries with their totals (all in reporting currency).
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct GainReport {
    pub entries: Vec<GainEntry>,
    // Sum of the non-negative taxable gains
    pub total_profits: Decimal,
    // Sum of the negative taxable gains. Negative or zero.
    pub total_losses: Decimal,
    pub total_sales: Decimal,
}

impl GainReport {
    pub fn aggregate(entries: Vec<GainEntry>) -> GainReport {
        let mut total_profits = Decimal::ZERO;
        let mut total_losses = Decimal::ZERO;
        let mut total_sales = Decimal::ZERO;
        for e in &entries {
            if is_non_negative(&e.taxable_profit_loss) {
                total_profits += e.taxable_profit_loss;
            } else {
                total_losses += e.taxable_profit_loss;
            }
            total_sales += e.sale_value_reporting_currency;
        }
        GainReport { entries, total_profits, total_losses, total_sales }
    }

    /// The entries sold in [start_inclusive, end_exclusive), with their own totals.
    pub fn slice_by_date(&self, start_inclusive: Date, end_exclusive: Date) -> GainReport {
        GainReport::aggregate(
            self.entries
                .iter()
                .filter(|e| e.sale_date >= start_inclusive && e.sale_date < end_exclusive)
                .cloned()
                .collect(),
        )
    }

    pub fn net_profit_loss(&self) -> Decimal {
        self.total_profits + self.total_losses
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
