use rust_decimal::Decimal;
use tracing::trace;

use crate::util::decimal::GreaterEqualZeroDecimal;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Deduction {
    pub remaining: GreaterEqualZeroDecimal,
    pub credit_left: GreaterEqualZeroDecimal,
    pub credit_used: GreaterEqualZeroDecimal,
}

/// Deducts as much of `credit` from `amount` as possible.
pub fn try_to_deduct(
    amount: GreaterEqualZeroDecimal,
    credit: GreaterEqualZeroDecimal,
) -> Deduction {
    let (remaining, credit_left) = if credit.is_zero() {
        (amount, credit)
    } else if *credit <= *amount {
        (amount.saturating_sub(credit), GreaterEqualZeroDecimal::zero())
    } else {
        (GreaterEqualZeroDecimal::zero(), credit.saturating_sub(amount))
    };
    Deduction { remaining, credit_left, credit_used: credit.saturating_sub(credit_left) }
}

/// Loss credits available to offset taxable income, in the order in which
/// they are consumed.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct CreditPool {
    pub from_prior_years: GreaterEqualZeroDecimal,
    pub from_current_year_stock_losses: GreaterEqualZeroDecimal,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct CreditApplication {
    pub remaining_income: Decimal,
    pub pool: CreditPool,
    pub used_from_prior_years: GreaterEqualZeroDecimal,
    pub used_from_stock_losses: GreaterEqualZeroDecimal,
}

impl CreditApplication {
    pub fn credit_used(&self) -> GreaterEqualZeroDecimal {
        self.used_from_prior_years + self.used_from_stock_losses
    }
}

impl CreditPool {
    pub fn new(
        from_prior_years: GreaterEqualZeroDecimal,
        from_current_year_stock_losses: GreaterEqualZeroDecimal,
    ) -> CreditPool {
        CreditPool { from_prior_years, from_current_year_stock_losses }
    }

    pub fn empty() -> CreditPool {
        CreditPool::new(GreaterEqualZeroDecimal::zero(), GreaterEqualZeroDecimal::zero())
    }

    pub fn total(&self) -> GreaterEqualZeroDecimal {
        self.from_prior_years + self.from_current_year_stock_losses
    }

    /// Offsets `income` with the credit from prior years, and then whatever
    /// is left of it with the credit from this year's stock losses.
    ///
    /// Non-positive income consumes nothing.
    pub fn apply(&self, income: Decimal) -> CreditApplication {
        let amount = match GreaterEqualZeroDecimal::try_from(income) {
            Ok(a) if !a.is_zero() => a,
            _ => {
                return CreditApplication {
                    remaining_income: income,
                    pool: *self,
                    used_from_prior_years: GreaterEqualZeroDecimal::zero(),
                    used_from_stock_losses: GreaterEqualZeroDecimal::zero(),
                };
            }
        };

        let prior = try_to_deduct(amount, self.from_prior_years);
        let stock = try_to_deduct(prior.remaining, self.from_current_year_stock_losses);

        let application = CreditApplication {
            remaining_income: *stock.remaining,
            pool: CreditPool::new(prior.credit_left, stock.credit_left),
            used_from_prior_years: prior.credit_used,
            used_from_stock_losses: stock.credit_used,
        };
        trace!("CreditPool::apply {} with {:?} -> {:?}", income, self, application);
        application
    }
}
