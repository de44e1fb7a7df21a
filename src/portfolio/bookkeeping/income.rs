use rust_decimal::Decimal;
use time::Date;

use crate::{
    fx::RateTable,
    portfolio::{Dividend, Interest},
};

use super::CalcError;

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DividendEntry {
    pub symbol: String,
    pub date: Date,
    pub value_usd: Decimal,
    pub rate: Decimal,
    pub value_ils: Decimal,
    pub tax_deducted_usd: Decimal,
    pub tax_deducted_ils: Decimal,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct InterestEntry {
    pub date: Date,
    pub value_usd: Decimal,
    pub rate: Decimal,
    pub value_ils: Decimal,
}

/// Dividends and interest, converted at the rate of the day they were paid.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct IncomeReport {
    pub dividends: Vec<DividendEntry>,
    pub interest: Vec<InterestEntry>,
}

impl IncomeReport {
    pub fn new(
        dividends: &[Dividend],
        interest: &[Interest],
        rates: &RateTable,
    ) -> Result<IncomeReport, CalcError> {
        let dividends = dividends
            .iter()
            .map(|d| -> Result<DividendEntry, CalcError> {
                let rate = rates.rate_for(d.date)?.foreign_to_local_rate;
                Ok(DividendEntry {
                    symbol: d.symbol.clone(),
                    date: d.date,
                    value_usd: d.amount,
                    rate,
                    value_ils: d.amount * rate,
                    tax_deducted_usd: d.tax_withheld,
                    tax_deducted_ils: d.tax_withheld * rate,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let interest = interest
            .iter()
            .map(|i| -> Result<InterestEntry, CalcError> {
                let rate = rates.rate_for(i.date)?.foreign_to_local_rate;
                Ok(InterestEntry {
                    date: i.date,
                    value_usd: i.amount,
                    rate,
                    value_ils: i.amount * rate,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(IncomeReport { dividends, interest })
    }

    /// Only the income paid in [start_inclusive, end_exclusive).
    pub fn slice_by_date(&self, start_inclusive: Date, end_exclusive: Date) -> IncomeReport {
        let in_range = |d: &Date| *d >= start_inclusive && *d < end_exclusive;
        IncomeReport {
            dividends: self.dividends.iter().filter(|d| in_range(&d.date)).cloned().collect(),
            interest: self.interest.iter().filter(|i| in_range(&i.date)).cloned().collect(),
        }
    }

    pub fn total_dividends_usd(&self) -> Decimal {
        self.dividends.iter().map(|d| d.value_usd).sum()
    }

    pub fn total_dividends_ils(&self) -> Decimal {
        self.dividends.iter().map(|d| d.value_ils).sum()
    }

    pub fn total_tax_deducted_usd(&self) -> Decimal {
        self.dividends.iter().map(|d| d.tax_deducted_usd).sum()
    }

    pub fn total_tax_deducted_ils(&self) -> Decimal {
        self.dividends.iter().map(|d| d.tax_deducted_ils).sum()
    }

    pub fn total_interest_usd(&self) -> Decimal {
        self.interest.iter().map(|i| i.value_usd).sum()
    }

    pub fn total_interest_ils(&self) -> Decimal {
        self.interest.iter().map(|i| i.value_ils).sum()
    }

    pub fn passive_income_ils(&self) -> Decimal {
        self.total_dividends_ils() + self.total_interest_ils()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        portfolio::{bookkeeping::CalcError, pub_testlib::rate_table, Dividend, Interest},
        util::date::pub_testlib::ymd,
    };

    use super::IncomeReport;

    fn div(m: u8, d: u8, amount: rust_decimal::Decimal, withheld: rust_decimal::Decimal) -> Dividend {
        Dividend {
            symbol: "FOO".to_string(),
            date: ymd(2019, m, d),
            currency: "USD".to_string(),
            amount,
            tax_withheld: withheld,
            description: "FOO(US0000000000) Cash Dividend USD 0.50 per Share".to_string(),
        }
    }

    fn int(m: u8, d: u8, amount: rust_decimal::Decimal) -> Interest {
        Interest {
            date: ymd(2019, m, d),
            currency: "USD".to_string(),
            amount,
            description: "USD Credit Interest".to_string(),
        }
    }

    #[test]
    fn test_income_report() {
        let rates = rate_table(&[(ymd(2019, 3, 1), dec!(3.6)), (ymd(2019, 9, 2), dec!(3.5))]);
        let report = IncomeReport::new(
            &[div(3, 1, dec!(10), dec!(2.5)), div(9, 4, dec!(20), dec!(5))],
            &[int(3, 3, dec!(1.5))],
            &rates,
        )
        .unwrap();

        assert_eq!(report.dividends[0].value_ils, dec!(36));
        assert_eq!(report.dividends[0].tax_deducted_ils, dec!(9));
        // Looks back to the closest rate
        assert_eq!(report.dividends[1].rate, dec!(3.5));
        assert_eq!(report.interest[0].value_ils, dec!(5.4));

        assert_eq!(report.total_dividends_usd(), dec!(30));
        assert_eq!(report.total_dividends_ils(), dec!(106));
        assert_eq!(report.total_tax_deducted_usd(), dec!(7.5));
        assert_eq!(report.total_tax_deducted_ils(), dec!(26.5));
        assert_eq!(report.total_interest_usd(), dec!(1.5));
        assert_eq!(report.total_interest_ils(), dec!(5.4));
        assert_eq!(report.passive_income_ils(), dec!(111.4));

        let h2 = report.slice_by_date(ymd(2019, 7, 1), ymd(2020, 1, 1));
        assert_eq!(h2.dividends.len(), 1);
        assert!(h2.interest.is_empty());
        assert_eq!(h2.passive_income_ils(), dec!(70));
    }

    #[test]
    fn test_income_missing_rate() {
        let rates = rate_table(&[(ymd(2019, 3, 1), dec!(3.6))]);
        let err = IncomeReport::new(&[], &[int(6, 3, dec!(1.5))], &rates).unwrap_err();
        assert_eq!(err, CalcError::RateNotFound { date: ymd(2019, 6, 3), lookback_days: 5 });
    }
}
