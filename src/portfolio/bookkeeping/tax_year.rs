use std::fmt::Display;

use rust_decimal::Decimal;
use time::{Date, Duration};
use tracing::{debug, info, warn};

use crate::{
    fx::RateTable,
    portfolio::{split_trades_by_symbol, Trade},
    util::{date::first_day_of_year, decimal::GreaterEqualZeroDecimal},
};

use super::{
    CalcError, CreditApplication, CreditPool, GainReport, IncomeReport, LotMatcher,
    MatchRecord, OpenLotBalance, TaxableGainCalculator, UnmatchedClose, UnmatchedClosePolicy,
};

/// A half-open range of dates, [start, end_exclusive).
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct DatePeriod {
    pub start: Date,
    pub end_exclusive: Date,
}

impl DatePeriod {
    pub fn contains(&self, d: Date) -> bool {
        d >= self.start && d < self.end_exclusive
    }

    pub fn last_day(&self) -> Date {
        self.end_exclusive.saturating_sub(Duration::days(1))
    }
}

impl Display for DatePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.last_day())
    }
}

#[derive(Clone, Debug)]
pub struct TaxYearOptions {
    tax_year: i32,
    loss_from_prev_years: GreaterEqualZeroDecimal,
    split_dates: Vec<Date>,
    unmatched_close_policy: UnmatchedClosePolicy,
}

impl TaxYearOptions {
    /// `split_dates` partition the year into consecutive periods. Each must
    /// fall strictly after January 1st of `tax_year` and within the year.
    pub fn new(
        tax_year: i32,
        loss_from_prev_years: GreaterEqualZeroDecimal,
        split_dates: Vec<Date>,
        unmatched_close_policy: UnmatchedClosePolicy,
    ) -> Result<TaxYearOptions, String> {
        if !(1900..=9998).contains(&tax_year) {
            return Err(format!("Tax year {tax_year} is out of range"));
        }
        let mut split_dates = split_dates;
        split_dates.sort();
        split_dates.dedup();
        for d in &split_dates {
            if d.year() != tax_year || *d == first_day_of_year(tax_year) {
                return Err(format!(
                    "Split date {d} does not fall inside tax year {tax_year} \
                     (after January 1st)"
                ));
            }
        }
        Ok(TaxYearOptions { tax_year, loss_from_prev_years, split_dates, unmatched_close_policy })
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    pub fn loss_from_prev_years(&self) -> GreaterEqualZeroDecimal {
        self.loss_from_prev_years
    }

    pub fn unmatched_close_policy(&self) -> UnmatchedClosePolicy {
        self.unmatched_close_policy
    }

    pub fn year_period(&self) -> DatePeriod {
        DatePeriod {
            start: first_day_of_year(self.tax_year),
            end_exclusive: first_day_of_year(self.tax_year + 1),
        }
    }

    /// The consecutive periods covering the whole year, in calendar order.
    pub fn periods(&self) -> Vec<DatePeriod> {
        let year = self.year_period();
        let mut bounds = vec![year.start];
        bounds.extend(self.split_dates.iter().copied());
        bounds.push(year.end_exclusive);
        bounds
            .windows(2)
            .map(|w| DatePeriod { start: w[0], end_exclusive: w[1] })
            .collect()
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct PeriodSummary {
    pub period: DatePeriod,
    pub report: GainReport,
    // The period's profits, offset by the credits available at that point
    pub capital_gains: CreditApplication,
    // Only in the last period
    pub passive_income: Option<CreditApplication>,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TaxYearResult {
    pub tax_year: i32,
    pub year_report: GainReport,
    pub periods: Vec<PeriodSummary>,
    pub income: IncomeReport,
    pub initial_credits: CreditPool,
    // Carried forward to next year
    pub final_credits: CreditPool,
    pub unmatched: Vec<UnmatchedClose>,
    pub open_lots: Vec<OpenLotBalance>,
    pub notes: Vec<String>,
}

fn match_all(
    trades: Vec<Trade>,
    policy: UnmatchedClosePolicy,
) -> Result<(Vec<MatchRecord>, Vec<UnmatchedClose>, Vec<OpenLotBalance>), CalcError> {
    let matcher = LotMatcher::new(policy);
    let mut matches = Vec::new();
    let mut unmatched = Vec::new();
    let mut open_lots = Vec::new();
    for (symbol, symbol_trades) in split_trades_by_symbol(trades) {
        let mut res = matcher.match_symbol(&symbol, &symbol_trades)?;
        debug!(
            "{}: {} trade(s), {} match record(s), {} open lot(s) remaining",
            symbol, symbol_trades.len(), res.matches.len(), res.open_lots.len()
        );
        matches.append(&mut res.matches);
        unmatched.append(&mut res.unmatched);
        open_lots.append(&mut res.open_lots);
    }
    Ok((matches, unmatched, open_lots))
}

/// Computes the capital gains of a tax year, and how the available loss
/// credits offset them.
///
/// The ledger may include trades from before the tax year (the lots they open
/// are needed for matching). Sales outside the tax year consume lots, but do
/// not appear in any report.
pub fn compute_tax_year(
    ledger: Vec<Trade>,
    rates: &RateTable,
    income: &IncomeReport,
    options: &TaxYearOptions,
) -> Result<TaxYearResult, CalcError> {
    let year = options.year_period();
    let mut notes = Vec::new();

    let (matches, unmatched, open_lots) = match_all(ledger, options.unmatched_close_policy())?;
    for u in &unmatched {
        notes.push(format!(
            "{} share(s) of {} sold on {} could not be matched to a purchase and were not reported",
            u.uncovered_shares, u.closing.symbol, u.closing.trade_date
        ));
    }

    let (in_year, out_of_year): (Vec<MatchRecord>, Vec<MatchRecord>) =
        matches.into_iter().partition(|m| year.contains(m.closing.trade_date));
    for m in &out_of_year {
        warn!(
            "Sale of {} on {} is outside of tax year {}. Excluded from the reports",
            m.closing.symbol, m.closing.trade_date, options.tax_year()
        );
    }
    if !out_of_year.is_empty() {
        notes.push(format!(
            "{} sale match(es) outside of {} were excluded",
            out_of_year.len(), options.tax_year()
        ));
    }

    let entries = TaxableGainCalculator::new(rates).gain_entries(&in_year)?;
    let year_report = GainReport::aggregate(entries);
    let year_income = income.slice_by_date(year.start, year.end_exclusive);

    let initial_credits = CreditPool::new(
        options.loss_from_prev_years(),
        // Losses are negative or zero
        GreaterEqualZeroDecimal::try_from(-year_report.total_losses)
            .unwrap_or(GreaterEqualZeroDecimal::zero()),
    );

    let periods = options.periods();
    let n_periods = periods.len();
    let mut credits = initial_credits;
    let mut summaries = Vec::with_capacity(n_periods);
    for (i, period) in periods.into_iter().enumerate() {
        let report = year_report.slice_by_date(period.start, period.end_exclusive);
        let capital_gains = credits.apply(report.total_profits);
        credits = capital_gains.pool;

        let passive_income = if i + 1 == n_periods {
            let application = credits.apply(year_income.passive_income_ils());
            credits = application.pool;
            Some(application)
        } else {
            None
        };

        info!(
            "{}: profits {}, losses {}, taxable after credits {}",
            period, report.total_profits, report.total_losses, capital_gains.remaining_income
        );
        summaries.push(PeriodSummary { period, report, capital_gains, passive_income });
    }

    info!(
        "Credits carried forward to {}: {} from previous years, {} from stock losses",
        options.tax_year() + 1,
        credits.from_prior_years,
        credits.from_current_year_stock_losses
    );

    Ok(TaxYearResult {
        tax_year: options.tax_year(),
        year_report,
        periods: summaries,
        income: year_income,
        initial_credits,
        final_credits: credits,
        unmatched,
        open_lots,
        notes,
    })
}

impl TaxYearResult {
    /// Taxable capital gains across all periods, after credits.
    pub fn taxable_capital_gains(&self) -> Decimal {
        self.periods.iter().map(|p| p.capital_gains.remaining_income).sum()
    }

    pub fn taxable_passive_income(&self) -> Decimal {
        self.periods
            .iter()
            .filter_map(|p| p.passive_income.as_ref())
            .map(|a| a.remaining_income)
            .sum()
    }
}
