use rust_decimal::Decimal;

use crate::util::decimal::currency_precision_str;

use super::bookkeeping::{
    CreditApplication, CreditPool, GainReport, IncomeReport, PeriodSummary, TaxYearResult,
};

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct RenderTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Vec<String>,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

struct ValueFormatter {
    full_values: bool,
}

impl ValueFormatter {
    fn money(&self, d: &Decimal) -> String {
        if self.full_values {
            d.normalize().to_string()
        } else {
            currency_precision_str(d)
        }
    }

    fn ratio(&self, d: &Decimal) -> String {
        if self.full_values {
            d.normalize().to_string()
        } else {
            format!("{:.4}", d)
        }
    }
}

fn s(v: &str) -> String {
    String::from(v)
}

/// One row per gain entry, with the profit/loss/sales totals in the footer.
/// Values are in ILS unless marked as USD.
pub fn render_gains_table_model(report: &GainReport, full_values: bool) -> RenderTable {
    let f = ValueFormatter { full_values };
    let mut table = RenderTable {
        header: vec![
            s("Symbol"),
            s("Shares"),
            s("Sale Value (USD)"),
            s("Purchase Date"),
            s("Original Price"),
            s("Adjustment Ratio"),
            s("Adjusted Price"),
            s("Sale Date"),
            s("Sale Value"),
            s("Profit/Loss"),
        ],
        ..RenderTable::default()
    };

    for e in &report.entries {
        table.rows.push(vec![
            e.symbol.clone(),
            e.shares_covered.to_string(),
            f.money(&e.sale_value_trade_currency),
            e.purchase_date.to_string(),
            f.money(&e.orig_price_reporting_currency),
            f.ratio(&e.fx_ratio_effective),
            f.money(&e.adjusted_price),
            e.sale_date.to_string(),
            f.money(&e.sale_value_reporting_currency),
            f.money(&e.taxable_profit_loss),
        ]);
    }

    let mut footer = vec![String::new(); table.header.len()];
    footer[0] = s("Total");
    footer[7] = format!("Profits: {}", f.money(&report.total_profits));
    footer[8] = format!("Sales: {}", f.money(&report.total_sales));
    footer[9] = format!("Losses: {}", f.money(&report.total_losses));
    table.footer = footer;

    if report.entries.is_empty() {
        table.notes.push(s("No sales in this period"));
    }
    table
}

pub fn render_dividends_table_model(income: &IncomeReport, full_values: bool) -> RenderTable {
    let f = ValueFormatter { full_values };
    let mut table = RenderTable {
        header: vec![
            s("Symbol"),
            s("Date"),
            s("Value (USD)"),
            s("Rate"),
            s("Value (ILS)"),
            s("Tax Deducted (USD)"),
            s("Tax Deducted (ILS)"),
        ],
        ..RenderTable::default()
    };
    for d in &income.dividends {
        table.rows.push(vec![
            d.symbol.clone(),
            d.date.to_string(),
            f.money(&d.value_usd),
            f.ratio(&d.rate),
            f.money(&d.value_ils),
            f.money(&d.tax_deducted_usd),
            f.money(&d.tax_deducted_ils),
        ]);
    }
    table.footer = vec![
        s("Total"),
        String::new(),
        f.money(&income.total_dividends_usd()),
        String::new(),
        f.money(&income.total_dividends_ils()),
        f.money(&income.total_tax_deducted_usd()),
        f.money(&income.total_tax_deducted_ils()),
    ];
    table
}

pub fn render_interest_table_model(income: &IncomeReport, full_values: bool) -> RenderTable {
    let f = ValueFormatter { full_values };
    let mut table = RenderTable {
        header: vec![s("Date"), s("Value (USD)"), s("Rate"), s("Value (ILS)")],
        ..RenderTable::default()
    };
    for i in &income.interest {
        table.rows.push(vec![
            i.date.to_string(),
            f.money(&i.value_usd),
            f.ratio(&i.rate),
            f.money(&i.value_ils),
        ]);
    }
    table.footer = vec![
        s("Total"),
        f.money(&income.total_interest_usd()),
        String::new(),
        f.money(&income.total_interest_ils()),
    ];
    table
}

fn credit_row(
    f: &ValueFormatter,
    label: String,
    income: &Decimal,
    app: &CreditApplication,
) -> Vec<String> {
    vec![
        label,
        f.money(income),
        f.money(&app.used_from_prior_years),
        f.money(&app.used_from_stock_losses),
        f.money(&app.remaining_income),
        f.money(&app.pool.from_prior_years),
        f.money(&app.pool.from_current_year_stock_losses),
    ]
}

/// How the loss credits offset each period's gains (and the passive income,
/// in the last period), in the order they were applied.
pub fn render_periods_table_model(periods: &[PeriodSummary], full_values: bool) -> RenderTable {
    let f = ValueFormatter { full_values };
    let mut table = RenderTable {
        header: vec![
            s("Period"),
            s("Income"),
            s("Prior Years Credit Used"),
            s("Stock Loss Credit Used"),
            s("Taxable"),
            s("Prior Years Credit Left"),
            s("Stock Loss Credit Left"),
        ],
        ..RenderTable::default()
    };
    for p in periods {
        table.rows.push(credit_row(
            &f,
            format!("{} capital gains", p.period),
            &p.report.total_profits,
            &p.capital_gains,
        ));
        if let Some(passive) = &p.passive_income {
            let income = passive.remaining_income + *passive.credit_used();
            table.rows.push(credit_row(
                &f,
                format!("{} dividends and interest", p.period),
                &income,
                passive,
            ));
        }
    }
    table
}

fn pool_rows(f: &ValueFormatter, label: &str, pool: &CreditPool) -> Vec<Vec<String>> {
    vec![
        vec![format!("{label}: from previous years"), f.money(&pool.from_prior_years)],
        vec![
            format!("{label}: from stock losses"),
            f.money(&pool.from_current_year_stock_losses),
        ],
    ]
}

pub fn render_annual_summary_table_model(result: &TaxYearResult, full_values: bool) -> RenderTable {
    let f = ValueFormatter { full_values };
    let report = &result.year_report;
    let mut table = RenderTable {
        header: vec![s(&format!("Tax Year {}", result.tax_year)), s("ILS")],
        ..RenderTable::default()
    };
    table.rows.push(vec![s("Capital gains: total sales"), f.money(&report.total_sales)]);
    table.rows.push(vec![s("Capital gains: profits"), f.money(&report.total_profits)]);
    table.rows.push(vec![s("Capital gains: losses"), f.money(&report.total_losses)]);
    table.rows.push(vec![s("Dividends"), f.money(&result.income.total_dividends_ils())]);
    table.rows.push(vec![
        s("Dividends: tax deducted at source"),
        f.money(&result.income.total_tax_deducted_ils()),
    ]);
    table.rows.push(vec![s("Interest"), f.money(&result.income.total_interest_ils())]);
    table.rows.append(&mut pool_rows(&f, "Credits available", &result.initial_credits));
    table.rows.push(vec![
        s("Taxable capital gains after credits"),
        f.money(&result.taxable_capital_gains()),
    ]);
    table.rows.push(vec![
        s("Taxable dividends and interest after credits"),
        f.money(&result.taxable_passive_income()),
    ]);
    table.rows.append(&mut pool_rows(
        &f,
        &format!("Carried forward to {}", result.tax_year + 1),
        &result.final_credits,
    ));

    table.notes = result.notes.clone();
    for lot in &result.open_lots {
        table.notes.push(format!(
            "{} share(s) of {} bought on {} are still held",
            lot.shares_remaining, lot.opening.symbol, lot.opening.trade_date
        ));
    }
    table
}
