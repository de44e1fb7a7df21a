use std::io::Write;

use crate::{
    fx::io::load_rate_table,
    portfolio::{
        bookkeeping::{compute_tax_year, IncomeReport, TaxYearResult},
        io::ib_statement::read_statements,
        render::{
            render_annual_summary_table_model, render_dividends_table_model,
            render_gains_table_model, render_interest_table_model, render_periods_table_model,
            RenderTable,
        },
    },
    util::rw::{DescribedReader, WriteHandle},
    write_errln,
};

use super::{
    config::TaxConfig,
    outfmt::{
        csv::CsvWriter,
        model::{OutputType, ReportWriter},
        text::TextWriter,
    },
};

pub type Error = String;

pub struct Options {
    pub config: TaxConfig,
    pub render_full_values: bool,
    pub csv_output_dir: Option<String>,
    pub xlsx_output_path: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: TaxConfig::default(),
            render_full_values: false,
            csv_output_dir: None,
            xlsx_output_path: None,
        }
    }
}

pub struct AppRenderResult {
    pub tax_year: i32,
    // (period name, table). One per sub-period when the year is split.
    pub period_gains_tables: Vec<(String, RenderTable)>,
    pub year_gains_table: RenderTable,
    pub dividends_table: RenderTable,
    pub interest_table: RenderTable,
    pub periods_table: RenderTable,
    pub annual_summary_table: RenderTable,
    pub result: TaxYearResult,
}

/// Runs the whole tax year computation: reads the statements and rates,
/// matches lots, computes gains and credits, and renders everything to
/// generic table models, to be fed to any of the output formatters.
pub fn run_app_to_render_model(
    statement_readers: Vec<DescribedReader>,
    rates_reader: &DescribedReader,
    config: &TaxConfig,
    render_full_values: bool,
    mut err_printer: WriteHandle,
) -> Result<AppRenderResult, Error> {
    let options = config.tax_year_options()?;
    let year = options.year_period();

    let statement = read_statements(&statement_readers, &mut err_printer)?;
    let rates = load_rate_table(rates_reader, config.rate_lookback_days, &mut err_printer)?;

    // Income outside the year is not reported, and may predate the rates.
    let dividends: Vec<_> = statement.dividends.into_iter()
        .filter(|d| year.contains(d.date))
        .collect();
    let interest: Vec<_> = statement.interest.into_iter()
        .filter(|i| year.contains(i.date))
        .collect();
    let income = IncomeReport::new(&dividends, &interest, &rates).map_err(|e| e.to_string())?;

    let result = compute_tax_year(statement.trades, &rates, &income, &options)
        .map_err(|e| e.to_string())?;

    let period_gains_tables = if result.periods.len() > 1 {
        result.periods.iter()
            .map(|p| (p.period.to_string(), render_gains_table_model(&p.report, render_full_values)))
            .collect()
    } else {
        Vec::new()
    };

    let mut annual_summary_table = render_annual_summary_table_model(&result, render_full_values);
    if let Some(taxpayer) = &config.taxpayer {
        annual_summary_table.notes.insert(0, format!("Taxpayer: {taxpayer}"));
    }

    Ok(AppRenderResult {
        tax_year: result.tax_year,
        period_gains_tables,
        year_gains_table: render_gains_table_model(&result.year_report, render_full_values),
        dividends_table: render_dividends_table_model(&result.income, render_full_values),
        interest_table: render_interest_table_model(&result.income, render_full_values),
        periods_table: render_periods_table_model(&result.periods, render_full_values),
        annual_summary_table,
        result,
    })
}

fn write_render_result(render_res: &AppRenderResult, writer: &mut dyn ReportWriter)
    -> Result<(), Error> {
    let year_name = render_res.tax_year.to_string();

    for (period_name, table) in &render_res.period_gains_tables {
        writer.print_render_table(OutputType::CapitalGains, period_name, table)
            .map_err(|e| format!("Rendering capital gains for {period_name}: {e}"))?;
    }
    writer.print_render_table(OutputType::CapitalGains, &year_name, &render_res.year_gains_table)
        .map_err(|e| format!("Rendering capital gains for {year_name}: {e}"))?;
    writer.print_render_table(OutputType::Dividends, &year_name, &render_res.dividends_table)
        .map_err(|e| format!("Rendering dividends: {e}"))?;
    writer.print_render_table(OutputType::Interest, &year_name, &render_res.interest_table)
        .map_err(|e| format!("Rendering interest: {e}"))?;
    writer.print_render_table(OutputType::PeriodSummary, &year_name, &render_res.periods_table)
        .map_err(|e| format!("Rendering period summary: {e}"))?;
    writer.print_render_table(
        OutputType::AnnualSummary, &year_name, &render_res.annual_summary_table)
        .map_err(|e| format!("Rendering annual summary: {e}"))?;
    Ok(())
}

/// Returned Err is for exit code determination only.
/// All errors are written to err_printer.
pub fn run_app_to_writer(
    mut writer: Box<dyn ReportWriter>,
    statement_readers: Vec<DescribedReader>,
    rates_reader: &DescribedReader,
    config: &TaxConfig,
    render_full_values: bool,
    mut err_printer: WriteHandle,
) -> Result<AppRenderResult, ()> {
    let res = run_app_to_render_model(
        statement_readers, rates_reader, config, render_full_values, err_printer.clone());

    let render_res = match res {
        Ok(render_res) => render_res,
        Err(e) => {
            write_errln!(err_printer, "{}", e);
            return Err(());
        }
    };

    if let Err(e) = write_render_result(&render_res, writer.as_mut()) {
        write_errln!(err_printer, "{}", e);
        return Err(());
    }
    if let Err(e) = writer.finish() {
        write_errln!(err_printer, "{}", e);
        return Err(());
    }

    Ok(render_res)
}

fn make_writer(options: &Options) -> Result<Box<dyn ReportWriter>, Error> {
    #[cfg(feature = "xlsx_write")]
    if let Some(path) = &options.xlsx_output_path {
        return Ok(Box::new(super::outfmt::xlsx::XlsxWriter::new(path)));
    }
    #[cfg(not(feature = "xlsx_write"))]
    if options.xlsx_output_path.is_some() {
        return Err("Spreadsheet output (xlsx_write) is not enabled".to_string());
    }

    match &options.csv_output_dir {
        Some(dir_path) => CsvWriter::new(dir_path)
            .map(|w| Box::new(w) as Box<dyn ReportWriter>)
            .map_err(|e| format!("Unable to use output directory {dir_path}: {e}")),
        None => Ok(Box::new(TextWriter::new(WriteHandle::stdout_write_handle()))),
    }
}

pub fn run_app_to_console(
    statement_readers: Vec<DescribedReader>,
    rates_reader: &DescribedReader,
    options: Options,
    mut err_printer: WriteHandle,
) -> Result<(), ()> {
    let writer = match make_writer(&options) {
        Ok(w) => w,
        Err(e) => {
            write_errln!(err_printer, "{e}");
            return Err(());
        }
    };

    let res = run_app_to_writer(
        writer, statement_readers, rates_reader, &options.config,
        options.render_full_values, err_printer.clone());

    if let Ok(render_res) = &res {
        let n_unmatched = render_res.result.unmatched.len();
        if n_unmatched > 0 {
            write_errln!(
                err_printer,
                "\n[!] {n_unmatched} sale(s) could not be fully matched to purchases. \
                 See the annual summary notes."
            );
        }
    }
    let _ = err_printer.flush();
    res.map(|_| ())
}

// MARK: Tests
#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        app::{
            config::{TaxConfig, TaxpayerInfo},
            outfmt::{model::ReportWriter, text::TextWriter},
        },
        portfolio::bookkeeping::UnmatchedClosePolicy,
        testlib::assert_re,
        util::rw::{DescribedReader, WriteHandle},
    };

    use super::{run_app_to_render_model, run_app_to_writer, AppRenderResult};

    const TRADES_HEADER: &str = "Trades,Header,DataDiscriminator,Asset Category,Currency,Symbol,\
Date/Time,Quantity,T. Price,C. Price,Proceeds,Comm/Fee,Basis,Realized P/L,MTM P/L,Code";

    fn statement(trades: &[&str]) -> Vec<DescribedReader> {
        let text = format!("{TRADES_HEADER}\n{}\n", trades.join("\n"));
        vec![DescribedReader::from_string("statement.csv".to_string(), text)]
    }

    fn rates() -> DescribedReader {
        DescribedReader::from_string(
            "rates.csv".to_string(),
            "2021-03-01,5\n2022-02-01,7\n2022-09-01,3\n".to_string(),
        )
    }

    fn config() -> TaxConfig {
        TaxConfig { tax_year: Some(2022), ..TaxConfig::default() }
    }

    fn smoke_test_render(render_res: &AppRenderResult) {
        let wh = if std::env::var("VERBOSE").unwrap_or_default().is_empty() {
            WriteHandle::empty_write_handle()
        } else {
            WriteHandle::stderr_write_handle()
        };
        let mut w = TextWriter::new(wh);
        w.print_render_table(
            crate::app::outfmt::model::OutputType::AnnualSummary,
            "2022", &render_res.annual_summary_table).unwrap();
    }

    #[test]
    fn test_two_halves() {
        // One share bought at rate 5, sold in H1 at rate 7 for a profit,
        // and one sold in H2 at rate 3 for a loss.
        let readers = statement(&[
            r#"Trades,Data,Order,Stocks,USD,FOO,"2021-03-01, 10:00:00",2,100,0,0,0,0,0,0,O"#,
            r#"Trades,Data,Order,Stocks,USD,FOO,"2022-02-01, 10:00:00",-1,150,0,0,0,0,0,0,C"#,
            r#"Trades,Data,Order,Stocks,USD,FOO,"2022-09-01, 10:00:00",-1,50,0,0,0,0,0,0,C"#,
        ]);
        let render_res = run_app_to_render_model(
            readers, &rates(), &config(), false, WriteHandle::empty_write_handle()).unwrap();
        smoke_test_render(&render_res);

        assert_eq!(render_res.period_gains_tables.len(), 2);
        assert_eq!(render_res.period_gains_tables[0].0, "2022-01-01 - 2022-06-30");
        assert_eq!(render_res.period_gains_tables[0].1.rows.len(), 1);
        assert_eq!(render_res.period_gains_tables[1].1.rows.len(), 1);
        assert_eq!(render_res.year_gains_table.rows.len(), 2);

        let result = &render_res.result;
        // 1050 - 500 * 7/5 = 350; and 150 - 500 = -350, real loss -150
        assert_eq!(result.year_report.total_profits, dec!(350));
        assert_eq!(result.year_report.total_losses, dec!(-150));
        // The H2 loss is credited against the H1 profit.
        assert_eq!(result.taxable_capital_gains(), dec!(200));
        assert_eq!(render_res.periods_table.rows.len(), 3);
    }

    #[test]
    fn test_unbalanced_ledger() {
        let sells = [
            r#"Trades,Data,Order,Stocks,USD,FOO,"2021-03-01, 10:00:00",1,100,0,0,0,0,0,0,O"#,
            r#"Trades,Data,Order,Stocks,USD,FOO,"2022-02-01, 10:00:00",-3,150,0,0,0,0,0,0,C"#,
        ];

        let (err_printer, err_buff) = WriteHandle::string_buff_write_handle();
        let res = run_app_to_writer(
            Box::new(TextWriter::new(WriteHandle::empty_write_handle())),
            statement(&sells), &rates(), &config(), false, err_printer);
        assert!(res.is_err());
        assert_re("FOO", err_buff.borrow().as_str());

        let lenient = TaxConfig {
            unmatched_close_policy: UnmatchedClosePolicy::Warn,
            split_half_year: false,
            taxpayer: Some(TaxpayerInfo { name: "Dana".to_string(), id_number: None }),
            ..config()
        };
        let render_res = run_app_to_render_model(
            statement(&sells), &rates(), &lenient, false,
            WriteHandle::empty_write_handle()).unwrap();
        assert!(render_res.period_gains_tables.is_empty());
        assert_eq!(render_res.year_gains_table.rows.len(), 1);
        assert_eq!(render_res.result.unmatched.len(), 1);
        assert_eq!(render_res.annual_summary_table.notes[0], "Taxpayer: Dana");
        assert_re("2 share\\(s\\) of FOO", &render_res.annual_summary_table.notes[1]);
    }

    #[test]
    fn test_missing_rate() {
        let readers = statement(&[
            r#"Trades,Data,Order,Stocks,USD,FOO,"2020-03-01, 10:00:00",1,100,0,0,0,0,0,0,O"#,
            r#"Trades,Data,Order,Stocks,USD,FOO,"2022-02-01, 10:00:00",-1,150,0,0,0,0,0,0,C"#,
        ]);
        let err = run_app_to_render_model(
            readers, &rates(), &config(), false, WriteHandle::empty_write_handle())
            .err().unwrap();
        assert_re("2020-03-01", &err);
    }

    #[test]
    fn test_no_tax_year() {
        let err = run_app_to_render_model(
            statement(&[]), &rates(), &TaxConfig::default(), false,
            WriteHandle::empty_write_handle())
            .err().unwrap();
        assert_re("No tax year", &err);
    }
}
