use std::path::PathBuf;

use clap::Parser;

use crate::{
    app::{
        approot::{run_app_to_console, Options},
        config::{load_config, TaxConfig},
        input_parse::parse_non_negative_amount,
    },
    portfolio::bookkeeping::UnmatchedClosePolicy,
    util::{
        os::default_config_path,
        rw::{DescribedReader, WriteHandle},
    },
    write_errln,
};

pub type Error = String;

const ABOUT: &str = "Israeli capital gains tax calculator for foreign (USD) securities";

fn get_long_about() -> String {
    "\
A cli tool which computes the capital gains of a tax year, as reported to the
Israel Tax Authority, from Interactive Brokers activity statements.

Each sale is matched to purchases first-in first-out. Purchase prices are
converted to ILS at the purchase date's rate, and adjusted by the change in the
exchange rate until the sale, which separates the real gain from the
inflationary one. Losses offset gains first from previous years' carried losses,
then from this year's losses, across the half-years of the tax year.

The rate file contains USD to ILS rates, one 'date,rate' pair (YYYY-MM-DD) per
line, or is a Bank of Israel spreadsheet export (.xlsx). When a date has no rate,
the closest previous rate within the lookback window is used.

Settings may also be read from a json config file (see --config). Flags
override the config."
        .to_string()
}

#[derive(Parser, Debug)]
#[command(version = crate::app::ILCG_APP_VERSION,
          about = ABOUT, long_about = get_long_about())]
pub struct Args {
    /// Activity statement csv files. Trades of all files are combined, in order.
    #[arg(required = true)]
    pub statement_files: Vec<String>,

    /// USD/ILS exchange rates file (.csv or .xlsx)
    #[arg(short, long)]
    pub rates: String,

    #[arg(short = 'y', long)]
    pub tax_year: Option<i32>,

    /// Losses carried over from previous years, in ILS
    #[arg(long)]
    pub loss_from_prev_years: Option<String>,

    /// Splits the tax year into periods at this date (YYYY-MM-DD).
    /// May be provided multiple times. Replaces the default half-year split.
    #[arg(long)]
    pub split_date: Vec<String>,

    /// Report the tax year as a single period
    #[arg(long, default_value_t = false, conflicts_with = "split_date")]
    pub no_half_year_split: bool,

    /// How many days (including the date itself) to look back for an
    /// exchange rate, when a date has none
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Fail when a sale cannot be matched to purchases (default)
    #[arg(long, default_value_t = false, conflicts_with = "lenient")]
    pub strict: bool,

    /// Report sales which cannot be matched to purchases as notes, and continue
    #[arg(long, default_value_t = false)]
    pub lenient: bool,

    /// Json config file. Defaults to ~/.ilcg/config.json, if it exists.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write output as CSV to the specified directory.
    #[arg(short = 'd', long)]
    pub csv_output_dir: Option<String>,

    /// Write output to this xlsx file, one sheet per table.
    #[arg(short = 'x', long, conflicts_with = "csv_output_dir")]
    pub xlsx_output: Option<String>,

    /// Print all digits in output values
    #[arg(long, default_value_t = false)]
    pub print_full_values: bool,

    /// Print verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// The config file's settings, with the flags applied over them.
pub fn config_from_args(args: &Args) -> Result<TaxConfig, Error> {
    let config_path = args.config.as_ref().map(PathBuf::from).or_else(default_config_path);
    let mut config = match config_path {
        Some(path) => load_config(&path)?,
        None => TaxConfig::default(),
    };

    if let Some(year) = args.tax_year {
        config.tax_year = Some(year);
    }
    if let Some(loss) = &args.loss_from_prev_years {
        config.loss_from_prev_years = *parse_non_negative_amount(loss)
            .map_err(|e| format!("--loss-from-prev-years: {e}"))?;
    }
    if !args.split_date.is_empty() {
        config.split_dates = args.split_date.clone();
    }
    if args.no_half_year_split {
        config.split_half_year = false;
        config.split_dates.clear();
    }
    if let Some(days) = args.lookback_days {
        config.rate_lookback_days = days;
    }
    if args.strict {
        config.unmatched_close_policy = UnmatchedClosePolicy::Fail;
    } else if args.lenient {
        config.unmatched_close_policy = UnmatchedClosePolicy::Warn;
    }
    Ok(config)
}

pub fn command_main() -> Result<(), ()> {
    let args = Args::parse();

    if args.verbose {
        crate::tracing::enable_trace_env("ilcg=debug");
    }
    crate::tracing::setup_tracing();
    tracing::debug!("{:#?}", args);

    let mut err_printer = WriteHandle::stderr_write_handle();

    let config = match config_from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            write_errln!(err_printer, "{e}");
            return Err(());
        }
    };

    let statement_readers = args.statement_files.iter()
        .map(|f| DescribedReader::from_file_path(PathBuf::from(f)))
        .collect();
    let rates_reader = DescribedReader::from_file_path(PathBuf::from(&args.rates));

    let options = Options {
        config,
        render_full_values: args.print_full_values,
        csv_output_dir: args.csv_output_dir,
        xlsx_output_path: args.xlsx_output,
    };

    run_app_to_console(statement_readers, &rates_reader, options, err_printer)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rust_decimal_macros::dec;

    use crate::{portfolio::bookkeeping::UnmatchedClosePolicy, testlib::assert_re};

    use super::{config_from_args, Args};

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["ilcg", "stmt.csv", "-r", "rates.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_arg_parsing() {
        let args = parse(&["-y", "2022", "--split-date", "2022-04-01", "--split-date",
                           "2022-10-01", "--lenient", "-x", "out.xlsx"]);
        assert_eq!(args.statement_files, vec!["stmt.csv".to_string()]);
        assert_eq!(args.rates, "rates.csv");
        assert_eq!(args.tax_year, Some(2022));
        assert_eq!(args.split_date.len(), 2);
        assert!(args.lenient);
        assert_eq!(args.xlsx_output, Some("out.xlsx".to_string()));

        assert!(Args::try_parse_from(["ilcg", "-r", "rates.csv"]).is_err());
        assert!(Args::try_parse_from(["ilcg", "stmt.csv"]).is_err());
        assert!(Args::try_parse_from(
            ["ilcg", "stmt.csv", "-r", "r.csv", "--strict", "--lenient"]).is_err());
        assert!(Args::try_parse_from(
            ["ilcg", "stmt.csv", "-r", "r.csv", "-d", "out", "-x", "out.xlsx"]).is_err());
        assert!(Args::try_parse_from(
            ["ilcg", "stmt.csv", "-r", "r.csv", "--split-date", "2022-04-01",
             "--no-half-year-split"]).is_err());
    }

    #[test]
    fn test_config_overrides() {
        let dir = std::env::temp_dir().join(format!("ilcg-cmd-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("config.json");
        std::fs::write(
            &config_path,
            r#"{"tax_year": 2021, "loss_from_prev_years": 100, "unmatched_close_policy": "warn"}"#,
        ).unwrap();
        let config_arg = config_path.to_str().unwrap();

        let config = config_from_args(&parse(&["-c", config_arg])).unwrap();
        assert_eq!(config.tax_year, Some(2021));
        assert_eq!(config.loss_from_prev_years, dec!(100));
        assert_eq!(config.unmatched_close_policy, UnmatchedClosePolicy::Warn);

        let config = config_from_args(&parse(&[
            "-c", config_arg, "-y", "2022", "--loss-from-prev-years", "2,500",
            "--strict", "--no-half-year-split", "--lookback-days", "3",
        ])).unwrap();
        assert_eq!(config.tax_year, Some(2022));
        assert_eq!(config.loss_from_prev_years, dec!(2500));
        assert_eq!(config.unmatched_close_policy, UnmatchedClosePolicy::Fail);
        assert!(!config.split_half_year);
        assert_eq!(config.rate_lookback_days, 3);
        assert_eq!(config.tax_year_options().unwrap().periods().len(), 1);

        let err = config_from_args(&parse(&[
            "-c", config_arg, "--loss-from-prev-years=-5"])).unwrap_err();
        assert_re("--loss-from-prev-years", &err);

        let missing = dir.join("missing.json");
        let err = config_from_args(&parse(&["-c", missing.to_str().unwrap()])).unwrap_err();
        assert_re("Unable to read config", &err);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
