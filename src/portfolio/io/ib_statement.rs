//! Reads Interactive Brokers activity statements (csv export).
//!
//! The export concatenates several tables. Every line starts with the name of
//! the section it belongs to and a row kind (Header, Data, SubTotal, Total).
//! A Header row names the columns of the Data rows of its section which follow.
use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use lazy_static::lazy_static;
use rust_decimal::Decimal;
use time::Date;
use tracing::{debug, info};

use crate::{
    portfolio::{Dividend, Interest, Trade, TradeAction},
    util::{
        date::parse_date_discarding_time,
        rw::{DescribedReader, WriteHandle},
    },
    write_errln,
};

type Error = String;

pub struct IbSection;

impl IbSection {
    pub const TRADES: &'static str = "Trades";
    pub const DIVIDENDS: &'static str = "Dividends";
    pub const WITHHOLDING_TAX: &'static str = "Withholding Tax";
    pub const INTEREST: &'static str = "Interest";
}

struct IbCol;

impl IbCol {
    const DATA_DISCRIMINATOR: &'static str = "DataDiscriminator";
    const CURRENCY: &'static str = "Currency";
    const SYMBOL: &'static str = "Symbol";
    const DATE_TIME: &'static str = "Date/Time";
    const QUANTITY: &'static str = "Quantity";
    const T_PRICE: &'static str = "T. Price";
    const COMM_FEE: &'static str = "Comm/Fee";
    const REALIZED_PL: &'static str = "Realized P/L";
    const CODE: &'static str = "Code";
    const DATE: &'static str = "Date";
    const DESCRIPTION: &'static str = "Description";
    const AMOUNT: &'static str = "Amount";
}

const SUPPORTED_CURRENCY: &str = "USD";

lazy_static! {
    // "AAPL(US0378331005) Cash Dividend USD 0.77 per Share (Ordinary Dividend)"
    static ref DIVIDEND_SYMBOL_REGEXP: regex::Regex =
        regex::Regex::new(r"^\s*([^(]+?)\s*\(").unwrap();
}

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Statement {
    pub trades: Vec<Trade>,
    pub dividends: Vec<Dividend>,
    pub interest: Vec<Interest>,
}

impl Statement {
    pub fn append(&mut self, mut other: Statement) {
        self.trades.append(&mut other.trades);
        self.dividends.append(&mut other.dividends);
        self.interest.append(&mut other.interest);
    }

    pub fn next_read_index(&self) -> u32 {
        self.trades.iter().map(|t| t.read_index + 1).max().unwrap_or(0)
    }
}

// A Data row, along with the column names of its section.
struct DataRow<'a> {
    desc: &'a str,
    line: u64,
    section: &'a str,
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> DataRow<'a> {
    fn err(&self, msg: String) -> Error {
        format!("{}, line {} ({}): {}", self.desc, self.line, self.section, msg)
    }

    fn opt_get(&self, col: &str) -> Option<&'a str> {
        self.columns.get(col).and_then(|i| self.record.get(*i + 2)).map(|s| s.trim())
    }

    fn get(&self, col: &str) -> Result<&'a str, Error> {
        self.opt_get(col)
            .ok_or_else(|| self.err(format!("no value in column \"{col}\"")))
    }

    fn get_dec(&self, col: &str) -> Result<Decimal, Error> {
        let s = self.get(col)?;
        Decimal::from_str(&s.replace(',', ""))
            .map_err(|e| self.err(format!("invalid number \"{s}\" in {col}: {e}")))
    }

    fn get_opt_dec(&self, col: &str) -> Result<Option<Decimal>, Error> {
        match self.opt_get(col) {
            None | Some("") | Some("--") => Ok(None),
            Some(_) => self.get_dec(col).map(Some),
        }
    }

    fn get_date(&self, col: &str) -> Result<Date, Error> {
        let s = self.get(col)?;
        parse_date_discarding_time(s)
            .map_err(|e| self.err(format!("invalid date \"{s}\" in {col}: {e}")))
    }
}

fn parse_trade_action(code: &str) -> Option<TradeAction> {
    let tokens: HashSet<&str> = code.split(';').map(|t| t.trim()).collect();
    if tokens.contains("O") {
        Some(TradeAction::Open)
    } else if tokens.contains("C") {
        Some(TradeAction::Close)
    } else {
        None
    }
}

fn is_total_currency(currency: &str) -> bool {
    currency.starts_with("Total")
}

fn dividend_symbol(description: &str) -> Option<String> {
    DIVIDEND_SYMBOL_REGEXP
        .captures(description)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

struct StatementParser<'a> {
    err_stream: &'a mut WriteHandle,
    statement: Statement,
    next_read_index: u32,
    // Withholding rows, resolved once all dividends are known
    withholdings: Vec<(String, Date, Decimal, u64)>,
}

impl<'a> StatementParser<'a> {
    fn parse_trade(&mut self, row: &DataRow) -> Result<(), Error> {
        if row.opt_get(IbCol::DATA_DISCRIMINATOR) == Some("ClosedLot") {
            return Ok(());
        }
        let code = row.opt_get(IbCol::CODE).unwrap_or("");
        let action = match parse_trade_action(code) {
            Some(a) => a,
            None => {
                if !code.is_empty() {
                    write_errln!(
                        self.err_stream,
                        "Warning: {}, line {}: skipping trade with unrecognized code \"{}\"",
                        row.desc, row.line, code
                    );
                }
                return Ok(());
            }
        };

        let currency = row.get(IbCol::CURRENCY)?;
        if currency != SUPPORTED_CURRENCY {
            return Err(row.err(format!(
                "trade in {currency}. Only {SUPPORTED_CURRENCY} trades are supported"
            )));
        }

        let quantity = row.get(IbCol::QUANTITY)?;
        let shares = i64::from_str(&quantity.replace(',', "")).map_err(|e| {
            row.err(format!("invalid share quantity \"{quantity}\": {e}"))
        })?;

        let trade = Trade {
            symbol: row.get(IbCol::SYMBOL)?.to_string(),
            trade_date: row.get_date(IbCol::DATE_TIME)?,
            action,
            shares,
            unit_price: row.get_dec(IbCol::T_PRICE)?,
            // Fees are reported as negative amounts
            commission: row.get_dec(IbCol::COMM_FEE)?.abs(),
            realized_pl: match action {
                TradeAction::Close => row.get_opt_dec(IbCol::REALIZED_PL)?,
                TradeAction::Open => None,
            },
            read_index: self.next_read_index,
        };
        self.next_read_index += 1;
        self.statement.trades.push(trade);
        Ok(())
    }

    fn parse_dividend(&mut self, row: &DataRow) -> Result<(), Error> {
        let currency = row.get(IbCol::CURRENCY)?;
        if is_total_currency(currency) {
            return Ok(());
        }
        let description = row.get(IbCol::DESCRIPTION)?;
        if currency != SUPPORTED_CURRENCY {
            write_errln!(
                self.err_stream,
                "Warning: {}, line {}: skipping {} dividend \"{}\"",
                row.desc, row.line, currency, description
            );
            return Ok(());
        }
        let symbol = dividend_symbol(description).ok_or_else(|| {
            row.err(format!("no symbol found in dividend description \"{description}\""))
        })?;
        self.statement.dividends.push(Dividend {
            symbol,
            date: row.get_date(IbCol::DATE)?,
            currency: currency.to_string(),
            amount: row.get_dec(IbCol::AMOUNT)?,
            tax_withheld: Decimal::ZERO,
            description: description.to_string(),
        });
        Ok(())
    }

    fn parse_withholding(&mut self, row: &DataRow) -> Result<(), Error> {
        let currency = row.get(IbCol::CURRENCY)?;
        if is_total_currency(currency) {
            return Ok(());
        }
        let description = row.get(IbCol::DESCRIPTION)?;
        if currency != SUPPORTED_CURRENCY {
            write_errln!(
                self.err_stream,
                "Warning: {}, line {}: skipping {} withholding tax \"{}\"",
                row.desc, row.line, currency, description
            );
            return Ok(());
        }
        let symbol = dividend_symbol(description).ok_or_else(|| {
            row.err(format!("no symbol found in withholding description \"{description}\""))
        })?;
        // Withheld amounts are negative (refunds positive)
        let withheld = -row.get_dec(IbCol::AMOUNT)?;
        self.withholdings.push((symbol, row.get_date(IbCol::DATE)?, withheld, row.line));
        Ok(())
    }

    fn parse_interest(&mut self, row: &DataRow) -> Result<(), Error> {
        let currency = row.get(IbCol::CURRENCY)?;
        if is_total_currency(currency) {
            return Ok(());
        }
        let description = row.get(IbCol::DESCRIPTION)?;
        if currency != SUPPORTED_CURRENCY {
            write_errln!(
                self.err_stream,
                "Warning: {}, line {}: skipping {} interest \"{}\"",
                row.desc, row.line, currency, description
            );
            return Ok(());
        }
        self.statement.interest.push(Interest {
            date: row.get_date(IbCol::DATE)?,
            currency: currency.to_string(),
            amount: row.get_dec(IbCol::AMOUNT)?,
            description: description.to_string(),
        });
        Ok(())
    }

    fn resolve_withholdings(&mut self, desc: &str) {
        let withholdings = std::mem::take(&mut self.withholdings);
        for (symbol, date, withheld, line) in withholdings {
            match self
                .statement
                .dividends
                .iter_mut()
                .find(|d| d.symbol == symbol && d.date == date)
            {
                Some(d) => d.tax_withheld += withheld,
                None => write_errln!(
                    self.err_stream,
                    "Warning: {}, line {}: withholding tax of {} for {} on {} has no \
                     matching dividend",
                    desc, line, withheld, symbol, date
                ),
            }
        }
    }
}

/// Parses one activity statement. Trades are numbered (read_index) from
/// `first_read_index`, in the order they appear.
pub fn read_statement(
    reader: &DescribedReader,
    first_read_index: u32,
    err_stream: &mut WriteHandle,
) -> Result<Statement, Error> {
    let desc = reader.desc().to_string();
    let r = reader.reader().map_err(|e| format!("Unable to open {desc}: {e}"))?;

    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(r);

    let mut parser = StatementParser {
        err_stream,
        statement: Statement::default(),
        next_read_index: first_read_index,
        withholdings: Vec::new(),
    };
    let mut section_columns: HashMap<String, HashMap<String, usize>> = HashMap::new();
    let wanted_sections = [
        IbSection::TRADES,
        IbSection::DIVIDENDS,
        IbSection::WITHHOLDING_TAX,
        IbSection::INTEREST,
    ];

    for record_res in csv_r.records() {
        let record = record_res.map_err(|e| format!("Error reading {desc}: {e}"))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let (section, kind) = match (record.get(0), record.get(1)) {
            (Some(s), Some(k)) => (s.trim(), k.trim()),
            _ => continue,
        };
        if !wanted_sections.contains(&section) {
            continue;
        }

        match kind {
            "Header" => {
                let columns = record
                    .iter()
                    .skip(2)
                    .enumerate()
                    .map(|(i, c)| (c.trim().to_string(), i))
                    .collect();
                section_columns.insert(section.to_string(), columns);
            }
            "Data" => {
                let columns = section_columns.get(section).ok_or_else(|| {
                    format!("{desc}, line {line}: {section} data found before its header")
                })?;
                let row = DataRow { desc: &desc, line, section, columns, record: &record };
                match section {
                    IbSection::TRADES => parser.parse_trade(&row)?,
                    IbSection::DIVIDENDS => parser.parse_dividend(&row)?,
                    IbSection::WITHHOLDING_TAX => parser.parse_withholding(&row)?,
                    IbSection::INTEREST => parser.parse_interest(&row)?,
                    _ => (),
                }
            }
            _ => debug!("{}, line {}: skipping {} {} row", desc, line, section, kind),
        }
    }

    parser.resolve_withholdings(&desc);
    let statement = parser.statement;
    info!(
        "Read {} trades, {} dividends and {} interest payments from {}",
        statement.trades.len(), statement.dividends.len(), statement.interest.len(), desc
    );
    Ok(statement)
}

/// Reads several statements, in order, into one. read_index keeps counting
/// across them.
pub fn read_statements(
    readers: &[DescribedReader],
    err_stream: &mut WriteHandle,
) -> Result<Statement, Error> {
    let mut all = Statement::default();
    for reader in readers {
        let s = read_statement(reader, all.next_read_index(), err_stream)?;
        all.append(s);
    }
    Ok(all)
}
