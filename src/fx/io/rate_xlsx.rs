use std::{path::Path, str::FromStr};

use calamine::{open_workbook_auto, Data, Reader};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use time::Date;
use tracing::debug;

use crate::{fx::DailyRate, util::date};

use super::Error;

const DATE_COL: usize = 0;
const RATE_COL: usize = 1;

fn cell_rate(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Float(f) => Decimal::from_f64(*f),
        Data::Int(i) => Decimal::from_i64(*i),
        Data::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn cell_date(cell: &Data) -> Option<Date> {
    match cell {
        Data::DateTime(dt) => date::date_from_excel_serial(dt.as_f64()),
        Data::Float(f) => date::date_from_excel_serial(*f),
        Data::Int(i) => date::date_from_excel_serial(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) =>
            date::parse_date_discarding_time(s).ok(),
        _ => None,
    }
}

/// Reads a Bank of Israel style rate export: the first sheet, dates in the
/// first column and rates in the second. Rows without a numeric rate (titles,
/// headers, notes) are skipped.
pub fn read_rates_xlsx(path: &Path) -> Result<Vec<DailyRate>, Error> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Unable to open {}: {e}", path.display()))?;
    let range = workbook.worksheet_range_at(0)
        .ok_or_else(|| format!("{} has no worksheets", path.display()))?
        .map_err(|e| format!("Unable to read first sheet of {}: {e}", path.display()))?;

    let mut rates = Vec::new();
    for (i, row) in range.rows().enumerate() {
        let rate = match row.get(RATE_COL).and_then(cell_rate) {
            Some(r) => r,
            None => {
                debug!("read_rates_xlsx: skipping row {} (no numeric rate)", i + 1);
                continue;
            },
        };
        let date_val = row.get(DATE_COL).and_then(cell_date)
            .ok_or_else(|| format!(
                "{}: row {} has a rate but no valid date", path.display(), i + 1))?;
        rates.push(DailyRate::new(date_val, rate));
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use calamine::Data;
    use rust_decimal_macros::dec;

    use crate::util::date::pub_testlib::ymd;

    use super::{cell_date, cell_rate};

    #[test]
    fn test_cells() {
        assert_eq!(cell_rate(&Data::Float(3.5)), Some(dec!(3.5)));
        assert_eq!(cell_rate(&Data::Int(4)), Some(dec!(4)));
        assert_eq!(cell_rate(&Data::String(" 3.51 ".to_string())), Some(dec!(3.51)));
        assert_eq!(cell_rate(&Data::String("Rate".to_string())), None);
        assert_eq!(cell_rate(&Data::Empty), None);

        assert_eq!(cell_date(&Data::Float(43466.0)), Some(ymd(2019, 1, 1)));
        assert_eq!(cell_date(&Data::String("2019-01-02".to_string())), Some(ymd(2019, 1, 2)));
        assert_eq!(cell_date(&Data::Empty), None);
    }
}
