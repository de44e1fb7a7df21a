mod rate_csv;
#[cfg(feature = "xlsx_read")]
mod rate_xlsx;

use std::path::Path;

use tracing::info;

use crate::util::rw::{DescribedReader, WriteHandle};

use super::{RateTable, DailyRate};

pub type Error = String;

// Exports
pub use self::rate_csv::*;
#[cfg(feature = "xlsx_read")]
pub use self::rate_xlsx::*;

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn read_rates(reader: &DescribedReader, err_stream: &mut WriteHandle)
-> Result<Vec<DailyRate>, Error> {
    if let DescribedReader::FilePath(path) = reader {
        if has_extension(path, "xlsx") || has_extension(path, "xls") {
            #[cfg(feature = "xlsx_read")]
            return read_rates_xlsx(path);
            #[cfg(not(feature = "xlsx_read"))]
            return Err(format!(
                "Cannot read {}: spreadsheet support (xlsx_read) is not enabled",
                path.display()));
        }
    }
    read_rates_csv(reader, err_stream)
}

/// Loads a rate file (csv, or a spreadsheet by extension) into a RateTable
/// resolving with the given lookback window.
pub fn load_rate_table(
    reader: &DescribedReader,
    lookback_days: u32,
    err_stream: &mut WriteHandle,
) -> Result<RateTable, Error> {
    let desc = reader.desc();
    let rates = read_rates(reader, err_stream)?;
    if rates.is_empty() {
        return Err(format!("No exchange rates found in {desc}"));
    }
    let table = RateTable::new(rates, lookback_days)
        .map_err(|e| format!("Invalid rates in {desc}: {e}"))?;
    info!(
        "Loaded {} rates from {} ({:?} to {:?})",
        table.len(), desc, table.first_date(), table.last_date()
    );
    Ok(table)
}
