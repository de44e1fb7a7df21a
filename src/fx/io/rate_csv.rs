use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{
    fx::DailyRate,
    util::{date, rw::{DescribedReader, WriteHandle}},
    write_errln,
};

use super::Error;

/// Reads `date,rate` rows. A leading header row is tolerated. Rows which
/// cannot be parsed are reported to err_stream and skipped.
pub fn read_rates_csv(reader: &DescribedReader, err_stream: &mut WriteHandle)
-> Result<Vec<DailyRate>, Error> {
    let desc = reader.desc().to_string();
    let r = reader.reader()
        .map_err(|e| format!("Unable to open {desc}: {e}"))?;

    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(r);

    let mut rates: Vec<DailyRate> = Vec::new();

    for (i, record_res) in csv_r.records().enumerate() {
        let line = i + 1;
        let record = match record_res {
            Ok(r) => r,
            Err(e) => {
                write_errln!(err_stream, "{desc}: error reading rates csv record {line}: {e}");
                continue;
            },
        };
        let (date_str, rate_str) = match (record.get(0), record.get(1)) {
            (Some(d), Some(r)) => (d, r),
            (Some(d), None) if d.is_empty() => continue,
            _ => {
                write_errln!(err_stream, "{desc}: line {line} does not have a date and a rate");
                continue;
            },
        };

        let date_val = match date::parse_date_discarding_time(date_str) {
            Ok(d) => d,
            Err(e) => {
                // The header, if any
                if line == 1 {
                    continue;
                }
                write_errln!(err_stream,
                    "{desc}: error parsing rates csv date \"{date_str}\" on line {line}: {e}");
                continue;
            },
        };

        let rate = match Decimal::from_str(rate_str) {
            Ok(d) => d,
            Err(e) => {
                write_errln!(err_stream,
                    "{desc}: error parsing rate \"{rate_str}\" for {date_val} on line {line}: {e}");
                continue;
            },
        };

        rates.push(DailyRate { date: date_val, foreign_to_local_rate: rate })
    }

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        fx::DailyRate,
        testlib::{assert_re, assert_vec_eq},
        util::{date::pub_testlib::doy_date, rw::{DescribedReader, WriteHandle}},
    };

    use super::read_rates_csv;

    fn read(s: &str, err_stream: &mut WriteHandle) -> Vec<DailyRate> {
        let reader = DescribedReader::from_string("rates".to_string(), s.to_string());
        read_rates_csv(&reader, err_stream).unwrap()
    }

    #[test]
    fn test_read_csv() {
        let date_yd = |year, doy| doy_date(year, doy);
        let dr = |date, rate| DailyRate { date, foreign_to_local_rate: rate };

        let (mut write_handle, err_buff) = WriteHandle::string_buff_write_handle();

        let res = read("2022-01-01,3.12
2022-01-02,3.13
2022-01-03,3.14", &mut write_handle);
        assert_vec_eq(
            res,
            vec![
                dr(date_yd(2022, 0), dec!(3.12)),
                dr(date_yd(2022, 1), dec!(3.13)),
                dr(date_yd(2022, 2), dec!(3.14)),
            ],
        );
        assert_eq!(err_buff.borrow().as_str(), "");

        // Empty csv
        assert_vec_eq(read("", &mut write_handle), vec![]);
        assert_eq!(err_buff.borrow().as_str(), "");

        // Header and empty rows (they are ignored)
        let res = read("date,rate

2022-01-02 , 3.12

2022-01-03,3.13
", &mut write_handle);
        assert_vec_eq(
            res,
            vec![
                dr(date_yd(2022, 1), dec!(3.12)),
                dr(date_yd(2022, 2), dec!(3.13)),
            ],
        );
        assert_eq!(err_buff.borrow().as_str(), "");
    }

    #[test]
    fn test_read_csv_bad_rows() {
        let (mut write_handle, err_buff) = WriteHandle::string_buff_write_handle();
        let res = read("2022-01-01,3.12
2022-13-02,3.13
2022-01-03,abc
2022-01-04
2022-01-05,3.15", &mut write_handle);
        assert_eq!(res.len(), 2);
        assert_eq!(res[1].foreign_to_local_rate, dec!(3.15));

        let errs = err_buff.borrow().as_str().to_string();
        let lines: Vec<&str> = errs.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_re("error parsing rates csv date \"2022-13-02\" on line 2", lines[0]);
        assert_re("error parsing rate \"abc\" for 2022-01-03 on line 3", lines[1]);
        assert_re("line 4 does not have a date and a rate", lines[2]);
    }
}
