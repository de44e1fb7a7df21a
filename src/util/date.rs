pub use time::Date;
use time::{macros::format_description, Duration, Month};

pub type StaticDateFormat<'a> =
    &'static [time::format_description::BorrowedFormatItem<'a>];

pub const STANDARD_DATE_FORMAT: StaticDateFormat =
    format_description!("[year]-[month]-[day]");

pub fn parse_standard_date(date_str: &str) -> Result<Date, time::error::Parse> {
    Date::parse(date_str.trim(), STANDARD_DATE_FORMAT)
}

/// Parses dates which may carry a trailing time component, such as
/// "2019-04-22, 14:04:29" or "2019-04-22 00:00:00". The time is discarded.
pub fn parse_date_discarding_time(s: &str) -> Result<Date, time::error::Parse> {
    let trimmed = s.trim();
    let date_part = trimmed
        .split(|c: char| c == ',' || c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    parse_standard_date(date_part)
}

// Serial of 9999-12-31, the last date spreadsheets can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

// Day zero of the 1900 date system, as used by spreadsheets
// (accounting for the fictional 1900-02-29).
fn excel_epoch() -> Date {
    Date::from_calendar_date(1899, Month::December, 30).unwrap()
}

/// Converts a spreadsheet serial date (days since the 1900 epoch) to a Date.
/// Any fractional (time of day) part is dropped.
pub fn date_from_excel_serial(serial: f64) -> Option<Date> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    excel_epoch().checked_add(Duration::days(serial.trunc() as i64))
}

pub fn first_day_of_year(year: i32) -> Date {
    Date::from_calendar_date(year, Month::January, 1).unwrap()
}

pub fn mid_year(year: i32) -> Date {
    Date::from_calendar_date(year, Month::July, 1).unwrap()
}

// Used by both unit and integration tests
pub mod pub_testlib {
    use time::{Date, Duration, Month};

    pub fn doy_date(year: u32, day: i64) -> Date {
        Date::from_calendar_date(year as i32, Month::January, 1)
            .unwrap()
            .saturating_add(Duration::days(day))
    }

    pub fn ymd(year: i32, month: u8, day: u8) -> Date {
        Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, Month};

    use super::{date_from_excel_serial, parse_date_discarding_time, parse_standard_date};

    #[test]
    fn test_parse() {
        let d = parse_standard_date("2023-01-21");
        assert_eq!(
            d.unwrap(),
            Date::from_calendar_date(2023, Month::January, 21).unwrap()
        );

        let d = parse_standard_date("2023-01-41");
        assert!(d.is_err());
    }

    #[test]
    fn test_parse_discarding_time() {
        let exp = Date::from_calendar_date(2019, Month::April, 22).unwrap();
        assert_eq!(parse_date_discarding_time("2019-04-22, 14:04:29").unwrap(), exp);
        assert_eq!(parse_date_discarding_time("2019-04-22 00:00:00").unwrap(), exp);
        assert_eq!(parse_date_discarding_time(" 2019-04-22").unwrap(), exp);
        assert!(parse_date_discarding_time("22/04/2019").is_err());
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(
            date_from_excel_serial(43466.0).unwrap(),
            Date::from_calendar_date(2019, Month::January, 1).unwrap()
        );
        // Time of day is ignored
        assert_eq!(
            date_from_excel_serial(43830.75).unwrap(),
            Date::from_calendar_date(2019, Month::December, 31).unwrap()
        );
        assert!(date_from_excel_serial(0.0).is_none());
        assert!(date_from_excel_serial(f64::NAN).is_none());
        assert_eq!(
            date_from_excel_serial(2_958_465.0).unwrap(),
            Date::from_calendar_date(9999, Month::December, 31).unwrap()
        );
        assert!(date_from_excel_serial(2_958_466.0).is_none());
        assert!(date_from_excel_serial(1e15).is_none());
    }
}
