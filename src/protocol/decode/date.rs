//! DATE and TIME text codecs.
//!
//! RFC dates are 8 characters `YYYYMMDD` and times are 6 characters
//! `HHMMSS`. The initial date is `00000000`; a blank or empty field is
//! treated the same way.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveTime};

pub const INITIAL_DATE: &str = "00000000";
pub const INITIAL_TIME: &str = "000000";

/// Format a date as `YYYYMMDD`.
pub fn format_date(date: NaiveDate) -> Result<String> {
    let text = date.format("%Y%m%d").to_string();
    if text.len() != 8 {
        return Err(Error::type_conversion(format!(
            "date {} is outside the representable range",
            date
        )));
    }
    Ok(text)
}

/// Format a time as `HHMMSS`.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H%M%S").to_string()
}

/// Parse `YYYYMMDD` text. Returns `None` for the initial date.
pub fn parse_date(text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() || text == INITIAL_DATE {
        return Ok(None);
    }
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::type_conversion(format!(
            "{:?} is not a date in YYYYMMDD form",
            text
        )));
    }
    NaiveDate::parse_from_str(text, "%Y%m%d")
        .map(Some)
        .map_err(|e| Error::type_conversion(format!("invalid date {:?}: {}", text, e)))
}

/// Parse `HHMMSS` text. Returns `None` for a blank field.
pub fn parse_time(text: &str) -> Result<Option<NaiveTime>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::type_conversion(format!(
            "{:?} is not a time in HHMMSS form",
            text
        )));
    }
    NaiveTime::parse_from_str(text, "%H%M%S")
        .map(Some)
        .map_err(|e| Error::type_conversion(format!("invalid time {:?}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_2024_10_21() {
        let date = parse_date("20241021").unwrap().unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 10);
        assert_eq!(date.day(), 21);
        assert_eq!(format_date(date).unwrap(), "20241021");
    }

    #[test]
    fn test_parse_date_initial() {
        assert_eq!(parse_date("00000000").unwrap(), None);
        assert_eq!(parse_date("        ").unwrap(), None);
        assert_eq!(parse_date("").unwrap(), None);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("20241301").is_err()); // month 13
        assert!(parse_date("20240230").is_err()); // Feb 30
        assert!(parse_date("2024-10-21").is_err());
        assert!(parse_date("2024102").is_err());
    }

    #[test]
    fn test_parse_time() {
        let time = parse_time("123605").unwrap().unwrap();
        assert_eq!(time.hour(), 12);
        assert_eq!(time.minute(), 36);
        assert_eq!(time.second(), 5);
        assert_eq!(format_time(time), "123605");
        assert_eq!(parse_time("000000").unwrap(), NaiveTime::from_hms_opt(0, 0, 0));
    }

    #[test]
    fn test_parse_time_invalid() {
        assert!(parse_time("246000").is_err());
        assert!(parse_time("12:36:05").is_err());
    }

    #[test]
    fn test_format_date_out_of_range() {
        let date = NaiveDate::from_ymd_opt(12345, 1, 1).unwrap();
        assert!(format_date(date).is_err());
    }
}
