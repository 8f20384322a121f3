use chrono::NaiveDate;
use thiserror::Error;

/// Human-readable description of the only accepted date layout.
pub const DATE_FORMAT_HINT: &str = "yyyy-MM-dd";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date `{input}`: expected {hint}", hint = DATE_FORMAT_HINT)]
pub struct DateParseError {
    pub input: String,
}

/// Parse a calendar date in strict `YYYY-MM-DD` form.
///
/// Exactly four year digits, two month digits and two day digits are required, and the
/// result must be a real calendar date (`2023-02-29` is rejected). No whitespace is
/// trimmed; callers accepting user input trim before calling.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let err = || DateParseError {
        input: input.to_string(),
    };

    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(err());
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit());
    if !digits_ok {
        return Err(err());
    }

    let year: i32 = input[0..4].parse().map_err(|_| err())?;
    let month: u32 = input[5..7].parse().map_err(|_| err())?;
    let day: u32 = input[8..10].parse().map_err(|_| err())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err)
}

/// Render a date in the same `YYYY-MM-DD` layout [`parse_date`] accepts.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
