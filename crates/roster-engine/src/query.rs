//! Stateless filter and sort operations over record sequences.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use roster_model::{parse_date, Field, Record, DATE_FORMAT_HINT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(
        "invalid date format `{input}`: please enter a date in {hint} format",
        hint = DATE_FORMAT_HINT
    )]
    InvalidDateFormat { input: String },
    #[error("wrong dates are provided: from date {from} is after to date {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
    #[error("invalid field `{0}`")]
    InvalidField(String),
    #[error("invalid column {0}")]
    InvalidColumn(usize),
}

/// Inclusive birth-date bounds. At least one bound is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range from already-parsed bounds.
    ///
    /// Returns `Ok(None)` when both bounds are absent (filtering disabled).
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<Self>, QueryError> {
        match (from, to) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) if from > to => Err(QueryError::InvalidDateRange { from, to }),
            (from, to) => Ok(Some(Self { from, to })),
        }
    }

    /// Parse user-entered bounds. Blank input means "no bound".
    ///
    /// Both inputs are checked for format before the range itself is validated, so a
    /// malformed date is always reported as [`QueryError::InvalidDateFormat`].
    pub fn parse(from: &str, to: &str) -> Result<Option<Self>, QueryError> {
        let from = parse_bound(from)?;
        let to = parse_bound(to)?;
        Self::new(from, to)
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from, self.to) {
            (Some(from), Some(to)) => write!(f, "{from}..={to}"),
            (Some(from), None) => write!(f, "{from}.."),
            (None, Some(to)) => write!(f, "..={to}"),
            (None, None) => f.write_str(".."),
        }
    }
}

fn parse_bound(input: &str) -> Result<Option<NaiveDate>, QueryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed)
        .map(Some)
        .map_err(|_| QueryError::InvalidDateFormat {
            input: input.to_string(),
        })
}

/// Records whose birth date falls in `range`, in their existing order.
pub fn filter(records: &[Arc<Record>], range: &DateRange) -> Vec<Arc<Record>> {
    records
        .iter()
        .filter(|record| range.contains(record.birth_date()))
        .cloned()
        .collect()
}

/// Stable sort on `field`.
///
/// Descending order reverses the comparator, not the result: records with equal keys keep
/// their prior relative order in both directions.
pub fn sort(records: &mut [Arc<Record>], field: Field, ascending: bool) {
    records.sort_by(|a, b| {
        let ord = field.compare(a, b);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

/// A sort column as supplied by a front end: a column index or a field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Field(Field),
    Column(usize),
    Name(String),
}

impl SortKey {
    pub fn resolve(&self) -> Result<Field, QueryError> {
        match self {
            SortKey::Field(field) => Ok(*field),
            SortKey::Column(index) => {
                Field::from_index(*index).ok_or(QueryError::InvalidColumn(*index))
            }
            SortKey::Name(name) => name
                .parse()
                .map_err(|_| QueryError::InvalidField(name.clone())),
        }
    }
}

impl From<Field> for SortKey {
    fn from(value: Field) -> Self {
        SortKey::Field(value)
    }
}

impl From<usize> for SortKey {
    fn from(value: usize) -> Self {
        SortKey::Column(value)
    }
}

impl From<&str> for SortKey {
    /// All-digit input is a column index; anything else is a field name.
    fn from(value: &str) -> Self {
        match column_index(value) {
            Some(index) => SortKey::Column(index),
            None => SortKey::Name(value.to_string()),
        }
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        match column_index(&value) {
            Some(index) => SortKey::Column(index),
            None => SortKey::Name(value),
        }
    }
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortKey::from(s))
    }
}

fn column_index(input: &str) -> Option<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Field(field) => write!(f, "{field}"),
            SortKey::Column(index) => write!(f, "column {index}"),
            SortKey::Name(name) => f.write_str(name),
        }
    }
}
