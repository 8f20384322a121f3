use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::format_date;
use crate::Record;

/// Number of columns in a record (and fields in a source line).
pub const FIELD_COUNT: usize = 8;

/// Column headers in display order.
pub const COLUMN_HEADERS: [&str; FIELD_COUNT] = [
    "ID",
    "First Name",
    "Last Name",
    "Email",
    "Gender",
    "Country",
    "Domain Name",
    "Birth Date",
];

/// One column of a [`Record`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    FirstName,
    LastName,
    Email,
    Gender,
    Country,
    DomainName,
    BirthDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field `{0}`")]
pub struct UnknownField(pub String);

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Id,
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::Gender,
        Field::Country,
        Field::DomainName,
        Field::BirthDate,
    ];

    /// 0-based column index.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Field> {
        Self::ALL.get(index).copied()
    }

    pub fn header(self) -> &'static str {
        COLUMN_HEADERS[self.index()]
    }

    /// Canonical snake_case name (`first_name`, `birth_date`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Email => "email",
            Field::Gender => "gender",
            Field::Country => "country",
            Field::DomainName => "domain_name",
            Field::BirthDate => "birth_date",
        }
    }

    /// Compare two records on this field.
    ///
    /// Identifiers compare numerically, birth dates chronologically and every other field by
    /// byte order of its UTF-8 text (which equals code point order).
    pub fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            Field::Id => a.id().cmp(&b.id()),
            Field::BirthDate => a.birth_date().cmp(&b.birth_date()),
            text => a.text(text).cmp(&b.text(text)),
        }
    }

    /// Display text of this field for `record`.
    pub fn cell(self, record: &Record) -> String {
        match self {
            Field::Id => record.id().to_string(),
            Field::BirthDate => format_date(record.birth_date()),
            text => record.text(text).unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    /// Accepts `first_name`, `firstName` and `First Name` spellings, ASCII case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let field = match folded.as_str() {
            "id" => Field::Id,
            "firstname" => Field::FirstName,
            "lastname" => Field::LastName,
            "email" => Field::Email,
            "gender" => Field::Gender,
            "country" => Field::Country,
            "domainname" | "domain" => Field::DomainName,
            "birthdate" => Field::BirthDate,
            _ => return Err(UnknownField(s.to_string())),
        };
        Ok(field)
    }
}
