use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::format_date;
use crate::field::{Field, FIELD_COUNT};

/// Record identifier.
///
/// Identifiers read from source files are arbitrary (possibly negative or duplicated); once a
/// store has been renumbered they form the contiguous sequence `1..=N`.
pub type RecordId = i64;

/// One person's imported data row.
///
/// Records are immutable once constructed. Renumbering produces a fresh copy via
/// [`Record::with_id`] instead of mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    id: RecordId,
    first_name: String,
    last_name: String,
    email: String,
    gender: String,
    country: String,
    domain_name: String,
    birth_date: NaiveDate,
}

impl Record {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RecordId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        gender: impl Into<String>,
        country: impl Into<String>,
        domain_name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            gender: gender.into(),
            country: country.into(),
            domain_name: domain_name.into(),
            birth_date,
        }
    }

    /// Copy of this record carrying a different identifier.
    pub fn with_id(&self, id: RecordId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    /// Text value of a string-typed field, or `None` for `Id` / `BirthDate`.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::FirstName => Some(&self.first_name),
            Field::LastName => Some(&self.last_name),
            Field::Email => Some(&self.email),
            Field::Gender => Some(&self.gender),
            Field::Country => Some(&self.country),
            Field::DomainName => Some(&self.domain_name),
            Field::Id | Field::BirthDate => None,
        }
    }

    /// Display cells in column order (see [`crate::COLUMN_HEADERS`]).
    pub fn cells(&self) -> [String; FIELD_COUNT] {
        Field::ALL.map(|field| field.cell(self))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}, {}",
            self.id,
            self.first_name,
            self.last_name,
            self.email,
            self.gender,
            self.country,
            self.domain_name,
            format_date(self.birth_date)
        )
    }
}
