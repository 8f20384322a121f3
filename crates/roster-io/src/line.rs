use roster_model::{parse_date, Record, RecordId, FIELD_COUNT};
use thiserror::Error;

/// Why a single source line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid identifier `{value}`")]
    Identifier { value: String },
    #[error("invalid birth date `{value}`: expected yyyy-MM-dd")]
    BirthDate { value: String },
    #[error("invalid UTF-8 in column {column}")]
    Encoding { column: usize },
}

/// Build a [`Record`] from the decoded fields of one line.
///
/// Fields are, in order: id, first name, last name, email, gender, country, domain name,
/// birth date. The identifier is checked before the birth date.
pub fn parse_fields<S: AsRef<str>>(fields: &[S]) -> Result<Record, LineError> {
    if fields.len() != FIELD_COUNT {
        return Err(LineError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }
    let field = |idx: usize| fields[idx].as_ref();

    let id: RecordId = field(0).parse().map_err(|_| LineError::Identifier {
        value: field(0).to_string(),
    })?;
    let birth_date = parse_date(field(7)).map_err(|_| LineError::BirthDate {
        value: field(7).to_string(),
    })?;

    Ok(Record::new(
        id,
        field(1),
        field(2),
        field(3),
        field(4),
        field(5),
        field(6),
        birth_date,
    ))
}
