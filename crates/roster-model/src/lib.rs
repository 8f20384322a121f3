//! `roster-model` defines the core in-memory person record types.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the CSV ingestion layer (`roster-io`)
//! - the store/query engine (`roster-engine`)
//! - front ends that render or serialize rows via `serde`

mod date;
mod field;
mod record;

pub use date::{format_date, parse_date, DateParseError, DATE_FORMAT_HINT};
pub use field::{Field, UnknownField, COLUMN_HEADERS, FIELD_COUNT};
pub use record::{Record, RecordId};
