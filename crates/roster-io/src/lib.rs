//! CSV input for roster records.
//!
//! Each source is a sequence of delimiter-separated lines with exactly eight fields:
//! `id, first name, last name, email, gender, country, domain name, birth date (yyyy-MM-dd)`.
//! There is no header row. Malformed lines are skipped with a [`Diagnostic`]; see
//! [`read_source`].

mod line;
mod options;
mod source;

pub use line::{parse_fields, LineError};
pub use options::{CsvOptions, TextEncoding};
pub use source::{
    read_source, Diagnostic, RecordSink, SinkClosed, Source, SourceError, SourceReport,
};

pub use roster_model::Record;
