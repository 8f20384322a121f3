//! In-memory engine for roster person records.
//!
//! Several CSV sources are ingested concurrently into one shared [`RecordStore`]; once
//! loading settles the store is renumbered to contiguous identifiers and served through a
//! [`Roster`] session that supports birth-date filtering and stable single-column sorting.
//!
//! The crate exposes:
//! - [`ingest`]: bounded-wait worker pool over `roster-io` sources
//! - [`RecordStore`]: the mutex-guarded collection with its one-time renumbering
//! - [`query`]: stateless filter/sort helpers
//! - [`Roster`]: the `load_data` / `filter_by_date` / `sort_by` / `current_view` commands

mod config;
mod error;
pub mod ingest;
pub mod query;
mod session;
mod store;
mod view;

pub use config::{ConfigError, RosterConfig};
pub use error::CommandError;
pub use ingest::{
    ingest, IngestError, IngestOptions, IngestOutcome, IngestReport, SourceOutcome,
    DEFAULT_INGEST_TIMEOUT,
};
pub use query::{DateRange, QueryError, SortKey};
pub use session::{FilterOutcome, LoadStatus, LoadSummary, Roster};
pub use store::{renumber, RecordStore};
pub use view::ViewSnapshot;

pub use roster_io::{CsvOptions, Diagnostic, Source, TextEncoding};
pub use roster_model::{Field, Record, RecordId, COLUMN_HEADERS};
