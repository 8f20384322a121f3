use thiserror::Error;

use crate::query::QueryError;

/// Failure of a command issued through [`crate::Roster`].
///
/// Query and sort failures never change session state. `IngestionTimedOut` is only raised
/// when the config asks for it, and the records that did arrive stay loaded.
///
/// The `Display` text is meant for end users; [`CommandError::kind`] is a stable tag for
/// front ends that need to branch on the cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no data loaded yet; load data first")]
    NotLoaded,
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("data loading did not finish in time; still running: {}", .still_running.join(", "))]
    IngestionTimedOut { still_running: Vec<String> },
}

impl CommandError {
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::NotLoaded => "not_loaded",
            CommandError::Query(QueryError::InvalidDateFormat { .. }) => "invalid_format",
            CommandError::Query(QueryError::InvalidDateRange { .. }) => "invalid_range",
            CommandError::Query(QueryError::InvalidField(_)) => "invalid_field",
            CommandError::Query(QueryError::InvalidColumn(_)) => "invalid_column",
            CommandError::IngestionTimedOut { .. } => "ingestion_timeout",
        }
    }
}
