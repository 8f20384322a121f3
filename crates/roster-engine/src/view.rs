use std::sync::Arc;

use roster_model::{Record, COLUMN_HEADERS, FIELD_COUNT};

/// The materialized, ordered rows a front end should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    rows: Vec<Arc<Record>>,
    filtered: bool,
}

impl ViewSnapshot {
    pub(crate) fn new(rows: Vec<Arc<Record>>, filtered: bool) -> Self {
        Self { rows, filtered }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether these rows come from an active date filter rather than the full store.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub fn records(&self) -> &[Arc<Record>] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.rows.iter().map(|record| record.as_ref())
    }

    pub fn headers(&self) -> [&'static str; FIELD_COUNT] {
        COLUMN_HEADERS
    }

    /// Display cells for every row.
    pub fn to_table(&self) -> Vec<[String; FIELD_COUNT]> {
        self.iter().map(Record::cells).collect()
    }
}
