use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use roster_io::{RecordSink, SinkClosed};
use roster_model::{Field, Record, RecordId};

use crate::query;

/// The authoritative in-memory collection of ingested records.
///
/// Shared as `Arc<RecordStore>` between ingestion workers and the command session. Every
/// full-collection mutation (append, renumber, sort) happens under one mutex, so readers
/// never observe a torn collection.
///
/// The store starts *open*: records may be appended in any order. [`RecordStore::renumber_once`]
/// rewrites identifiers to `1..=N` and *seals* the store; afterwards appends are refused so
/// the contiguous-identifier invariant cannot be broken by a late writer. [`RecordStore::seal`]
/// closes the store early without renumbering, for loads that gave up on slow workers.
#[derive(Debug, Default)]
pub struct RecordStore {
    inner: Mutex<StoreInner>,
    ingest_started: AtomicBool,
}

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<Arc<Record>>,
    sealed: bool,
    renumbered: bool,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Fails once the store has been sealed or renumbered.
    pub fn append(&self, record: Record) -> Result<(), SinkClosed> {
        let mut inner = self.lock();
        if inner.sealed {
            log::warn!(
                "dropping record {} appended after the store was sealed: {record}",
                record.id()
            );
            return Err(SinkClosed);
        }
        inner.records.push(Arc::new(record));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Whether appends are refused.
    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Refuse further appends without renumbering. Returns `true` if this call sealed it.
    pub fn seal(&self) -> bool {
        let mut inner = self.lock();
        !std::mem::replace(&mut inner.sealed, true)
    }

    /// Reassign identifiers `1..=N` in current order and seal the store.
    ///
    /// Only the first call does any work; it returns `true`. Later calls return `false`.
    pub fn renumber_once(&self) -> bool {
        let mut inner = self.lock();
        if inner.renumbered {
            return false;
        }
        inner.records = renumber(&inner.records);
        inner.renumbered = true;
        inner.sealed = true;
        log::debug!("renumbered {} records", inner.records.len());
        true
    }

    /// Stable in-place sort of the whole store.
    pub fn sort_in_place(&self, field: Field, ascending: bool) {
        let mut inner = self.lock();
        query::sort(&mut inner.records, field, ascending);
    }

    /// Consistent copy of the current order.
    pub fn snapshot(&self) -> Vec<Arc<Record>> {
        self.lock().records.clone()
    }

    /// Claim the right to ingest into this store. Returns `false` if it was already claimed.
    pub fn mark_ingest_started(&self) -> bool {
        !self.ingest_started.swap(true, Ordering::AcqRel)
    }

    pub fn ingest_started(&self) -> bool {
        self.ingest_started.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("record store mutex poisoned")
    }
}

impl RecordSink for RecordStore {
    fn append(&self, record: Record) -> Result<(), SinkClosed> {
        RecordStore::append(self, record)
    }
}

/// Fresh records carrying identifiers `1..=N` in the given order.
pub fn renumber(records: &[Arc<Record>]) -> Vec<Arc<Record>> {
    records
        .iter()
        .zip(1..)
        .map(|(record, id): (&Arc<Record>, RecordId)| Arc::new(record.with_id(id)))
        .collect()
}
