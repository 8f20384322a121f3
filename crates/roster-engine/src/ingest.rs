//! Concurrent ingestion of CSV sources into a [`RecordStore`].
//!
//! One worker per source runs on a dedicated `rayon` pool; the caller blocks until every
//! worker reports back or the configured timeout elapses.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};
use roster_io::{read_source, CsvOptions, Diagnostic, Source, SourceError, SourceReport};
use thiserror::Error;

use crate::store::RecordStore;

pub const DEFAULT_INGEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Upper bound on how long [`ingest`] blocks waiting for workers.
    pub timeout: Duration,
    /// Cap on concurrent workers. `None` runs one worker per source.
    pub max_workers: Option<usize>,
    pub csv: CsvOptions,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_INGEST_TIMEOUT,
            max_workers: None,
            csv: CsvOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Every worker finished (successfully or not) before the deadline.
    AllCompleted,
    /// The deadline passed with workers still reading the named sources.
    TimedOut { still_running: Vec<String> },
    /// This store was already ingested into; nothing was done.
    AlreadyIngested,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("worker reading `{source_name}` panicked: {message}")]
    WorkerPanicked {
        source_name: String,
        message: String,
    },
    #[error("worker reading `{source_name}` exited without reporting")]
    WorkerLost { source_name: String },
}

/// What happened to one source whose worker finished.
#[derive(Debug)]
pub enum SourceOutcome {
    Loaded(SourceReport),
    Failed { source: String, error: IngestError },
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            SourceOutcome::Loaded(report) => &report.source,
            SourceOutcome::Failed { source, .. } => source,
        }
    }

    pub fn report(&self) -> Option<&SourceReport> {
        match self {
            SourceOutcome::Loaded(report) => Some(report),
            SourceOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    /// Finished sources, in the order they were supplied.
    pub sources: Vec<SourceOutcome>,
    /// Store size when the call returned. After a timeout, workers still running may append
    /// more until the store is sealed.
    pub records: usize,
}

impl IngestReport {
    fn already_ingested(store: &RecordStore) -> Self {
        Self {
            outcome: IngestOutcome::AlreadyIngested,
            sources: Vec::new(),
            records: store.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == IngestOutcome::AllCompleted
    }

    /// Every skipped line across finished sources.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.sources
            .iter()
            .filter_map(SourceOutcome::report)
            .flat_map(|report| report.diagnostics.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &IngestError)> + '_ {
        self.sources.iter().filter_map(|outcome| match outcome {
            SourceOutcome::Failed { source, error } => Some((source.as_str(), error)),
            SourceOutcome::Loaded(_) => None,
        })
    }
}

/// Read `sources` concurrently into `store`.
///
/// Runs at most once per store: a second call returns [`IngestOutcome::AlreadyIngested`]
/// without reading anything. Per-line and per-file failures are recorded in the report and
/// never abort the other workers. On timeout the still-running workers are left to finish
/// in the background; their appends stop once the store is renumbered.
pub fn ingest(
    store: &Arc<RecordStore>,
    sources: Vec<Source>,
    options: &IngestOptions,
) -> IngestReport {
    if !store.mark_ingest_started() {
        log::debug!("ingestion already ran for this store; ignoring repeat request");
        return IngestReport::already_ingested(store);
    }

    let names: Vec<String> = sources.iter().map(|s| s.name().into_owned()).collect();
    if sources.is_empty() {
        log::warn!("no sources configured; nothing to ingest");
        return IngestReport {
            outcome: IngestOutcome::AllCompleted,
            sources: Vec::new(),
            records: store.len(),
        };
    }

    let workers = options
        .max_workers
        .unwrap_or(sources.len())
        .min(sources.len())
        .max(1);
    let Some(pool) = build_worker_pool(workers) else {
        log::warn!("could not start an ingestion worker pool; reading sources serially");
        return ingest_serially(store, sources, &options.csv);
    };

    let (tx, rx) = mpsc::channel::<(usize, SourceOutcome)>();
    for (idx, source) in sources.into_iter().enumerate() {
        let tx = tx.clone();
        let store = Arc::clone(store);
        let csv = options.csv.clone();
        let name = names[idx].clone();
        pool.spawn(move || {
            let outcome = run_worker(source, name, &csv, &store);
            // The receiver is gone if the caller already timed out.
            tx.send((idx, outcome)).ok();
        });
    }
    drop(tx);

    // `None` when the timeout is too large to represent; wait without a deadline then.
    let deadline = Instant::now().checked_add(options.timeout);
    let mut finished: Vec<Option<SourceOutcome>> = names.iter().map(|_| None).collect();
    let mut pending = names.len();
    let mut disconnected = false;
    while pending > 0 {
        let remaining = deadline.map_or(Duration::MAX, |deadline| {
            deadline.saturating_duration_since(Instant::now())
        });
        match rx.recv_timeout(remaining) {
            Ok((idx, outcome)) => {
                finished[idx] = Some(outcome);
                pending -= 1;
            }
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => {
                disconnected = true;
                break;
            }
        }
    }

    let mut still_running = Vec::new();
    let mut outcomes = Vec::with_capacity(names.len());
    for (slot, name) in finished.into_iter().zip(&names) {
        match slot {
            Some(outcome) => outcomes.push(outcome),
            None if disconnected => outcomes.push(SourceOutcome::Failed {
                source: name.clone(),
                error: IngestError::WorkerLost {
                    source_name: name.clone(),
                },
            }),
            None => still_running.push(name.clone()),
        }
    }

    log_failures(&outcomes);

    let outcome = if still_running.is_empty() {
        IngestOutcome::AllCompleted
    } else {
        log::warn!(
            "ingestion did not finish within {:?}; still running: {}",
            options.timeout,
            still_running.join(", ")
        );
        IngestOutcome::TimedOut { still_running }
    };

    IngestReport {
        outcome,
        sources: outcomes,
        records: store.len(),
    }
}

fn run_worker(
    source: Source,
    name: String,
    csv: &CsvOptions,
    store: &RecordStore,
) -> SourceOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| read_source(source, csv, store)));
    match result {
        Ok(Ok(report)) => SourceOutcome::Loaded(report),
        Ok(Err(error)) => SourceOutcome::Failed {
            source: name,
            error: error.into(),
        },
        Err(payload) => SourceOutcome::Failed {
            error: IngestError::WorkerPanicked {
                source_name: name.clone(),
                message: panic_message(payload.as_ref()),
            },
            source: name,
        },
    }
}

fn ingest_serially(
    store: &Arc<RecordStore>,
    sources: Vec<Source>,
    csv: &CsvOptions,
) -> IngestReport {
    let outcomes: Vec<SourceOutcome> = sources
        .into_iter()
        .map(|source| {
            let name = source.name().into_owned();
            run_worker(source, name, csv, store)
        })
        .collect();
    log_failures(&outcomes);
    IngestReport {
        outcome: IngestOutcome::AllCompleted,
        sources: outcomes,
        records: store.len(),
    }
}

fn log_failures(outcomes: &[SourceOutcome]) {
    for outcome in outcomes {
        if let SourceOutcome::Failed { source, error } = outcome {
            log::error!("failed to load {source}: {error}");
        }
    }
}

fn build_worker_pool(workers: usize) -> Option<ThreadPool> {
    // A dedicated pool keeps ingestion off rayon's global pool. If the OS refuses to spawn
    // that many threads, retry with fewer before giving up.
    let mut threads = workers.max(1);
    loop {
        match ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("roster-ingest-{idx}"))
            .build()
        {
            Ok(pool) => return Some(pool),
            Err(_) if threads > 1 => {
                threads /= 2;
            }
            Err(_) => return None,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
