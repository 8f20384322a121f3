use std::sync::Arc;

use roster_io::Source;
use roster_model::Record;

use crate::config::RosterConfig;
use crate::error::CommandError;
use crate::ingest::{ingest, IngestOutcome, IngestReport};
use crate::query::{self, DateRange, SortKey};
use crate::store::RecordStore;
use crate::view::ViewSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// This call ran ingestion.
    Loaded,
    /// Data was loaded earlier; the call did nothing.
    AlreadyLoaded,
}

#[derive(Debug)]
pub struct LoadSummary {
    pub status: LoadStatus,
    /// Present when this call ran ingestion.
    pub report: Option<IngestReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// A filter is now active with this many matching rows.
    Applied { matched: usize },
    /// Both bounds were blank; the full store is shown again.
    Cleared,
}

/// Command surface for a single front end.
///
/// Owns the shared [`RecordStore`] handle and the filtered view. All commands run on the
/// caller's thread; only ingestion fans out to worker threads, and `load_data` blocks until
/// it settles. Commands other than loading fail with [`CommandError::NotLoaded`] until data
/// has been loaded.
#[derive(Debug)]
pub struct Roster {
    store: Arc<RecordStore>,
    config: RosterConfig,
    loaded: bool,
    /// Active date filter result. Rebuilt wholesale by each filter command and sorted
    /// independently of the store.
    filtered: Option<Vec<Arc<Record>>>,
}

impl Roster {
    pub fn new(config: RosterConfig) -> Self {
        Self::with_store(Arc::new(RecordStore::new()), config)
    }

    pub fn with_store(store: Arc<RecordStore>, config: RosterConfig) -> Self {
        Self {
            store,
            config,
            loaded: false,
            filtered: None,
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered.is_some()
    }

    /// Ingest the configured source files.
    pub fn load_data(&mut self) -> Result<LoadSummary, CommandError> {
        let sources = self.config.sources.iter().map(Source::path).collect();
        self.load_sources(sources)
    }

    /// Ingest explicit source handles instead of the configured files.
    ///
    /// When ingestion times out the store is sealed before returning, so rows from workers
    /// that are still running are dropped and `report.records` matches what the view shows.
    pub fn load_sources(&mut self, sources: Vec<Source>) -> Result<LoadSummary, CommandError> {
        if self.loaded {
            return Ok(LoadSummary {
                status: LoadStatus::AlreadyLoaded,
                report: None,
            });
        }

        let mut report = ingest(&self.store, sources, &self.config.ingest_options());
        self.loaded = true;

        if report.outcome == IngestOutcome::AlreadyIngested {
            return Ok(LoadSummary {
                status: LoadStatus::AlreadyLoaded,
                report: None,
            });
        }
        if let IngestOutcome::TimedOut { still_running } = &report.outcome {
            // Workers still running must not grow the store behind the caller's back.
            self.store.seal();
            report.records = self.store.len();
            if self.config.fail_on_timeout {
                return Err(CommandError::IngestionTimedOut {
                    still_running: still_running.clone(),
                });
            }
        }

        log::info!("loaded {} records", report.records);
        Ok(LoadSummary {
            status: LoadStatus::Loaded,
            report: Some(report),
        })
    }

    /// Filter by birth date. Blank bounds are absent; both blank clears the filter.
    ///
    /// On error the previous filtered view (if any) is kept.
    pub fn filter_by_date(
        &mut self,
        from: &str,
        to: &str,
    ) -> Result<FilterOutcome, CommandError> {
        self.ensure_loaded()?;
        let range = DateRange::parse(from, to)?;
        self.store.renumber_once();

        match range {
            None => {
                self.filtered = None;
                Ok(FilterOutcome::Cleared)
            }
            Some(range) => {
                let rows = query::filter(&self.store.snapshot(), &range);
                let matched = rows.len();
                log::debug!("filter {range} matched {matched} records");
                self.filtered = Some(rows);
                Ok(FilterOutcome::Applied { matched })
            }
        }
    }

    /// Sort whichever rows are displayed: the filtered view when a filter is active,
    /// otherwise the whole store.
    pub fn sort_by(
        &mut self,
        key: impl Into<SortKey>,
        ascending: bool,
    ) -> Result<(), CommandError> {
        self.ensure_loaded()?;
        let field = key.into().resolve()?;
        self.store.renumber_once();

        match &mut self.filtered {
            Some(rows) => query::sort(rows, field, ascending),
            None => self.store.sort_in_place(field, ascending),
        }
        Ok(())
    }

    /// Rows to display, reflecting the latest load, filter and sort.
    ///
    /// The first call after loading renumbers the store so identifiers read `1..=N`.
    pub fn current_view(&self) -> Result<ViewSnapshot, CommandError> {
        self.ensure_loaded()?;
        self.store.renumber_once();

        Ok(match &self.filtered {
            Some(rows) => ViewSnapshot::new(rows.clone(), true),
            None => ViewSnapshot::new(self.store.snapshot(), false),
        })
    }

    fn ensure_loaded(&self) -> Result<(), CommandError> {
        if self.loaded {
            Ok(())
        } else {
            Err(CommandError::NotLoaded)
        }
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}
