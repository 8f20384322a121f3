use std::path::{Path, PathBuf};
use std::time::Duration;

use roster_io::CsvOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::IngestOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// CSV files read by `load_data`, one worker each.
    pub sources: Vec<PathBuf>,
    /// How long `load_data` waits for workers (default: 60).
    pub ingest_timeout_secs: u64,
    /// Cap on concurrent ingestion workers (default: one per source).
    pub max_workers: Option<usize>,
    /// Report an ingestion timeout as a command error instead of only logging it.
    pub fail_on_timeout: bool,
    pub csv: CsvOptions,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                PathBuf::from("data/MOCK_DATA1.csv"),
                PathBuf::from("data/MOCK_DATA2.csv"),
                PathBuf::from("data/MOCK_DATA3.csv"),
            ],
            ingest_timeout_secs: 60,
            max_workers: None,
            fail_on_timeout: false,
            csv: CsvOptions::default(),
        }
    }
}

impl RosterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "ingest_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_workers == Some(0) {
            return Err(ConfigError::Invalid(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ingest_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest_timeout_secs)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            timeout: self.ingest_timeout(),
            max_workers: self.max_workers,
            csv: self.csv.clone(),
        }
    }
}
