use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Mutex;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use roster_model::Record;
use thiserror::Error;

use crate::line::{parse_fields, LineError};
use crate::options::{CsvOptions, TextEncoding};

/// Returned by a [`RecordSink`] that no longer accepts records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("record sink is closed")]
pub struct SinkClosed;

/// Destination for parsed records.
///
/// Implementations must be safe to call from several reader threads at once.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: Record) -> Result<(), SinkClosed>;
}

impl RecordSink for Mutex<Vec<Record>> {
    fn append(&self, record: Record) -> Result<(), SinkClosed> {
        self.lock()
            .expect("record sink mutex poisoned")
            .push(record);
        Ok(())
    }
}

/// A named input handle.
pub enum Source {
    /// A CSV file on disk, opened when the source is read.
    Path(PathBuf),
    /// An already-open byte stream (stdin, in-memory fixtures, network bodies).
    Reader {
        name: String,
        reader: Box<dyn Read + Send>,
    },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    pub fn reader(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Source::Reader {
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    /// In-memory source, mostly useful for fixtures.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::reader(name, std::io::Cursor::new(bytes.into()))
    }

    /// Name used in diagnostics and reports.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Source::Path(path) => path.to_string_lossy(),
            Source::Reader { name, .. } => Cow::Borrowed(name),
        }
    }

    fn open(self) -> Result<Box<dyn Read + Send>, SourceError> {
        match self {
            Source::Path(path) => match File::open(&path) {
                Ok(file) => Ok(Box::new(file)),
                Err(source) => Err(SourceError::Open {
                    name: path.to_string_lossy().into_owned(),
                    source,
                }),
            },
            Source::Reader { reader, .. } => Ok(reader),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Reader { name, .. } => f.debug_struct("Reader").field("name", name).finish(),
        }
    }
}

/// A source that could not be read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open `{name}`: {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read `{name}` at line {line}: {reason}")]
    Read {
        name: String,
        line: u64,
        reason: String,
    },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            SourceError::Open { name, .. } | SourceError::Read { name, .. } => name,
        }
    }
}

/// A skipped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: String,
    /// 1-based line number within the source.
    pub line: u64,
    /// The offending line, re-joined with the configured delimiter.
    pub content: String,
    pub error: LineError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.source, self.line, self.error, self.content
        )
    }
}

/// Result of reading one source to completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceReport {
    pub source: String,
    /// Records handed to the sink.
    pub loaded: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// The sink closed before the end of input; remaining lines were not read.
    pub interrupted: bool,
}

/// Read every line of `source`, appending well-formed records to `sink`.
///
/// Malformed lines are logged, collected into [`SourceReport::diagnostics`] and skipped;
/// they never fail the call. Only an unopenable or unreadable source is an error.
pub fn read_source(
    source: Source,
    options: &CsvOptions,
    sink: &dyn RecordSink,
) -> Result<SourceReport, SourceError> {
    let name = source.name().into_owned();
    log::info!("loading records from {name}");

    let reader = source.open()?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Every line is data; there is no header row.
        .has_headers(false)
        // Field counts are validated per line so one bad row cannot abort the file.
        .flexible(true)
        .quoting(options.quoting)
        .trim(if options.trim_fields {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(BufReader::new(reader));

    let mut report = SourceReport {
        source: name.clone(),
        ..SourceReport::default()
    };
    let mut record = ByteRecord::new();
    let mut first = true;

    loop {
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(err) => return Err(map_csv_error(err, &name)),
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let parsed = decode_record(&record, first, options.encoding)
            .and_then(|fields| parse_fields(fields.as_slice()));
        first = false;

        match parsed {
            Ok(parsed) => {
                if sink.append(parsed).is_err() {
                    log::warn!(
                        "stopped reading {name} at line {line}: sink no longer accepts records"
                    );
                    report.interrupted = true;
                    break;
                }
                report.loaded += 1;
            }
            Err(error) => {
                let diagnostic = Diagnostic {
                    source: name.clone(),
                    line,
                    content: lossy_line(&record, options.delimiter),
                    error,
                };
                log::warn!("skipping malformed line in {name}: {diagnostic}");
                report.diagnostics.push(diagnostic);
            }
        }
    }

    log::info!(
        "loaded {} records from {name} ({} skipped)",
        report.loaded,
        report.diagnostics.len()
    );
    Ok(report)
}

fn decode_record(
    record: &ByteRecord,
    first: bool,
    encoding: TextEncoding,
) -> Result<Vec<String>, LineError> {
    record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            // Excel-exported CSVs commonly start with a UTF-8 BOM.
            let field = if first && idx == 0 {
                field.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(field)
            } else {
                field
            };
            decode_field(field, idx + 1, encoding).map(Cow::into_owned)
        })
        .collect()
}

fn decode_field(
    field: &[u8],
    column: usize,
    encoding: TextEncoding,
) -> Result<Cow<'_, str>, LineError> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(field)
            .map(Cow::Borrowed)
            .map_err(|_| LineError::Encoding { column }),
        TextEncoding::Windows1252 => {
            let (cow, _, _) = WINDOWS_1252.decode(field);
            Ok(cow)
        }
        TextEncoding::Auto => match std::str::from_utf8(field) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(_) => {
                let (cow, _, _) = WINDOWS_1252.decode(field);
                Ok(cow)
            }
        },
    }
}

fn lossy_line(record: &ByteRecord, delimiter: u8) -> String {
    let delimiter = char::from(delimiter).to_string();
    record
        .iter()
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(delimiter.as_str())
}

fn map_csv_error(err: csv::Error, name: &str) -> SourceError {
    let line = err.position().map(|p| p.line()).unwrap_or_default();
    SourceError::Read {
        name: name.to_string(),
        line,
        reason: err.to_string(),
    }
}
