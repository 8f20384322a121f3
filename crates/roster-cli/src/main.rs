use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use roster_engine::{
    IngestOutcome, LoadSummary, Record, Roster, RosterConfig, SortKey, ViewSnapshot,
    COLUMN_HEADERS,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "roster",
    about = "Load person records from CSV files, then filter by birth date and sort."
)]
struct Args {
    /// CSV files to load (default: the sources listed in the config).
    files: Vec<PathBuf>,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Earliest birth date to include, `yyyy-MM-dd`.
    #[arg(long, default_value = "")]
    from: String,

    /// Latest birth date to include, `yyyy-MM-dd`.
    #[arg(long, default_value = "")]
    to: String,

    /// Column to sort by: a zero-based index or a field name such as `lastName`.
    #[arg(long)]
    sort_by: Option<SortKey>,

    /// Sort in descending order.
    #[arg(long, requires = "sort_by")]
    desc: bool,

    /// Seconds to wait for loading to finish (overrides the config).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print at most this many rows.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    filtered: bool,
    total: usize,
    records: Vec<&'a Record>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let mut roster = Roster::new(config);
    let summary = roster.load_data()?;
    report_load(&summary);

    roster.filter_by_date(&args.from, &args.to)?;
    if let Some(key) = args.sort_by.clone() {
        roster.sort_by(key, !args.desc)?;
    }
    let view = roster.current_view()?;

    let rendered = match args.format {
        OutputFormat::Text => render_text(&view, args.limit),
        OutputFormat::Json => render_json(&view, args.limit)?,
    };
    write_stdout(&rendered)
}

fn build_config(args: &Args) -> Result<RosterConfig> {
    let mut config = match &args.config {
        Some(path) => RosterConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RosterConfig::default(),
    };
    if !args.files.is_empty() {
        config.sources = args.files.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.ingest_timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn report_load(summary: &LoadSummary) {
    let Some(report) = &summary.report else {
        return;
    };
    let skipped = report.diagnostics().count();
    if skipped > 0 {
        log::warn!("skipped {skipped} malformed line(s)");
    }
    if let IngestOutcome::TimedOut { still_running } = &report.outcome {
        eprintln!(
            "warning: loading timed out; showing partial data (still running: {})",
            still_running.join(", ")
        );
    }
}

fn limited(view: &ViewSnapshot, limit: Option<usize>) -> impl Iterator<Item = &Record> + '_ {
    view.iter().take(limit.unwrap_or(usize::MAX))
}

fn render_text(view: &ViewSnapshot, limit: Option<usize>) -> String {
    let rows: Vec<_> = limited(view, limit).map(Record::cells).collect();

    let mut widths = COLUMN_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, COLUMN_HEADERS.iter().copied(), &widths);
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    if rows.len() < view.len() {
        out.push_str(&format!("({} of {} rows)\n", rows.len(), view.len()));
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn render_json(view: &ViewSnapshot, limit: Option<usize>) -> Result<String> {
    let report = JsonReport {
        filtered: view.is_filtered(),
        total: view.len(),
        records: limited(view, limit).collect(),
    };
    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => Ok(()),
        // A closed pipe (e.g. `roster ... | head`) is not an error.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}
