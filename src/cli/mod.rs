//! CLI command definitions for planner-index.
//!
//! Every command reads a JSON array of raw task records, normalizes and
//! validates them, loads them into a [`SnapshotIndex`] and prints a query
//! result.

use crate::index::SnapshotIndex;
use crate::types::TaskRecord;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

/// Query a planner snapshot from the command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON file holding an array of task records ("-" for stdin)
    #[arg(short, long, global = true, default_value = "-")]
    pub snapshot: String,

    /// Timezone for "today" (overrides config)
    #[arg(long, global = true)]
    pub tz: Option<String>,

    /// Output format: json or markdown (overrides config)
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lexical search over titles and notes
    Search(SearchArgs),

    /// Filter with a JSON where-clause, e.g. '{"overdue": true}'
    Filter(FilterArgs),

    /// Overdue / upcoming / backlog / scheduled counters
    Stats,

    /// Expand repeating records into dated occurrences
    Occurrences(OccurrencesArgs),

    /// Streaks and weekly heatmap for repeating records
    Habits(HabitsArgs),

    /// Print the normalized form of each raw record
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query (empty browses by date)
    #[arg(default_value = "")]
    pub query: String,

    /// Maximum number of results (overrides config)
    #[arg(short, long)]
    pub k: Option<usize>,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// JSON object of predicates
    #[arg(value_name = "WHERE", default_value = "{}")]
    pub clause: String,
}

#[derive(Args, Debug)]
pub struct OccurrencesArgs {
    /// First day (YYYY-MM-DD), default: start of the current week
    #[arg(long)]
    pub from: Option<String>,

    /// Last day (YYYY-MM-DD), default: end of the current week
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct HabitsArgs {
    /// Heatmap start (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Heatmap end (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Normalize as habits (recurrence defaults to daily)
    #[arg(long)]
    pub habit: bool,
}

/// Read raw JSON from a path, or stdin for "-".
pub fn read_raw_snapshot(source: &str) -> Result<Vec<Value>> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading snapshot from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading snapshot {}", source))?
    };
    parse_raw_snapshot(&content)
}

/// Parse a JSON array of raw records.
pub fn parse_raw_snapshot(content: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(content).context("snapshot is not valid JSON")?;
    match value {
        Value::Array(items) => Ok(items),
        other => bail!("snapshot must be a JSON array, got {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize and validate raw records, skipping (and logging) rejects.
pub fn ingest_records(raw: &[Value]) -> Vec<TaskRecord> {
    let mut records = Vec::with_capacity(raw.len());
    for (position, item) in raw.iter().enumerate() {
        match TaskRecord::from_raw(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                position,
                code = ?e.code,
                field = e.field.as_deref().unwrap_or("-"),
                "Skipping record: {}",
                e
            ),
        }
    }
    if records.len() < raw.len() {
        info!(
            accepted = records.len(),
            rejected = raw.len() - records.len(),
            "Snapshot ingested with rejects"
        );
    }
    records
}

/// Build an index over the records in `raw`.
pub fn build_index(raw: &[Value], time_zone: &str) -> SnapshotIndex {
    let index = SnapshotIndex::new().with_time_zone(time_zone);
    index.init(ingest_records(raw));
    index
}
