//! planner-index CLI
//!
//! Loads a JSON snapshot of task records and answers search, filter,
//! aggregate and occurrence queries against it.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use planner_index::cli::{
    Cli, Command, HabitsArgs, OccurrencesArgs, build_index, read_raw_snapshot,
};
use planner_index::config::Config;
use planner_index::dates::{parse_ymd, week_range_from_today};
use planner_index::format::{
    OutputFormat, format_aggregates_markdown, format_habit_stats_markdown,
    format_occurrences_markdown, format_records_markdown,
};
use planner_index::index::{SnapshotIndex, WhereClause};
use planner_index::logging::init_logging;
use planner_index::occurrences::{expand_occurrences, habit_stats};
use planner_index::recurrence::{normalize_habit, normalize_task};
use planner_index::types::SearchOptions;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref())?;

    // CLI flags win over config and environment
    if let Some(tz) = &cli.tz {
        config.index.time_zone = tz.clone();
    }
    if let Some(format) = &cli.format {
        config.output.format = OutputFormat::from_str(format)
            .ok_or_else(|| anyhow!("unknown output format '{}'", format))?;
    }
    debug!(?config, "Configuration resolved");

    let raw = read_raw_snapshot(&cli.snapshot)?;
    let format = config.output.format;

    match cli.command {
        Command::Normalize(args) => {
            let normalized: Vec<Value> = raw
                .iter()
                .map(|item| {
                    if args.habit {
                        normalize_habit(item)
                    } else {
                        normalize_task(item)
                    }
                })
                .collect();
            print_json(&normalized)?;
        }
        Command::Search(args) => {
            let index = build_index(&raw, &config.index.time_zone);
            let k = args.k.unwrap_or(config.index.default_k);
            let results = index.search_by_query(&args.query, SearchOptions::with_k(k));
            match format {
                OutputFormat::Json => print_json(&results)?,
                OutputFormat::Markdown => {
                    print!("{}", format_records_markdown("Search", &results))
                }
            }
        }
        Command::Filter(args) => {
            let clause_json: Value =
                serde_json::from_str(&args.clause).context("where-clause is not valid JSON")?;
            let index = build_index(&raw, &config.index.time_zone);
            let results = index.filter_by_where(&WhereClause::from_value(&clause_json));
            match format {
                OutputFormat::Json => print_json(&results)?,
                OutputFormat::Markdown => {
                    print!("{}", format_records_markdown("Filter", &results))
                }
            }
        }
        Command::Stats => {
            let index = build_index(&raw, &config.index.time_zone);
            let stats = index.get_aggregates();
            match format {
                OutputFormat::Json => print_json(&stats)?,
                OutputFormat::Markdown => print!("{}", format_aggregates_markdown(&stats)),
            }
        }
        Command::Occurrences(args) => {
            let index = build_index(&raw, &config.index.time_zone);
            run_occurrences(&index, &config, args, format)?;
        }
        Command::Habits(args) => {
            let index = build_index(&raw, &config.index.time_zone);
            run_habits(&index, args, format)?;
        }
    }

    Ok(())
}

fn run_occurrences(
    index: &SnapshotIndex,
    config: &Config,
    args: OccurrencesArgs,
    format: OutputFormat,
) -> Result<()> {
    let (week_from, week_to) = week_range_from_today(&config.index.time_zone, chrono::Utc::now());
    let from = parse_date_arg("from", args.from.as_deref().unwrap_or(&week_from))?;
    let to = parse_date_arg("to", args.to.as_deref().unwrap_or(&week_to))?;

    let mut occurrences: Vec<_> = index
        .records()
        .iter()
        .filter(|r| r.is_repeating())
        .flat_map(|r| expand_occurrences(r, from, to))
        .collect();
    occurrences.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));

    match format {
        OutputFormat::Json => print_json(&occurrences),
        OutputFormat::Markdown => {
            print!("{}", format_occurrences_markdown(&occurrences));
            Ok(())
        }
    }
}

fn run_habits(index: &SnapshotIndex, args: HabitsArgs, format: OutputFormat) -> Result<()> {
    let range = match (args.from.as_deref(), args.to.as_deref()) {
        (Some(from), Some(to)) => Some((parse_date_arg("from", from)?, parse_date_arg("to", to)?)),
        _ => None,
    };
    let snapshot = index.snapshot();
    let today = index.today_for(&snapshot);

    let mut entries = Vec::new();
    let mut md = String::from("# Habits\n\n");
    for record in snapshot.records.iter().filter(|r| r.is_repeating()) {
        let stats = habit_stats(record, today, range);
        md.push_str(&format_habit_stats_markdown(&record.title, &stats));
        entries.push(json!({ "id": record.id, "title": record.title, "stats": stats }));
    }

    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Markdown => {
            print!("{}", md);
            Ok(())
        }
    }
}

fn parse_date_arg(name: &str, value: &str) -> Result<chrono::NaiveDate> {
    parse_ymd(value).ok_or_else(|| anyhow!("--{} must be a YYYY-MM-DD date, got '{}'", name, value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
