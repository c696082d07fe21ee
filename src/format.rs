//! Output formatting utilities for markdown and JSON.

use crate::types::{Aggregates, HabitStats, Occurrence, TaskRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Format a single record as a markdown bullet.
pub fn format_record_short(record: &TaskRecord) -> String {
    let check = if record.completed { "x" } else { " " };
    let mut line = format!("- [{}] `{}` {}", check, record.id, record.title);

    match record.scheduled_for.as_deref() {
        Some(date) => line.push_str(&format!(" ({})", date)),
        None => line.push_str(" (backlog)"),
    }
    if let Some(ref time) = record.time_of_day {
        line.push_str(&format!(" @ {}", time));
    }
    if record.is_repeating() {
        line.push_str(&format!(" [{}]", record.recurrence.kind.as_str()));
    }
    if let Some(ref priority) = record.priority {
        line.push_str(&format!(" !{}", priority));
    }
    line.push('\n');
    line
}

/// Format a list of records as markdown.
pub fn format_records_markdown(title: &str, records: &[Arc<TaskRecord>]) -> String {
    let mut md = format!("# {} ({})\n\n", title, records.len());
    if records.is_empty() {
        md.push_str("_No matching tasks._\n");
    }
    for record in records {
        md.push_str(&format_record_short(record));
    }
    md
}

/// Format aggregate counters as markdown.
pub fn format_aggregates_markdown(stats: &Aggregates) -> String {
    let mut md = String::from("# Summary\n\n");
    md.push_str(&format!("- **overdue**: {}\n", stats.overdue_count));
    md.push_str(&format!("- **next 7 days**: {}\n", stats.next7_days_count));
    md.push_str(&format!("- **scheduled**: {}\n", stats.scheduled_count));
    md.push_str(&format!("- **backlog**: {}\n", stats.backlog_count));
    md
}

/// Format expanded occurrences as markdown.
pub fn format_occurrences_markdown(occurrences: &[Occurrence]) -> String {
    let mut md = format!("# Occurrences ({})\n\n", occurrences.len());
    for occ in occurrences {
        md.push_str(&format!("- {} `{}`\n", occ.scheduled_for, occ.master_id));
    }
    md
}

/// Format habit statistics as markdown.
pub fn format_habit_stats_markdown(title: &str, stats: &HabitStats) -> String {
    let mut md = format!("## {}\n", title);
    md.push_str(&format!("- **current streak**: {}\n", stats.current_streak));
    md.push_str(&format!("- **longest streak**: {}\n", stats.longest_streak));
    let cells: String = stats
        .week_heatmap
        .iter()
        .map(|day| if day.completed { '#' } else { '.' })
        .collect();
    md.push_str(&format!("- **week**: `{}`\n", cells));
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Recurrence, RecurrenceType};

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_format_record_short() {
        let record = TaskRecord::new(3, "Water plants")
            .scheduled("2025-06-10")
            .with_priority("high")
            .with_recurrence(Recurrence::new(RecurrenceType::Weekly, None));
        assert_eq!(
            format_record_short(&record),
            "- [ ] `3` Water plants (2025-06-10) [weekly] !high\n"
        );

        let done = TaskRecord::new(4, "Call bank").with_completed(true);
        assert_eq!(format_record_short(&done), "- [x] `4` Call bank (backlog)\n");
    }

    #[test]
    fn test_format_records_markdown_empty() {
        let md = format_records_markdown("Search", &[]);
        assert!(md.starts_with("# Search (0)"));
        assert!(md.contains("No matching tasks"));
    }
}
