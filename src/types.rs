//! Core record types for the planner index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default number of records returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 40;

/// Recurrence kind of a task, event or habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekdays,
    Weekly,
    EveryNDays,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::None => "none",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekdays => "weekdays",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::EveryNDays => "every_n_days",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(RecurrenceType::None),
            "daily" => Some(RecurrenceType::Daily),
            "weekdays" => Some(RecurrenceType::Weekdays),
            "weekly" => Some(RecurrenceType::Weekly),
            "every_n_days" => Some(RecurrenceType::EveryNDays),
            _ => None,
        }
    }

    /// True for every kind except `none`.
    pub fn is_repeating(&self) -> bool {
        !matches!(self, RecurrenceType::None)
    }
}

/// Recurrence descriptor attached to every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    #[serde(rename = "type", default)]
    pub kind: RecurrenceType,
    /// Last calendar day (YMD) an occurrence may fall on. `None` means no cap.
    #[serde(default)]
    pub until: Option<String>,
    /// Step in days, only meaningful for `every_n_days`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    /// Descriptor keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recurrence {
    pub fn new(kind: RecurrenceType, until: Option<String>) -> Self {
        Self {
            kind,
            until,
            interval_days: None,
            extra: Map::new(),
        }
    }

    pub fn every_n_days(interval_days: u32, until: Option<String>) -> Self {
        Self {
            interval_days: Some(interval_days),
            ..Self::new(RecurrenceType::EveryNDays, until)
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.kind.is_repeating()
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::new(RecurrenceType::None, None)
    }
}

/// Partial recurrence update applied on top of an existing descriptor.
///
/// Fields left as `None` keep the existing value. `until: Some(None)` clears the cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecurrenceType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub until: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecurrencePatch {
    /// Patch that only changes the recurrence type.
    pub fn kind(kind: RecurrenceType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Distinguishes an absent key from an explicit `null` when deserializing patches.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task record as held by the snapshot index.
///
/// `completed_dates` and `skipped_dates` are present exactly when the
/// recurrence type is not `none`; they are omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    /// Calendar date (YMD) or `None` for the backlog.
    #[serde(default)]
    pub scheduled_for: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_dates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_dates: Option<Vec<String>>,
    /// Legacy priority label (`low`, `medium`, `high`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Fields owned by other layers, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    /// A one-off, incomplete, unscheduled record.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            notes: String::new(),
            scheduled_for: None,
            time_of_day: None,
            completed: false,
            recurrence: Recurrence::default(),
            completed_dates: None,
            skipped_dates: None,
            priority: None,
            extra: Map::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn scheduled(mut self, ymd: impl Into<String>) -> Self {
        self.scheduled_for = Some(ymd.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Set the recurrence and make the occurrence history match its type.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        if recurrence.is_repeating() {
            self.completed_dates.get_or_insert_with(Vec::new);
            self.skipped_dates.get_or_insert_with(Vec::new);
        } else {
            self.completed_dates = None;
            self.skipped_dates = None;
        }
        self.recurrence = recurrence;
        self
    }

    pub fn is_repeating(&self) -> bool {
        self.recurrence.is_repeating()
    }

    pub fn is_backlog(&self) -> bool {
        self.scheduled_for.is_none()
    }
}

/// Options for [`crate::index::SnapshotIndex::search_by_query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of records returned.
    pub k: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchOptions {
    pub fn with_k(k: usize) -> Self {
        Self { k }
    }
}

/// Counters relative to today in the configured timezone.
///
/// Categories overlap: an overdue record also counts as scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub overdue_count: usize,
    /// Scheduled within `[today, today + 7]`, regardless of completion.
    pub next7_days_count: usize,
    pub backlog_count: usize,
    pub scheduled_count: usize,
}

/// A single calendar instance of a repeating record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub id: i64,
    pub master_id: i64,
    pub scheduled_for: String,
}

/// One cell of a habit heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: String,
    pub completed: bool,
}

/// Streak statistics derived from a habit's completed dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub week_heatmap: Vec<HeatmapDay>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recurrence_type_roundtrip() {
        for kind in [
            RecurrenceType::None,
            RecurrenceType::Daily,
            RecurrenceType::Weekdays,
            RecurrenceType::Weekly,
            RecurrenceType::EveryNDays,
        ] {
            assert_eq!(RecurrenceType::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RecurrenceType::from_str("monthly"), None);
    }

    #[test]
    fn test_one_off_record_omits_occurrence_keys() {
        let record = TaskRecord::new(1, "Pay rent").scheduled("2025-06-01");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("completedDates").is_none());
        assert!(value.get("skippedDates").is_none());
        assert_eq!(value["scheduledFor"], "2025-06-01");
        assert_eq!(value["recurrence"]["type"], "none");
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = json!({
            "id": 7,
            "title": "Stretch",
            "recurrence": {"type": "every_n_days", "intervalDays": 3, "until": null, "anchor": "x"},
            "completedDates": [],
            "skippedDates": [],
            "context": "home"
        });
        let record: TaskRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.recurrence.kind, RecurrenceType::EveryNDays);
        assert_eq!(record.recurrence.interval_days, Some(3));
        assert_eq!(record.recurrence.extra["anchor"], "x");
        assert_eq!(record.extra["context"], "home");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["context"], "home");
        assert_eq!(back["recurrence"]["anchor"], "x");
    }

    #[test]
    fn test_patch_distinguishes_null_until() {
        let cleared: RecurrencePatch = serde_json::from_value(json!({"until": null})).unwrap();
        assert_eq!(cleared.until, Some(None));

        let untouched: RecurrencePatch = serde_json::from_value(json!({"type": "weekly"})).unwrap();
        assert_eq!(untouched.until, None);
        assert_eq!(untouched.kind, Some(RecurrenceType::Weekly));
    }

    #[test]
    fn test_aggregates_serialize_camel_case() {
        let value = serde_json::to_value(Aggregates {
            overdue_count: 1,
            next7_days_count: 2,
            backlog_count: 3,
            scheduled_count: 4,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"overdueCount": 1, "next7DaysCount": 2, "backlogCount": 3, "scheduledCount": 4})
        );
    }
}
