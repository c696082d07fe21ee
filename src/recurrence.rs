//! Recurrence normalization and the repeating/one-off state machine.
//!
//! Raw records arrive as JSON from storage rows or user input and may be
//! missing fields. The normalizers fill defaults and keep the occurrence
//! history (`completedDates`, `skippedDates`) in step with the recurrence
//! type. [`apply_recurrence_mutation`] governs what happens to that history
//! when a stored record changes type.

use crate::dates::{end_of_current_year_ymd, is_ymd_string, parse_ymd};
use crate::error::{IndexError, IndexResult};
use crate::types::{RecurrencePatch, RecurrenceType, TaskRecord};
use serde_json::{Map, Value, json};

const COMPLETED_DATES: &str = "completedDates";
const SKIPPED_DATES: &str = "skippedDates";

/// Which record family is being normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Task,
    Habit,
}

impl RecordKind {
    fn default_recurrence(self) -> RecurrenceType {
        match self {
            RecordKind::Task => RecurrenceType::None,
            RecordKind::Habit => RecurrenceType::Daily,
        }
    }
}

/// Normalize a raw task record.
///
/// Returns a shallow copy with `timeOfDay`, `recurrence` and `completed`
/// filled in. Repeating records get both occurrence lists; one-off records
/// lose them. Anything that is not a JSON object is returned unchanged.
pub fn normalize_task(record: &Value) -> Value {
    normalize(record, RecordKind::Task)
}

/// Normalize a raw habit record.
///
/// Like [`normalize_task`], but the recurrence type defaults to `daily` and
/// `completedDates` is ensured whatever the type.
pub fn normalize_habit(record: &Value) -> Value {
    normalize(record, RecordKind::Habit)
}

fn normalize(record: &Value, kind: RecordKind) -> Value {
    let Some(fields) = record.as_object() else {
        return record.clone();
    };
    let mut out = fields.clone();

    out.entry("timeOfDay").or_insert(Value::Null);

    let default_type = kind.default_recurrence().as_str();
    match out.get_mut("recurrence") {
        Some(Value::Object(recurrence)) => {
            if recurrence.get("type").is_none_or(is_falsy) {
                recurrence.insert("type".into(), json!(default_type));
            }
            recurrence
                .entry("until")
                .or_insert_with(|| json!(end_of_current_year_ymd()));
        }
        _ => {
            out.insert(
                "recurrence".into(),
                json!({ "type": default_type, "until": end_of_current_year_ymd() }),
            );
        }
    }

    let repeating = out
        .get("recurrence")
        .and_then(|r| r.get("type"))
        .and_then(Value::as_str)
        != Some(RecurrenceType::None.as_str());

    match kind {
        RecordKind::Task if repeating => {
            ensure_array(&mut out, COMPLETED_DATES);
            ensure_array(&mut out, SKIPPED_DATES);
        }
        RecordKind::Task => {
            out.remove(COMPLETED_DATES);
            out.remove(SKIPPED_DATES);
        }
        RecordKind::Habit => {
            ensure_array(&mut out, COMPLETED_DATES);
            if repeating {
                ensure_array(&mut out, SKIPPED_DATES);
            }
        }
    }

    if !out.get("completed").is_some_and(Value::is_boolean) {
        out.insert("completed".into(), Value::Bool(false));
    }

    Value::Object(out)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn ensure_array(fields: &mut Map<String, Value>, key: &str) {
    if !fields.get(key).is_some_and(Value::is_array) {
        fields.insert(key.into(), Value::Array(Vec::new()));
    }
}

/// Merge `incoming` into the record's recurrence and reconcile its occurrence history.
///
/// - one-off to repeating: `completedDates`/`skippedDates` are created empty
///   when missing, existing entries are kept;
/// - anything to one-off: both lists are dropped;
/// - repeating to repeating: lists are left as they are.
///
/// The resulting type is the incoming type when given, else the existing one.
pub fn apply_recurrence_mutation<'a>(
    target: &'a mut TaskRecord,
    incoming: &RecurrencePatch,
) -> &'a mut TaskRecord {
    let was_repeating = target.recurrence.is_repeating();

    let recurrence = &mut target.recurrence;
    if let Some(kind) = incoming.kind {
        recurrence.kind = kind;
    }
    if let Some(until) = &incoming.until {
        recurrence.until = until.clone();
    }
    if let Some(interval) = incoming.interval_days {
        recurrence.interval_days = Some(interval);
    }
    for (key, value) in &incoming.extra {
        recurrence.extra.insert(key.clone(), value.clone());
    }

    let now_repeating = target.recurrence.is_repeating();
    if !was_repeating && now_repeating {
        target.completed_dates.get_or_insert_with(Vec::new);
        target.skipped_dates.get_or_insert_with(Vec::new);
    }
    if !now_repeating {
        target.completed_dates = None;
        target.skipped_dates = None;
    }

    target
}

/// Check a raw recurrence descriptor.
///
/// `null` or absent is valid. Otherwise the type must be a known kind,
/// `every_n_days` needs an integer `intervalDays >= 1`, and `until` must be
/// null, absent or YMD-shaped.
pub fn is_valid_recurrence(recurrence: Option<&Value>) -> bool {
    let fields = match recurrence {
        None | Some(Value::Null) => return true,
        Some(Value::Object(fields)) => fields,
        Some(_) => return false,
    };

    let Some(kind) = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(RecurrenceType::from_str)
    else {
        return false;
    };

    if kind == RecurrenceType::EveryNDays
        && !fields
            .get("intervalDays")
            .and_then(Value::as_u64)
            .is_some_and(|n| n >= 1)
    {
        return false;
    }

    match fields.get("until") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => is_ymd_string(s),
        Some(_) => false,
    }
}

impl TaskRecord {
    /// Normalize a raw task and convert it, rejecting records that stay malformed.
    pub fn from_raw(raw: &Value) -> IndexResult<Self> {
        Self::from_normalized(normalize_task(raw))
    }

    /// Normalize a raw habit and convert it, rejecting records that stay malformed.
    pub fn habit_from_raw(raw: &Value) -> IndexResult<Self> {
        Self::from_normalized(normalize_habit(raw))
    }

    fn from_normalized(value: Value) -> IndexResult<Self> {
        let Some(fields) = value.as_object() else {
            return Err(IndexError::invalid_value(
                "record",
                "record must be a JSON object",
            ));
        };

        if fields.get("id").is_none_or(Value::is_null) {
            return Err(IndexError::missing_field("id"));
        }

        if !is_valid_recurrence(fields.get("recurrence")) {
            return Err(IndexError::invalid_recurrence("recurrence descriptor is invalid")
                .with_details(
                    fields
                        .get("recurrence")
                        .map(Value::to_string)
                        .unwrap_or_default(),
                ));
        }

        match fields.get("scheduledFor") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if parse_ymd(s).is_some() => {}
            Some(other) => {
                return Err(IndexError::invalid_value(
                    "scheduledFor",
                    "scheduledFor must be a YYYY-MM-DD calendar date or null",
                )
                .with_details(other.to_string()));
            }
        }

        serde_json::from_value(value).map_err(|err| {
            IndexError::invalid_value("record", "record does not match the task shape")
                .with_details(err.to_string())
        })
    }
}
