//! Conjunctive predicate filtering over the snapshot.

use super::{SnapshotIndex, is_overdue};
use crate::dates::{add_days, parse_ymd};
use crate::types::TaskRecord;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Inclusive calendar range on `scheduledFor`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduledRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ScheduledRange {
    pub fn new(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: from.map(String::from),
            to: to.map(String::from),
        }
    }

    fn is_empty(&self) -> bool {
        self.from.as_deref().is_none_or(str::is_empty) && self.to.as_deref().is_none_or(str::is_empty)
    }
}

/// Filter predicates. Absent predicates match everything.
///
/// `ids: Some(vec![])` matches nothing; use `None` to skip the id predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    pub ids: Option<Vec<i64>>,
    pub title_contains: Option<String>,
    pub overdue: Option<bool>,
    pub scheduled_range: Option<ScheduledRange>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
    pub repeating: Option<bool>,
}

impl WhereClause {
    /// Read predicates from a loosely typed JSON object.
    ///
    /// Values of the wrong type are treated as absent and unknown keys are
    /// ignored. `ids` entries may be numbers or numeric strings; entries that
    /// cannot be read as integers never match. An empty `ids` array is no
    /// predicate at all.
    pub fn from_value(value: &Value) -> Self {
        let ids = value
            .get("ids")
            .and_then(Value::as_array)
            .filter(|arr| !arr.is_empty())
            .map(|arr| arr.iter().filter_map(coerce_id).collect::<Vec<i64>>());

        let scheduled_range = value
            .get("scheduled_range")
            .filter(|v| v.is_object())
            .map(|range| ScheduledRange {
                from: get_string(range, "from"),
                to: get_string(range, "to"),
            });

        Self {
            ids,
            title_contains: get_string(value, "title_contains"),
            overdue: get_bool(value, "overdue"),
            scheduled_range,
            priority: get_string(value, "priority"),
            completed: get_bool(value, "completed"),
            repeating: get_bool(value, "repeating"),
        }
    }
}

fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

fn get_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Read an id from a JSON number or the leading digits of a string.
fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

impl SnapshotIndex {
    /// Records matching every predicate in `clause`, in snapshot order.
    ///
    /// Predicates apply in a fixed order: ids, title, overdue, scheduled
    /// range, priority, completed, repeating. Records whose dates cannot be
    /// parsed fail the range predicate instead of raising.
    pub fn filter_by_where(&self, clause: &WhereClause) -> Vec<Arc<TaskRecord>> {
        let snapshot = self.snapshot();
        let mut items: Vec<Arc<TaskRecord>> = snapshot.records.iter().cloned().collect();

        if let Some(ids) = &clause.ids {
            let set: HashSet<i64> = ids.iter().copied().collect();
            items.retain(|t| set.contains(&t.id));
        }

        if let Some(needle) = clause
            .title_contains
            .as_ref()
            .filter(|q| !q.trim().is_empty())
        {
            let needle = needle.to_lowercase();
            items.retain(|t| t.title.to_lowercase().contains(&needle));
        }

        if let Some(overdue) = clause.overdue {
            let today = self.today_ymd_for(&snapshot);
            items.retain(|t| is_overdue(t, &today) == overdue);
        }

        if let Some(range) = clause.scheduled_range.as_ref().filter(|r| !r.is_empty()) {
            let from = range.from.as_deref().and_then(parse_ymd);
            // `to` is inclusive: compare against the following day, exclusive.
            let end = range.to.as_deref().and_then(parse_ymd).map(|to| add_days(to, 1));
            items.retain(|t| in_range(t, from, end));
        }

        if let Some(priority) = &clause.priority {
            let priority = priority.to_lowercase();
            items.retain(|t| t.priority.as_deref().unwrap_or("").to_lowercase() == priority);
        }

        if let Some(completed) = clause.completed {
            items.retain(|t| t.completed == completed);
        }

        if let Some(repeating) = clause.repeating {
            items.retain(|t| t.is_repeating() == repeating);
        }

        items
    }
}

fn in_range(record: &TaskRecord, from: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    let Some(date) = record.scheduled_for.as_deref().and_then(parse_ymd) else {
        return false;
    };
    if from.is_some_and(|from| date < from) {
        return false;
    }
    if end.is_some_and(|end| date >= end) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_typed_predicates() {
        let clause = WhereClause::from_value(&json!({
            "ids": [1, "2", "3abc", 4.9, "x", null],
            "title_contains": "rent",
            "overdue": true,
            "scheduled_range": {"from": "2025-06-01", "to": "2025-06-07"},
            "priority": "HIGH",
            "completed": false,
            "repeating": true,
            "unknown": 5
        }));
        assert_eq!(clause.ids, Some(vec![1, 2, 3, 4]));
        assert_eq!(clause.title_contains.as_deref(), Some("rent"));
        assert_eq!(clause.overdue, Some(true));
        assert_eq!(
            clause.scheduled_range,
            Some(ScheduledRange::new(Some("2025-06-01"), Some("2025-06-07")))
        );
        assert_eq!(clause.priority.as_deref(), Some("HIGH"));
        assert_eq!(clause.completed, Some(false));
        assert_eq!(clause.repeating, Some(true));
    }

    #[test]
    fn test_from_value_ignores_wrong_types() {
        let clause = WhereClause::from_value(&json!({
            "ids": "1,2",
            "title_contains": 12,
            "overdue": "yes",
            "scheduled_range": "2025-06-01",
            "completed": 1,
            "repeating": null
        }));
        assert_eq!(clause, WhereClause::default());
    }

    #[test]
    fn test_from_value_ids_array_emptiness() {
        assert_eq!(WhereClause::from_value(&json!({"ids": []})).ids, None);
        assert_eq!(
            WhereClause::from_value(&json!({"ids": ["x", null]})).ids,
            Some(Vec::new())
        );
    }

    #[test]
    fn test_from_value_on_non_object() {
        assert_eq!(WhereClause::from_value(&json!([1, 2])), WhereClause::default());
        assert_eq!(WhereClause::from_value(&Value::Null), WhereClause::default());
    }

    #[test]
    fn test_coerce_id() {
        assert_eq!(coerce_id(&json!(12)), Some(12));
        assert_eq!(coerce_id(&json!(" 42 ")), Some(42));
        assert_eq!(coerce_id(&json!("-3")), Some(-3));
        assert_eq!(coerce_id(&json!("7th")), Some(7));
        assert_eq!(coerce_id(&json!("abc")), None);
        assert_eq!(coerce_id(&json!(true)), None);
    }

    #[test]
    fn test_in_range_excludes_unparseable_dates() {
        let from = parse_ymd("2025-06-01");
        let end = parse_ymd("2025-06-08");
        assert!(in_range(&TaskRecord::new(1, "a").scheduled("2025-06-07"), from, end));
        assert!(!in_range(&TaskRecord::new(2, "b").scheduled("2025-06-08"), from, end));
        assert!(!in_range(&TaskRecord::new(3, "c").scheduled("2025-02-30"), from, end));
        assert!(!in_range(&TaskRecord::new(4, "d"), from, end));
    }
}
