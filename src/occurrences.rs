//! Occurrence expansion and per-occurrence state for repeating records.

use crate::dates::{add_days, days_between, format_ymd, parse_ymd};
use crate::error::{IndexError, IndexResult};
use crate::types::{
    HabitStats, HeatmapDay, Occurrence, Recurrence, RecurrenceType, TaskRecord,
};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Longest heatmap a habit summary renders.
const MAX_HEATMAP_DAYS: i64 = 7;

/// Upper bound on how far back a current streak is walked.
const MAX_STREAK_DAYS: u32 = 3660;

/// Whether `date` is an occurrence of `recurrence` anchored at `anchor`.
///
/// Dates before the anchor never match.
pub fn matches_rule(date: NaiveDate, anchor: NaiveDate, recurrence: &Recurrence) -> bool {
    let diff = days_between(anchor, date);
    if diff < 0 {
        return false;
    }
    match recurrence.kind {
        RecurrenceType::None => false,
        RecurrenceType::Daily => true,
        RecurrenceType::Weekdays => date.weekday().number_from_monday() <= 5,
        RecurrenceType::Weekly => diff % 7 == 0,
        RecurrenceType::EveryNDays => match recurrence.interval_days {
            Some(step) if step >= 1 => diff % i64::from(step) == 0,
            _ => false,
        },
    }
}

/// Occurrences of `master` between `from` and `to`, both inclusive.
///
/// The record's `scheduledFor` is the anchor; unscheduled records have no
/// occurrences. Expansion stops after `recurrence.until` when it parses.
pub fn expand_occurrences(master: &TaskRecord, from: NaiveDate, to: NaiveDate) -> Vec<Occurrence> {
    let Some(anchor) = master.scheduled_for.as_deref().and_then(parse_ymd) else {
        return Vec::new();
    };
    let until = master.recurrence.until.as_deref().and_then(parse_ymd);

    let mut occurrences = Vec::new();
    let mut day = from.max(anchor);
    while day <= to {
        if until.is_some_and(|until| day > until) {
            break;
        }
        if matches_rule(day, anchor, &master.recurrence) {
            occurrences.push(Occurrence {
                id: master.id,
                master_id: master.id,
                scheduled_for: format_ymd(day),
            });
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    occurrences
}

/// Mark one occurrence of a repeating record as completed or not.
///
/// `completed` defaults to `true`. Completing is idempotent; un-completing a
/// date that was never completed is a no-op.
pub fn toggle_occurrence<'a>(
    record: &'a mut TaskRecord,
    occurrence_date: &str,
    completed: Option<bool>,
) -> IndexResult<&'a mut TaskRecord> {
    if !record.is_repeating() {
        return Err(IndexError::not_repeating(record.id));
    }
    if parse_ymd(occurrence_date).is_none() {
        return Err(IndexError::invalid_value(
            "occurrenceDate",
            "occurrenceDate must be a YYYY-MM-DD calendar date",
        )
        .with_details(occurrence_date));
    }

    let dates = record.completed_dates.get_or_insert_with(Vec::new);
    let position = dates.iter().position(|d| d == occurrence_date);
    match (completed.unwrap_or(true), position) {
        (true, None) => dates.push(occurrence_date.to_string()),
        (false, Some(idx)) => {
            dates.remove(idx);
        }
        _ => {}
    }
    Ok(record)
}

/// Streaks and a heatmap computed from a habit's completed dates.
///
/// The heatmap covers `range` (default: the seven days ending `today`),
/// capped to seven days. The current streak counts consecutive completed
/// days ending today; the longest streak is the longest run anywhere.
pub fn habit_stats(
    habit: &TaskRecord,
    today: NaiveDate,
    range: Option<(NaiveDate, NaiveDate)>,
) -> HabitStats {
    let completed: BTreeSet<NaiveDate> = habit
        .completed_dates
        .iter()
        .flatten()
        .filter_map(|d| parse_ymd(d))
        .collect();

    let (from, to) = range.unwrap_or((add_days(today, -(MAX_HEATMAP_DAYS - 1)), today));
    let day_count = (days_between(from, to) + 1).clamp(1, MAX_HEATMAP_DAYS);
    let week_heatmap = (0..day_count)
        .map(|i| {
            let day = add_days(from, i);
            HeatmapDay {
                date: format_ymd(day),
                completed: completed.contains(&day),
            }
        })
        .collect();

    let mut current_streak = 0;
    let mut day = today;
    while current_streak < MAX_STREAK_DAYS && completed.contains(&day) {
        current_streak += 1;
        day = add_days(day, -1);
    }

    let mut longest_streak = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in &completed {
        run = match previous {
            Some(prev) if days_between(prev, date) == 1 => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        previous = Some(date);
    }

    HabitStats {
        current_streak,
        longest_streak,
        week_heatmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_matches_rule_weekdays() {
        // 2025-09-15 is a Monday.
        let anchor = ymd(2025, 9, 15);
        let rule = Recurrence::new(RecurrenceType::Weekdays, None);
        assert!(matches_rule(anchor, anchor, &rule));
        assert!(matches_rule(ymd(2025, 9, 16), anchor, &rule));
        assert!(!matches_rule(ymd(2025, 9, 20), anchor, &rule));
        assert!(!matches_rule(ymd(2025, 9, 21), anchor, &rule));
    }

    #[test]
    fn test_matches_rule_rejects_dates_before_anchor() {
        let anchor = ymd(2025, 9, 15);
        let rule = Recurrence::new(RecurrenceType::Daily, None);
        assert!(!matches_rule(ymd(2025, 9, 14), anchor, &rule));
    }

    #[test]
    fn test_matches_rule_every_n_days_needs_interval() {
        let anchor = ymd(2025, 9, 15);
        let missing = Recurrence::new(RecurrenceType::EveryNDays, None);
        assert!(!matches_rule(ymd(2025, 9, 16), anchor, &missing));
        let zero = Recurrence::every_n_days(0, None);
        assert!(!matches_rule(ymd(2025, 9, 16), anchor, &zero));
    }

    #[test]
    fn test_habit_stats_heatmap_is_capped() {
        let habit = TaskRecord::new(1, "Walk");
        let stats = habit_stats(&habit, ymd(2025, 6, 10), Some((ymd(2025, 6, 1), ymd(2025, 6, 30))));
        assert_eq!(stats.week_heatmap.len(), 7);
        assert_eq!(stats.week_heatmap[0].date, "2025-06-01");

        let reversed = habit_stats(&habit, ymd(2025, 6, 10), Some((ymd(2025, 6, 5), ymd(2025, 6, 1))));
        assert_eq!(reversed.week_heatmap.len(), 1);
    }
}
