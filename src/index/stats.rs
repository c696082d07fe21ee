//! Aggregate counters over the snapshot.

use super::{SnapshotIndex, is_overdue};
use crate::dates::{add_days, format_ymd, parse_ymd};
use crate::types::Aggregates;

/// Length of the "coming up" window, in days after today.
const UPCOMING_WINDOW_DAYS: i64 = 7;

impl SnapshotIndex {
    /// Count overdue, upcoming, backlog and scheduled records in one pass.
    ///
    /// The upcoming window `[today, today + 7]` ignores completion, unlike
    /// the overdue count.
    pub fn get_aggregates(&self) -> Aggregates {
        let snapshot = self.snapshot();
        let today = self.today_for(&snapshot);
        let today_ymd = format_ymd(today);
        let window_end = add_days(today, UPCOMING_WINDOW_DAYS);

        let mut stats = Aggregates::default();
        for record in snapshot.records.iter() {
            match record.scheduled_for.as_deref() {
                None => stats.backlog_count += 1,
                Some(scheduled) => {
                    stats.scheduled_count += 1;
                    if parse_ymd(scheduled).is_some_and(|d| d >= today && d <= window_end) {
                        stats.next7_days_count += 1;
                    }
                }
            }
            if is_overdue(record, &today_ymd) {
                stats.overdue_count += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Clock;
    use crate::types::TaskRecord;
    use chrono::{TimeZone, Utc};

    fn index_at(y: i32, m: u32, d: u32) -> SnapshotIndex {
        SnapshotIndex::new()
            .with_time_zone("UTC")
            .with_clock(Clock::Fixed(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()))
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(index_at(2025, 6, 10).get_aggregates(), Aggregates::default());
    }

    #[test]
    fn test_window_edges_are_inclusive() {
        let index = index_at(2025, 6, 10);
        index.refresh(vec![
            TaskRecord::new(1, "yesterday").scheduled("2025-06-09"),
            TaskRecord::new(2, "today").scheduled("2025-06-10"),
            TaskRecord::new(3, "edge").scheduled("2025-06-17"),
            TaskRecord::new(4, "past edge").scheduled("2025-06-18"),
            TaskRecord::new(5, "bad date").scheduled("2025-06-31"),
        ]);
        let stats = index.get_aggregates();
        assert_eq!(stats.next7_days_count, 2);
        assert_eq!(stats.scheduled_count, 5);
        assert_eq!(stats.overdue_count, 1);
        assert_eq!(stats.backlog_count, 0);
    }
}
