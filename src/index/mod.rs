//! In-memory snapshot index over task records.
//!
//! The persistence layer hands the index a full copy of its records after
//! every write; the index answers search, filter and aggregate queries
//! against that copy and never mutates it.

pub mod filter;
pub mod search;
pub mod stats;

pub use filter::{ScheduledRange, WhereClause};
pub use search::tokenize;

use crate::dates::{DEFAULT_TIME_ZONE, today_in, today_ymd_in};
use crate::types::TaskRecord;
use arc_swap::ArcSwap;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;

/// Source of the current instant for "today" computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Wall-clock time.
    #[default]
    System,
    /// A frozen instant.
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(instant) => *instant,
        }
    }
}

/// Records shared between the index and query results.
pub type Records = Arc<Vec<Arc<TaskRecord>>>;

/// The records and the timezone "today" is judged in, swapped as one unit.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Records,
    pub time_zone: String,
}

/// Point-in-time index over task records.
///
/// Records and timezone live in one atomically swapped [`Snapshot`], so the
/// index can be shared across threads behind an `Arc`. Every query loads
/// one snapshot reference and works on it to completion.
pub struct SnapshotIndex {
    snapshot: ArcSwap<Snapshot>,
    clock: Clock,
}

impl SnapshotIndex {
    /// Create an empty index using the system clock and the default timezone.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot {
                records: Arc::new(Vec::new()),
                time_zone: DEFAULT_TIME_ZONE.to_string(),
            }),
            clock: Clock::System,
        }
    }

    /// Use a specific clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the initial timezone (same rules as [`Self::set_time_zone`]).
    pub fn with_time_zone(self, id: &str) -> Self {
        self.set_time_zone(id);
        self
    }

    /// Load the first snapshot. Same contract as [`Self::refresh`].
    pub fn init(&self, records: impl IntoIterator<Item = TaskRecord>) {
        self.refresh(records);
    }

    /// Replace the whole snapshot with `records`, in the given order.
    pub fn refresh(&self, records: impl IntoIterator<Item = TaskRecord>) {
        let records: Records = Arc::new(records.into_iter().map(Arc::new).collect());
        debug!(count = records.len(), "Snapshot refreshed");
        self.snapshot.rcu(|current| Snapshot {
            records: Arc::clone(&records),
            time_zone: current.time_zone.clone(),
        });
    }

    /// Change the timezone used for "today". Blank identifiers are ignored.
    ///
    /// The identifier is not validated here; an unknown zone makes "today"
    /// fall back to the host's local date.
    pub fn set_time_zone(&self, id: &str) {
        if id.trim().is_empty() {
            return;
        }
        debug!(time_zone = %id, "Timezone set");
        self.snapshot.rcu(|current| Snapshot {
            records: Arc::clone(&current.records),
            time_zone: id.to_string(),
        });
    }

    /// Currently configured timezone identifier.
    pub fn time_zone(&self) -> String {
        self.snapshot.load().time_zone.clone()
    }

    /// The current records and timezone.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// The current records.
    pub fn records(&self) -> Records {
        Arc::clone(&self.snapshot.load().records)
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Today's calendar date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        self.today_for(&self.snapshot.load())
    }

    /// Today in the timezone of an already loaded snapshot.
    pub fn today_for(&self, snapshot: &Snapshot) -> NaiveDate {
        today_in(&snapshot.time_zone, self.clock.now())
    }

    pub(crate) fn today_ymd_for(&self, snapshot: &Snapshot) -> String {
        today_ymd_in(&snapshot.time_zone, self.clock.now())
    }
}

impl Default for SnapshotIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Incomplete, scheduled, and scheduled strictly before `today_ymd`.
///
/// Compares YMD strings, so both sides must be zero-padded.
pub fn is_overdue(record: &TaskRecord, today_ymd: &str) -> bool {
    if record.completed {
        return false;
    }
    match record.scheduled_for.as_deref() {
        Some(scheduled) if !scheduled.is_empty() => scheduled < today_ymd,
        _ => false,
    }
}
