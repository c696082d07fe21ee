//! Planner Index Library
//!
//! In-memory retrieval over a planner's task snapshot (lexical search,
//! predicate filters, timezone-aware counters) and the recurrence
//! normalizer that keeps repeating and one-off records consistent.

pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod format;
pub mod index;
pub mod logging;
pub mod occurrences;
pub mod recurrence;
pub mod types;
