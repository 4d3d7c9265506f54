//! Request-independent logic behind the AI routes.
//!
//! Everything here is pure: callers pass in "now", the tasks and the period,
//! and get back prompts, schemas, statistics or clamped suggestions.

pub mod anchors;
pub mod calendar;
pub mod stats;
pub mod summary;
pub mod task_parser;

pub use anchors::DateAnchors;
pub use calendar::LocalCalendar;
pub use stats::{filter_for_period, TaskStatistics};
