//! Domain types and DTOs
//!
//! Tasks as read from the store, the keyword vocabulary, reporting periods
//! and the AI request/response shapes.

pub mod ai;
pub mod period;
pub mod tasks;
pub mod vocabulary;

pub use period::ReportPeriod;
pub use tasks::{Category, Priority, Task};
pub use vocabulary::CategoryLabel;
