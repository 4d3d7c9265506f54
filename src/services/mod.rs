//! Clients for the hosted collaborators: the structured-extraction model and
//! the todo database.

pub mod ai_client;
pub mod task_store;

pub use ai_client::{AiError, GeminiClient, StructuredExtractor};
pub use task_store::{PgTaskStore, TaskStore};
