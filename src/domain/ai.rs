//! Shapes exchanged with the structured-extraction model and the client.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::period::ReportPeriod;
use super::tasks::Priority;

/// Task suggestion as the model returns it, before clamping.
///
/// Every field is optional here and anything that is not a string reads as
/// absent; post-processing decides the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaskSuggestion {
    #[serde(default, deserialize_with = "string_or_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub category: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Task suggestion handed back to the client to prefill its form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedTaskSuggestion {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub priority: Priority,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseMeta {
    pub processed_at: String,
    pub original_text: String,
    /// Unix epoch milliseconds when the response was assembled.
    pub processing_time: i64,
}

/// Narrative summary. Passed through from the model unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub summary: String,
    #[serde(default)]
    pub urgent_tasks: Vec<String>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    pub period: ReportPeriod,
    pub total_todos: usize,
    pub completed_todos: usize,
    pub completion_rate: u32,
    #[serde(rename = "analyzed_at")]
    pub analyzed_at: String,
}
