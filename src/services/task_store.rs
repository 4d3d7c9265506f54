//! Read access to the caller's tasks.
//!
//! The hosted database owns the `todos` and `categories` tables; this service
//! only ever lists one owner's rows.

use anyhow::{Context, Result};
use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::{Category, Priority, Task};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `owner`, newest first.
    async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>>;

    async fn health_check(&self) -> bool;
}

/// Database row for a task joined with its category
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: String,
    category_id: Option<i64>,
    category_name: Option<String>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };

        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            priority: Priority::parse(&row.priority).unwrap_or_default(),
            category,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the hosted todo database. Requests only read, so the pool
    /// idles down to zero between them.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let connect_options = PgConnectOptions::from_str(&settings.database_url)
            .context("Invalid DATABASE_URL")?
            .application_name("todo-ai-backend");

        let pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(connect_options)
            .await
            .context("Failed to connect to the todo database")?;

        tracing::info!(
            max_connections = settings.database_max_connections,
            "Todo database pool established"
        );

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT t.id, t.user_id, t.title, t.description, t.due_date, t.priority,
                   t.category_id, c.name AS category_name,
                   t.is_completed, t.completed_at, t.created_at, t.updated_at
            FROM todos t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load todos")?;

        tracing::debug!(owner = %owner, count = rows.len(), "Loaded todos");

        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Reachable and both tables readable by this role.
    async fn health_check(&self) -> bool {
        let probe = sqlx::query(
            "SELECT 1 FROM todos t LEFT JOIN categories c ON c.id = t.category_id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await;

        if let Err(e) = &probe {
            tracing::warn!(error = %e, "Todo database health check failed");
        }
        probe.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(priority: &str, category: (Option<i64>, Option<&str>)) -> TaskRow {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        TaskRow {
            id: 7,
            user_id: Uuid::nil(),
            title: "장보기".to_string(),
            description: None,
            due_date: None,
            priority: priority.to_string(),
            category_id: category.0,
            category_name: category.1.map(str::to_string),
            is_completed: false,
            completed_at: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn row_maps_joined_category() {
        let task = Task::from(row("high", (Some(2), Some("개인"))));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(
            task.category,
            Some(Category {
                id: 2,
                name: "개인".to_string()
            })
        );
    }

    #[test]
    fn unknown_priority_reads_as_medium_and_dangling_category_as_none() {
        let task = Task::from(row("urgent", (Some(9), None)));
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, None);
    }

    #[tokio::test]
    async fn connect_rejects_a_malformed_database_url() {
        let mut settings = Settings::for_tests();
        settings.database_url = "not a database url".to_string();

        let err = PgTaskStore::connect(&settings).await.err().unwrap();
        assert!(err.to_string().contains("Invalid DATABASE_URL"));
    }

    #[tokio::test]
    async fn unreachable_database_is_unhealthy() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://postgres@127.0.0.1:1/todos")
            .unwrap();

        assert!(!PgTaskStore::new(pool).health_check().await);
    }
}
