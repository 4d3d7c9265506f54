//! The two AI endpoints: natural-language todo parsing and period summaries.
//!
//! Both check credentials first, then the body, then (for summaries) the
//! caller. Model failures are mapped onto statuses per route.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::{
    filter_for_period, summary, task_parser, DateAnchors, LocalCalendar, TaskStatistics,
};
use crate::api::ApiResponse;
use crate::app::AppState;
use crate::auth::authenticate;
use crate::domain::ai::{
    ParseMeta, ParsedTaskSuggestion, RawTaskSuggestion, SummaryMeta, TaskSummary,
};
use crate::domain::ReportPeriod;
use crate::error::{ApiError, ApiResult, INVALID_JSON_MESSAGE};
use crate::middleware::RequestIdExt;
use crate::services::AiError;

const PARSE_AUTH_MESSAGE: &str = "Google Generative AI API 키가 누락되었거나 잘못되었습니다. 환경 변수 GOOGLE_GENERATIVE_AI_API_KEY를 확인해주세요.";
const SUMMARY_AUTH_MESSAGE: &str = "Google Generative AI API 키가 누락되었거나 잘못되었습니다.";
const NETWORK_MESSAGE: &str = "AI 서비스에 연결할 수 없습니다. 잠시 후 다시 시도해주세요.";
const RATE_LIMIT_MESSAGE: &str = "AI 서비스 사용량이 초과되었습니다. 잠시 후 다시 시도해주세요.";
const TIMEOUT_MESSAGE: &str = "AI 처리 시간이 초과되었습니다. 더 간단한 문장으로 다시 시도해주세요.";
const PARSE_FALLBACK_MESSAGE: &str = "AI 처리 중 오류가 발생했습니다. 다시 시도해주세요.";
const SUMMARY_FALLBACK_MESSAGE: &str = "AI 분석 중 오류가 발생했습니다. 다시 시도해주세요.";

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(error = %rejection, "Rejected request body");
        ApiError::BadRequest(INVALID_JSON_MESSAGE.to_string())
    })
}

fn passthrough(e: &AiError, fallback: &str) -> ApiError {
    let message = e.to_string();
    if message.trim().is_empty() {
        ApiError::Upstream(fallback.to_string())
    } else {
        ApiError::Upstream(message)
    }
}

fn parse_failure(e: AiError) -> ApiError {
    match e {
        AiError::MissingApiKey | AiError::Unauthorized(_) => {
            ApiError::Unauthorized(PARSE_AUTH_MESSAGE.to_string())
        }
        AiError::Network(_) => ApiError::ServiceUnavailable(NETWORK_MESSAGE.to_string()),
        AiError::RateLimited(_) => ApiError::RateLimited(RATE_LIMIT_MESSAGE.to_string()),
        AiError::Timeout(_) => ApiError::RequestTimeout(TIMEOUT_MESSAGE.to_string()),
        other => passthrough(&other, PARSE_FALLBACK_MESSAGE),
    }
}

/// Summaries have no timeout status of their own.
fn summary_failure(e: AiError) -> ApiError {
    match e {
        AiError::MissingApiKey | AiError::Unauthorized(_) => {
            ApiError::Unauthorized(SUMMARY_AUTH_MESSAGE.to_string())
        }
        AiError::Network(_) => ApiError::ServiceUnavailable(NETWORK_MESSAGE.to_string()),
        AiError::RateLimited(_) => ApiError::RateLimited(RATE_LIMIT_MESSAGE.to_string()),
        other => passthrough(&other, SUMMARY_FALLBACK_MESSAGE),
    }
}

/// Turn one sentence of Korean or English into a todo suggestion.
///
/// POST /api/ai-parse-todo
pub async fn parse_todo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse<ParsedTaskSuggestion, ParseMeta>> {
    let request_id = headers.request_id().unwrap_or("-").to_string();

    if !state.ai.is_configured() {
        return Err(ApiError::MissingCredentials);
    }

    let body = json_body(body)?;
    let text = task_parser::normalize_input(body.get("text"))?;

    let now = Utc::now();
    let anchors = DateAnchors::at(now);
    debug!(
        request_id = %request_id,
        today = %anchors.today,
        tomorrow = %anchors.tomorrow,
        this_friday = %anchors.this_friday,
        next_monday = %anchors.next_monday,
        "Date anchors"
    );

    let value = state
        .ai
        .generate_object(&task_parser::build_request(&text, &anchors))
        .await
        .map_err(parse_failure)?;

    let raw: RawTaskSuggestion = serde_json::from_value(value).map_err(|e| {
        warn!(request_id = %request_id, error = %e, "Model answer does not match the todo schema");
        ApiError::Upstream(PARSE_FALLBACK_MESSAGE.to_string())
    })?;

    let calendar = LocalCalendar::new(now, state.settings.report_utc_offset);
    let suggestion = task_parser::finalize(raw, &calendar);

    info!(
        request_id = %request_id,
        priority = suggestion.priority.as_str(),
        category = %suggestion.category,
        has_due_date = suggestion.due_date.is_some(),
        "Parsed todo"
    );

    let meta = ParseMeta {
        processed_at: iso_timestamp(now),
        original_text: text,
        processing_time: Utc::now().timestamp_millis(),
    };

    Ok(ApiResponse::with_meta(suggestion, meta))
}

/// Narrative summary of the caller's todos due today or this week.
///
/// POST /api/ai-summary
pub async fn summarize_todos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskSummary, SummaryMeta>> {
    let request_id = headers.request_id().unwrap_or("-").to_string();

    if !state.ai.is_configured() {
        return Err(ApiError::MissingCredentials);
    }

    let body = json_body(body)?;
    let period = ReportPeriod::from_token(body.get("period").and_then(Value::as_str))?;

    let auth = authenticate(&state, &headers).await?;

    let tasks = state
        .store
        .list_tasks(auth.user_id)
        .await
        .map_err(ApiError::TaskStore)?;

    let now = Utc::now();
    let calendar = LocalCalendar::new(now, state.settings.report_utc_offset);
    let in_period = filter_for_period(&tasks, period, &calendar);

    if in_period.is_empty() {
        info!(
            request_id = %request_id,
            period = period.as_str(),
            total = tasks.len(),
            "No todos in period"
        );
        return Ok(ApiResponse::new(summary::empty_summary(period)));
    }

    let stats = TaskStatistics::compute(&in_period, &calendar);
    debug!(
        request_id = %request_id,
        period = period.as_str(),
        total = stats.total_todos,
        completed = stats.completed_todos,
        overdue = stats.overdue_tasks,
        "Computed todo statistics"
    );

    let value = state
        .ai
        .generate_object(&summary::build_request(period, &stats))
        .await
        .map_err(summary_failure)?;

    let narrative: TaskSummary = serde_json::from_value(value).map_err(|e| {
        warn!(request_id = %request_id, error = %e, "Model answer does not match the summary schema");
        ApiError::Upstream(SUMMARY_FALLBACK_MESSAGE.to_string())
    })?;

    let meta = SummaryMeta {
        period,
        total_todos: stats.total_todos,
        completed_todos: stats.completed_todos,
        completion_rate: stats.completion_rate,
        analyzed_at: iso_timestamp(now),
    };

    Ok(ApiResponse::with_meta(narrative, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{create_app, AppState};
    use crate::auth::{AuthContext, IdentityProvider};
    use crate::config::Settings;
    use crate::domain::{Priority, Task};
    use crate::error::UNAUTHENTICATED_MESSAGE;
    use crate::middleware::X_REQUEST_ID;
    use crate::services::ai_client::ExtractionRequest;
    use crate::services::{StructuredExtractor, TaskStore};
    use axum::{
        async_trait,
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use uuid::Uuid;

    const TOKEN: &str = "valid-token";

    struct FakeIdentity {
        user_id: Uuid,
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn authenticate(&self, token: &str) -> anyhow::Result<AuthContext> {
            if token != TOKEN {
                anyhow::bail!("unknown token");
            }
            Ok(AuthContext {
                user_id: self.user_id,
                email: Some("me@example.com".to_string()),
                role: Some("authenticated".to_string()),
            })
        }
    }

    struct FakeStore {
        tasks: Vec<Task>,
        fail: bool,
    }

    #[async_trait]
    impl TaskStore for FakeStore {
        async fn list_tasks(&self, _owner: Uuid) -> anyhow::Result<Vec<Task>> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.tasks.clone())
        }

        async fn health_check(&self) -> bool {
            !self.fail
        }
    }

    struct FakeExtractor {
        configured: bool,
        reply: fn() -> Result<Value, AiError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StructuredExtractor for FakeExtractor {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate_object(&self, _request: &ExtractionRequest) -> Result<Value, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }

        async fn health_check(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        calls: Arc<AtomicUsize>,
    }

    fn harness(
        configured: bool,
        reply: fn() -> Result<Value, AiError>,
        tasks: Vec<Task>,
        store_fails: bool,
    ) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let user_id = Uuid::new_v4();
        let state = AppState::new(
            Settings::for_tests(),
            Arc::new(FakeIdentity { user_id }),
            Arc::new(FakeStore {
                tasks,
                fail: store_fails,
            }),
            Arc::new(FakeExtractor {
                configured,
                reply,
                calls: calls.clone(),
            }),
        );
        Harness {
            app: create_app(state),
            calls,
        }
    }

    fn parsed_reply() -> Result<Value, AiError> {
        Ok(json!({
            "title": "팀 회의",
            "description": null,
            "due_date": null,
            "priority": "high",
            "category": "업무"
        }))
    }

    fn summary_reply() -> Result<Value, AiError> {
        Ok(json!({
            "summary": "오늘 할일 1개 중 1개를 완료했습니다.",
            "urgentTasks": [],
            "insights": ["오전에 집중력이 높습니다."],
            "recommendations": ["내일 일정을 미리 정리해보세요."]
        }))
    }

    fn task_due_now(completed: bool) -> Task {
        let now = Utc::now();
        Task {
            id: 1,
            user_id: Uuid::new_v4(),
            title: "보고서 제출".to_string(),
            description: None,
            due_date: Some(now),
            priority: Priority::High,
            category: None,
            is_completed: completed,
            completed_at: completed.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn task_without_due_date() -> Task {
        Task {
            due_date: None,
            ..task_due_now(false)
        }
    }

    async fn post(app: Router, uri: &str, body: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = app
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn parse_with(reply: fn() -> Result<Value, AiError>) -> (StatusCode, Value) {
        let h = harness(true, reply, vec![], false);
        post(h.app, "/api/ai-parse-todo", r#"{"text":"내일 회의"}"#, None).await
    }

    #[tokio::test]
    async fn parse_returns_suggestion_with_meta() {
        let h = harness(true, parsed_reply, vec![], false);
        let (status, body) = post(
            h.app,
            "/api/ai-parse-todo",
            r#"{"text":"  내일   팀 회의  "}"#,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "팀 회의");
        assert_eq!(body["data"]["priority"], "high");
        assert_eq!(body["data"]["category"], "업무");
        assert!(body["data"].get("due_date").is_none());
        assert_eq!(body["meta"]["original_text"], "내일 팀 회의");
        assert!(body["meta"]["processing_time"].as_i64().unwrap() > 0);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn parse_without_credentials_never_calls_the_model() {
        let h = harness(false, parsed_reply, vec![], false);
        let (status, body) =
            post(h.app, "/api/ai-parse-todo", r#"{"text":"내일 회의"}"#, None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("GOOGLE_GENERATIVE_AI_API_KEY"));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn parse_rejects_malformed_json_and_bad_text() {
        let h = harness(true, parsed_reply, vec![], false);
        let (status, body) = post(h.app, "/api/ai-parse-todo", "{not json", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_JSON_MESSAGE);

        let h = harness(true, parsed_reply, vec![], false);
        let (status, body) = post(h.app, "/api/ai-parse-todo", r#"{"text":"a"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "입력 텍스트는 최소 2자 이상이어야 합니다.");

        let h = harness(true, parsed_reply, vec![], false);
        let (status, _) = post(h.app, "/api/ai-parse-todo", r#"{"text":42}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn parse_maps_model_failures_to_statuses() {
        let (status, body) = parse_with(|| Err(AiError::Unauthorized("bad key".into()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], PARSE_AUTH_MESSAGE);

        let (status, body) = parse_with(|| Err(AiError::Network("refused".into()))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], NETWORK_MESSAGE);

        let (status, _) = parse_with(|| Err(AiError::RateLimited("quota".into()))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, body) = parse_with(|| Err(AiError::Timeout("slow".into()))).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], TIMEOUT_MESSAGE);

        let (status, body) = parse_with(|| {
            Err(AiError::Service {
                status: 500,
                message: "model overloaded".into(),
            })
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "model overloaded");

        let (status, body) = parse_with(|| {
            Err(AiError::Service {
                status: 500,
                message: String::new(),
            })
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], PARSE_FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn parse_defaults_fields_the_model_mistyped() {
        let (status, body) = parse_with(|| {
            Ok(json!({
                "title": "팀 회의",
                "priority": 2,
                "category": ["업무"],
                "due_date": false
            }))
        })
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "팀 회의");
        assert_eq!(body["data"]["priority"], "medium");
        assert_eq!(body["data"]["category"], "개인");
        assert!(body["data"].get("due_date").is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_in_the_error_envelope() {
        let h = harness(true, parsed_reply, vec![], false);
        let oversized = json!({ "text": "가".repeat(70_000) }).to_string();
        let (status, body) = post(h.app, "/api/ai-parse-todo", &oversized, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], INVALID_JSON_MESSAGE);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn summary_checks_period_before_identity() {
        let h = harness(true, summary_reply, vec![], false);
        let (status, body) = post(h.app, "/api/ai-summary", r#"{"period":"month"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "분석 기간은 \"today\" 또는 \"week\"이어야 합니다.");

        let h = harness(true, summary_reply, vec![], false);
        let (status, body) = post(h.app, "/api/ai-summary", r#"{"period":"today"}"#, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], UNAUTHENTICATED_MESSAGE);

        let h = harness(true, summary_reply, vec![], false);
        let (status, _) = post(
            h.app,
            "/api/ai-summary",
            r#"{"period":"today"}"#,
            Some("forged"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_period_short_circuits_without_the_model() {
        let h = harness(true, summary_reply, vec![task_without_due_date()], false);
        let (status, body) =
            post(h.app, "/api/ai-summary", r#"{"period":"week"}"#, Some(TOKEN)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["summary"], "이번주 예정된 할일이 없습니다.");
        assert_eq!(body["data"]["urgentTasks"], json!([]));
        assert_eq!(body["data"]["insights"], json!([]));
        assert_eq!(
            body["data"]["recommendations"],
            json!(["할일을 추가하여 생산성을 높여보세요."])
        );
        assert!(body.get("meta").is_none());
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn summary_passes_narrative_through_with_meta() {
        let h = harness(true, summary_reply, vec![task_due_now(true)], false);
        let (status, body) =
            post(h.app, "/api/ai-summary", r#"{"period":"today"}"#, Some(TOKEN)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["summary"], "오늘 할일 1개 중 1개를 완료했습니다.");
        assert_eq!(body["meta"]["period"], "today");
        assert_eq!(body["meta"]["totalTodos"], 1);
        assert_eq!(body["meta"]["completedTodos"], 1);
        assert_eq!(body["meta"]["completionRate"], 100);
        assert!(body["meta"]["analyzed_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn summary_store_failure_is_a_server_error() {
        let h = harness(true, summary_reply, vec![], true);
        let (status, body) =
            post(h.app, "/api/ai-summary", r#"{"period":"today"}"#, Some(TOKEN)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "할일 데이터를 가져오는 중 오류가 발생했습니다.");
    }

    #[tokio::test]
    async fn summary_timeout_falls_through_to_server_error() {
        let h = harness(
            true,
            || Err(AiError::Timeout("deadline exceeded".into())),
            vec![task_due_now(false)],
            false,
        );
        let (status, body) =
            post(h.app, "/api/ai-summary", r#"{"period":"today"}"#, Some(TOKEN)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("deadline exceeded"));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let h = harness(true, parsed_reply, vec![], false);
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/categories")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"][1]["label"], "개인");
        assert_eq!(body["data"][1]["is_default"], true);
    }

    #[tokio::test]
    async fn me_requires_a_token() {
        let h = harness(true, parsed_reply, vec![], false);
        let response = h
            .app
            .clone()
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
