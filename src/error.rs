//! Unified API error handling
//!
//! Every failure leaves the service as `{ "success": false, "error": "..." }`
//! with the status code of its class.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::task_parser::TaskInputError;
use crate::domain::period::PeriodError;

pub const INVALID_JSON_MESSAGE: &str = "잘못된 JSON 형식입니다. 올바른 형식으로 요청해주세요.";
pub const MISSING_API_KEY_MESSAGE: &str =
    "API 키가 설정되지 않았습니다. 환경 변수 GOOGLE_GENERATIVE_AI_API_KEY를 확인해주세요.";
pub const UNAUTHENTICATED_MESSAGE: &str = "인증되지 않은 사용자입니다.";
const TASK_STORE_MESSAGE: &str = "할일 데이터를 가져오는 중 오류가 발생했습니다.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request timeout: {0}")]
    RequestTimeout(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// AI credentials are not configured on this server.
    #[error("Missing AI service credentials")]
    MissingCredentials,

    /// Failure whose message is shown to the caller as is.
    #[error("{0}")]
    Upstream(String),

    /// Details stay in the logs.
    #[error("Task store error")]
    TaskStore(#[source] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MissingCredentials
            | Self::Upstream(_)
            | Self::TaskStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::RequestTimeout(msg)
            | Self::RateLimited(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Upstream(msg) => msg.clone(),
            Self::MissingCredentials => MISSING_API_KEY_MESSAGE.to_string(),
            Self::TaskStore(_) => TASK_STORE_MESSAGE.to_string(),
        }
    }
}

impl From<TaskInputError> for ApiError {
    fn from(e: TaskInputError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<PeriodError> for ApiError {
    fn from(e: PeriodError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::TaskStore(e) => {
                tracing::error!(error = ?e, "Task store error");
            }
            Self::MissingCredentials | Self::Upstream(_) => {
                tracing::error!(error = %self, "AI route failed");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
