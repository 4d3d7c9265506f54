//! Reporting periods for the summary route.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("분석 기간은 \"today\" 또는 \"week\"이어야 합니다.")]
pub struct PeriodError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    Week,
}

impl ReportPeriod {
    /// Accepts only the exact wire tokens.
    pub fn from_token(token: Option<&str>) -> Result<Self, PeriodError> {
        match token {
            Some("today") => Ok(Self::Today),
            Some("week") => Ok(Self::Week),
            _ => Err(PeriodError),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
        }
    }
}
