//! Natural-language task parsing: input checks, the extraction request and
//! clamping of whatever the model sends back.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use super::anchors::DateAnchors;
use super::calendar::LocalCalendar;
use crate::domain::ai::{ParsedTaskSuggestion, RawTaskSuggestion};
use crate::domain::vocabulary::{priority_keywords, CategoryLabel, RelativeDay, TimeOfDay};
use crate::domain::Priority;
use crate::services::ai_client::ExtractionRequest;

pub const MIN_INPUT_CHARS: usize = 2;
pub const MAX_INPUT_CHARS: usize = 500;

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
const ELLIPSIS: &str = "...";

/// Title used when the model produces none.
pub const PLACEHOLDER_TITLE: &str = "할일";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskInputError {
    #[error("유효한 텍스트를 제공해야 합니다.")]
    NotText,
    #[error("입력 텍스트는 최소 2자 이상이어야 합니다.")]
    TooShort,
    #[error("입력 텍스트는 최대 500자까지 입력 가능합니다.")]
    TooLong,
    #[error("한글, 영문, 숫자가 포함된 유효한 내용을 입력해주세요.")]
    NoMeaningfulContent,
    #[error("전처리 후 텍스트가 너무 짧습니다.")]
    TooShortAfterNormalization,
}

/// Validate the `text` field of a request body and normalise it.
///
/// Length limits apply to the raw input; the content and final length checks
/// apply to the normalised text.
pub fn normalize_input(text: Option<&Value>) -> Result<String, TaskInputError> {
    let raw = match text {
        Some(Value::String(s)) if !s.is_empty() => s.as_str(),
        _ => return Err(TaskInputError::NotText),
    };

    let raw_len = raw.chars().count();
    if raw_len < MIN_INPUT_CHARS {
        return Err(TaskInputError::TooShort);
    }
    if raw_len > MAX_INPUT_CHARS {
        return Err(TaskInputError::TooLong);
    }

    let normalized: String = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .nfc()
        .collect();

    if !normalized.chars().any(is_meaningful_char) {
        return Err(TaskInputError::NoMeaningfulContent);
    }
    if normalized.chars().count() < MIN_INPUT_CHARS {
        return Err(TaskInputError::TooShortAfterNormalization);
    }

    Ok(normalized)
}

fn is_meaningful_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c)
}

/// Field schema the model must answer with.
pub fn suggestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "할일의 제목 (120자 이내)"
            },
            "description": {
                "type": "STRING",
                "description": "할일에 대한 상세 설명 (선택 사항, 2000자 이내)"
            },
            "due_date": {
                "type": "STRING",
                "format": "date-time",
                "nullable": true,
                "description": "할일의 마감 날짜 및 시간 (ISO 8601 형식, 예: 2024-01-16T15:00:00Z). 시간이 명시되지 않은 경우 09:00로 설정."
            },
            "priority": {
                "type": "STRING",
                "format": "enum",
                "enum": Priority::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                "nullable": true,
                "description": "할일의 우선순위 (high, medium, low 중 하나). 문맥을 기반으로 자동 판단."
            },
            "category": {
                "type": "STRING",
                "format": "enum",
                "enum": CategoryLabel::labels(),
                "description": "할일의 카테고리. 반드시 \"업무\", \"개인\", \"건강\", \"학습\" 중 하나로 분류해야 합니다."
            }
        },
        "required": ["title", "category"],
        "propertyOrdering": ["title", "description", "due_date", "priority", "category"]
    })
}

/// Build the extraction request for already-normalised `text`.
pub fn build_request(text: &str, anchors: &DateAnchors) -> ExtractionRequest {
    ExtractionRequest {
        name: "parsed_todo",
        prompt: build_prompt(text, anchors),
        schema: suggestion_schema(),
    }
}

pub fn build_prompt(text: &str, anchors: &DateAnchors) -> String {
    let today = anchors.today.format("%Y-%m-%d");
    let mut prompt = String::new();

    prompt.push_str("다음 자연어로 입력된 할일을 구조화된 데이터로 변환해주세요.\n\n");
    prompt.push_str(&format!("입력 텍스트: \"{}\"\n\n", text));
    prompt.push_str(&format!("현재 날짜: {} ({})\n\n", today, anchors.weekday_name()));

    prompt.push_str("=== 날짜 처리 규칙 ===\n");
    prompt.push_str(&format!("현재 날짜가 {}이므로:\n", today));
    for day in RelativeDay::ALL {
        prompt.push_str(&format!(
            "- \"{}\" → {}\n",
            day.phrase(),
            anchors.resolve(day, None)
        ));
    }

    prompt.push_str("\n=== 시간 처리 규칙 ===\n");
    for time in TimeOfDay::ALL {
        prompt.push_str(&format!("- \"{}\" → {:02}:00\n", time.keyword(), time.hour()));
    }
    prompt.push_str(&format!(
        "- 시간이 명시되지 않은 경우 {:02}:00으로 기본 설정\n",
        TimeOfDay::DEFAULT_HOUR
    ));

    prompt.push_str("\n=== 우선순위 키워드 ===\n");
    for priority in Priority::ALL {
        let mut words: Vec<String> = priority_keywords(priority)
            .iter()
            .map(|w| format!("\"{}\"", w))
            .collect();
        if priority == Priority::Medium {
            words.push("키워드 없음".to_string());
        }
        prompt.push_str(&format!("- {}: {}\n", priority.as_str(), words.join(", ")));
    }

    prompt.push_str("\n=== 카테고리 분류 키워드 ===\n");
    prompt.push_str("반드시 다음 카테고리 중 하나로 분류해야 합니다:\n");
    for category in CategoryLabel::ALL {
        let words: Vec<String> = category
            .keywords()
            .iter()
            .map(|w| format!("\"{}\"", w))
            .collect();
        prompt.push_str(&format!("- \"{}\": {}\n", category.label(), words.join(", ")));
    }
    let quoted_labels: Vec<String> = CategoryLabel::labels()
        .iter()
        .map(|l| format!("\"{}\"", l))
        .collect();
    prompt.push_str(&format!(
        "\n중요: 카테고리는 반드시 정확한 한글 이름으로 반환해야 합니다 ({} 중 하나).\n",
        quoted_labels.join(", ")
    ));
    prompt.push_str(
        "특히 \"책 읽기\", \"독서하기\", \"읽기\" 등은 모두 \"학습\" 카테고리로 분류해야 합니다.\n",
    );
    prompt.push_str("카테고리 필드는 필수이며, 반드시 위 4개 카테고리 중 하나를 선택해야 합니다.\n");

    prompt.push_str("\n=== 출력 형식 ===\n");
    prompt.push_str("반드시 JSON 형식으로 응답하고, 모든 필드가 올바른 타입이어야 합니다.\n");

    prompt.push_str("\n=== 예시 ===\n");
    for (input, output) in worked_examples(anchors) {
        prompt.push_str(&format!("입력: \"{}\"\n출력: {}\n\n", input, output));
    }
    prompt.push_str("위 규칙에 따라 정확히 변환해주세요.");

    prompt
}

fn worked_examples(anchors: &DateAnchors) -> Vec<(&'static str, String)> {
    let examples = [
        (
            "내일 오후 3시까지 중요한 팀 회의 준비하기",
            json!({
                "title": "팀 회의 준비",
                "description": "내일 오후 3시까지 팀 회의를 위한 준비 작업",
                "due_date": anchors.timestamp(RelativeDay::Tomorrow, 15),
                "priority": "high",
                "category": CategoryLabel::Work.label()
            }),
        ),
        (
            "다음주 월요일까지 여유롭게 독서하기",
            json!({
                "title": "독서하기",
                "due_date": anchors.resolve(RelativeDay::NextMonday, None),
                "priority": "low",
                "category": CategoryLabel::Study.label()
            }),
        ),
        (
            "오늘 저녁 운동하기",
            json!({
                "title": "운동하기",
                "due_date": anchors.resolve(RelativeDay::Today, Some(TimeOfDay::Evening)),
                "priority": "medium",
                "category": CategoryLabel::Health.label()
            }),
        ),
        (
            "모레 아침에 병원 예약하기",
            json!({
                "title": "병원 예약하기",
                "due_date": anchors.resolve(RelativeDay::DayAfterTomorrow, Some(TimeOfDay::Morning)),
                "priority": "medium",
                "category": CategoryLabel::Health.label()
            }),
        ),
        (
            "언젠가 책 읽기",
            json!({
                "title": "책 읽기",
                "due_date": null,
                "priority": "low",
                "category": CategoryLabel::Study.label()
            }),
        ),
    ];

    examples
        .into_iter()
        .map(|(input, output)| {
            let rendered = serde_json::to_string_pretty(&output).unwrap_or_default();
            (input, rendered)
        })
        .collect()
}

/// Clamp and default a model answer into a suggestion the client can use.
pub fn finalize(raw: RawTaskSuggestion, calendar: &LocalCalendar) -> ParsedTaskSuggestion {
    let title = match raw.title {
        Some(title) if !title.is_empty() => truncate_with_ellipsis(title, MAX_TITLE_CHARS),
        _ => PLACEHOLDER_TITLE.to_string(),
    };

    let description = raw
        .description
        .map(|d| truncate_with_ellipsis(d, MAX_DESCRIPTION_CHARS));

    let due_date = raw
        .due_date
        .as_deref()
        .and_then(parse_timestamp)
        .map(|due| due.max(calendar.start_of_today()))
        .map(|due| due.to_rfc3339_opts(SecondsFormat::Millis, true));

    let priority = raw
        .priority
        .as_deref()
        .and_then(Priority::parse)
        .unwrap_or(Priority::Medium);

    let category = raw
        .category
        .as_deref()
        .and_then(CategoryLabel::from_label)
        .unwrap_or(CategoryLabel::DEFAULT)
        .label()
        .to_string();

    ParsedTaskSuggestion {
        title,
        description,
        due_date,
        priority,
        category,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Cut `text` to `max` characters, ending in `...`, when it is longer.
fn truncate_with_ellipsis(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let keep = max - ELLIPSIS.len();
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}
