//! Keyword tables the parser prompt is generated from.
//!
//! These are configuration data: the four canonical categories, the priority
//! hint words, the time-of-day hours and the relative-day phrases. Prompts,
//! schemas and post-processing all read from here.

use serde::Serialize;

use super::tasks::Priority;

/// Canonical category labels, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLabel {
    Work,
    Personal,
    Health,
    Study,
}

impl CategoryLabel {
    pub const ALL: [CategoryLabel; 4] = [
        CategoryLabel::Work,
        CategoryLabel::Personal,
        CategoryLabel::Health,
        CategoryLabel::Study,
    ];

    /// Used when the model returns no category or an unknown one.
    pub const DEFAULT: CategoryLabel = CategoryLabel::Personal;

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "업무",
            Self::Personal => "개인",
            Self::Health => "건강",
            Self::Study => "학습",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Work => &[
                "회의", "보고서", "프로젝트", "업무", "회사", "사무", "미팅", "발표", "기획",
                "업무용", "직장",
            ],
            Self::Personal => &[
                "쇼핑", "친구", "가족", "개인", "여행", "휴가", "모임", "데이트", "놀이", "취미",
            ],
            Self::Health => &[
                "운동", "병원", "건강", "요가", "헬스", "약속", "검진", "치료", "약", "의료",
                "피트니스",
            ],
            Self::Study => &[
                "공부", "책", "강의", "학습", "독서", "교육", "수업", "시험", "책 읽기",
                "독서하기", "공부하기", "배우기", "읽기", "학원",
            ],
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}

/// Words that hint at a priority. Medium is also what "no keyword" means.
pub fn priority_keywords(priority: Priority) -> &'static [&'static str] {
    match priority {
        Priority::High => &["급하게", "중요한", "빨리", "꼭", "반드시"],
        Priority::Medium => &["보통", "적당히"],
        Priority::Low => &["여유롭게", "천천히", "언젠가"],
    }
}

/// Time-of-day words and the hour they resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Noon,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 5] = [
        TimeOfDay::Morning,
        TimeOfDay::Noon,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Hour used when the text names a day but no time.
    pub const DEFAULT_HOUR: u32 = 9;

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Morning => "아침",
            Self::Noon => "점심",
            Self::Afternoon => "오후",
            Self::Evening => "저녁",
            Self::Night => "밤",
        }
    }

    pub fn hour(&self) -> u32 {
        match self {
            Self::Morning => 9,
            Self::Noon => 12,
            Self::Afternoon => 14,
            Self::Evening => 18,
            Self::Night => 21,
        }
    }
}

/// Relative-day phrases the prompt resolves to concrete dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Tomorrow,
    DayAfterTomorrow,
    ThisFriday,
    NextMonday,
}

impl RelativeDay {
    pub const ALL: [RelativeDay; 5] = [
        RelativeDay::Today,
        RelativeDay::Tomorrow,
        RelativeDay::DayAfterTomorrow,
        RelativeDay::ThisFriday,
        RelativeDay::NextMonday,
    ];

    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Today => "오늘",
            Self::Tomorrow => "내일",
            Self::DayAfterTomorrow => "모레",
            Self::ThisFriday => "이번주 금요일",
            Self::NextMonday => "다음주 월요일",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_category_is_the_second_label() {
        assert_eq!(CategoryLabel::DEFAULT, CategoryLabel::ALL[1]);
        assert_eq!(CategoryLabel::DEFAULT.label(), "개인");
    }

    #[test]
    fn labels_round_trip() {
        for category in CategoryLabel::ALL {
            assert_eq!(CategoryLabel::from_label(category.label()), Some(category));
        }
        assert_eq!(CategoryLabel::from_label("기타"), None);
    }

    #[test]
    fn reading_words_are_study_hints() {
        let study = CategoryLabel::Study.keywords();
        assert!(study.contains(&"책 읽기"));
        assert!(study.contains(&"독서하기"));
    }
}
