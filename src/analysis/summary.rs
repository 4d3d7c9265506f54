//! Narrative summary: the empty-state answer, the response schema and the
//! analysis prompt built from `TaskStatistics`.

use serde_json::{json, Value};

use super::stats::{TaskStatistics, TimeSlot};
use crate::domain::ai::TaskSummary;
use crate::domain::{Priority, ReportPeriod};
use crate::services::ai_client::ExtractionRequest;

/// Upper bound for each list in the model's answer.
pub const MAX_LIST_ITEMS: usize = 5;

pub const EMPTY_RECOMMENDATION: &str = "할일을 추가하여 생산성을 높여보세요.";

/// Answer returned without consulting the model when the period has no tasks.
pub fn empty_summary(period: ReportPeriod) -> TaskSummary {
    let summary = match period {
        ReportPeriod::Today => "오늘 예정된 할일이 없습니다.",
        ReportPeriod::Week => "이번주 예정된 할일이 없습니다.",
    };

    TaskSummary {
        summary: summary.to_string(),
        urgent_tasks: Vec::new(),
        insights: Vec::new(),
        recommendations: vec![EMPTY_RECOMMENDATION.to_string()],
    }
}

pub fn summary_schema() -> Value {
    let list = |description: &str| {
        json!({
            "type": "ARRAY",
            "items": { "type": "STRING" },
            "maxItems": MAX_LIST_ITEMS,
            "description": description
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "할일 목록의 전체 요약 (완료율, 총 개수 등 포함)"
            },
            "urgentTasks": list("긴급하거나 중요한 할일 목록 (최대 5개)"),
            "insights": list("할일 패턴이나 특징에 대한 인사이트 (최대 5개)"),
            "recommendations": list("사용자에게 도움이 되는 실행 가능한 추천 사항 (최대 5개)")
        },
        "required": ["summary", "urgentTasks", "insights", "recommendations"],
        "propertyOrdering": ["summary", "urgentTasks", "insights", "recommendations"]
    })
}

pub fn build_request(period: ReportPeriod, stats: &TaskStatistics) -> ExtractionRequest {
    ExtractionRequest {
        name: "todo_summary",
        prompt: build_prompt(period, stats),
        schema: summary_schema(),
    }
}

pub fn build_prompt(period: ReportPeriod, stats: &TaskStatistics) -> String {
    let mut p = String::from(
        "당신은 전문적인 생산성 분석가입니다. 사용자의 할일 데이터를 분석하여 정교하고 실용적인 인사이트를 제공해주세요.\n\n",
    );

    p.push_str("=== 분석 기간 ===\n");
    p.push_str(match period {
        ReportPeriod::Today => "오늘 (당일 분석)\n\n",
        ReportPeriod::Week => "이번주 (주간 분석)\n\n",
    });

    p.push_str("=== 기본 데이터 ===\n");
    p.push_str(&format!(
        "총 {}개의 할일 중 {}개 완료 (완료율: {}%)\n\n",
        stats.total_todos, stats.completed_todos, stats.completion_rate
    ));

    p.push_str("우선순위별 상세 분석:\n");
    for priority in Priority::ALL {
        let s = stats.priority_stats.get(priority);
        p.push_str(&format!(
            "- {}: {}개 (완료: {}개, 완료율: {}%)\n",
            priority.label(),
            s.total,
            s.completed,
            s.completion_rate
        ));
    }

    p.push_str("\n마감일 현황:\n");
    p.push_str(&format!("- 지연된 할일: {}개\n", stats.overdue_tasks));
    p.push_str(&format!("- 오늘 마감: {}개\n", stats.due_today_tasks));
    p.push_str(&format!("- 내일 마감: {}개\n", stats.due_tomorrow_tasks));
    p.push_str(&format!("- 마감일 준수율: {}%\n", stats.on_time_rate));

    p.push_str("\n시간대별 분포:\n");
    for slot in TimeSlot::ALL {
        p.push_str(&format!(
            "- {}: {}개\n",
            slot_label(slot),
            stats.time_distribution.count(slot)
        ));
    }
    let (busiest, count) = stats.most_productive_time;
    p.push_str(&format!(
        "- 가장 집중된 시간대: {} ({}개)\n",
        busiest.as_str(),
        count
    ));

    p.push_str("\n카테고리별 분석:\n");
    let categories: Vec<String> = stats
        .category_stats
        .iter()
        .map(|c| {
            format!(
                "- {}: {}개 (완료: {}개, 완료율: {}%)",
                c.name, c.stats.total, c.stats.completed, c.stats.completion_rate
            )
        })
        .collect();
    p.push_str(&categories.join("\n"));

    p.push_str("\n\n긴급한 할일:\n");
    let urgent: Vec<String> = stats.urgent_tasks.iter().map(|t| format!("- {}", t)).collect();
    p.push_str(&urgent.join("\n"));

    p.push_str(ANALYSIS_REQUESTS);
    p.push_str(match period {
        ReportPeriod::Today => {
            "- 오늘의 요약: 당일 집중도와 남은 할일 우선순위 제시\n- 오늘 남은 시간을 효율적으로 활용하는 방법 제안\n"
        }
        ReportPeriod::Week => {
            "- 이번주 요약: 주간 패턴 분석 및 다음주 계획 제안\n- 주간 생산성 트렌드 분석 및 개선 방향 제시\n"
        }
    });
    p.push_str(OUTPUT_AND_TONE);

    p
}

fn slot_label(slot: TimeSlot) -> &'static str {
    match slot {
        TimeSlot::Morning => "오전 (06:00-12:00)",
        TimeSlot::Afternoon => "오후 (12:00-18:00)",
        TimeSlot::Evening => "저녁 (18:00-24:00)",
        TimeSlot::Night => "밤 (00:00-06:00)",
    }
}

const ANALYSIS_REQUESTS: &str = "

=== 분석 요청사항 ===

**1. 완료율 분석**
- 일일/주간 완료율 계산 및 평가
- 우선순위별 완료 패턴 분석 (높음/보통/낮음 우선순위별 완료율)
- 마감일 준수율 계산 (지연된 할일 비율 분석)

**2. 시간 관리 분석**
- 마감일 준수율 계산 및 평가
- 연기된 할일의 빈도 및 패턴 파악
- 시간대별 업무 집중도 분포 분석 (어느 시간대에 가장 많은 할일이 집중되는지)

**3. 생산성 패턴**
- 가장 생산적인 요일과 시간대 도출
- 자주 미루는 작업 유형 식별
- 완료하기 쉬운 작업의 공통 특징 도출

**4. 실행 가능한 추천**
- 구체적인 시간 관리 팁 제공
- 우선순위 조정 및 일정 재배치 제안
- 업무 과부하를 줄이는 분산 전략 포함

**5. 긍정적인 피드백**
- 사용자가 잘하고 있는 부분 강조
- 개선점을 격려하는 긍정적 톤으로 제시
- 동기부여 메시지 포함

**6. 기간별 차별화**
";

const OUTPUT_AND_TONE: &str = "
=== 출력 형식 ===

**summary**: 전체적인 요약 (완료율, 주요 성과, 개선 영역을 포함한 자연스러운 한국어 문장)

**urgentTasks**: 긴급하거나 중요한 할일 목록 (최대 5개, 구체적인 액션 아이템)

**insights**: 할일 패턴 분석 인사이트 (최대 5개, 데이터 기반의 구체적인 발견사항)

**recommendations**: 실행 가능한 추천사항 (최대 5개, 바로 실천할 수 있는 구체적인 조언)

=== 톤앤매너 ===
- 친근하고 격려하는 톤
- 전문적이면서도 이해하기 쉬운 언어
- 구체적이고 실용적인 조언
- 긍정적이면서도 현실적인 피드백
- 사용자의 노력을 인정하고 동기부여하는 메시지

분석 결과를 사용자가 이해하기 쉽고, 바로 실천할 수 있는 자연스러운 한국어 문장으로 구성해주세요.";
