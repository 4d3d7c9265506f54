//! Task statistics for the summary prompt.
//!
//! Date comparisons deliberately mix two semantics: period membership for
//! `today`, due-today and due-tomorrow use calendar-day equality, while the
//! week window, overdue and on-time checks compare full timestamps.

use serde::Serialize;

use super::calendar::LocalCalendar;
use crate::domain::{Priority, ReportPeriod, Task};

/// Label for tasks without a category.
pub const UNCATEGORIZED: &str = "미분류";

/// How many urgent task titles are forwarded to the prompt.
pub const MAX_URGENT_TASKS: usize = 5;

/// Keep only tasks due inside `period`. Tasks without a due date never match.
pub fn filter_for_period<'a>(
    tasks: &'a [Task],
    period: ReportPeriod,
    calendar: &LocalCalendar,
) -> Vec<&'a Task> {
    match period {
        ReportPeriod::Today => {
            let today = calendar.today();
            tasks
                .iter()
                .filter(|t| t.due_date.is_some_and(|due| calendar.local_date(due) == today))
                .collect()
        }
        ReportPeriod::Week => {
            let sunday = calendar.start_of_week_date();
            let start = calendar.start_of(sunday);
            // Saturday at local midnight, not the end of Saturday
            let end = calendar.start_of(sunday + chrono::Days::new(6));
            tasks
                .iter()
                .filter(|t| t.due_date.is_some_and(|due| due >= start && due <= end))
                .collect()
        }
    }
}

/// Integer percentage rounded half up; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (whole * 2)) as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: u32,
}

impl CompletionStats {
    fn record(&mut self, completed: bool) {
        self.total += 1;
        if completed {
            self.completed += 1;
        }
        self.completion_rate = percentage(self.completed, self.total);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityStats {
    pub high: CompletionStats,
    pub medium: CompletionStats,
    pub low: CompletionStats,
}

impl PriorityStats {
    pub fn get(&self, priority: Priority) -> &CompletionStats {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    fn get_mut(&mut self, priority: Priority) -> &mut CompletionStats {
        match priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }
}

/// Buckets of the local hour of a due timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Morning,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=23 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeDistribution {
    pub morning: usize,
    pub afternoon: usize,
    pub evening: usize,
    pub night: usize,
}

impl TimeDistribution {
    pub fn count(&self, slot: TimeSlot) -> usize {
        match slot {
            TimeSlot::Morning => self.morning,
            TimeSlot::Afternoon => self.afternoon,
            TimeSlot::Evening => self.evening,
            TimeSlot::Night => self.night,
        }
    }

    /// Most populated slot; ties go to the earlier slot in `TimeSlot::ALL`.
    pub fn busiest(&self) -> (TimeSlot, usize) {
        TimeSlot::ALL
            .into_iter()
            .map(|slot| (slot, self.count(slot)))
            .fold((TimeSlot::Morning, self.morning), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }

    fn record(&mut self, slot: TimeSlot) {
        match slot {
            TimeSlot::Morning => self.morning += 1,
            TimeSlot::Afternoon => self.afternoon += 1,
            TimeSlot::Evening => self.evening += 1,
            TimeSlot::Night => self.night += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub name: String,
    #[serde(flatten)]
    pub stats: CompletionStats,
}

/// Everything the summary prompt reports about a task subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total_todos: usize,
    pub completed_todos: usize,
    pub completion_rate: u32,
    pub priority_stats: PriorityStats,
    pub overdue_tasks: usize,
    pub due_today_tasks: usize,
    pub due_tomorrow_tasks: usize,
    pub on_time_rate: u32,
    pub time_distribution: TimeDistribution,
    /// In order of first appearance.
    pub category_stats: Vec<CategoryStats>,
    pub most_productive_time: (TimeSlot, usize),
    pub urgent_tasks: Vec<String>,
}

impl TaskStatistics {
    pub fn compute(tasks: &[&Task], calendar: &LocalCalendar) -> Self {
        let today = calendar.today();
        let tomorrow = calendar.tomorrow();

        let mut completed_todos = 0;
        let mut priority_stats = PriorityStats::default();
        let mut time_distribution = TimeDistribution::default();
        let mut category_stats: Vec<CategoryStats> = Vec::new();
        let mut overdue: Vec<&Task> = Vec::new();
        let mut due_today: Vec<&Task> = Vec::new();
        let mut due_tomorrow_tasks = 0;
        let mut completed_with_due = 0;
        let mut on_time = 0;

        for &task in tasks {
            if task.is_completed {
                completed_todos += 1;
            }
            priority_stats.get_mut(task.priority).record(task.is_completed);

            let name = task.category_name().unwrap_or(UNCATEGORIZED);
            match category_stats.iter_mut().find(|c| c.name == name) {
                Some(entry) => entry.stats.record(task.is_completed),
                None => {
                    let mut stats = CompletionStats::default();
                    stats.record(task.is_completed);
                    category_stats.push(CategoryStats {
                        name: name.to_string(),
                        stats,
                    });
                }
            }

            let Some(due) = task.due_date else {
                continue;
            };

            time_distribution.record(TimeSlot::from_hour(calendar.local_hour(due)));

            if let Some(done_at) = task.completion_time() {
                completed_with_due += 1;
                if done_at <= due {
                    on_time += 1;
                }
                continue;
            }

            if task.is_overdue(calendar) {
                overdue.push(task);
            }
            let due_day = calendar.local_date(due);
            if due_day == today {
                due_today.push(task);
            } else if due_day == tomorrow {
                due_tomorrow_tasks += 1;
            }
        }

        let urgent_tasks = overdue
            .iter()
            .chain(due_today.iter())
            .take(MAX_URGENT_TASKS)
            .map(|t| t.title.clone())
            .collect();

        Self {
            total_todos: tasks.len(),
            completed_todos,
            completion_rate: percentage(completed_todos, tasks.len()),
            priority_stats,
            overdue_tasks: overdue.len(),
            due_today_tasks: due_today.len(),
            due_tomorrow_tasks,
            on_time_rate: percentage(on_time, completed_with_due),
            time_distribution,
            category_stats,
            most_productive_time: time_distribution.busiest(),
            urgent_tasks,
        }
    }
}
