use chrono::NaiveDate;

use super::event::{upcoming_events, Event};
use super::habit::{completion_rate, HabitTracker};
use super::task::{TaskCard, TaskStatus};

/// Counts shown on the home page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardSummary {
    pub tasks_to_do: usize,
    pub tasks_processing: usize,
    pub tasks_done: usize,
    pub tasks_overdue: usize,
    pub habits_today: usize,
    pub habits_completed: usize,
    pub habit_completion: f64,
    pub upcoming_events: usize,
    pub next_event: Option<String>,
}

impl DashboardSummary {
    pub fn build(
        tasks: &[TaskCard],
        trackers: &[HabitTracker],
        events: &[Event],
        today: NaiveDate,
    ) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let upcoming = upcoming_events(events, today);

        Self {
            tasks_to_do: count(TaskStatus::ToDo),
            tasks_processing: count(TaskStatus::Processing),
            tasks_done: count(TaskStatus::Done),
            tasks_overdue: tasks.iter().filter(|t| t.is_overdue(today)).count(),
            habits_today: trackers.len(),
            habits_completed: trackers.iter().filter(|t| t.is_completed).count(),
            habit_completion: completion_rate(trackers),
            upcoming_events: upcoming.len(),
            next_event: upcoming.first().map(|e| e.subject.clone()),
        }
    }

    pub fn tasks_total(&self) -> usize {
        self.tasks_to_do + self.tasks_processing + self.tasks_done
    }
}
