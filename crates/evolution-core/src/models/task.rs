use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::cmp_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    Processing,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::Processing, TaskStatus::Done];
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::ToDo => write!(f, "To Do"),
            TaskStatus::Processing => write!(f, "Processing"),
            TaskStatus::Done => write!(f, "Done"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Personal,
    Professional,
    Educational,
    HealthWellness,
    Financial,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Personal => write!(f, "Personal"),
            TaskType::Professional => write!(f, "Professional"),
            TaskType::Educational => write!(f, "Educational/Learning"),
            TaskType::HealthWellness => write!(f, "Health & Wellness"),
            TaskType::Financial => write!(f, "Financial"),
            TaskType::Other => write!(f, "Other"),
        }
    }
}

/// Declared low to high so the derived `Ord` ranks `High` above `Low`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCard {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub user_username: Option<String>,
}

impl TaskCard {
    /// Past its due date and not done
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < today)
    }

    pub fn due_display(&self) -> String {
        match self.due_date {
            Some(date) => date.format("%b %d, %Y").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Body for creating a task
#[derive(Debug, Clone, Serialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: TaskStatus,
    pub task_type: TaskType,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Partial update; only the fields that are set are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortColumn {
    Title,
    #[default]
    Priority,
    DueDate,
}

/// Sort tasks for display. Ties fall back to title. Tasks without a due date sort last
/// when ordering by due date ascending.
pub fn sort_tasks(tasks: &[TaskCard], column: TaskSortColumn, ascending: bool) -> Vec<&TaskCard> {
    let mut sorted: Vec<&TaskCard> = tasks.iter().collect();
    sorted.sort_by(|a, b| {
        let primary = match column {
            TaskSortColumn::Title => Ordering::Equal,
            // Highest priority first when ascending
            TaskSortColumn::Priority => b.priority.cmp(&a.priority),
            TaskSortColumn::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        let ord = primary.then_with(|| cmp_ignore_case(&a.title, &b.title));
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    sorted
}

/// Tasks grouped into kanban columns
#[derive(Debug, Default)]
pub struct KanbanBoard<'a> {
    pub to_do: Vec<&'a TaskCard>,
    pub processing: Vec<&'a TaskCard>,
    pub done: Vec<&'a TaskCard>,
}

impl<'a> KanbanBoard<'a> {
    pub fn from_tasks(tasks: &'a [TaskCard]) -> Self {
        let mut board = Self::default();
        for task in sort_tasks(tasks, TaskSortColumn::Priority, true) {
            board.column_mut(task.status).push(task);
        }
        board
    }

    pub fn column(&self, status: TaskStatus) -> &[&'a TaskCard] {
        match status {
            TaskStatus::ToDo => &self.to_do,
            TaskStatus::Processing => &self.processing,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<&'a TaskCard> {
        match status {
            TaskStatus::ToDo => &mut self.to_do,
            TaskStatus::Processing => &mut self.processing,
            TaskStatus::Done => &mut self.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(
        id: i64,
        title: &str,
        status: TaskStatus,
        priority: Priority,
        due: Option<&str>,
    ) -> TaskCard {
        TaskCard {
            id,
            title: title.to_string(),
            summary: None,
            status,
            task_type: TaskType::Other,
            priority,
            due_date: due.map(|d| d.parse().unwrap()),
            user: None,
            user_username: None,
        }
    }

    #[test]
    fn test_parse_task_from_api() {
        let json = r#"{"id": 7, "title": "Read", "summary": null, "status": "processing",
            "task_type": "health_wellness", "priority": "high", "due_date": "2024-03-01",
            "user": 2, "user_username": "sam"}"#;
        let t: TaskCard = serde_json::from_str(json).unwrap();
        assert_eq!(t.status, TaskStatus::Processing);
        assert_eq!(t.task_type, TaskType::HealthWellness);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_unknown_task_type_is_other() {
        let json = r#"{"id": 1, "title": "x", "task_type": "hobby"}"#;
        let t: TaskCard = serde_json::from_str(json).unwrap();
        assert_eq!(t.task_type, TaskType::Other);
        assert_eq!(t.status, TaskStatus::ToDo);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let body = serde_json::to_value(TaskPatch::status(TaskStatus::Done)).unwrap();
        assert_eq!(body, serde_json::json!({"status": "done"}));
    }

    #[test]
    fn test_sort_by_priority_then_title() {
        let tasks = vec![
            task(1, "b", TaskStatus::ToDo, Priority::Low, None),
            task(2, "a", TaskStatus::ToDo, Priority::High, None),
            task(3, "C", TaskStatus::ToDo, Priority::High, None),
        ];
        let ids: Vec<i64> = sort_tasks(&tasks, TaskSortColumn::Priority, true)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_by_due_date_puts_undated_last() {
        let tasks = vec![
            task(1, "a", TaskStatus::ToDo, Priority::Low, None),
            task(2, "b", TaskStatus::ToDo, Priority::Low, Some("2024-05-02")),
            task(3, "c", TaskStatus::ToDo, Priority::Low, Some("2024-05-01")),
        ];
        let ids: Vec<i64> = sort_tasks(&tasks, TaskSortColumn::DueDate, true)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_kanban_board_groups_by_status() {
        let tasks = vec![
            task(1, "a", TaskStatus::Done, Priority::Low, None),
            task(2, "b", TaskStatus::ToDo, Priority::Low, None),
            task(3, "c", TaskStatus::ToDo, Priority::High, None),
        ];
        let board = KanbanBoard::from_tasks(&tasks);
        let todo: Vec<i64> = board.column(TaskStatus::ToDo).iter().map(|t| t.id).collect();
        assert_eq!(todo, vec![3, 2]);
        assert!(board.processing.is_empty());
        assert_eq!(board.done.len(), 1);
    }

    #[test]
    fn test_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let yesterday = Some("2024-05-09");
        assert!(task(1, "a", TaskStatus::ToDo, Priority::Low, yesterday).is_overdue(today));
        assert!(!task(2, "b", TaskStatus::Done, Priority::Low, yesterday).is_overdue(today));
        let due_today = Some("2024-05-10");
        assert!(!task(3, "c", TaskStatus::ToDo, Priority::Low, due_today).is_overdue(today));
        assert!(!task(4, "d", TaskStatus::ToDo, Priority::Low, None).is_overdue(today));
    }
}
