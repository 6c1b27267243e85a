//! Data models for evolution entities.
//!
//! - `TaskCard`: kanban cards with status, type, priority and due date
//! - `Habit`, `HabitTracker`: habit definitions and today's completion entries
//! - `Event`: scheduled calendar events
//! - `JournalEntry`: daily journal pages
//! - `UserProfile`, `UserBadge`: account details and earned badges
//! - `DashboardSummary`: counts across the above for the home page

pub mod dashboard;
pub mod event;
pub mod habit;
pub mod journal;
pub mod profile;
pub mod task;

pub use dashboard::DashboardSummary;
pub use event::{upcoming_events, Event, EventDraft};
pub use habit::{completion_rate, Habit, HabitDraft, HabitTracker};
pub use journal::{JournalDraft, JournalEntry};
pub use profile::{Badge, LoginResponse, ProfileUpdate, RegisterRequest, UserBadge, UserProfile};
pub use task::{
    sort_tasks, KanbanBoard, Priority, TaskCard, TaskDraft, TaskPatch, TaskSortColumn, TaskStatus,
    TaskType,
};
