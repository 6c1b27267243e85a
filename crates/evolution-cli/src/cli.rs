//! Command-line arguments.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use evolution_core::models::{Priority, TaskSortColumn, TaskStatus, TaskType};

#[derive(Debug, Parser)]
#[command(
    name = "evolution",
    version,
    about = "Kanban tasks, habits, schedule and journal from the terminal"
)]
pub struct Cli {
    /// Backend base URL, e.g. http://127.0.0.1:8000/api
    #[arg(long, global = true, env = "EVOLUTION_API_URL")]
    pub api_url: Option<String>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(short, long, env = "EVOLUTION_USERNAME")]
        username: Option<String>,
    },
    /// Create an account
    Register(RegisterArgs),
    /// Forget the current session
    Logout,
    /// Show whether a session is active
    Status,
    /// Kanban task board
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Habit list and today's tracker
    #[command(subcommand)]
    Habits(HabitsCommand),
    /// Scheduled events
    #[command(subcommand)]
    Events(EventsCommand),
    /// Daily journal
    #[command(subcommand)]
    Journal(JournalCommand),
    /// Account settings
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Earned badges
    Badges,
    /// Summary of tasks, habits and upcoming events
    Dashboard,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub country: String,
    #[arg(long, default_value = "")]
    pub bio: String,
    /// Profile picture to upload
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Todo,
    Processing,
    Done,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Todo => TaskStatus::ToDo,
            StatusArg::Processing => TaskStatus::Processing,
            StatusArg::Done => TaskStatus::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaskTypeArg {
    Personal,
    Professional,
    Educational,
    Health,
    Financial,
    Other,
}

impl From<TaskTypeArg> for TaskType {
    fn from(arg: TaskTypeArg) -> Self {
        match arg {
            TaskTypeArg::Personal => TaskType::Personal,
            TaskTypeArg::Professional => TaskType::Professional,
            TaskTypeArg::Educational => TaskType::Educational,
            TaskTypeArg::Health => TaskType::HealthWellness,
            TaskTypeArg::Financial => TaskType::Financial,
            TaskTypeArg::Other => TaskType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Title,
    Priority,
    Due,
}

impl From<SortArg> for TaskSortColumn {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => TaskSortColumn::Title,
            SortArg::Priority => TaskSortColumn::Priority,
            SortArg::Due => TaskSortColumn::DueDate,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// Show tasks grouped into kanban columns
    Board,
    /// Show tasks as a sorted list
    List {
        #[arg(long, value_enum, default_value = "priority")]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
        /// Only tasks whose title contains this text
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        title: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long = "type", value_enum, default_value = "other")]
        task_type: TaskTypeArg,
        #[arg(long, value_enum, default_value = "medium")]
        priority: PriorityArg,
        #[arg(long, value_enum, default_value = "todo")]
        status: StatusArg,
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Move a card to another column
    Move {
        id: i64,
        #[arg(value_enum)]
        status: StatusArg,
    },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum HabitsCommand {
    /// All habits
    List,
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Edit {
        id: i64,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: i64 },
    /// Today's checklist
    Today,
    /// Flip a tracker entry between done and not done
    Toggle { tracker_id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    List {
        /// Include past events
        #[arg(long)]
        all: bool,
    },
    Add {
        subject: String,
        /// RFC 3339, e.g. 2024-03-04T09:00:00Z
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Change an event; omitted fields keep their current value
    Edit {
        id: i64,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum JournalCommand {
    /// Show today's entry
    Today,
    /// Write today's entry, replacing what was there
    Write {
        text: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// All entries, newest first
    List,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Also prompt for a new password
        #[arg(long)]
        change_password: bool,
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Remove the current profile picture
        #[arg(long, conflicts_with = "image")]
        remove_image: bool,
    },
}
