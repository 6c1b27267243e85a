use anyhow::{Context, Result};
use chrono::Local;
use evolution_core::models::{sort_tasks, KanbanBoard, TaskCard, TaskDraft, TaskPatch, TaskStatus};
use evolution_core::utils::{contains_ignore_case, truncate};
use evolution_core::{optimistic, Route};
use tracing::warn;

use crate::app::App;
use crate::cli::TasksCommand;

/// Width of the title column in task listings
const TITLE_WIDTH: usize = 40;

pub async fn run(app: &App, cmd: TasksCommand) -> Result<()> {
    app.enter(Route::Tasks)?;

    match cmd {
        TasksCommand::Board => {
            let tasks = app.api.fetch_tasks().await.context("Could not fetch tasks")?;
            print_board(&tasks);
        }
        TasksCommand::List { sort, desc, search } => {
            let tasks = app.api.fetch_tasks().await.context("Could not fetch tasks")?;
            let sorted = sort_tasks(&tasks, sort.into(), !desc);
            let today = Local::now().date_naive();
            for task in sorted
                .into_iter()
                .filter(|t| search.as_deref().map_or(true, |q| contains_ignore_case(&t.title, q)))
            {
                let overdue = if task.is_overdue(today) { " (overdue)" } else { "" };
                println!(
                    "{:>5}  {:<width$}  {:<10}  {:<6}  {}{}",
                    task.id,
                    truncate(&task.title, TITLE_WIDTH),
                    task.status.to_string(),
                    task.priority.to_string(),
                    task.due_display(),
                    overdue,
                    width = TITLE_WIDTH,
                );
            }
        }
        TasksCommand::Add {
            title,
            summary,
            task_type,
            priority,
            status,
            due,
        } => {
            let draft = TaskDraft {
                title,
                summary,
                status: status.into(),
                task_type: task_type.into(),
                priority: priority.into(),
                due_date: due,
            };
            let task = app.api.create_task(&draft).await.context("Could not create task")?;
            println!("Created task {} \"{}\"", task.id, task.title);
        }
        TasksCommand::Move { id, status } => move_task(app, id, status.into()).await?,
        TasksCommand::Delete { id } => {
            app.api.delete_task(id).await.context("Could not delete task")?;
            println!("Deleted task {}", id);
        }
    }
    Ok(())
}

/// Move a card between columns, showing the new column right away and putting the
/// card back if the server refuses.
async fn move_task(app: &App, id: i64, status: TaskStatus) -> Result<()> {
    let mut tasks = app.api.fetch_tasks().await.context("Could not fetch tasks")?;
    let index = tasks
        .iter()
        .position(|t| t.id == id)
        .with_context(|| format!("No task with id {}", id))?;

    let patch = TaskPatch::status(status);
    let result = optimistic::apply(&mut tasks[index].status, status, || {
        app.api.update_task(id, &patch)
    })
    .await;

    print_board(&tasks);
    match result {
        Ok(task) => {
            println!("Moved \"{}\" to {}", task.title, task.status);
            Ok(())
        }
        Err(e) => {
            warn!(task = id, error = %e, "Task move rejected, card restored");
            Err(e.context(format!("Could not move task {}", id)))
        }
    }
}

fn print_board(tasks: &[TaskCard]) {
    let board = KanbanBoard::from_tasks(tasks);
    for status in TaskStatus::ALL {
        let column = board.column(status);
        println!("== {} ({}) ==", status, column.len());
        for task in column {
            println!(
                "  [{}] {} ({}, {})",
                task.id,
                truncate(&task.title, TITLE_WIDTH),
                task.priority,
                task.task_type
            );
        }
    }
}
