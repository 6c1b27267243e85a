use anyhow::{Context, Result};
use chrono::Local;
use evolution_core::models::DashboardSummary;
use evolution_core::utils::format_percent;
use evolution_core::Route;

use crate::app::App;

pub async fn run(app: &App) -> Result<()> {
    app.enter(Route::Home)?;

    let (tasks, trackers, events) = futures::try_join!(
        app.api.fetch_tasks(),
        app.api.fetch_habit_trackers(),
        app.api.fetch_events(),
    )
    .context("Could not load dashboard")?;

    let summary = DashboardSummary::build(&tasks, &trackers, &events, Local::now().date_naive());

    println!("Tasks      {} total", summary.tasks_total());
    println!(
        "           {} to do, {} in progress, {} done, {} overdue",
        summary.tasks_to_do, summary.tasks_processing, summary.tasks_done, summary.tasks_overdue
    );
    println!(
        "Habits     {}/{} done today ({})",
        summary.habits_completed,
        summary.habits_today,
        format_percent(summary.habit_completion)
    );
    match summary.next_event {
        Some(next) => println!("Schedule   {} upcoming, next: {}", summary.upcoming_events, next),
        None => println!("Schedule   nothing upcoming"),
    }
    Ok(())
}
