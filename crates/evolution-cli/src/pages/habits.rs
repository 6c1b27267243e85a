use anyhow::{Context, Result};
use evolution_core::models::{completion_rate, HabitDraft, HabitTracker};
use evolution_core::utils::format_percent;
use evolution_core::{optimistic, Route};
use tracing::warn;

use crate::app::App;
use crate::cli::HabitsCommand;

pub async fn run(app: &App, cmd: HabitsCommand) -> Result<()> {
    app.enter(Route::Habits)?;

    match cmd {
        HabitsCommand::List => {
            let habits = app.api.fetch_habits().await.context("Could not fetch habits")?;
            if habits.is_empty() {
                println!("No habits yet. Add one with `evolution habits add <name>`.");
            }
            for habit in habits {
                match habit.habit_description.as_deref().filter(|d| !d.is_empty()) {
                    Some(description) => {
                        println!("{:>5}  {} - {}", habit.id, habit.habit_name, description)
                    }
                    None => println!("{:>5}  {}", habit.id, habit.habit_name),
                }
            }
        }
        HabitsCommand::Add { name, description } => {
            let draft = HabitDraft {
                habit_name: name,
                habit_description: description,
            };
            let habit = app.api.create_habit(&draft).await.context("Could not add habit")?;
            println!("Added habit {} \"{}\"", habit.id, habit.habit_name);
        }
        HabitsCommand::Edit { id, name, description } => {
            let draft = HabitDraft {
                habit_name: name,
                habit_description: description,
            };
            let habit = app
                .api
                .update_habit(id, &draft)
                .await
                .context("Could not update habit")?;
            println!("Updated habit {} \"{}\"", habit.id, habit.habit_name);
        }
        HabitsCommand::Delete { id } => {
            app.api.delete_habit(id).await.context("Could not delete habit")?;
            println!("Deleted habit {}", id);
        }
        HabitsCommand::Today => {
            let trackers = app
                .api
                .fetch_habit_trackers()
                .await
                .context("Could not fetch today's habits")?;
            print_trackers(&trackers);
        }
        HabitsCommand::Toggle { tracker_id } => toggle(app, tracker_id).await?,
    }
    Ok(())
}

/// Flip one checkbox. The local value changes first and is restored if the
/// server rejects the update.
async fn toggle(app: &App, tracker_id: i64) -> Result<()> {
    let mut trackers = app
        .api
        .fetch_habit_trackers()
        .await
        .context("Could not fetch today's habits")?;
    let index = trackers
        .iter()
        .position(|t| t.id == tracker_id)
        .with_context(|| format!("No habit entry {} for today", tracker_id))?;

    let target = !trackers[index].is_completed;
    let result = optimistic::apply(&mut trackers[index].is_completed, target, || {
        app.api.set_habit_completed(tracker_id, target)
    })
    .await;

    if let Ok(confirmed) = &result {
        trackers[index] = confirmed.clone();
    }
    print_trackers(&trackers);

    result.map(|_| ()).map_err(|e| {
        warn!(tracker = tracker_id, error = %e, "Habit update rejected, checkbox restored");
        e.context("Could not update habit completion")
    })
}

fn print_trackers(trackers: &[HabitTracker]) {
    if trackers.is_empty() {
        println!("Nothing to track today.");
        return;
    }
    for tracker in trackers {
        let mark = if tracker.is_completed { "x" } else { " " };
        println!("[{}] {:>5}  {}", mark, tracker.id, tracker.habit_name);
    }
    println!("Completed today: {}", format_percent(completion_rate(trackers)));
}
