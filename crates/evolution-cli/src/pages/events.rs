use anyhow::{bail, Context, Result};
use chrono::Local;
use evolution_core::models::{upcoming_events, Event, EventDraft};
use evolution_core::Route;

use crate::app::App;
use crate::cli::EventsCommand;

pub async fn run(app: &App, cmd: EventsCommand) -> Result<()> {
    app.enter(Route::Schedule)?;

    match cmd {
        EventsCommand::List { all } => {
            let mut events = app.api.fetch_events().await.context("Could not fetch events")?;
            if all {
                events.sort_by_key(|e| e.start_time);
                print_events(events.iter());
            } else {
                let today = Local::now().date_naive();
                print_events(upcoming_events(&events, today).into_iter());
            }
        }
        EventsCommand::Add {
            subject,
            start,
            end,
            location,
            description,
            color,
        } => {
            if end <= start {
                bail!("Event must end after it starts");
            }
            let draft = EventDraft {
                subject,
                location,
                start_time: start,
                end_time: end,
                description,
                category_color: color,
            };
            let event = app.api.create_event(&draft).await.context("Could not add event")?;
            println!("Scheduled {} \"{}\" {}", event.id, event.subject, event.formatted_range());
        }
        EventsCommand::Edit {
            id,
            subject,
            start,
            end,
            location,
            description,
        } => {
            let events = app.api.fetch_events().await.context("Could not fetch events")?;
            let current = events
                .into_iter()
                .find(|e| e.id == id)
                .with_context(|| format!("No event with id {}", id))?;

            let draft = EventDraft {
                subject: subject.unwrap_or(current.subject),
                location: location.or(current.location),
                start_time: start.unwrap_or(current.start_time),
                end_time: end.unwrap_or(current.end_time),
                description: description.or(current.description),
                category_color: current.category_color,
            };
            if draft.end_time <= draft.start_time {
                bail!("Event must end after it starts");
            }
            let event = app
                .api
                .update_event(id, &draft)
                .await
                .context("Could not update event")?;
            println!("Updated {} \"{}\" {}", event.id, event.subject, event.formatted_range());
        }
        EventsCommand::Delete { id } => {
            app.api.delete_event(id).await.context("Could not delete event")?;
            println!("Deleted event {}", id);
        }
    }
    Ok(())
}

fn print_events<'a>(events: impl Iterator<Item = &'a Event>) {
    let mut any = false;
    for event in events {
        any = true;
        let location = event
            .location
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| format!(" @ {}", l))
            .unwrap_or_default();
        println!(
            "{:>5}  {} ({} min)  {}{}",
            event.id,
            event.formatted_range(),
            event.duration_minutes(),
            event.subject,
            location
        );
    }
    if !any {
        println!("No events scheduled.");
    }
}
