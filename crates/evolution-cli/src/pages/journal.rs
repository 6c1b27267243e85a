use anyhow::{Context, Result};
use evolution_core::models::JournalDraft;
use evolution_core::Route;
use tracing::debug;

use crate::app::App;
use crate::cli::JournalCommand;

pub async fn run(app: &App, cmd: JournalCommand) -> Result<()> {
    app.enter(Route::Journal)?;

    match cmd {
        JournalCommand::Today => {
            match app
                .api
                .fetch_today_journal()
                .await
                .context("Could not load journal")?
            {
                Some(entry) => {
                    if !entry.title.is_empty() {
                        println!("# {}", entry.title);
                    }
                    println!("{}", entry.plain_text());
                }
                None => {
                    println!("Nothing written today. Start with `evolution journal write <text>`.")
                }
            }
        }
        JournalCommand::Write { text, title } => {
            let draft = JournalDraft::from_plain_text(&title, &text);
            let existing = app
                .api
                .fetch_today_journal()
                .await
                .context("Could not load journal")?;

            let entry = match existing {
                Some(entry) => {
                    debug!(entry = entry.journal_entry_id, "Updating today's journal entry");
                    app.api
                        .update_journal_entry(entry.journal_entry_id, &draft)
                        .await
                }
                None => app.api.create_journal_entry(&draft).await,
            }
            .context("Could not save journal")?;
            println!("Saved journal entry for {}", entry.date_created.format("%b %d, %Y"));
        }
        JournalCommand::List => {
            let mut entries = app
                .api
                .fetch_journal_entries()
                .await
                .context("Could not load journal")?;
            entries.sort_by(|a, b| b.date_created.cmp(&a.date_created));
            for entry in entries {
                let title = if entry.title.is_empty() {
                    "(untitled)"
                } else {
                    entry.title.as_str()
                };
                println!("{}  {}", entry.date_created.format("%Y-%m-%d"), title);
            }
        }
    }
    Ok(())
}
