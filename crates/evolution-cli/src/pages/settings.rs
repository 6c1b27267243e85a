use anyhow::{bail, Context, Result};
use evolution_core::models::ProfileUpdate;
use evolution_core::Route;

use crate::app::App;
use crate::cli::ProfileCommand;

pub async fn run(app: &App, cmd: ProfileCommand) -> Result<()> {
    app.enter(Route::Settings)?;

    match cmd {
        ProfileCommand::Show => {
            let profile = app.api.fetch_profile().await.context("Could not load profile")?;
            println!("{} (@{})", profile.display_name(), profile.username);
            for (label, value) in [
                ("Email", &profile.email),
                ("Country", &profile.country),
                ("Bio", &profile.bio),
                ("Image", &profile.profile_image),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    println!("{:<8} {}", label, value);
                }
            }
        }
        ProfileCommand::Update {
            name,
            email,
            country,
            bio,
            change_password,
            image,
            remove_image,
        } => {
            let mut update = ProfileUpdate {
                name,
                email,
                country,
                bio,
                profile_image: image,
                remove_image,
                ..Default::default()
            };
            if change_password {
                update.password = Some(rpassword::prompt_password("New password: ")?);
            }
            if update.is_empty() {
                bail!("No changes detected.");
            }

            update.current_password = Some(rpassword::prompt_password("Current password: ")?);
            if !update.has_current_password() {
                bail!("Current password is required for any profile update.");
            }

            let profile = app
                .api
                .update_profile(&update)
                .await
                .context("Update failed")?;
            println!("Profile updated for {}", profile.display_name());
        }
    }
    Ok(())
}

pub async fn badges(app: &App) -> Result<()> {
    app.enter(Route::Home)?;

    let badges = app.api.fetch_badges().await.context("Could not load badges")?;
    if badges.is_empty() {
        println!("No badges earned yet.");
    }
    for earned in badges {
        let kind = earned.badge.badge_type.as_deref().unwrap_or("general");
        println!("{} - {}", earned.badge.title, kind);
        if !earned.badge.description.is_empty() {
            println!("    {}", earned.badge.description);
        }
    }
    Ok(())
}
