use anyhow::Result;
use tracing::error;

use crate::app::App;
use crate::status::status_line;
use crate::ui::{MenuResult, Ui};

#[derive(Clone, Copy)]
enum PathField {
    CardFile,
    LaunchScript,
}

// ── Path settings menu ────────────────────────────────────────────────────────

pub fn path_settings_menu(ui: &mut Ui, app: &mut App) -> Result<()> {
    loop {
        let card_label = format!("Card File: {}", app.auth_path().display());
        let launch_label = format!("Launch Script: {}", app.launch_path().display());
        let choices = [card_label.as_str(), launch_label.as_str(), "---", "Back"];

        match ui.run_menu("Path Settings", &choices, Some("Select a path to change it"))? {
            MenuResult::Back => break,
            MenuResult::Selected(s) => match s.as_str() {
                l if l == card_label => edit_path(ui, app, PathField::CardFile)?,
                l if l == launch_label => edit_path(ui, app, PathField::LaunchScript)?,
                _ => break,
            },
        }
    }
    Ok(())
}

fn edit_path(ui: &mut Ui, app: &mut App, field: PathField) -> Result<()> {
    let (prompt, current, is_default) = match field {
        PathField::CardFile => (
            "Path to the card file (aime.txt):",
            app.settings.auth_file_path.clone(),
            app.settings.auth_is_default(),
        ),
        PathField::LaunchScript => (
            "Path to the game launch script:",
            app.settings.launch_script_path.clone(),
            app.settings.launch_is_default(),
        ),
    };
    let initial = if is_default { "" } else { current.as_str() };

    let Some(input) = ui.input_prompt(prompt, initial)? else {
        return Ok(());
    };
    if input.is_empty() {
        return ui.flash_message("Path cannot be empty.", 1000);
    }

    let saved = match field {
        PathField::CardFile => app.set_auth_path(&input),
        PathField::LaunchScript => app.set_launch_path(&input),
    };
    match saved {
        Ok(false) => Ok(()),
        Ok(true) => {
            ui.set_status(status_line(app));
            ui.flash_message("Path updated.", 800)?;
            if matches!(field, PathField::CardFile) {
                crate::refresh_and_report(ui, app, crate::Refresh::OfferAdd)?;
            }
            crate::show_path_check(ui, app)
        }
        Err(e) => {
            error!("{e}");
            ui.flash_message(&format!("Could not save settings: {e}"), 2000)
        }
    }
}
