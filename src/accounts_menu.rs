use anyhow::Result;
use tracing::error;

use crate::app::App;
use crate::domain::Decision;
use crate::error::ReconcileError;
use crate::ui::{MenuEntry, MenuResult, Ui};

// ── Account management ────────────────────────────────────────────────────────

fn row_label(username: &str, token: &str) -> String {
    format!("{username}  [{token}]")
}

pub fn manage_accounts_menu(ui: &mut Ui, app: &mut App) -> Result<()> {
    let mut cursor = 0usize;
    loop {
        let rows: Vec<(String, String)> = app
            .accounts
            .iter()
            .map(|(u, t)| (row_label(u, t), u.to_string()))
            .collect();

        let mut entries: Vec<MenuEntry> = rows.iter().map(|(label, _)| MenuEntry::Item(label.as_str())).collect();
        if !entries.is_empty() {
            entries.push(MenuEntry::Separator);
        }
        let add_at = entries.len();
        entries.extend([MenuEntry::Item("Add / Update Account"), MenuEntry::Separator, MenuEntry::Item("Back")]);

        let subtitle = format!("{} account(s). Select one to edit or delete.", rows.len());
        match ui.run_list_at("Manage Accounts", &entries, Some(&subtitle), cursor)? {
            Some(pos) if pos < rows.len() => {
                cursor = pos;
                account_actions(ui, app, &rows[pos].1)?;
            }
            Some(pos) if pos == add_at => {
                add_account_dialog(ui, app, None)?;
                cursor = rows.len();
            }
            _ => break,
        }
    }
    Ok(())
}

fn account_actions(ui: &mut Ui, app: &mut App, username: &str) -> Result<()> {
    let Some(token) = app.accounts.get(username).map(str::to_string) else {
        return Ok(());
    };
    let title = format!("Account: {username}");
    let subtitle = format!("Card number: {token}");
    let choice = ui.run_menu(
        &title,
        &["Change Card Number", "Rename", "Delete", "---", "Back"],
        Some(&subtitle),
    )?;
    let MenuResult::Selected(choice) = choice else {
        return Ok(());
    };

    match choice.as_str() {
        "Change Card Number" => {
            if let Some(new_token) = ui.input_prompt(&format!("New card number for '{username}':"), &token)? {
                submit_account(ui, app, username, &new_token)?;
            }
        }
        "Rename" => {
            if let Some(new_name) = ui.input_prompt(&format!("New username for card {token}:"), username)? {
                submit_account(ui, app, &new_name, &token)?;
            }
        }
        "Delete" => {
            if ui.confirm(&format!("Delete account '{username}'?"))? {
                match app.delete_account(username) {
                    Ok(_) => {
                        ui.flash_message(&format!("Account '{username}' deleted."), 800)?;
                        crate::refresh_and_report(ui, app, crate::Refresh::Quiet)?;
                    }
                    Err(e) => {
                        error!("delete failed: {e:#}");
                        ui.flash_message(&format!("Delete failed: {e:#}"), 1500)?;
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Ask for a username and card number, then run them through reconciliation.
/// `prefill_token` comes from an unrecognised card found in the card file.
pub fn add_account_dialog(ui: &mut Ui, app: &mut App, prefill_token: Option<&str>) -> Result<()> {
    let Some(username) = ui.input_prompt("Username:", "")? else {
        return Ok(());
    };
    let Some(token) = ui.input_prompt(&format!("Card number for '{username}':"), prefill_token.unwrap_or(""))? else {
        return Ok(());
    };
    submit_account(ui, app, &username, &token)
}

fn submit_account(ui: &mut Ui, app: &mut App, username: &str, token: &str) -> Result<()> {
    let (username, token) = (username.trim(), token.trim());
    let decision = match app.propose(username, token) {
        Ok(d) => d,
        Err(ReconcileError::InvalidInput) => {
            return ui.flash_message("Username and card number cannot be empty.", 1200);
        }
        Err(e) => {
            error!("reconcile: {e}");
            return ui.flash_message(&format!("Internal error: {e}. Nothing was changed."), 2000);
        }
    };

    let prompt = match &decision {
        Decision::NoOp => {
            return ui.flash_message(
                &format!("'{username}' already has card {token}. Nothing changed."),
                1200,
            );
        }
        Decision::Conflict => {
            return ui.flash_message(
                &format!("Cannot save: username '{username}' or card {token} is already taken."),
                1800,
            );
        }
        Decision::Insert => String::new(),
        Decision::UpdateToken { old_token } => format!(
            "'{username}' already exists.\nChange its card number from {old_token} to {token}?"
        ),
        Decision::RenameOwner { old_username } => format!(
            "Card {token} belongs to '{old_username}'.\nRename that account to '{username}'?"
        ),
    };
    if decision.needs_confirmation() && !ui.confirm(&prompt)? {
        return Ok(());
    }

    match app.commit(username, token, &decision) {
        Ok(_) => {
            ui.flash_message(&format!("Saved '{username}' with card {token}."), 800)?;
            crate::refresh_and_report(ui, app, crate::Refresh::Quiet)
        }
        Err(e) => {
            error!("{e}");
            ui.flash_message(&format!("Could not save accounts: {e}"), 2000)
        }
    }
}
