use anyhow::{bail, Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;
use tracing::{error, info};

mod accounts_menu;
mod app;
mod checks;
mod config;
mod domain;
mod error;
mod launcher;
mod logging;
mod settings;
mod status;
mod ui;

use accounts_menu::{add_account_dialog, manage_accounts_menu};
use app::{App, LaunchPlan};
use checks::check_paths;
use config::DataPaths;
use crate::domain::Resolution;
use settings::path_settings_menu;
use status::status_line;
use ui::{MenuEntry, MenuResult, Term, Ui};

// ── Command line ──────────────────────────────────────────────────────────────

struct Args {
    data_dir: Option<PathBuf>,
    skip_path_check: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { data_dir: None, skip_path_check: false };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--skip-path-check" => args.skip_path_check = true,
            "--data-dir" => match it.next() {
                Some(dir) => args.data_dir = Some(PathBuf::from(dir)),
                None => bail!("--data-dir needs a directory"),
            },
            "-h" | "--help" => {
                println!("usage: cardswitch [--data-dir DIR] [--skip-path-check]");
                std::process::exit(0);
            }
            other => bail!("unknown argument '{other}' (try --help)"),
        }
    }
    Ok(args)
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(ratatui::Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Card file resolution ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Update the status only; errors are still shown.
    Quiet,
    /// Also offer to add an unrecognised card.
    OfferAdd,
    /// Also announce every outcome.
    Announce,
}

pub fn refresh_and_report(ui: &mut Ui, app: &mut App, mode: Refresh) -> Result<()> {
    let outcome = app.refresh_active();
    ui.set_status(status_line(app));
    let announce = mode == Refresh::Announce;

    match outcome {
        Ok(Resolution::Matched { username, .. }) => {
            if announce {
                ui.flash_message(&format!("Current account: {username}"), 1000)?;
            }
        }
        Ok(Resolution::MissingFile) => {
            if announce {
                ui.flash_message("Current account unknown: the card file is missing.", 1500)?;
            }
        }
        Ok(Resolution::EmptyFile) => {
            if announce {
                ui.flash_message("Current account unknown: the card file is empty.", 1500)?;
            }
        }
        Ok(Resolution::Unmatched { token }) => {
            if mode == Refresh::Quiet {
                return Ok(());
            }
            let prompt = format!(
                "The card file holds card {token},\nbut no account uses it yet.\n\nAdd an account for this card now?"
            );
            if ui.confirm(&prompt)? {
                add_account_dialog(ui, app, Some(&token))?;
            }
        }
        Err(e) => {
            error!("{e}");
            ui.flash_message(&format!("Could not determine the current account: {e}"), 2000)?;
        }
    }
    Ok(())
}

pub fn show_path_check(ui: &mut Ui, app: &App) -> Result<()> {
    let report = check_paths(&app.settings, &app.paths.base);
    if report.is_clean() {
        return Ok(());
    }
    for w in &report.warnings {
        info!("path check: {w}");
    }
    ui.pager(&report.render(), "Path Check")
}

// ── Switch / launch ───────────────────────────────────────────────────────────

/// Rows of the account picker. The chosen row is mapped back by position,
/// so any username works, including ones that read like menu entries.
struct AccountPicker {
    names: Vec<String>,
    labels: Vec<String>,
}

impl AccountPicker {
    fn new(app: &App) -> Self {
        let names = app.displayed_order();
        let labels = names
            .iter()
            .map(|u| {
                if app.active() == Some(u.as_str()) {
                    format!("{u}  (current)")
                } else {
                    u.clone()
                }
            })
            .collect();
        Self { names, labels }
    }

    fn entries(&self) -> Vec<MenuEntry<'_>> {
        let mut entries: Vec<MenuEntry> = self.labels.iter().map(|l| MenuEntry::Item(l.as_str())).collect();
        entries.extend([MenuEntry::Separator, MenuEntry::Item("Back")]);
        entries
    }

    /// `None` for the trailing Back entry.
    fn username_at(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }
}

fn pick_account(ui: &mut Ui, app: &App, title: &str) -> Result<Option<String>> {
    if app.accounts.is_empty() {
        ui.flash_message("No accounts yet. Add one under Manage Accounts.", 1200)?;
        return Ok(None);
    }
    let picker = AccountPicker::new(app);
    let start = app.active_index().unwrap_or(0);
    let chosen = ui.run_list_at(title, &picker.entries(), Some(&app.active_label()), start)?;
    Ok(chosen.and_then(|pos| picker.username_at(pos)).map(str::to_string))
}

fn switch_account(ui: &mut Ui, app: &mut App, username: &str) -> Result<bool> {
    match app.switch(username) {
        Ok(()) => {
            ui.flash_message(&format!("Switched to {username}."), 800)?;
            Ok(true)
        }
        Err(e) => {
            error!("switch to {username} failed: {e}");
            ui.flash_message(&format!("Switch failed: {e}"), 2000)?;
            Ok(false)
        }
    }
}

fn launch_game(ui: &mut Ui, app: &App) -> Result<()> {
    match launcher::launch(&app.launch_path()) {
        Ok(()) => ui.flash_message("Game launched.", 1000),
        Err(e) => {
            error!("{e}");
            ui.flash_message(&format!("Launch failed: {e}\nCheck Path Settings."), 2000)
        }
    }
}

fn switch_and_launch(ui: &mut Ui, app: &mut App, selected: Option<&str>) -> Result<()> {
    match app.plan_launch(selected) {
        LaunchPlan::LaunchOnly => launch_game(ui, app),
        LaunchPlan::SwitchFirst(username) => {
            if !ui.confirm(&format!("Switch to {username} and launch the game?"))? {
                return Ok(());
            }
            if switch_account(ui, app, &username)? {
                launch_game(ui, app)?;
            }
            Ok(())
        }
    }
}

// ── Main application loop ─────────────────────────────────────────────────────

fn run(ui: &mut Ui, app: &mut App, load_warnings: &[error::StoreError], skip_path_check: bool) -> Result<()> {
    ui.set_status(status_line(app));

    if !load_warnings.is_empty() {
        let mut text = String::from("Some files could not be read; defaults were used:\n\n");
        for w in load_warnings {
            text.push_str(&format!("  ! {w}\n"));
        }
        ui.pager(&text, "Load Warnings")?;
    }
    if !skip_path_check {
        show_path_check(ui, app)?;
    }
    refresh_and_report(ui, app, Refresh::OfferAdd)?;

    loop {
        let subtitle = app.active_label();
        let result = ui.run_menu(
            "Main Menu",
            &[
                "Switch Account",
                "Switch & Launch",
                "Launch Game",
                "Refresh Current Account",
                "---",
                "Manage Accounts",
                "Path Settings",
                "---",
                "Exit",
            ],
            Some(&subtitle),
        )?;

        match result {
            MenuResult::Back => {}
            MenuResult::Selected(s) => match s.as_str() {
                "Switch Account" => {
                    if let Some(u) = pick_account(ui, app, "Switch Account")? {
                        switch_account(ui, app, &u)?;
                    }
                }
                "Switch & Launch" => {
                    if let Some(u) = pick_account(ui, app, "Switch & Launch")? {
                        switch_and_launch(ui, app, Some(&u))?;
                    }
                }
                "Launch Game" => switch_and_launch(ui, app, None)?,
                "Refresh Current Account" => refresh_and_report(ui, app, Refresh::Announce)?,
                "Manage Accounts" => manage_accounts_menu(ui, app)?,
                "Path Settings" => path_settings_menu(ui, app)?,
                "Exit" => break,
                _ => {}
            },
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = parse_args()?;

    let paths = match args.data_dir {
        Some(dir) => DataPaths::new(config::base_dir(), dir),
        None => DataPaths::beside_exe(),
    };
    std::fs::create_dir_all(&paths.data)
        .with_context(|| format!("creating data directory {}", paths.data.display()))?;
    logging::init(&paths.log_file());
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let (mut app, load_warnings) = App::load(paths);

    let mut ui = Ui::new(init_terminal()?);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run(&mut ui, &mut app, &load_warnings, args.skip_path_check)
    }));

    // Always restore terminal
    restore_terminal(&mut ui.terminal).ok();

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("{e:#}");
            Err(e)
        }
        Err(_) => {
            error!("panicked");
            eprintln!("cardswitch crashed. See {}", app.paths.log_file().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DATA_DIR_NAME;
    use crate::domain::AccountStore;

    fn app_with(accounts: &[(&str, &str)], dir: &std::path::Path) -> App {
        let (mut app, _) = App::load(DataPaths::new(dir, dir.join(DATA_DIR_NAME)));
        app.accounts = accounts.iter().copied().collect::<AccountStore>();
        app.settings.auth_file_path = dir.join("aime.txt").display().to_string();
        app
    }

    #[test]
    fn picker_maps_rows_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(&[("---", "T0"), ("Back", "T1"), ("bob", "T2")], dir.path());
        let picker = AccountPicker::new(&app);
        let entries = picker.entries();

        assert_eq!(ui::selectable_positions(&entries), vec![0, 1, 2, 4]);
        assert_eq!(picker.username_at(0), Some("---"));
        assert_eq!(picker.username_at(1), Some("Back"));
        assert_eq!(picker.username_at(4), None);
    }

    #[test]
    fn current_marker_does_not_confuse_lookalike_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&[("bob", "T1"), ("bob  (current)", "T2")], dir.path());
        app.switch("bob").unwrap();

        let picker = AccountPicker::new(&app);
        assert_eq!(picker.labels[0], picker.labels[1]);
        assert_eq!(picker.username_at(0), Some("bob"));
        assert_eq!(picker.username_at(1), Some("bob  (current)"));
    }
}
