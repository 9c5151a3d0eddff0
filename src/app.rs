use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{DataPaths, Settings};
use crate::domain::{reconcile, resolve, switch_to, AccountStore, Decision, Resolution};
use crate::error::{ReconcileError, ResolveError, StoreError, SwitchError};

/// Everything the screens read and mutate. Passed explicitly to each handler.
#[derive(Debug)]
pub struct App {
    pub paths: DataPaths,
    pub settings: Settings,
    pub accounts: AccountStore,
    /// What the card file held at the last resolve or switch.
    pub card: CardState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CardState {
    #[default]
    NotChecked,
    Resolved(Resolution),
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    LaunchOnly,
    /// Switch to this account first, after the user confirms.
    SwitchFirst(String),
}

impl App {
    /// Load both stores. Missing files are written back as defaults;
    /// unreadable ones fall back to defaults and come back as warnings.
    pub fn load(paths: DataPaths) -> (App, Vec<StoreError>) {
        let mut warnings = Vec::new();

        let accounts_file = paths.accounts_file();
        let accounts = AccountStore::load(&accounts_file);
        warnings.extend(accounts.warning);
        if !accounts_file.exists() {
            if let Err(e) = accounts.value.save(&accounts_file) {
                warnings.push(e);
            }
        }

        let settings_file = paths.settings_file();
        let settings = Settings::load(&settings_file);
        warnings.extend(settings.warning);
        if !settings_file.exists() {
            if let Err(e) = settings.value.save(&settings_file) {
                warnings.push(e);
            }
        }

        for w in &warnings {
            warn!("{w}");
        }
        info!(accounts = accounts.value.len(), data = %paths.data.display(), "stores loaded");

        let app = App {
            paths,
            settings: settings.value,
            accounts: accounts.value,
            card: CardState::NotChecked,
        };
        (app, warnings)
    }

    pub fn auth_path(&self) -> PathBuf {
        self.settings.auth_path(&self.paths.base)
    }

    pub fn launch_path(&self) -> PathBuf {
        self.settings.launch_path(&self.paths.base)
    }

    pub fn displayed_order(&self) -> Vec<String> {
        self.accounts.usernames()
    }

    /// Username whose card is in the card file, as of the last resolve.
    pub fn active(&self) -> Option<&str> {
        match &self.card {
            CardState::Resolved(Resolution::Matched { username, .. }) => Some(username.as_str()),
            _ => None,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        let active = self.active()?;
        self.displayed_order().iter().position(|u| u == active)
    }

    pub fn active_label(&self) -> String {
        let detail = match &self.card {
            CardState::NotChecked => "unknown".to_string(),
            CardState::Unreadable => "unknown (card file unreadable)".to_string(),
            CardState::Resolved(r) => match r {
                Resolution::Matched { username, .. } => username.clone(),
                Resolution::Unmatched { token } => format!("not in list (card {token})"),
                Resolution::MissingFile => "unknown (card file missing)".to_string(),
                Resolution::EmptyFile => "unknown (card file empty)".to_string(),
            },
        };
        format!("Current account: {detail}")
    }

    /// Re-read the card file and record which account it selects.
    pub fn refresh_active(&mut self) -> Result<Resolution, ResolveError> {
        let outcome = resolve(&self.auth_path(), &self.accounts, &self.displayed_order());
        self.card = match &outcome {
            Ok(r) => CardState::Resolved(r.clone()),
            Err(_) => CardState::Unreadable,
        };
        outcome
    }

    pub fn propose(&self, username: &str, token: &str) -> Result<Decision, ReconcileError> {
        reconcile(&self.accounts, username, token)
    }

    /// Apply an already-confirmed decision and persist when the store changed.
    /// The in-memory store only changes once the save succeeded.
    pub fn commit(&mut self, username: &str, token: &str, decision: &Decision) -> Result<bool, StoreError> {
        let mut next = self.accounts.clone();
        if !next.apply(username, token, decision) {
            return Ok(false);
        }
        next.save(&self.paths.accounts_file())?;
        self.accounts = next;
        info!(username = username.trim(), ?decision, "account saved");
        Ok(true)
    }

    pub fn delete_account(&mut self, username: &str) -> Result<String> {
        let mut next = self.accounts.clone();
        let token = next.remove(username)?;
        next.save(&self.paths.accounts_file())
            .context("saving accounts after delete")?;
        self.accounts = next;
        info!(username, "account deleted");
        Ok(token)
    }

    pub fn switch(&mut self, username: &str) -> Result<(), SwitchError> {
        let path = self.auth_path();
        switch_to(username, &self.accounts, &path)?;
        info!(username, card_file = %path.display(), "switched account");
        let index = self.displayed_order().iter().position(|u| u == username).unwrap_or_default();
        self.card = CardState::Resolved(Resolution::Matched { username: username.to_string(), index });
        Ok(())
    }

    pub fn plan_launch(&self, selected: Option<&str>) -> LaunchPlan {
        match selected {
            Some(u) if self.active() != Some(u) => LaunchPlan::SwitchFirst(u.to_string()),
            _ => LaunchPlan::LaunchOnly,
        }
    }

    /// Returns whether the value changed. Blank input is refused by the caller.
    pub fn set_auth_path(&mut self, path: &str) -> Result<bool, StoreError> {
        let path = path.trim();
        if path == self.settings.auth_file_path {
            return Ok(false);
        }
        let mut next = self.settings.clone();
        next.auth_file_path = path.to_string();
        next.save(&self.paths.settings_file())?;
        self.settings = next;
        info!(path, "card file path updated");
        Ok(true)
    }

    pub fn set_launch_path(&mut self, path: &str) -> Result<bool, StoreError> {
        let path = path.trim();
        if path == self.settings.launch_script_path {
            return Ok(false);
        }
        let mut next = self.settings.clone();
        next.launch_script_path = path.to_string();
        next.save(&self.paths.settings_file())?;
        self.settings = next;
        info!(path, "launch script path updated");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DATA_DIR_NAME;

    fn app_in(dir: &std::path::Path) -> App {
        let (mut app, warnings) = App::load(DataPaths::new(dir, dir.join(DATA_DIR_NAME)));
        assert!(warnings.is_empty());
        app.settings.auth_file_path = dir.join("aime.txt").display().to_string();
        app
    }

    fn add(app: &mut App, u: &str, t: &str) {
        let d = app.propose(u, t).unwrap();
        assert!(app.commit(u, t, &d).unwrap());
    }

    #[test]
    fn load_writes_missing_stores_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path(), dir.path().join(DATA_DIR_NAME));
        let (app, warnings) = App::load(paths.clone());
        assert!(warnings.is_empty());
        assert!(app.accounts.is_empty());
        assert!(paths.accounts_file().is_file());
        assert!(paths.settings_file().is_file());
    }

    #[test]
    fn malformed_accounts_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path(), dir.path().join(DATA_DIR_NAME));
        std::fs::create_dir_all(&paths.data).unwrap();
        std::fs::write(paths.accounts_file(), "[1, 2").unwrap();

        let (app, warnings) = App::load(paths);
        assert!(app.accounts.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], StoreError::MalformedStoreFile { .. }));
    }

    #[test]
    fn commit_persists_and_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        add(&mut app, "bob", "T2");

        let d = app.propose("carol", "T1").unwrap();
        assert!(app.commit("carol", "T1", &d).unwrap());

        let reloaded = AccountStore::load(&app.paths.accounts_file()).value;
        assert_eq!(reloaded, app.accounts);
        assert_eq!(reloaded.get("carol"), Some("T1"));
        assert_eq!(reloaded.get("alice"), None);
    }

    #[test]
    fn conflict_commit_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        add(&mut app, "bob", "T2");

        let d = app.propose("alice", "T2").unwrap();
        assert_eq!(d, Decision::Conflict);
        assert!(!app.commit("alice", "T2", &d).unwrap());
        assert_eq!(app.accounts.get("alice"), Some("T1"));
    }

    #[test]
    fn switch_sets_active_and_refresh_agrees() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        add(&mut app, "bob", "T2");

        app.switch("bob").unwrap();
        assert_eq!(app.active(), Some("bob"));
        assert_eq!(app.active_index(), Some(1));

        app.card = CardState::NotChecked;
        let r = app.refresh_active().unwrap();
        assert_eq!(r, Resolution::Matched { username: "bob".into(), index: 1 });
        assert_eq!(app.active(), Some("bob"));
    }

    #[test]
    fn deleting_active_account_clears_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        app.switch("alice").unwrap();

        assert_eq!(app.delete_account("alice").unwrap(), "T1");
        assert!(app.delete_account("alice").is_err());
        let r = app.refresh_active().unwrap();
        assert_eq!(r, Resolution::Unmatched { token: "T1".into() });
        assert_eq!(app.active(), None);
    }

    #[test]
    fn launch_plan_switches_only_when_needed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        add(&mut app, "bob", "T2");
        app.switch("alice").unwrap();

        assert_eq!(app.plan_launch(None), LaunchPlan::LaunchOnly);
        assert_eq!(app.plan_launch(Some("alice")), LaunchPlan::LaunchOnly);
        assert_eq!(app.plan_launch(Some("bob")), LaunchPlan::SwitchFirst("bob".into()));
    }

    #[test]
    fn path_updates_persist_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        assert!(app.set_launch_path(" /srv/start.bat ").unwrap());
        assert!(!app.set_launch_path("/srv/start.bat").unwrap());

        let saved = Settings::load(&app.paths.settings_file()).value;
        assert_eq!(saved.launch_script_path, "/srv/start.bat");
    }

    #[test]
    fn active_label_keeps_the_reason() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        assert_eq!(app.active_label(), "Current account: unknown");

        app.refresh_active().unwrap();
        assert_eq!(app.active_label(), "Current account: unknown (card file missing)");

        std::fs::write(app.auth_path(), "  \n").unwrap();
        app.refresh_active().unwrap();
        assert_eq!(app.active_label(), "Current account: unknown (card file empty)");

        std::fs::write(app.auth_path(), "T9").unwrap();
        app.refresh_active().unwrap();
        assert_eq!(app.active_label(), "Current account: not in list (card T9)");

        app.switch("alice").unwrap();
        assert_eq!(app.active_label(), "Current account: alice");
    }

    #[test]
    fn failed_saves_leave_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        add(&mut app, "alice", "T1");
        let settings_before = app.settings.clone();

        // A plain file where the data directory was makes every save fail.
        std::fs::remove_dir_all(&app.paths.data).unwrap();
        std::fs::write(&app.paths.data, "blocked").unwrap();

        let d = app.propose("bob", "T2").unwrap();
        assert!(app.commit("bob", "T2", &d).is_err());
        assert_eq!(app.accounts.get("bob"), None);

        assert!(app.delete_account("alice").is_err());
        assert_eq!(app.accounts.get("alice"), Some("T1"));

        assert!(app.set_launch_path("/srv/start.bat").is_err());
        assert!(app.set_auth_path("/srv/aime.txt").is_err());
        assert_eq!(app.settings, settings_before);
    }
}
