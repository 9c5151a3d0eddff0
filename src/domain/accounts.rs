use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{load_json, save_json, Loaded};
use crate::domain::reconcile::Decision;
use crate::error::{AccountError, StoreError};

// ── Account store ─────────────────────────────────────────────────────────────

/// Username → card number. Sorted by username, so every scan is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountStore {
    accounts: BTreeMap<String, String>,
}

impl AccountStore {
    pub fn load(path: &Path) -> Loaded<AccountStore> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, username: &str) -> Option<&str> {
        self.accounts.get(username).map(String::as_str)
    }

    /// First username, in sorted order, holding `token`.
    pub fn owner_of(&self, token: &str) -> Option<&str> {
        self.accounts
            .iter()
            .find(|(_, t)| t.as_str() == token)
            .map(|(u, _)| u.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.accounts.iter().map(|(u, t)| (u.as_str(), t.as_str()))
    }

    /// The order accounts are listed in on screen.
    pub fn usernames(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }

    /// Carry out a decision from [`crate::domain::reconcile`]. Returns whether
    /// the store changed; the caller persists when it did.
    pub fn apply(&mut self, username: &str, token: &str, decision: &Decision) -> bool {
        let (username, token) = (username.trim(), token.trim());
        match decision {
            Decision::NoOp | Decision::Conflict => false,
            Decision::Insert | Decision::UpdateToken { .. } => {
                self.accounts.insert(username.to_string(), token.to_string());
                true
            }
            Decision::RenameOwner { old_username } => {
                self.accounts.remove(old_username);
                self.accounts.insert(username.to_string(), token.to_string());
                true
            }
        }
    }

    /// Returns the card number the account held.
    pub fn remove(&mut self, username: &str) -> Result<String, AccountError> {
        self.accounts
            .remove(username)
            .ok_or_else(|| AccountError::UnknownUsername(username.to_string()))
    }
}

impl<U: Into<String>, T: Into<String>> FromIterator<(U, T)> for AccountStore {
    fn from_iter<I: IntoIterator<Item = (U, T)>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().map(|(u, t)| (u.into(), t.into())).collect(),
        }
    }
}
