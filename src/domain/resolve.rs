use std::path::Path;

use crate::domain::accounts::AccountStore;
use crate::error::ResolveError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `index` is the account's position in the displayed list.
    Matched { username: String, index: usize },
    /// The card file holds a card no account owns.
    Unmatched { token: String },
    MissingFile,
    EmptyFile,
}

/// Work out which stored account the card file currently selects.
/// The file is re-read on every call, so outside edits are picked up.
pub fn resolve(
    card_file: &Path,
    store: &AccountStore,
    displayed: &[String],
) -> Result<Resolution, ResolveError> {
    if !card_file.is_file() {
        return Ok(Resolution::MissingFile);
    }
    let raw = std::fs::read_to_string(card_file).map_err(|source| ResolveError::Read {
        path: card_file.to_path_buf(),
        source,
    })?;
    let token = raw.trim();
    if token.is_empty() {
        return Ok(Resolution::EmptyFile);
    }

    let Some(username) = store.owner_of(token) else {
        return Ok(Resolution::Unmatched { token: token.to_string() });
    };
    let index = displayed
        .iter()
        .position(|u| u == username)
        .ok_or_else(|| ResolveError::DisplayInconsistency {
            username: username.to_string(),
            token: token.to_string(),
        })?;
    Ok(Resolution::Matched { username: username.to_string(), index })
}
