use crate::domain::accounts::AccountStore;
use crate::error::ReconcileError;

/// What saving a (username, card number) pair would do to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The exact pair is already stored.
    NoOp,
    /// Both the username and the card number are new.
    Insert,
    /// The username exists with a different card; the new card is free.
    UpdateToken { old_token: String },
    /// The card belongs to `old_username`; the new username is free.
    RenameOwner { old_username: String },
    /// The username exists with another card and the new card is taken.
    /// Which of the two collisions fired is deliberately not reported.
    Conflict,
}

impl Decision {
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Decision::UpdateToken { .. } | Decision::RenameOwner { .. })
    }
}

/// Classify a proposed edit against the store. Inputs are trimmed first.
/// Nothing is mutated here; see [`AccountStore::apply`].
pub fn reconcile(
    store: &AccountStore,
    username: &str,
    token: &str,
) -> Result<Decision, ReconcileError> {
    let (username, token) = (username.trim(), token.trim());
    if username.is_empty() || token.is_empty() {
        return Err(ReconcileError::InvalidInput);
    }

    match (store.get(username), store.owner_of(token)) {
        (Some(current), _) if current == token => Ok(Decision::NoOp),
        (None, None) => Ok(Decision::Insert),
        (Some(current), None) => Ok(Decision::UpdateToken {
            old_token: current.to_string(),
        }),
        (Some(_), Some(owner)) if owner != username => Ok(Decision::Conflict),
        (None, Some(owner)) => Ok(Decision::RenameOwner {
            old_username: owner.to_string(),
        }),
        // The user owns the card yet holds a different one.
        (Some(_), Some(_)) => Err(ReconcileError::Unreachable {
            username: username.to_string(),
            token: token.to_string(),
        }),
    }
}
