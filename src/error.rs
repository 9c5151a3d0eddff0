use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("malformed store file {path}: {source}")]
    MalformedStoreFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("username and card number must both be non-empty")]
    InvalidInput,

    /// The decision table fell through. Nothing has been mutated.
    #[error("unhandled account state for '{username}' / '{token}'")]
    Unreachable { username: String, token: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountError {
    #[error("no account named '{0}'")]
    UnknownUsername(String),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("could not read card file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("account '{username}' holds card {token} but is missing from the account list")]
    DisplayInconsistency { username: String, token: String },
}

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("no account named '{0}'")]
    UnknownUsername(String),

    #[error("could not create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("permission denied writing {0}")]
    PermissionDenied(PathBuf),

    #[error("could not write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("launch script not found: {0}")]
    MissingScript(PathBuf),

    #[error("could not start {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
