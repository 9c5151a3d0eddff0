use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

// ── Paths ─────────────────────────────────────────────────────────────────────

pub const DATA_DIR_NAME: &str = "LauncherConfig";
pub const ACCOUNTS_FILE_NAME: &str = "accounts.json";
pub const SETTINGS_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "cardswitch.log";

pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Where the stores live and what relative default paths are anchored to.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub base: PathBuf,
    pub data: PathBuf,
}

impl DataPaths {
    pub fn beside_exe() -> Self {
        let base = base_dir();
        Self { data: base.join(DATA_DIR_NAME), base }
    }

    pub fn new(base: impl Into<PathBuf>, data: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), data: data.into() }
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.data.join(ACCOUNTS_FILE_NAME)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data.join(SETTINGS_FILE_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data.join(LOG_FILE_NAME)
    }
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

/// A loaded value plus the problem that forced a fallback to defaults, if any.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warning: Option<StoreError>,
}

impl<T> Loaded<T> {
    fn clean(value: T) -> Self {
        Self { value, warning: None }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded { value: f(self.value), warning: self.warning }
    }
}

/// Missing and blank files load as `T::default()` without a warning.
/// Unreadable or unparsable files also load as the default, but say why.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Loaded<T> {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Loaded::clean(T::default()),
        Err(source) => {
            return Loaded {
                value: T::default(),
                warning: Some(StoreError::Io { path: path.to_path_buf(), source }),
            }
        }
    };
    if text.trim().is_empty() {
        return Loaded::clean(T::default());
    }
    match serde_json::from_str(&text) {
        Ok(v) => Loaded::clean(v),
        Err(source) => Loaded {
            value: T::default(),
            warning: Some(StoreError::MalformedStoreFile { path: path.to_path_buf(), source }),
        },
    }
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?;
    }
    let json = serde_json::to_string_pretty(data)
        .map_err(|source| StoreError::Encode { path: path.to_path_buf(), source })?;
    std::fs::write(path, json).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

// ── Settings ──────────────────────────────────────────────────────────────────

pub const PLACEHOLDER_AUTH_PATH: &str = "<set the card file (aime.txt) path>";
pub const PLACEHOLDER_LAUNCH_PATH: &str = "<set the launch script path>";

// Relative to the executable directory; the launcher normally sits one
// level below the game root.
const DEFAULT_AUTH_PATH: &[&str] = &["..", "AMDaemon", "DEVICE", "aime.txt"];
const DEFAULT_LAUNCH_PATH: &[&str] = &["..", "start.bat"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "placeholder_auth_path")]
    pub auth_file_path: String,
    #[serde(rename = "launch_bat_path", default = "placeholder_launch_path")]
    pub launch_script_path: String,
}

fn placeholder_auth_path() -> String {
    PLACEHOLDER_AUTH_PATH.to_string()
}

fn placeholder_launch_path() -> String {
    PLACEHOLDER_LAUNCH_PATH.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auth_file_path: placeholder_auth_path(),
            launch_script_path: placeholder_launch_path(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Loaded<Settings> {
        load_json::<Settings>(path).map(|mut s| {
            s.normalize();
            s
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }

    fn normalize(&mut self) {
        if self.auth_file_path.trim().is_empty() {
            self.auth_file_path = placeholder_auth_path();
        }
        if self.launch_script_path.trim().is_empty() {
            self.launch_script_path = placeholder_launch_path();
        }
    }

    pub fn auth_is_default(&self) -> bool {
        self.auth_file_path == PLACEHOLDER_AUTH_PATH
    }

    pub fn launch_is_default(&self) -> bool {
        self.launch_script_path == PLACEHOLDER_LAUNCH_PATH
    }

    pub fn auth_path(&self, base: &Path) -> PathBuf {
        if self.auth_is_default() {
            default_path(base, DEFAULT_AUTH_PATH)
        } else {
            PathBuf::from(&self.auth_file_path)
        }
    }

    pub fn launch_path(&self, base: &Path) -> PathBuf {
        if self.launch_is_default() {
            default_path(base, DEFAULT_LAUNCH_PATH)
        } else {
            PathBuf::from(&self.launch_script_path)
        }
    }
}

fn default_path(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |p, part| p.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_keeps_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        Settings::default().save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["auth_file_path"], PLACEHOLDER_AUTH_PATH);
        assert_eq!(raw["launch_bat_path"], PLACEHOLDER_LAUNCH_PATH);

        let loaded = Settings::load(&path);
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.value, Settings::default());
    }

    #[test]
    fn empty_and_missing_values_load_as_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "auth_file_path": "  " }"#).unwrap();

        let loaded = Settings::load(&path);
        assert!(loaded.warning.is_none());
        assert!(loaded.value.auth_is_default());
        assert!(loaded.value.launch_is_default());
    }

    #[test]
    fn malformed_settings_fall_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.value, Settings::default());
        assert!(matches!(loaded.warning, Some(StoreError::MalformedStoreFile { .. })));
    }

    #[test]
    fn placeholder_paths_resolve_next_to_base() {
        let s = Settings::default();
        let base = Path::new("/opt/game/launcher");
        assert_eq!(
            s.auth_path(base),
            base.join("..").join("AMDaemon").join("DEVICE").join("aime.txt")
        );
        assert_eq!(s.launch_path(base), base.join("..").join("start.bat"));

        let custom = Settings {
            auth_file_path: "/srv/aime.txt".into(),
            launch_script_path: "/srv/go.sh".into(),
        };
        assert_eq!(custom.auth_path(base), PathBuf::from("/srv/aime.txt"));
        assert_eq!(custom.launch_path(base), PathBuf::from("/srv/go.sh"));
    }

    #[test]
    fn save_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path(), dir.path().join(DATA_DIR_NAME));
        Settings::default().save(&paths.settings_file()).unwrap();
        assert!(paths.settings_file().is_file());
    }
}
