use std::path::Path;

use crate::config::Settings;

#[derive(Debug, Default)]
pub struct PathReport {
    pub warnings: Vec<String>,
}

impl PathReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Startup check found problems:\n\n");
        for w in &self.warnings {
            out.push_str(&format!("  ! {w}\n\n"));
        }
        out.push_str(
            "Place the launcher folder inside the game directory, or set valid\n\
             paths under Path Settings.",
        );
        out
    }
}

// (label, configured value is the placeholder, effective path)
fn checked_paths(settings: &Settings, base: &Path) -> [(&'static str, bool, std::path::PathBuf); 2] {
    [
        ("card file", settings.auth_is_default(), settings.auth_path(base)),
        ("launch script", settings.launch_is_default(), settings.launch_path(base)),
    ]
}

pub fn check_paths(settings: &Settings, base: &Path) -> PathReport {
    let mut warnings = Vec::new();
    for (label, is_default, path) in checked_paths(settings, base) {
        if path.is_file() {
            continue;
        }
        let msg = if is_default {
            format!("default {label} not found at '{}'", path.display())
        } else {
            format!("configured {label} is missing or not a file: '{}'", path.display())
        };
        warnings.push(msg);
    }
    PathReport { warnings }
}
