use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{info, warn};

#[cfg(unix)]
use std::os::unix::process::CommandExt;
#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

#[cfg(target_os = "windows")]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(target_os = "windows")]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

use crate::error::LaunchError;

/// Start the game script detached, working from the script's own directory.
/// The game gets its own process group (its own console on Windows), so it
/// outlives the launcher's terminal. A background thread reaps it on exit.
pub fn launch(script: &Path) -> Result<(), LaunchError> {
    if !script.is_file() {
        return Err(LaunchError::MissingScript(script.to_path_buf()));
    }
    let workdir = script
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut command = script_command(script);
    command
        .current_dir(&workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut command);

    let mut child = command
        .spawn()
        .map_err(|source| LaunchError::Spawn { path: script.to_path_buf(), source })?;

    let pid = child.id();
    info!(pid, script = %script.display(), workdir = %workdir.display(), "launched game script");

    std::thread::spawn(move || match child.wait() {
        Ok(status) => info!(pid, %status, "game script exited"),
        Err(e) => warn!(pid, "could not wait for game script: {e}"),
    });
    Ok(())
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    command.process_group(0);
}

#[cfg(target_os = "windows")]
fn detach(command: &mut Command) {
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, target_os = "windows")))]
fn detach(_command: &mut Command) {}

#[cfg(target_os = "windows")]
fn script_command(script: &Path) -> Command {
    let is_batch = script
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("bat") || e.eq_ignore_ascii_case("cmd"))
        .unwrap_or(false);
    if is_batch {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(script);
        cmd
    } else {
        Command::new(script)
    }
}

#[cfg(not(target_os = "windows"))]
fn script_command(script: &Path) -> Command {
    Command::new(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_script_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("start.bat");
        assert!(matches!(launch(&path), Err(LaunchError::MissingScript(p)) if p == path));
    }

    #[test]
    fn directory_is_not_a_script() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(launch(dir.path()), Err(LaunchError::MissingScript(_))));
    }

    /// Write an executable script into `game/` and launch it, retrying while
    /// another test thread still holds the freshly written file open.
    #[cfg(unix)]
    fn launch_script(root: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let game = root.join("game");
        std::fs::create_dir_all(&game).unwrap();
        let script = game.join("start.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        for _ in 0..20 {
            match launch(&script) {
                Ok(()) => return game,
                Err(LaunchError::Spawn { .. }) => std::thread::sleep(std::time::Duration::from_millis(50)),
                Err(e) => panic!("{e}"),
            }
        }
        panic!("could not start {}", script.display());
    }

    #[cfg(unix)]
    fn wait_for_line(path: &Path) -> String {
        for _ in 0..100 {
            if let Ok(text) = std::fs::read_to_string(path) {
                if text.ends_with('\n') {
                    return text.trim().to_string();
                }
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        panic!("{} was never written", path.display());
    }

    #[cfg(unix)]
    #[test]
    fn runs_from_the_script_directory() {
        let dir = tempfile::tempdir().unwrap();
        let game = launch_script(dir.path(), "pwd > cwd.txt.tmp && mv cwd.txt.tmp cwd.txt");

        let cwd = wait_for_line(&game.join("cwd.txt"));
        assert_eq!(
            std::fs::canonicalize(cwd).unwrap(),
            std::fs::canonicalize(&game).unwrap()
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn script_leads_its_own_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let game = launch_script(
            dir.path(),
            "echo \"$$ $(cut -d' ' -f5 /proc/$$/stat)\" > ids.txt.tmp && mv ids.txt.tmp ids.txt",
        );

        let ids = wait_for_line(&game.join("ids.txt"));
        let (pid, pgid) = ids.split_once(' ').unwrap();
        assert_eq!(pid, pgid);
    }
}
