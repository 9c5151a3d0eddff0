use std::io::ErrorKind;
use std::path::Path;

use crate::domain::accounts::AccountStore;
use crate::error::SwitchError;

/// Replace the card file's contents with `username`'s card number.
/// No trailing newline is written.
pub fn switch_to(username: &str, store: &AccountStore, card_file: &Path) -> Result<(), SwitchError> {
    let token = store
        .get(username)
        .ok_or_else(|| SwitchError::UnknownUsername(username.to_string()))?;

    if let Some(dir) = card_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|source| SwitchError::DirectoryCreateFailed {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }

    std::fs::write(card_file, token).map_err(|source| match source.kind() {
        ErrorKind::PermissionDenied => SwitchError::PermissionDenied(card_file.to_path_buf()),
        _ => SwitchError::WriteFailed { path: card_file.to_path_buf(), source },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AccountStore {
        [("alice", "T1"), ("bob", "T2")].into_iter().collect()
    }

    #[test]
    fn overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aime.txt");
        std::fs::write(&path, "a much longer previous card number\n").unwrap();

        switch_to("bob", &store(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "T2");
    }

    #[test]
    fn unknown_username_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aime.txt");
        std::fs::write(&path, "T1").unwrap();

        let err = switch_to("mallory", &store(), &path).unwrap_err();
        assert!(matches!(err, SwitchError::UnknownUsername(ref u) if u == "mallory"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "T1");
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AMDaemon").join("DEVICE").join("aime.txt");

        switch_to("alice", &store(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "T1");
    }

    #[test]
    fn directory_target_is_a_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = switch_to("alice", &store(), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            SwitchError::WriteFailed { .. } | SwitchError::PermissionDenied(_)
        ));
    }

    #[test]
    fn parent_blocked_by_file_fails_directory_create() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("DEVICE");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = switch_to("alice", &store(), &blocker.join("sub").join("aime.txt")).unwrap_err();
        assert!(matches!(err, SwitchError::DirectoryCreateFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_card_file_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aime.txt");
        std::fs::write(&path, "T1").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();

        // Root ignores file modes.
        if std::fs::OpenOptions::new().write(true).open(&path).is_ok() {
            return;
        }

        let err = switch_to("bob", &store(), &path).unwrap_err();
        assert!(matches!(err, SwitchError::PermissionDenied(ref p) if p == &path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "T1");
    }
}
