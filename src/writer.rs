//! Backup-then-overwrite config persistence
//!
//! A config file is never overwritten unless a timestamped copy of its
//! previous contents has landed in the backup directory first. Every step is
//! a hard precondition for the next; every failure carries the underlying
//! I/O error and aborts only this one write.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Backups land here, relative to the working directory.
pub const BACKUP_DIR: &str = "backup-configs";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write permission denied for {path} (read-only file or attributes)")]
    PermissionDenied { path: PathBuf },

    #[error("cannot create backup directory {dir}: {source}")]
    BackupDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("backing up {path} to {backup} failed, refusing to overwrite: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        source: std::io::Error,
    },

    #[error("writing {path} failed: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Collapse runs of blank lines down to a single blank line and trim
/// trailing newlines.
pub fn normalize_text(content: &str) -> String {
    let mut text = content.replace("\r\n", "\n");
    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }
    text.trim_end_matches('\n').to_string()
}

/// Write `content` to `path` with backup-before-overwrite semantics.
/// Returns the backup path on success.
///
/// The backup copy failing for any reason, including the source file not
/// existing yet, aborts the write: the live file is only ever replaced once
/// its previous state is safely on disk.
pub fn export_config(
    path: &Path,
    content: &str,
    backup_dir: &Path,
) -> Result<PathBuf, WriteError> {
    if let Ok(meta) = fs::metadata(path) {
        if meta.permissions().readonly() {
            return Err(WriteError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
    }

    fs::create_dir_all(backup_dir).map_err(|source| WriteError::BackupDir {
        dir: backup_dir.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed.conf".to_string());
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup = backup_dir.join(format!("{}.{}", stamp, file_name));

    tracing::info!("[writer] backing up {} to {}", path.display(), backup.display());
    fs::copy(path, &backup).map_err(|source| WriteError::Backup {
        path: path.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;

    let normalized = normalize_text(content);
    fs::write(path, format!("{}\n", normalized)).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("[writer] wrote {}", path.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("realmconf_writer_{}", name));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_normalize_collapses_blank_runs() {
        assert_eq!(normalize_text("a\n\n\n\nb\n\n\n"), "a\n\nb");
        assert_eq!(normalize_text("a\nb"), "a\nb");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_export_backs_up_then_overwrites() {
        let tmp = TempDir::new("roundtrip");
        let target = tmp.0.join("worldserver.conf");
        let backup_dir = tmp.0.join("backups");
        fs::write(&target, "Old = 1\n").unwrap();

        let backup = export_config(&target, "New = 2\n\n\n", &backup_dir).unwrap();

        assert_eq!(fs::read_to_string(&backup).unwrap(), "Old = 1\n");
        assert_eq!(fs::read_to_string(&target).unwrap(), "New = 2\n");
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".worldserver.conf"));
    }

    #[test]
    fn test_backup_failure_leaves_target_untouched() {
        let tmp = TempDir::new("badbackupdir");
        let target = tmp.0.join("worldserver.conf");
        fs::write(&target, "Old = 1\n").unwrap();

        // A plain file where the backup directory should go makes
        // create_dir_all fail.
        let backup_dir = tmp.0.join("backups");
        fs::write(&backup_dir, "not a directory").unwrap();

        let err = export_config(&target, "New = 2\n", &backup_dir).unwrap_err();
        assert!(matches!(err, WriteError::BackupDir { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "Old = 1\n");
    }

    #[test]
    fn test_missing_source_aborts_write() {
        let tmp = TempDir::new("missingsrc");
        let target = tmp.0.join("worldserver.conf");
        let backup_dir = tmp.0.join("backups");

        // Nothing to back up means nothing gets written either.
        let err = export_config(&target, "New = 2\n", &backup_dir).unwrap_err();
        assert!(matches!(err, WriteError::Backup { .. }));
        assert!(!target.exists());
    }
}
