//! Backup file naming shared by the rotating handlers
//!
//! Backups live next to the active file and are named
//! `<active file name>_<suffix>`.

use crate::core::{LoggerError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const SUFFIX_SEP: char = '_';

fn file_name(base: &Path) -> String {
    base.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("app.log")
        .to_string()
}

pub(crate) fn backup_path(base: &Path, suffix: &str) -> PathBuf {
    base.with_file_name(format!("{}{}{}", file_name(base), SUFFIX_SEP, suffix))
}

/// Path of numbered backup `slot` (`<name>_0001`, ...)
pub(crate) fn numbered_path(base: &Path, slot: u32) -> PathBuf {
    backup_path(base, &format!("{:04}", slot))
}

/// Every `<base>_*` entry, sorted by file name
pub(crate) fn list_backups(base: &Path) -> Result<Vec<PathBuf>> {
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{}{}", file_name(base), SUFFIX_SEP);

    let entries = fs::read_dir(dir).map_err(|e| {
        LoggerError::io_operation(
            "listing backups",
            format!("Failed to read directory '{}'", dir.display()),
            e,
        )
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix))
        .collect();
    names.sort();

    Ok(names.into_iter().map(|name| base.with_file_name(name)).collect())
}

/// Highest numeric suffix among existing backups, 0 if there are none.
/// Entries whose suffix is not a number are ignored.
pub(crate) fn max_numeric_suffix(base: &Path) -> Result<u32> {
    let max = list_backups(base)?
        .iter()
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
        .filter_map(|name| name.rsplit(SUFFIX_SEP).next())
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    Ok(max)
}

/// Rename `from` to `to`, replacing any existing `to`
pub(crate) fn rename_over(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        fs::remove_file(to).map_err(|e| {
            LoggerError::file_rotation(
                to.display().to_string(),
                format!("Failed to remove existing backup: {}", e),
            )
        })?;
    }
    fs::rename(from, to).map_err(|e| {
        LoggerError::file_rotation(
            from.display().to_string(),
            format!("Failed to rename to '{}': {}", to.display(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_backup_names() {
        let base = Path::new("/var/log/app.log");
        assert_eq!(backup_path(base, "202401011200"), Path::new("/var/log/app.log_202401011200"));
        assert_eq!(numbered_path(base, 7), Path::new("/var/log/app.log_0007"));
    }

    #[test]
    fn test_list_and_max_suffix() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("svc.log");
        for name in ["svc.log_0002", "svc.log_0010", "svc.log_old", "other.log_0099", "svc.log"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let names: Vec<String> = list_backups(&base)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["svc.log_0002", "svc.log_0010", "svc.log_old"]);
        assert_eq!(max_numeric_suffix(&base).unwrap(), 10);
    }
}
