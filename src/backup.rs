use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SplitError;

/// `yyyyMMddHHmmss`: fixed width, so backups sort by creation time.
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// `{file name}.{timestamp}.bak`, next to the original.
pub fn backup_path(original: &Path, timestamp: &str) -> PathBuf {
    let file_name = original
        .file_name()
        .unwrap_or_default()
        .to_string_lossy();
    original.with_file_name(format!("{file_name}.{timestamp}.bak"))
}

/// Copies `original` to its backup path, overwriting an existing backup of the same second.
pub fn create_backup(original: &Path, timestamp: &str) -> Result<PathBuf, SplitError> {
    let backup = backup_path(original, timestamp);
    fs::copy(original, &backup).map_err(|source| SplitError::Write {
        path: backup.clone(),
        source,
    })?;
    debug!(original = %original.display(), backup = %backup.display(), "backup created");
    Ok(backup)
}
