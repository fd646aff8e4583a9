//! Detect output files held open by another program
//!
//! Spreadsheet applications keep an owner file (`~$book.xlsx`) next to an
//! open workbook and, on Windows, hold it with a sharing lock.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// `~$name` owner file that Office creates next to an open document
pub fn owner_file(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    Some(path.with_file_name(format!("~${name}")))
}

/// Whether `path` exists and is currently held open elsewhere
pub fn is_locked(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }

    if owner_file(path).is_some_and(|owner| owner.exists()) {
        tracing::debug!(path = %path.display(), "Found owner file for open document");
        return true;
    }

    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(_) => false,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "Output cannot be opened for writing");
            true
        }
    }
}
