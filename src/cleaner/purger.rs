//! Purger for the direct children of a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Kind of a deleted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file or symbolic link.
    File,
    /// Directory, removed as a whole subtree.
    Directory,
}

/// Outcome of a single entry deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ItemOutcome {
    /// The entry was removed.
    Deleted { path: PathBuf, kind: EntryKind },
    /// The entry could not be removed.
    Skipped { path: PathBuf, reason: String },
}

impl ItemOutcome {
    /// Path of the entry this outcome refers to.
    pub fn path(&self) -> &Path {
        match self {
            ItemOutcome::Deleted { path, .. } | ItemOutcome::Skipped { path, .. } => path,
        }
    }
}

/// Result of purging one folder.
#[derive(Debug, Default)]
pub struct PurgeResult {
    /// Number of top-level entries removed. A subtree counts once.
    pub deleted_count: u32,
    /// One outcome per enumerated entry.
    pub outcomes: Vec<ItemOutcome>,
    /// Non-fatal note about the folder itself (missing, unreadable).
    pub note: Option<String>,
}

/// Deletes every direct child of a directory.
#[derive(Debug, Clone, Default)]
pub struct FolderPurger {
    dry_run: bool,
}

impl FolderPurger {
    /// Create a purger. In dry-run mode nothing is removed, but outcomes are
    /// reported as if it were.
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Purge all entries of `path`.
    ///
    /// Never fails: a missing or unreadable folder yields a note, and a failed
    /// entry yields a `Skipped` outcome without stopping its siblings.
    pub fn purge(&self, path: &Path) -> PurgeResult {
        self.purge_with(path, |entry| self.remove_entry(entry))
    }

    fn purge_with(
        &self,
        path: &Path,
        mut remove: impl FnMut(&Path) -> io::Result<EntryKind>,
    ) -> PurgeResult {
        if !path.exists() {
            tracing::debug!("Folder not found: {}", path.display());
            return PurgeResult {
                note: Some(format!("Folder not found: {}", path.display())),
                ..PurgeResult::default()
            };
        }

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                return PurgeResult {
                    note: Some(format!("Cannot read {}: {}", path.display(), e)),
                    ..PurgeResult::default()
                };
            }
        };

        let mut result = PurgeResult::default();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    result.outcomes.push(ItemOutcome::Skipped {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let entry_path = entry.path();
            match remove(&entry_path) {
                Ok(kind) => {
                    tracing::debug!("Deleted {}", entry_path.display());
                    result.deleted_count += 1;
                    result.outcomes.push(ItemOutcome::Deleted {
                        path: entry_path,
                        kind,
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {}: {}", entry_path.display(), e);
                    result.outcomes.push(ItemOutcome::Skipped {
                        path: entry_path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        result
    }

    fn remove_entry(&self, path: &Path) -> io::Result<EntryKind> {
        // symlink_metadata so that a link to a directory is unlinked, not followed
        let file_type = fs::symlink_metadata(path)?.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        if self.dry_run {
            return Ok(kind);
        }

        match kind {
            EntryKind::Directory => fs::remove_dir_all(path)?,
            EntryKind::File if file_type.is_symlink() => {
                // Windows directory symlinks need remove_dir
                fs::remove_file(path).or_else(|_| fs::remove_dir(path))?
            }
            EntryKind::File => fs::remove_file(path)?,
        }

        Ok(kind)
    }
}
