//! Reversible removal of the files a [`DuplicateDecision`] marks for deletion.
//!
//! Files are moved to the platform trash rather than unlinked, and only the
//! `delete` side of a decision is ever touched. In dry-run mode every check
//! still runs but nothing is moved.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use thiserror::Error;

use crate::keep::DuplicateDecision;

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Failed to move {} to trash: {message}", path.display())]
    TrashFailed { path: PathBuf, message: String },

    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of one attempted removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionResult {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

impl DeletionResult {
    fn ok(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: true,
            error: None,
        }
    }

    fn failed(path: &Path, error: DeleteError) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Deleter {
    dry_run: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Deleter {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            shutdown_flag: None,
        }
    }

    /// Stops a batch before the next file once `flag` is set.
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn delete_file(&self, path: &Path) -> DeletionResult {
        match self.try_delete(path) {
            Ok(()) => DeletionResult::ok(path),
            Err(e) => {
                warn!("Could not delete '{}': {}", path.display(), e);
                DeletionResult::failed(path, e)
            }
        }
    }

    fn try_delete(&self, path: &Path) -> Result<(), DeleteError> {
        let metadata = fs::symlink_metadata(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
            _ => DeleteError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        if !metadata.is_file() {
            return Err(DeleteError::NotAFile(path.to_path_buf()));
        }

        if self.dry_run {
            info!("[dry-run] Would move to trash: '{}'", path.display());
            return Ok(());
        }

        trash::delete(path).map_err(|e| DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Moved to trash: '{}'", path.display());
        Ok(())
    }

    /// Attempts every path in order. A requested shutdown ends the batch early;
    /// the returned list then only covers the paths that were attempted.
    pub fn delete_files<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<DeletionResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            if self.is_shutdown_requested() {
                warn!(
                    "Interrupted: {} file(s) left untouched",
                    paths.len() - results.len()
                );
                break;
            }
            results.push(self.delete_file(path.as_ref()));
        }
        results
    }

    /// Removes the `delete` files of every decision; `keep` files are never
    /// touched. Returns `(success_count, failure_count, results)`.
    pub fn delete_groups(
        &self,
        decisions: &[DuplicateDecision],
    ) -> (usize, usize, Vec<DeletionResult>) {
        let results = self.delete_files(&preview(decisions));
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        info!(
            "{} {} file(s), {} failed",
            if self.dry_run { "Would delete" } else { "Deleted" },
            success_count,
            failure_count
        );
        (success_count, failure_count, results)
    }
}

/// Every path the decisions mark for deletion, in decision order.
pub fn preview(decisions: &[DuplicateDecision]) -> Vec<PathBuf> {
    decisions
        .iter()
        .flat_map(|decision| {
            decision
                .delete
                .iter()
                .filter(move |path| **path != decision.keep)
                .cloned()
        })
        .collect()
}
