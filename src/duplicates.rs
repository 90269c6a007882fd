use std::path::{Path, PathBuf};

use log::info;

use crate::error::{ScanError, Warning};
use crate::filter::FileFilter;
use crate::grouper::{SizeGroups, group_by_size};
use crate::hasher::{HashEngine, HashOutcome, ProgressSink};
use crate::keep::{DuplicateDecision, KeepStrategy};
use crate::scanner::Walker;

/// Caller-side knobs for one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub filter: FileFilter,
    /// Files smaller than this many bytes never become candidates.
    pub min_size: u64,
    pub strategy: KeepStrategy,
}

/// Everything a scan produced: the decisions plus the per-file problems met
/// along the way.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub root: PathBuf,
    pub decisions: Vec<DuplicateDecision>,
    pub warnings: Vec<Warning>,
    /// Regular files that passed the directory, extension and minimum size
    /// filters.
    pub files_scanned: usize,
    pub skipped_symlinks: usize,
}

impl ScanOutcome {
    /// Combines the finished walk, the hashing result and the decisions made
    /// from it.
    pub fn assemble(
        walker: &mut Walker,
        files_scanned: usize,
        hashed: HashOutcome,
        decisions: Vec<DuplicateDecision>,
    ) -> Self {
        let mut warnings = walker.take_warnings();
        warnings.extend(hashed.warnings);
        Self {
            root: walker.root().to_path_buf(),
            decisions,
            warnings,
            files_scanned,
            skipped_symlinks: walker.skipped_symlinks(),
        }
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.decisions.iter().map(DuplicateDecision::reclaimable_bytes).sum()
    }
}

/// Drains `walker`, keeps the files that pass the extension and minimum size
/// checks, and buckets them by size. Also returns how many files passed.
pub fn collect_candidates(walker: &mut Walker, options: &ScanOptions) -> (SizeGroups, usize) {
    let mut accepted = 0;
    let records = walker
        .by_ref()
        .filter(|record| record.size >= options.min_size)
        .filter(|record| options.filter.accepts_extension(&record.path))
        .inspect(|_| accepted += 1);
    let size_groups = group_by_size(records);
    (size_groups, accepted)
}

/// Runs the whole detection pipeline on `root`: walk, size grouping, hashing
/// and keep/delete decisions. Only a bad root is fatal; unreadable files end
/// up in [`ScanOutcome::warnings`].
pub fn find_duplicates(
    root: &Path,
    options: &ScanOptions,
    engine: &mut HashEngine,
    progress: Option<&mut dyn ProgressSink>,
) -> Result<ScanOutcome, ScanError> {
    let mut walker = Walker::with_filter(root, &options.filter)?;
    let (size_groups, files_scanned) = collect_candidates(&mut walker, options);
    let hashed = engine.group_by_hash(&size_groups, progress);
    let decisions = options.strategy.analyze(&hashed.groups);

    let outcome = ScanOutcome::assemble(&mut walker, files_scanned, hashed, decisions);
    info!(
        "Duplicate analysis complete: {} files, {} duplicate groups, {} warnings",
        outcome.files_scanned,
        outcome.decisions.len(),
        outcome.warnings.len()
    );
    Ok(outcome)
}
