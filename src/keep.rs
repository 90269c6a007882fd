use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::{debug, error};

use crate::hasher::{HashGroups, HashedFile};
use crate::utils::format_timestamp;

/// Keep/delete verdict for one duplicate set.
///
/// `keep` never appears in `delete`, `delete` is never empty, and together they
/// hold exactly the members of the set. Every member is `size` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDecision {
    pub hash: String,
    pub size: u64,
    pub keep: PathBuf,
    pub delete: Vec<PathBuf>,
}

impl DuplicateDecision {
    /// `keep` followed by every `delete` path.
    pub fn members(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.keep.as_path()).chain(self.delete.iter().map(PathBuf::as_path))
    }

    /// Bytes freed by removing every file in `delete`.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.delete.len() as u64
    }
}

/// Total order over duplicate members; the smallest element is kept.
pub type Comparator = fn(&HashedFile, &HashedFile) -> Ordering;

/// Newest modification time first, then the shorter path in characters, then
/// plain path order so the choice is stable across runs.
pub fn newest_first(a: &HashedFile, b: &HashedFile) -> Ordering {
    b.mtime
        .cmp(&a.mtime)
        .then_with(|| path_chars(&a.path).cmp(&path_chars(&b.path)))
        .then_with(|| a.path.cmp(&b.path))
}

fn path_chars(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

/// Picks the survivor of every duplicate set.
#[derive(Debug, Clone, Copy)]
pub struct KeepStrategy {
    comparator: Comparator,
}

impl Default for KeepStrategy {
    fn default() -> Self {
        Self {
            comparator: newest_first,
        }
    }
}

impl KeepStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default ordering. The comparator must be a total order for
    /// decisions to stay deterministic.
    pub fn with_comparator(comparator: Comparator) -> Self {
        Self { comparator }
    }

    /// One decision per duplicate set, in digest order.
    pub fn analyze(&self, groups: &HashGroups) -> Vec<DuplicateDecision> {
        let mut decisions = Vec::with_capacity(groups.len());

        for (hash, set) in groups {
            debug_assert!(
                set.members.len() >= 2,
                "duplicate set {hash} reached the keep strategy with {} member(s)",
                set.members.len()
            );
            if set.members.len() < 2 {
                error!(
                    "Ignoring duplicate set {} with {} member(s)",
                    hash,
                    set.members.len()
                );
                continue;
            }

            let mut sorted: Vec<&HashedFile> = set.members.iter().collect();
            sorted.sort_by(|a, b| (self.comparator)(a, b));

            let keep = sorted[0];
            debug!(
                "Keeping '{}' (modified {}) out of {} copies",
                keep.path.display(),
                format_timestamp(keep.mtime),
                sorted.len()
            );

            decisions.push(DuplicateDecision {
                hash: hash.clone(),
                size: set.size,
                keep: keep.path.clone(),
                delete: sorted[1..].iter().map(|f| f.path.clone()).collect(),
            });
        }

        decisions
    }
}
