use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

/// In-memory digest cache owned by one [`crate::hasher::HashEngine`].
///
/// `HashCache` maps an absolute file path to its hex digest. Entries are never
/// invalidated implicitly: a changed mtime or a file replaced on disk keeps the
/// old digest until [`HashCache::clear`] is called. Callers scanning unrelated
/// trees with the same engine clear it in between.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: HashMap<PathBuf, String>,
    hits: u64,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached digest for `path`, if one was stored.
    pub fn get_hash(&mut self, path: &Path) -> Option<String> {
        let hash = self.entries.get(path).cloned();
        if hash.is_some() {
            self.hits += 1;
            debug!("Hash cache hit: '{}'", path.display());
        }
        hash
    }

    /// Stores or replaces the digest for `path`.
    pub fn set_hash(&mut self, path: &Path, hash: String) {
        self.entries.insert(path.to_path_buf(), hash);
    }

    pub fn clear(&mut self) {
        debug!("Clearing hash cache ({} entries)", self.entries.len());
        self.entries.clear();
        self.hits = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache since creation or the last clear.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
