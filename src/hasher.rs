use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::cache::HashCache;
use crate::error::{Stage, Warning};
use crate::grouper::{SizeGroups, candidate_count};

/// Files larger than this are hashed in chunks instead of read whole.
pub const DEFAULT_CHUNK_THRESHOLD: u64 = 10 * 1024 * 1024;
/// Read size for chunked hashing.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Receives fractional hashing progress in `0.0..=1.0`.
pub trait ProgressSink {
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

impl ProgressSink for ProgressBar {
    fn report(&mut self, fraction: f64) {
        let length = self.length().unwrap_or(0);
        self.set_position((fraction * length as f64).round() as u64);
    }
}

/// One member of a duplicate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedFile {
    pub path: PathBuf,
    pub mtime: SystemTime,
}

/// Files sharing one digest. Always holds at least two members when returned
/// from [`HashEngine::group_by_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    pub size: u64,
    pub members: Vec<HashedFile>,
}

/// Digest (lowercase hex) to duplicate set.
pub type HashGroups = BTreeMap<String, DuplicateSet>;

#[derive(Debug, Default)]
pub struct HashOutcome {
    pub groups: HashGroups,
    pub warnings: Vec<Warning>,
}

/// Computes BLAKE3 content digests and groups files by them.
///
/// Digests are memoized per path for the life of the engine; call
/// [`HashEngine::clear_cache`] before reusing an engine on an unrelated tree.
#[derive(Debug)]
pub struct HashEngine {
    chunk_threshold: u64,
    chunk_size: usize,
    cache: HashCache,
    digests_computed: u64,
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HashEngine {
    pub fn new() -> Self {
        Self::with_chunking(DEFAULT_CHUNK_THRESHOLD, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunking(chunk_threshold: u64, chunk_size: usize) -> Self {
        Self {
            chunk_threshold,
            chunk_size: chunk_size.max(1),
            cache: HashCache::new(),
            digests_computed: 0,
        }
    }

    pub fn chunk_threshold(&self) -> u64 {
        self.chunk_threshold
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    /// Digests read from disk, excluding cache hits.
    pub fn digests_computed(&self) -> u64 {
        self.digests_computed
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Hex digest of the file at `path`, whose size at scan time was `size`.
    ///
    /// Files up to the chunk threshold are read in one pass, larger ones in
    /// fixed-size chunks. Both produce the same digest for the same bytes.
    pub fn hash_file(&mut self, path: &Path, size: u64) -> io::Result<String> {
        if let Some(cached) = self.cache.get_hash(path) {
            return Ok(cached);
        }

        let hash = if size > self.chunk_threshold {
            hash_chunked(path, self.chunk_size)?
        } else {
            hash_whole(path)?
        };
        debug!("Hash calculated for '{}': {} ({} bytes)", path.display(), hash, size);

        self.digests_computed += 1;
        self.cache.set_hash(path, hash.clone());
        Ok(hash)
    }

    /// Digests every member of every size group and regroups by digest,
    /// dropping digests seen only once. Files that cannot be read become
    /// warnings and are left out without affecting their siblings.
    pub fn group_by_hash(
        &mut self,
        size_groups: &SizeGroups,
        mut progress: Option<&mut dyn ProgressSink>,
    ) -> HashOutcome {
        let total = candidate_count(size_groups);
        info!("Hashing {} candidate files", total);

        let mut groups: HashGroups = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut done = 0usize;

        for (size, records) in size_groups {
            for record in records {
                match self.hash_file(&record.path, *size) {
                    Ok(hash) => {
                        groups
                            .entry(hash)
                            .or_insert_with(|| DuplicateSet {
                                size: *size,
                                members: Vec::new(),
                            })
                            .members
                            .push(HashedFile {
                                path: record.path.clone(),
                                mtime: record.mtime,
                            });
                    }
                    Err(e) => {
                        warn!("Failed to hash '{}': {}", record.path.display(), e);
                        warnings.push(Warning::new(&record.path, Stage::Hash, e.to_string()));
                    }
                }

                done += 1;
                if let Some(sink) = progress.as_deref_mut() {
                    sink.report(done as f64 / total as f64);
                }
            }
        }

        let unique_hashes = groups.len();
        groups.retain(|_, set| set.members.len() > 1);
        info!(
            "Hashing complete: {} unique hashes, {} duplicate groups, {} unreadable files",
            unique_hashes,
            groups.len(),
            warnings.len()
        );

        HashOutcome { groups, warnings }
    }
}

fn hash_whole(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn hash_chunked(path: &Path, chunk_size: usize) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
