use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info, warn};
use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::error::{ScanError, Stage, Warning};
use crate::filter::FileFilter;

/// A regular file found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: SystemTime,
}

type EntryPredicate = Box<dyn FnMut(&DirEntry) -> bool>;

/// Lazy recursive enumeration of the regular files under a root directory.
///
/// Symbolic links are never followed: every link, whether it points at a file
/// or a directory, is skipped and counted. Directories whose name matches the
/// exclusion predicate are pruned without being read. Entries that cannot be
/// read or stat'ed are recorded as warnings and skipped.
pub struct Walker {
    root: PathBuf,
    entries: FilterEntry<walkdir::IntoIter, EntryPredicate>,
    warnings: Vec<Warning>,
    files_found: usize,
    dirs_found: usize,
    skipped_symlinks: usize,
}

impl Walker {
    /// Opens `root` for walking. `exclude` receives a directory name and returns
    /// true when that subtree must be skipped; the root itself is never skipped.
    pub fn new<F>(root: impl AsRef<Path>, exclude: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> bool + 'static,
    {
        let root = resolve_root(root.as_ref())?;
        info!("Scanning {}", root.display());

        let predicate: EntryPredicate = Box::new(move |entry: &DirEntry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let skip = exclude(&entry.file_name().to_string_lossy());
            if skip {
                debug!("Excluding directory: '{}'", entry.path().display());
            }
            !skip
        });
        let entries = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(predicate);

        Ok(Self {
            root,
            entries,
            warnings: Vec::new(),
            files_found: 0,
            dirs_found: 0,
            skipped_symlinks: 0,
        })
    }

    /// Walks `root` using the directory exclusions of `filter`.
    pub fn with_filter(root: impl AsRef<Path>, filter: &FileFilter) -> Result<Self, ScanError> {
        let filter = filter.clone();
        Self::new(root, move |name| filter.excludes_dir(name))
    }

    /// Canonical absolute path of the scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn files_found(&self) -> usize {
        self.files_found
    }

    pub fn dirs_found(&self) -> usize {
        self.dirs_found
    }

    pub fn skipped_symlinks(&self) -> usize {
        self.skipped_symlinks
    }

    fn record(&mut self, path: PathBuf, message: String) {
        warn!("Skipping '{}': {}", path.display(), message);
        self.warnings.push(Warning::new(path, Stage::Walk, message));
    }

    fn stat(&mut self, entry: &DirEntry) -> Option<FileRecord> {
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                self.record(entry.path().to_path_buf(), e.to_string());
                return None;
            }
        };
        match metadata.modified() {
            Ok(mtime) => Some(FileRecord {
                path: entry.path().to_path_buf(),
                size: metadata.len(),
                mtime,
            }),
            Err(e) => {
                self.record(entry.path().to_path_buf(), e.to_string());
                None
            }
        }
    }
}

impl Iterator for Walker {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let message = match e.io_error() {
                        Some(io) => io.to_string(),
                        None => e.to_string(),
                    };
                    self.record(path, message);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!("Skipping symlink: '{}'", entry.path().display());
                self.skipped_symlinks += 1;
                continue;
            }
            if file_type.is_dir() {
                self.dirs_found += 1;
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            if let Some(record) = self.stat(&entry) {
                debug!("Found file: '{}' ({} bytes)", record.path.display(), record.size);
                self.files_found += 1;
                return Some(record);
            }
        }
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }
    let root = root.canonicalize().map_err(|source| ScanError::RootInaccessible {
        path: root.to_path_buf(),
        source,
    })?;
    fs::read_dir(&root).map_err(|source| ScanError::RootInaccessible {
        path: root.clone(),
        source,
    })?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn names(records: &[FileRecord]) -> BTreeSet<String> {
        records
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn walks_nested_files_with_metadata() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.txt"), b"12345").unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), b"xy").unwrap();

        let mut walker = Walker::new(dir.path(), |_| false).unwrap();
        let records: Vec<_> = walker.by_ref().collect();

        assert_eq!(names(&records), BTreeSet::from(["top.txt".to_string(), "deep.txt".to_string()]));
        let deep = records.iter().find(|r| r.path.ends_with("deep.txt")).unwrap();
        assert_eq!(deep.size, 2);
        assert!(deep.path.is_absolute());
        assert_eq!(walker.files_found(), 2);
        assert!(walker.warnings().is_empty());
    }

    #[test]
    fn excluded_directories_are_not_descended() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), b"x").unwrap();
        fs::write(dir.path().join("src/main.rs"), b"x").unwrap();

        let records: Vec<_> = Walker::with_filter(dir.path(), &FileFilter::default())
            .unwrap()
            .collect();
        assert_eq!(names(&records), BTreeSet::from(["main.rs".to_string()]));
    }

    #[test]
    fn root_is_never_excluded() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("build");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("out.bin"), b"x").unwrap();

        let records: Vec<_> = Walker::new(&root, |name| name == "build").unwrap().collect();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let dir = tempdir().unwrap();
        let mut walker = Walker::new(dir.path(), |_| false).unwrap();
        assert!(walker.next().is_none());
        assert!(walker.warnings().is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = Walker::new(dir.path().join("nope"), |_| false).err().unwrap();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, b"x").unwrap();
        let err = Walker::new(&file, |_| false).err().unwrap();
        assert!(matches!(err, ScanError::RootNotDirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn file_vanishing_mid_walk_is_a_warning() {
        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            fs::write(dir.path().join(name), b"data").unwrap();
        }

        let mut walker = Walker::new(dir.path(), |_| false).unwrap();
        let first = walker.next().unwrap();
        // the directory listing is already buffered, so the name is still
        // yielded after the file is gone
        let gone = ["a.txt", "b.txt", "c.txt", "d.txt"]
            .iter()
            .map(|name| walker.root().join(name))
            .find(|path| *path != first.path)
            .unwrap();
        fs::remove_file(&gone).unwrap();

        let mut records = vec![first];
        records.extend(walker.by_ref());

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.path != gone));
        assert_eq!(walker.files_found(), 3);
        assert_eq!(walker.warnings().len(), 1);
        assert_eq!(walker.warnings()[0].stage, Stage::Walk);
        assert_eq!(walker.warnings()[0].path, gone);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped_and_counted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), b"data").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let mut walker = Walker::new(dir.path(), |_| false).unwrap();
        let records: Vec<_> = walker.by_ref().collect();
        assert_eq!(names(&records), BTreeSet::from(["real.txt".to_string()]));
        assert_eq!(walker.skipped_symlinks(), 2);
    }
}
