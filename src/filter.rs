use std::collections::BTreeSet;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::file_type::FileType;

/// Directory name patterns skipped unless the caller supplies its own list.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".gitignore",
    ".hg",
    ".hgignore",
    ".svn",
    "__pycache__",
    ".pytest_cache",
    ".tox",
    ".venv",
    "venv",
    "node_modules",
    ".idea",
    ".vscode",
    "dist",
    "build",
    ".mypy_cache",
    "*.egg-info",
];

/// Decides which directories are descended into and which files take part in
/// a scan.
///
/// Exclude patterns are shell globs matched against a single directory name,
/// never against a full path. The allowed-extension set is empty when every
/// extension is accepted.
#[derive(Debug, Clone)]
pub struct FileFilter {
    allowed_extensions: BTreeSet<String>,
    exclude_patterns: BTreeSet<String>,
    matcher: GlobSet,
    explicit: bool,
}

impl FileFilter {
    /// `exclude_dirs` replaces the default patterns when given; otherwise the
    /// defaults apply unless `use_default_excludes` is false.
    pub fn new(
        file_types: Option<&[FileType]>,
        exclude_dirs: Option<&[String]>,
        use_default_excludes: bool,
    ) -> Result<Self, globset::Error> {
        let exclude_patterns: BTreeSet<String> = match exclude_dirs {
            Some(dirs) => dirs.iter().cloned().collect(),
            None if use_default_excludes => {
                DEFAULT_EXCLUDE_DIRS.iter().map(|p| p.to_string()).collect()
            }
            None => BTreeSet::new(),
        };
        let mut filter = Self {
            allowed_extensions: BTreeSet::new(),
            matcher: build_matcher(&exclude_patterns)?,
            exclude_patterns,
            explicit: file_types.is_some() || exclude_dirs.is_some(),
        };
        if let Some(types) = file_types {
            filter.set_file_types(types);
        }
        Ok(filter)
    }

    /// True when a directory with this name must not be descended into.
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// Extension check only; an empty allow-list accepts everything.
    pub fn accepts_extension(&self, path: &Path) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }

    /// Full check: the extension is allowed and no ancestor directory name
    /// matches an exclude pattern.
    pub fn should_include_file(&self, path: &Path) -> bool {
        if !self.accepts_extension(path) {
            return false;
        }
        let Some(parent) = path.parent() else {
            return true;
        };
        !parent
            .components()
            .any(|component| self.excludes_dir(&component.as_os_str().to_string_lossy()))
    }

    pub fn filter_files<'a, P: AsRef<Path>>(&self, paths: &'a [P]) -> Vec<&'a P> {
        paths
            .iter()
            .filter(|path| self.should_include_file(path.as_ref()))
            .collect()
    }

    pub fn add_exclude_pattern(&mut self, pattern: &str) -> Result<(), globset::Error> {
        let mut patterns = self.exclude_patterns.clone();
        patterns.insert(pattern.to_string());
        self.matcher = build_matcher(&patterns)?;
        self.exclude_patterns = patterns;
        Ok(())
    }

    pub fn set_file_types(&mut self, file_types: &[FileType]) {
        self.allowed_extensions = file_types
            .iter()
            .flat_map(|file_type| file_type.extensions())
            .collect();
    }

    /// True when the caller chose file types or exclude patterns explicitly.
    pub fn is_filtering_active(&self) -> bool {
        self.explicit
    }

    pub fn exclude_patterns(&self) -> impl Iterator<Item = &str> {
        self.exclude_patterns.iter().map(String::as_str)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            allowed_extensions: BTreeSet::new(),
            exclude_patterns: DEFAULT_EXCLUDE_DIRS.iter().map(|p| p.to_string()).collect(),
            matcher: default_matcher(),
            explicit: false,
        }
    }
}

fn build_matcher(patterns: &BTreeSet<String>) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

fn default_matcher() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_EXCLUDE_DIRS {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_excludes_match_directory_names() {
        let filter = FileFilter::default();
        assert!(filter.excludes_dir(".git"));
        assert!(filter.excludes_dir("node_modules"));
        assert!(filter.excludes_dir("mypkg.egg-info"));
        assert!(!filter.excludes_dir("src"));
        assert!(!filter.is_filtering_active());
    }

    #[test]
    fn explicit_excludes_replace_defaults() {
        let dirs = vec!["cache*".to_string()];
        let filter = FileFilter::new(None, Some(&dirs), true).unwrap();
        assert!(filter.excludes_dir("cache-v2"));
        assert!(!filter.excludes_dir(".git"));
        assert!(filter.is_filtering_active());
    }

    #[test]
    fn defaults_can_be_disabled() {
        let filter = FileFilter::new(None, None, false).unwrap();
        assert!(!filter.excludes_dir(".git"));
        assert_eq!(filter.exclude_patterns().count(), 0);
    }

    #[test]
    fn extension_filter() {
        let filter = FileFilter::new(Some(&[FileType::Text]), None, true).unwrap();
        assert!(filter.accepts_extension(Path::new("/a/notes.MD")));
        assert!(!filter.accepts_extension(Path::new("/a/song.mp3")));
        assert!(!filter.accepts_extension(Path::new("/a/README")));
    }

    #[test]
    fn include_checks_ancestors() {
        let filter = FileFilter::default();
        assert!(filter.should_include_file(Path::new("/home/u/docs/a.txt")));
        assert!(!filter.should_include_file(Path::new("/home/u/.git/objects/ab")));

        let paths = vec![
            PathBuf::from("/p/src/main.rs"),
            PathBuf::from("/p/node_modules/x/index.js"),
        ];
        assert_eq!(filter.filter_files(&paths), vec![&paths[0]]);
    }

    #[test]
    fn add_pattern_and_reject_invalid_glob() {
        let mut filter = FileFilter::new(None, None, false).unwrap();
        filter.add_exclude_pattern("tmp").unwrap();
        assert!(filter.excludes_dir("tmp"));
        assert!(filter.add_exclude_pattern("[").is_err());
        assert!(filter.excludes_dir("tmp"));
    }
}
