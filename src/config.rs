use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::file_type::FileType;
use crate::hasher::{DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_THRESHOLD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid hash settings: {0}")]
    Hash(String),

    #[error("Invalid scan settings: {0}")]
    Scan(String),
}

/// Settings read from an optional TOML file. Every field has a default, so an
/// empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scan: ScanConfig,
    pub hash: HashConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Replaces the built-in directory exclusions when set.
    pub exclude_dirs: Option<Vec<String>>,
    pub use_default_excludes: bool,
    pub file_types: Option<Vec<FileType>>,
    pub min_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: None,
            use_default_excludes: true,
            file_types: None,
            min_size: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashConfig {
    pub chunk_threshold: u64,
    pub chunk_size: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Name of the config file picked up from the working directory.
    pub fn default_file_name() -> String {
        format!("{}.toml", env!("CARGO_PKG_NAME"))
    }

    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from: {}", path.display());
        Self::from_toml(&contents, path)
    }

    /// Loads `explicit` when given; otherwise the default file in `dir` if it
    /// exists, else built-in defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(Self::default_file_name());
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!("No config file at {}, using defaults", candidate.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let file_types = self.scan.file_types.as_deref().unwrap_or_default();
        if file_types.contains(&FileType::Unknown) {
            return Err(ConfigError::Scan(
                "'unknown' is not a selectable file type".into(),
            ));
        }
        if self.hash.chunk_size == 0 {
            return Err(ConfigError::Hash("chunk_size must be greater than zero".into()));
        }
        if self.hash.chunk_threshold < self.hash.chunk_size as u64 {
            return Err(ConfigError::Hash(format!(
                "chunk_threshold ({}) must not be smaller than chunk_size ({})",
                self.hash.chunk_threshold, self.hash.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("", Path::new("x.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.scan.use_default_excludes);
        assert_eq!(config.hash.chunk_threshold, 10 * 1024 * 1024);
        assert_eq!(config.hash.chunk_size, 4 * 1024 * 1024);
    }

    #[test]
    fn parses_all_sections() {
        let toml = r#"
            [scan]
            exclude_dirs = [".git", "target"]
            use_default_excludes = false
            file_types = ["text", "video"]
            min_size = 1

            [hash]
            chunk_threshold = 2048
            chunk_size = 512
        "#;
        let config = Config::from_toml(toml, Path::new("x.toml")).unwrap();
        assert_eq!(
            config.scan.exclude_dirs,
            Some(vec![".git".to_string(), "target".to_string()])
        );
        assert_eq!(config.scan.file_types, Some(vec![FileType::Text, FileType::Video]));
        assert_eq!(config.scan.min_size, 1);
        assert_eq!(config.hash.chunk_size, 512);
    }

    #[test]
    fn rejects_bad_chunking() {
        let zero = "[hash]\nchunk_size = 0\n";
        assert!(matches!(
            Config::from_toml(zero, Path::new("x.toml")),
            Err(ConfigError::Hash(_))
        ));
        let inverted = "[hash]\nchunk_threshold = 10\nchunk_size = 20\n";
        assert!(matches!(
            Config::from_toml(inverted, Path::new("x.toml")),
            Err(ConfigError::Hash(_))
        ));
    }

    #[test]
    fn rejects_unknown_file_type() {
        let toml = "[scan]\nfile_types = [\"text\", \"unknown\"]\n";
        let err = Config::from_toml(toml, Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Scan(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml("[scan]\nbogus = 1\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn discovers_file_in_directory() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::discover(None, dir.path()).unwrap(), Config::default());

        fs::write(
            dir.path().join(Config::default_file_name()),
            "[scan]\nmin_size = 42\n",
        )
        .unwrap();
        assert_eq!(Config::discover(None, dir.path()).unwrap().scan.min_size, 42);

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::discover(Some(&missing), dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }
}
