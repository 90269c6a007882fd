use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors for a scan: nothing is reported when one of these is returned.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Cannot access scan root {}: {source}", path.display())]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Pipeline stage that recorded a [`Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Walk,
    Hash,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Walk => f.write_str("scan"),
            Stage::Hash => f.write_str("hash"),
        }
    }
}

/// A per-file problem that excluded the file from the run without aborting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub path: PathBuf,
    pub stage: Stage,
    pub message: String,
}

impl Warning {
    pub fn new(path: impl Into<PathBuf>, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] '{}': {}", self.stage, self.path.display(), self.message)
    }
}
