pub mod cache;
pub mod cli;
pub mod config;
pub mod deleter;
pub mod duplicates;
pub mod error;
pub mod file_type;
pub mod filter;
pub mod grouper;
pub mod hasher;
pub mod keep;
pub mod report;
pub mod scanner;
pub mod utils;

pub use cache::HashCache;
pub use cli::Cli;
pub use config::Config;
pub use deleter::{DeletionResult, Deleter};
pub use duplicates::{ScanOptions, ScanOutcome, collect_candidates, find_duplicates};
pub use error::{ScanError, Stage, Warning};
pub use file_type::FileType;
pub use filter::FileFilter;
pub use grouper::{SizeGroups, group_by_size};
pub use hasher::{DuplicateSet, HashEngine, HashGroups, HashedFile, ProgressSink};
pub use keep::{DuplicateDecision, KeepStrategy};
pub use report::{ReportFormat, ScanStats};
pub use scanner::{FileRecord, Walker};
pub use utils::{format_human_elapsed, format_number, format_size};
