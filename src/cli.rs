use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::file_type::FileType;
use crate::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(name = "dedup-files", version)]
#[command(about = "Find byte-identical duplicate files and move the extra copies to the trash")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (default: ./dedup-files.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a directory and list duplicate groups
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Scan a directory and write a report
    Report {
        #[command(flatten)]
        scan: ScanArgs,

        /// Report format
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,

        /// Write the report to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Move duplicate copies to the trash, keeping one file per group
    Clean {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

impl Command {
    pub fn scan_args(&self) -> &ScanArgs {
        match self {
            Command::Scan { scan } | Command::Report { scan, .. } | Command::Clean { scan, .. } => {
                scan
            }
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory to scan for duplicates
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Only consider files of this type (repeatable): text, audio, video, archive
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub file_types: Vec<FileType>,

    /// Skip directories matching this glob (repeatable); replaces the defaults
    #[arg(short, long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Do not skip the default directories (.git, node_modules, ...)
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Skip files smaller than this many bytes
    #[arg(short, long, value_name = "BYTES")]
    pub min_size: Option<u64>,
}
