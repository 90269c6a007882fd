use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{LevelFilter, debug, info, warn};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use dedup_files::cli::{Command, ScanArgs};
use dedup_files::grouper::candidate_count;
use dedup_files::report::{self, ReportFormat};
use dedup_files::utils::format_human_elapsed;
use dedup_files::{
    Cli, Config, Deleter, FileFilter, HashEngine, ScanOptions, ScanOutcome, ScanStats, Walker,
    collect_candidates, format_number, format_size,
};

fn init_logger(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = ConfigBuilder::new();
    builder.set_target_level(LevelFilter::Off);
    // UTC timestamps when the local offset is unavailable
    let _ = builder.set_time_offset_to_local();
    TermLogger::init(level, builder.build(), TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialize logger")
}

fn scan_options(args: &ScanArgs, config: &Config) -> Result<ScanOptions> {
    let exclude_dirs = if args.exclude.is_empty() {
        config.scan.exclude_dirs.clone()
    } else {
        Some(args.exclude.clone())
    };
    let file_types = if args.file_types.is_empty() {
        config.scan.file_types.clone()
    } else {
        Some(args.file_types.clone())
    };
    let use_default_excludes = config.scan.use_default_excludes && !args.no_default_excludes;

    let filter = FileFilter::new(
        file_types.as_deref(),
        exclude_dirs.as_deref(),
        use_default_excludes,
    )
    .context("Invalid exclude pattern")?;
    debug!(
        "Excluding directories: {:?}",
        filter.exclude_patterns().collect::<Vec<_>>()
    );

    Ok(ScanOptions {
        filter,
        min_size: args.min_size.unwrap_or(config.scan.min_size),
        ..ScanOptions::default()
    })
}

fn check_interrupted(flag: &AtomicBool) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        bail!("Interrupted");
    }
    Ok(())
}

fn run_scan(
    path: &Path,
    options: &ScanOptions,
    engine: &mut HashEngine,
    quiet: bool,
    interrupted: &AtomicBool,
) -> Result<ScanOutcome> {
    let mut walker = Walker::with_filter(path, &options.filter)?;
    info!("Target directory: '{}'", walker.root().display());

    let spinner = ProgressBar::new_spinner();
    if quiet {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    }
    spinner.set_message("Scanning files and directories...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let (size_groups, files_scanned) = collect_candidates(&mut walker, options);
    spinner.finish_and_clear();
    check_interrupted(interrupted)?;

    let candidates = candidate_count(&size_groups);
    info!(
        "Found {} files and {} directories, {} kept after filtering, {} share a size with another file",
        format_number(walker.files_found()),
        format_number(walker.dirs_found()),
        format_number(files_scanned),
        format_number(candidates)
    );

    let mut bar = ProgressBar::new(candidates as u64);
    if quiet {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ETA: {eta}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );
    let hashed = engine.group_by_hash(&size_groups, Some(&mut bar));
    bar.finish_and_clear();
    check_interrupted(interrupted)?;

    let decisions = options.strategy.analyze(&hashed.groups);
    Ok(ScanOutcome::assemble(&mut walker, files_scanned, hashed, decisions))
}

fn print_skipped(outcome: &ScanOutcome) {
    if outcome.skipped_symlinks > 0 {
        info!("Skipped {} symbolic links", format_number(outcome.skipped_symlinks));
    }
    if let Some(summary) = report::skipped_summary(&outcome.warnings) {
        eprint!("{}", summary.yellow());
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn clean(
    outcome: &ScanOutcome,
    dry_run: bool,
    yes: bool,
    interrupted: Arc<AtomicBool>,
) -> Result<()> {
    let stats = ScanStats::from_outcome(outcome);
    if outcome.decisions.is_empty() {
        return Ok(());
    }

    if !dry_run && !yes {
        let prompt = format!(
            "Move {} file(s) ({}) to the trash?",
            format_number(stats.files_to_delete),
            stats.space_human()
        );
        if !confirm(&prompt)? {
            println!("Aborted, nothing was deleted.");
            return Ok(());
        }
    }

    let deleter = Deleter::new(dry_run).with_shutdown_flag(interrupted.clone());
    let (success_count, failure_count, results) = deleter.delete_groups(&outcome.decisions);

    for result in results.iter().filter(|r| !r.success) {
        let reason = result.error.as_deref().unwrap_or("unknown error");
        println!("{} {}", "FAILED:".red(), reason);
    }
    if dry_run {
        println!(
            "{} {} file(s) would be moved to the trash",
            "Dry run:".yellow(),
            format_number(success_count)
        );
    } else {
        println!(
            "Moved {} file(s) to the trash, {} failed",
            format_number(success_count),
            format_number(failure_count)
        );
    }
    check_interrupted(&interrupted)
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logger(&cli)?;

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current step");
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?;
    let options = scan_options(cli.command.scan_args(), &config)?;
    let mut engine = HashEngine::with_chunking(config.hash.chunk_threshold, config.hash.chunk_size);

    let color = io::stdout().is_terminal();
    let scan_path = &cli.command.scan_args().path;
    let outcome = run_scan(scan_path, &options, &mut engine, cli.quiet, &interrupted)?;
    let stats = ScanStats::from_outcome(&outcome);

    match &cli.command {
        Command::Scan { .. } => {
            print!("{}", report::render(&outcome, ReportFormat::Table, color)?);
            print_skipped(&outcome);
        }
        Command::Report { format, output, .. } => {
            let rendered = report::render(&outcome, *format, color && output.is_none())?;
            match output {
                Some(path) => {
                    report::save(&rendered, path)?;
                    info!("Report written to {}", path.display());
                }
                None => print!("{rendered}"),
            }
            print_skipped(&outcome);
        }
        Command::Clean { dry_run, yes, .. } => {
            print!("{}", report::render(&outcome, ReportFormat::Table, color)?);
            print_skipped(&outcome);
            clean(&outcome, *dry_run, *yes, interrupted.clone())?;
        }
    }

    info!(
        "Found {} duplicate groups, {} reclaimable",
        format_number(stats.duplicate_groups_found),
        format_size(stats.space_to_recover)
    );
    info!("Completed in {}", format_human_elapsed(start_time.elapsed()));
    Ok(())
}
