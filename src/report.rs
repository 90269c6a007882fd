use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::duplicates::ScanOutcome;
use crate::error::Warning;
use crate::keep::DuplicateDecision;
use crate::utils::{format_number, format_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Csv,
    Json,
}

/// Aggregate counters derived from a decision sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub total_files_scanned: usize,
    pub duplicate_groups_found: usize,
    /// Every file in a duplicate group, kept copies included.
    pub total_duplicate_files: usize,
    pub files_to_delete: usize,
    pub space_to_recover: u64,
}

impl ScanStats {
    pub fn from_decisions(decisions: &[DuplicateDecision], total_files_scanned: usize) -> Self {
        let files_to_delete: usize = decisions.iter().map(|d| d.delete.len()).sum();
        Self {
            total_files_scanned,
            duplicate_groups_found: decisions.len(),
            total_duplicate_files: files_to_delete + decisions.len(),
            files_to_delete,
            space_to_recover: decisions.iter().map(DuplicateDecision::reclaimable_bytes).sum(),
        }
    }

    pub fn from_outcome(outcome: &ScanOutcome) -> Self {
        Self::from_decisions(&outcome.decisions, outcome.files_scanned)
    }

    pub fn space_human(&self) -> String {
        format_size(self.space_to_recover)
    }
}

#[derive(Serialize)]
struct JsonSummary {
    total_files_scanned: usize,
    duplicate_groups_found: usize,
    total_duplicate_files: usize,
    files_to_delete: usize,
    space_to_recover_bytes: u64,
    space_to_recover_human: String,
}

#[derive(Serialize)]
struct JsonGroup<'a> {
    hash: &'a str,
    keep_file: String,
    delete_files: Vec<String>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: JsonSummary,
    groups: Vec<JsonGroup<'a>>,
}

const RULE_WIDTH: usize = 80;

/// Renders the table report. `color` adds ANSI styling for terminals.
pub fn generate_table(decisions: &[DuplicateDecision], stats: &ScanStats, color: bool) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total Files Scanned: {}", format_number(stats.total_files_scanned));
    let _ = writeln!(out, "Duplicate Groups Found: {}", format_number(stats.duplicate_groups_found));
    let _ = writeln!(out, "Total Duplicate Files: {}", format_number(stats.total_duplicate_files));
    let _ = writeln!(out, "Files to Delete: {}", format_number(stats.files_to_delete));
    let _ = writeln!(out, "Space to Recover: {}", stats.space_human());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);

    if decisions.is_empty() {
        let message = "No duplicates found.";
        if color {
            let _ = writeln!(out, "{}", message.green());
        } else {
            let _ = writeln!(out, "{message}");
        }
        return out;
    }

    for (i, decision) in decisions.iter().enumerate() {
        let short_hash: String = decision.hash.chars().take(16).collect();
        let _ = writeln!(
            out,
            "[{}] Hash: {}... ({} each)",
            i + 1,
            short_hash,
            format_size(decision.size)
        );
        let keep = format!("KEEP: {}", decision.keep.display());
        if color {
            let _ = writeln!(out, "    {}", keep.green());
        } else {
            let _ = writeln!(out, "    {keep}");
        }
        for path in &decision.delete {
            let delete = format!("DELETE: {}", path.display());
            if color {
                let _ = writeln!(out, "    {}", delete.red());
            } else {
                let _ = writeln!(out, "    {delete}");
            }
        }
        let _ = writeln!(out);
    }
    out
}

/// One `KEEP` row then one `DELETE` row per removable file, per group.
pub fn generate_csv(decisions: &[DuplicateDecision]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Group", "Hash", "Action", "File Path"])?;

    for (i, decision) in decisions.iter().enumerate() {
        let group = (i + 1).to_string();
        let keep = decision.keep.to_string_lossy();
        writer.write_record([group.as_str(), decision.hash.as_str(), "KEEP", &*keep])?;
        for path in &decision.delete {
            let path = path.to_string_lossy();
            writer.write_record([group.as_str(), decision.hash.as_str(), "DELETE", &*path])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV report")?;
    String::from_utf8(bytes).context("CSV report is not valid UTF-8")
}

pub fn generate_json(decisions: &[DuplicateDecision], stats: &ScanStats) -> Result<String> {
    let report = JsonReport {
        summary: JsonSummary {
            total_files_scanned: stats.total_files_scanned,
            duplicate_groups_found: stats.duplicate_groups_found,
            total_duplicate_files: stats.total_duplicate_files,
            files_to_delete: stats.files_to_delete,
            space_to_recover_bytes: stats.space_to_recover,
            space_to_recover_human: stats.space_human(),
        },
        groups: decisions
            .iter()
            .map(|d| JsonGroup {
                hash: &d.hash,
                keep_file: d.keep.to_string_lossy().into_owned(),
                delete_files: d
                    .delete
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Renders `outcome` in `format`.
pub fn render(outcome: &ScanOutcome, format: ReportFormat, color: bool) -> Result<String> {
    let stats = ScanStats::from_outcome(outcome);
    match format {
        ReportFormat::Table => Ok(generate_table(&outcome.decisions, &stats, color)),
        ReportFormat::Csv => generate_csv(&outcome.decisions),
        ReportFormat::Json => generate_json(&outcome.decisions, &stats),
    }
}

pub fn save(contents: &str, path: &Path) -> Result<()> {
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report to '{}'", path.display()))
}

/// Short listing of the files that were left out of the run.
pub fn skipped_summary(warnings: &[Warning]) -> Option<String> {
    if warnings.is_empty() {
        return None;
    }
    let mut out = format!("Skipped {} file(s):\n", format_number(warnings.len()));
    for warning in warnings {
        let _ = writeln!(out, "  {warning}");
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use std::path::PathBuf;

    fn decisions() -> Vec<DuplicateDecision> {
        vec![
            DuplicateDecision {
                hash: "a".repeat(64),
                size: 1024,
                keep: PathBuf::from("/d/keep.txt"),
                delete: vec![PathBuf::from("/d/copy1.txt"), PathBuf::from("/d/copy2.txt")],
            },
            DuplicateDecision {
                hash: "b".repeat(64),
                size: 10,
                keep: PathBuf::from("/d/x, y.bin"),
                delete: vec![PathBuf::from("/d/z.bin")],
            },
        ]
    }

    #[test]
    fn stats_from_decisions() {
        let stats = ScanStats::from_decisions(&decisions(), 12);
        assert_eq!(
            stats,
            ScanStats {
                total_files_scanned: 12,
                duplicate_groups_found: 2,
                total_duplicate_files: 5,
                files_to_delete: 3,
                space_to_recover: 2058,
            }
        );
        assert_eq!(stats.space_human(), "2.01 KB");
    }

    #[test]
    fn table_lists_keep_and_delete() {
        let decisions = decisions();
        let stats = ScanStats::from_decisions(&decisions, 12);
        let table = generate_table(&decisions, &stats, false);

        assert!(table.contains("Total Files Scanned: 12"));
        assert!(table.contains("Files to Delete: 3"));
        assert!(table.contains("[1] Hash: aaaaaaaaaaaaaaaa..."));
        assert!(table.contains("    KEEP: /d/keep.txt"));
        assert!(table.contains("    DELETE: /d/copy2.txt"));
        assert!(!table.contains("No duplicates found."));
    }

    #[test]
    fn empty_table() {
        let table = generate_table(&[], &ScanStats::default(), false);
        assert!(table.contains("Duplicate Groups Found: 0"));
        assert!(table.contains("No duplicates found."));
    }

    #[test]
    fn csv_rows() {
        let csv = generate_csv(&decisions()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Group,Hash,Action,File Path");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("1,") && lines[1].ends_with(",KEEP,/d/keep.txt"));
        assert!(lines[4].ends_with(",KEEP,\"/d/x, y.bin\""));
        assert!(lines[5].starts_with("2,") && lines[5].contains(",DELETE,"));
    }

    #[test]
    fn json_shape() {
        let decisions = decisions();
        let stats = ScanStats::from_decisions(&decisions, 12);
        let json: serde_json::Value =
            serde_json::from_str(&generate_json(&decisions, &stats).unwrap()).unwrap();

        assert_eq!(json["summary"]["files_to_delete"], 3);
        assert_eq!(json["summary"]["space_to_recover_bytes"], 2058);
        assert_eq!(json["summary"]["space_to_recover_human"], "2.01 KB");
        assert_eq!(json["groups"][0]["keep_file"], "/d/keep.txt");
        assert_eq!(json["groups"][0]["delete_files"].as_array().unwrap().len(), 2);
        assert_eq!(json["groups"][1]["hash"], "b".repeat(64));
    }

    #[test]
    fn skipped_summary_lists_warnings() {
        assert!(skipped_summary(&[]).is_none());
        let summary = skipped_summary(&[Warning::new(
            "/d/locked",
            Stage::Hash,
            "Permission denied",
        )])
        .unwrap();
        assert!(summary.starts_with("Skipped 1 file(s):"));
        assert!(summary.contains("[hash] '/d/locked': Permission denied"));
    }
}
