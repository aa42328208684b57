//! Backup display formatting
//!
//! Formats artifact listings and run summaries for terminal output.

use chrono::{DateTime, Utc};

use crate::backup::{ArtifactRestore, BackupArtifact, BackupReport, CompleteRestore};
use crate::database::DumpOutcome;

/// Format the remote artifact listing as a table
pub fn format_backup_list(artifacts: &[BackupArtifact], now: DateTime<Utc>) -> String {
    if artifacts.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = artifacts
        .iter()
        .map(|a| a.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>3}  {:<name_width$}  {:<7}  {:>10}  {:<20}  {}\n",
        "#",
        "Name",
        "Type",
        "Size",
        "Uploaded",
        "Age",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:->3}  {:-<name_width$}  {:-<7}  {:->10}  {:-<20}  {:-<5}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for (i, artifact) in artifacts.iter().enumerate() {
        output.push_str(&format!(
            "{:>3}  {:<name_width$}  {:<7}  {:>10}  {:<20}  {}\n",
            i + 1,
            artifact.name,
            artifact.kind.label(),
            format_size(artifact.size_bytes),
            artifact.last_modified.format("%Y-%m-%d %H:%M UTC"),
            format_age(now.signed_duration_since(artifact.last_modified)),
            name_width = name_width,
        ));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} backup(s)\n", artifacts.len()));
    output
}

/// Format the summary of a full backup run
pub fn format_backup_report(report: &BackupReport) -> String {
    let dump = match &report.dump {
        DumpOutcome::Native => "mongodump".to_string(),
        DumpOutcome::Fallback {
            collections,
            documents,
        } => format!(
            "in-process, {} documents in {} collections",
            documents, collections
        ),
    };

    let mut output = String::new();
    output.push_str("Backup complete\n");
    output.push_str("===============\n");
    output.push_str(&format!(
        "Database:     {} ({}, {})\n",
        report.database.name,
        format_size(report.database.size_bytes),
        dump
    ));
    output.push_str(&format!(
        "Object store: {} ({}, {} objects)\n",
        report.store.artifact.name,
        format_size(report.store.artifact.size_bytes),
        report.store.archived
    ));
    if report.store.skipped > 0 {
        output.push_str(&format!(
            "  Skipped {} object(s) that could not be downloaded\n",
            report.store.skipped
        ));
    }
    if !report.pruned.is_empty() {
        output.push_str(&format!(
            "Pruned {} old local file(s)\n",
            report.pruned.len()
        ));
    }
    output.push_str(&format!(
        "Duration:     {:.1}s\n",
        report.duration.as_secs_f64()
    ));
    output
}

/// Format the result of a single-artifact restore
pub fn format_restore(restored: &ArtifactRestore) -> String {
    format!("Restore complete: {}\n", restored.summary())
}

/// Format the result of a database + object store restore
pub fn format_complete_restore(restored: &CompleteRestore) -> String {
    let mut output = String::new();
    output.push_str("Restore complete\n");
    output.push_str("================\n");
    output.push_str(&format!("  {}\n", restored.database.summary()));
    output.push_str(&format!("  {}\n", restored.store.summary()));
    output
}

/// Format an age in human-readable form
pub fn format_age(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
