//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and, where it is printed as a block, a `print_*` wrapper that
//! writes to stdout. Format functions are pure: no I/O, no side effects.
//!
//! Paths are shown relative to the scanned root when they live under it.
//!
//! ## Build
//!
//! ```text
//! + nature/lake.png
//! ! broken.png: decode failed: ...
//!
//! 1 added, 3 cached, 1 failed, 2 not images (7 files scanned)
//! ```
//!
//! ## Scan
//!
//! ```text
//! Images (2)
//!     image/png   nature/lake.png
//!     image/jpeg  city.jpg
//! Skipped (1)
//!     notes.txt: not a PNG or JPEG
//! ```

use crate::classify::Classification;
use crate::pipeline::RunReport;
use crate::process::ProcessEvent;
use crate::types::{CachedImage, Skipped};
use std::path::Path;

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn skipped_line(skipped: &Skipped, root: &Path) -> String {
    format!("{}: {}", display_path(&skipped.path, root), skipped.reason)
}

// ============================================================================
// Build
// ============================================================================

/// One line per finished thumbnail job.
pub fn format_process_event(event: &ProcessEvent, root: &Path) -> String {
    match event {
        ProcessEvent::Generated { path } => format!("+ {}", display_path(path, root)),
        ProcessEvent::Skipped { path, reason } => {
            format!("! {}: {}", display_path(path, root), reason)
        }
    }
}

/// Summary block printed after a build. Lookup failures are always listed;
/// classifier rejects only when `verbose`.
pub fn format_run_report(report: &RunReport, root: &Path, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.lookup_failed.is_empty() {
        lines.push("Lookup errors".to_string());
        for (path, error) in &report.lookup_failed {
            lines.push(format!("    {}: {}", display_path(path, root), error));
        }
    }

    if verbose && !report.rejected.is_empty() {
        lines.push("Not images".to_string());
        for skipped in &report.rejected {
            lines.push(format!("    {}", skipped_line(skipped, root)));
        }
    }

    lines.push(report.to_string());
    lines
}

pub fn print_run_report(report: &RunReport, root: &Path, verbose: bool) {
    for line in format_run_report(report, root, verbose) {
        println!("{}", line);
    }
}

// ============================================================================
// Scan (dry run)
// ============================================================================

pub fn format_preview(classification: &Classification, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Images ({})", classification.accepted.len())];
    for candidate in &classification.accepted {
        lines.push(format!(
            "    {:<11} {}",
            candidate.mime_type.as_str(),
            display_path(candidate.file.path(), root)
        ));
    }

    if !classification.skipped.is_empty() {
        lines.push(format!("Skipped ({})", classification.skipped.len()));
        for skipped in &classification.skipped {
            lines.push(format!("    {}", skipped_line(skipped, root)));
        }
    }
    lines
}

pub fn print_preview(classification: &Classification, root: &Path) {
    for line in format_preview(classification, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Show
// ============================================================================

pub fn format_record(record: &CachedImage) -> Vec<String> {
    vec![
        record.path.clone(),
        format!("    Type: {}", record.mime_type),
        format!("    Modified: {}", record.modified_at),
        format!("    Thumbnail: {} bytes base64", record.thumbnail_data.len()),
    ]
}
