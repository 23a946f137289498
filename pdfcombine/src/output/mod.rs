//! Output formatting and display for pdfcombine.
//!
//! This module handles all user-facing output:
//! - Formatted status messages
//! - Per-source progress
//! - Listing tables
//! - Compile and import summaries
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::output::{OutputFormatter, display_listing};
//! use pdfcombine::entry::FileEntry;
//!
//! let formatter = OutputFormatter::default();
//! display_listing(&formatter, &[FileEntry::from_path("plan.pdf", 1)]);
//! ```

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::{ProgressBar, ProgressStyle};

use crate::entry::{FileEntry, FileKind};
use crate::io::PNG_SUPPORTED;
use crate::listing::ImportReport;
use crate::merge::{CompileOutcome, SourceFailure};

/// One listing row: order, selection mark, kind and file name.
pub fn format_entry_row(entry: &FileEntry) -> String {
    let mark = if entry.selected { "x" } else { " " };
    format!(
        "{:>4}  [{mark}]  {:<3}  {}",
        entry.order,
        entry.kind.as_str(),
        entry.file_name()
    )
}

/// Display a listing of entries.
pub fn display_listing(formatter: &OutputFormatter, entries: &[FileEntry]) {
    if entries.is_empty() {
        formatter.info("No PDF or PNG files found");
        return;
    }

    for entry in entries {
        formatter.item(&format_entry_row(entry));
    }
    if let Some(notice) = png_notice(entries) {
        formatter.warning(&notice);
    }
}

/// Warning for listed PNG files this build cannot compile.
pub fn png_notice(entries: &[FileEntry]) -> Option<String> {
    let pngs = entries.iter().filter(|e| e.kind == FileKind::Png).count();
    (!PNG_SUPPORTED && pngs > 0).then(|| {
        format!("{pngs} PNG file(s) will be skipped: built without the png feature")
    })
}

/// Display skipped sources.
///
/// Failures are warnings, so they are shown even in quiet mode.
pub fn display_failures(formatter: &OutputFormatter, failures: &[SourceFailure]) {
    if failures.is_empty() {
        return;
    }

    formatter.warning(&format!("{} file(s) were skipped:", failures.len()));
    for failure in failures {
        let reason = match &failure.error {
            crate::CombineError::SourceRead { problem, .. } => problem.to_string(),
            other => other.to_string(),
        };
        formatter.warning(&format!("  {}: {reason}", failure.path.display()));
    }
}

/// Display the result of a compile.
pub fn display_compile_summary(formatter: &OutputFormatter, outcome: &CompileOutcome) {
    for warning in &outcome.warnings {
        formatter.warning(warning);
    }
    display_failures(formatter, &outcome.failed);

    let stats = &outcome.statistics;
    if outcome.written {
        formatter.success(&format!(
            "Created {} ({} page(s) from {} file(s), {})",
            outcome.document.path.display(),
            outcome.document.page_count,
            outcome.succeeded.len(),
            stats.format_output_size()
        ));
    } else {
        formatter.success(&format!(
            "Dry run: {} page(s) from {} file(s) would be written to {}",
            outcome.document.page_count,
            outcome.succeeded.len(),
            outcome.document.path.display()
        ));
    }

    if formatter.is_verbose() {
        formatter.section("Statistics");
        for report in &outcome.succeeded {
            formatter.detail(
                &report.path.display().to_string(),
                &format!("{} page(s), {}", report.pages, report.kind),
            );
        }
        formatter.detail("Input size", &stats.format_input_size());
        formatter.detail(
            "Compile time",
            &format!("{:.2}s", stats.compile_time.as_secs_f64()),
        );
        if outcome.written {
            formatter.detail("Output size", &stats.format_output_size());
            formatter.detail(
                "Write time",
                &format!("{:.2}s", stats.write_time.as_secs_f64()),
            );
        }
    }
}

/// Display the result of an import.
pub fn display_import_report(formatter: &OutputFormatter, report: &ImportReport) {
    for path in &report.copied {
        formatter.debug(&format!("Copied {}", path.display()));
    }
    for (path, reason) in &report.skipped {
        formatter.info(&format!("Skipped {}: {reason}", path.display()));
    }
    for (path, err) in &report.failed {
        formatter.error(&format!("Could not copy {}: {err}", path.display()));
    }

    formatter.success(&format!(
        "Imported {} file(s), skipped {}, failed {}",
        report.copied.len(),
        report.skipped.len(),
        report.failed.len()
    ));
}
