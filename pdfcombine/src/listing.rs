//! Working directory listing and import.
//!
//! The listing service enumerates the PDF and PNG files directly inside the
//! working directory and ranks them by filename keywords, so that e.g. all
//! drawings come before plans. [`import_files`] copies files from anywhere
//! (typically the source directory) into the working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::OTHER_RANK;
use crate::entry::{FileEntry, FileKind};
use crate::error::{CombineError, Result};

/// Rank of a file name: the lowest rank among the keywords it contains.
pub fn keyword_rank(file_name: &str, keywords: &BTreeMap<String, i64>) -> i64 {
    let lower = file_name.to_lowercase();
    keywords
        .iter()
        .filter(|(keyword, _)| !keyword.is_empty() && lower.contains(keyword.to_lowercase().as_str()))
        .map(|(_, rank)| *rank)
        .min()
        .unwrap_or(OTHER_RANK)
}

/// List the PDF and PNG files directly inside `dir`.
///
/// Entries are sorted by keyword rank, then by lower-cased file name, and
/// numbered `1..=n` in that order. None of them is selected.
///
/// # Errors
///
/// Returns a configuration error if `dir` is not a readable directory.
pub fn list_entries(dir: &Path, keywords: &BTreeMap<String, i64>) -> Result<Vec<FileEntry>> {
    if !dir.is_dir() {
        return Err(CombineError::configuration(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut ranked = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            CombineError::configuration(format!("Cannot list {}: {e}", dir.display()))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if !FileKind::from_path(&path).is_supported() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        ranked.push((keyword_rank(&name, keywords), name, path));
    }

    ranked.sort();
    log::debug!("Listed {} file(s) in {}", ranked.len(), dir.display());

    Ok(ranked
        .into_iter()
        .enumerate()
        .map(|(idx, (_, _, path))| FileEntry::from_path(path, idx as u32 + 1))
        .collect())
}

/// Entries whose file no longer exists on disk.
pub fn missing_entries(entries: &[FileEntry]) -> Vec<&FileEntry> {
    entries.iter().filter(|e| !e.path.exists()).collect()
}

/// Outcome of [`import_files`].
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Files copied, as their new paths.
    pub copied: Vec<PathBuf>,
    /// Files skipped, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Files that failed to copy.
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

/// Copy PDF and PNG files into `working_dir`.
///
/// Files already located in `working_dir`, files with other extensions and
/// files whose target exists (unless `overwrite`) are skipped.
///
/// # Errors
///
/// Returns a configuration error if `working_dir` is not a directory.
/// Per-file problems are collected in the report.
pub fn import_files(paths: &[PathBuf], working_dir: &Path, overwrite: bool) -> Result<ImportReport> {
    if !working_dir.is_dir() {
        return Err(CombineError::configuration(format!(
            "Working directory does not exist: {}",
            working_dir.display()
        )));
    }

    let mut report = ImportReport::default();
    let canonical_dir = working_dir.canonicalize()?;

    for path in paths {
        if !FileKind::from_path(path).is_supported() {
            log::info!("Skipped non-PDF/PNG file: {}", path.display());
            report
                .skipped
                .push((path.clone(), "not a PDF or PNG file".to_string()));
            continue;
        }

        let Some(name) = path.file_name() else {
            report.skipped.push((path.clone(), "no file name".to_string()));
            continue;
        };
        let dest = working_dir.join(name);

        let already_there = path
            .canonicalize()
            .ok()
            .and_then(|p| p.parent().map(|d| d == canonical_dir))
            .unwrap_or(false);
        if already_there {
            report
                .skipped
                .push((path.clone(), "already in the working directory".to_string()));
            continue;
        }

        if dest.exists() && !overwrite {
            report
                .skipped
                .push((path.clone(), format!("{} already exists", dest.display())));
            continue;
        }

        match std::fs::copy(path, &dest) {
            Ok(_) => {
                log::debug!("Copied {} to {}", path.display(), dest.display());
                report.copied.push(dest);
            }
            Err(err) => {
                log::warn!("Could not copy {}: {err}", path.display());
                report.failed.push((path.clone(), err));
            }
        }
    }

    Ok(report)
}
