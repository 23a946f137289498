//! Utilities for path collection and size formatting.

use crate::error::{CombineError, Result};
use std::path::PathBuf;

/// Expand multiple glob patterns into filesystem paths, keeping pattern order.
///
/// A pattern that matches nothing is kept as a literal path so that the
/// compiler can report it as missing instead of it vanishing silently.
///
/// Errors:
/// - Propagates `glob` parse errors as configuration errors.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let pattern = pattern.as_ref();
        let paths = collect_paths_for_pattern(pattern)?;
        if paths.is_empty() {
            resolved_paths.push(PathBuf::from(pattern));
        } else {
            resolved_paths.extend(paths);
        }
    }

    Ok(resolved_paths)
}

/// Expand a single glob pattern into filesystem paths.
fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|err| CombineError::configuration(format!("Invalid pattern '{pattern}': {err}")))?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => resolved_paths.push(path),
            Err(err) => log::warn!("Skipping unreadable glob match: {err}"),
        }
    }

    Ok(resolved_paths)
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
