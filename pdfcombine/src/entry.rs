//! Entries, selection and ordering.
//!
//! A [`FileEntry`] is one candidate source with a user-assigned order and a
//! selected flag. [`CompilationRequest`] turns a list of entries into the
//! exact sequence the compiler appends: filtered by [`SelectionMode`], then
//! sorted ascending by order. The sort is stable, so entries sharing an
//! order keep their listing position.
//!
//! # Examples
//!
//! ```
//! use pdfcombine::entry::{CompilationRequest, FileEntry, SelectionMode};
//!
//! let entries = vec![
//!     FileEntry::from_path("plan.pdf", 2).with_selected(true),
//!     FileEntry::from_path("photo.png", 1),
//!     FileEntry::from_path("detail.pdf", 1).with_selected(true),
//! ];
//!
//! let request = CompilationRequest::new(entries, SelectionMode::Selected);
//! let names: Vec<_> = request.paths().map(|p| p.display().to_string()).collect();
//! assert_eq!(names, ["detail.pdf", "plan.pdf"]);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CombineError, Result};

/// Kind of a source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A PDF document; all of its pages are appended.
    Pdf,
    /// A PNG image; appended as one full-page image.
    Png,
    /// Anything else. Such entries are skipped and reported.
    Unsupported,
}

impl FileKind {
    /// Detect the kind from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("png") => Self::Png,
            _ => Self::Unsupported,
        }
    }

    /// Whether the compiler knows how to append this kind.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Lower-case label used in listings and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path to the file.
    pub path: PathBuf,

    /// Kind detected from the path.
    pub kind: FileKind,

    /// User-assigned order. Not required to be unique or contiguous.
    pub order: u32,

    /// Whether the entry is checked for `SelectionMode::Selected`.
    pub selected: bool,
}

impl FileEntry {
    /// Create an unselected entry, detecting its kind from the extension.
    pub fn from_path(path: impl Into<PathBuf>, order: u32) -> Self {
        let path = path.into();
        let kind = FileKind::from_path(&path);
        Self {
            path,
            kind,
            order,
            selected: false,
        }
    }

    /// Return the entry with its selected flag set.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// File name for display, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Order to give an entry appended after `entries`.
    ///
    /// Saturates at `u32::MAX`, so appending after such an entry ties with it.
    pub fn next_order(entries: &[FileEntry]) -> u32 {
        entries
            .iter()
            .map(|e| e.order)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }
}

/// Which entries take part in a compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Every entry.
    #[default]
    All,
    /// Only entries with `selected == true`.
    Selected,
}

impl SelectionMode {
    fn includes(&self, entry: &FileEntry) -> bool {
        match self {
            Self::All => true,
            Self::Selected => entry.selected,
        }
    }
}

/// Filtered and sorted sequence of entries handed to the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationRequest {
    entries: Vec<FileEntry>,
}

impl CompilationRequest {
    /// Filter `entries` by `mode` and sort them ascending by order.
    pub fn new(entries: impl IntoIterator<Item = FileEntry>, mode: SelectionMode) -> Self {
        let mut entries: Vec<FileEntry> = entries.into_iter().filter(|e| mode.includes(e)).collect();
        // sort_by_key is stable: ties keep listing order
        entries.sort_by_key(|e| e.order);
        Self { entries }
    }

    /// Build a request that appends `paths` exactly in the given order.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let entries = paths
            .into_iter()
            .enumerate()
            .map(|(idx, path)| FileEntry::from_path(path, idx as u32 + 1));
        Self::new(entries, SelectionMode::All)
    }

    /// Entries in compile order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Paths in compile order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the request has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct PlanItem {
    path: PathBuf,
    #[serde(default)]
    order: Option<u32>,
    #[serde(default = "default_selected")]
    selected: bool,
}

fn default_selected() -> bool {
    true
}

/// Parse a compile plan: a JSON array of `{ "path", "order"?, "selected"? }`.
///
/// An item without an order is placed after every item before it (see
/// [`FileEntry::next_order`]); missing `selected` flags default to `true`.
/// Relative paths are resolved against `base`.
pub fn parse_plan(json: &str, base: &Path) -> Result<Vec<FileEntry>> {
    let items: Vec<PlanItem> = serde_json::from_str(json)
        .map_err(|e| CombineError::configuration(format!("Invalid plan: {e}")))?;

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let path = if item.path.is_relative() {
            base.join(&item.path)
        } else {
            item.path
        };
        let order = item.order.unwrap_or_else(|| FileEntry::next_order(&entries));
        entries.push(FileEntry::from_path(path, order).with_selected(item.selected));
    }
    Ok(entries)
}
