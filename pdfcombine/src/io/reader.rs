//! Source loading.
//!
//! [`SourceReader`] turns one [`FileEntry`] into a [`LoadedSource`]: a PDF is
//! loaded as-is, a PNG becomes a one-page document. Every way a source can
//! be unusable maps to a [`SourceProblem`] so the compiler can record it and
//! move on.
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::entry::FileEntry;
//! use pdfcombine::io::reader::SourceReader;
//!
//! let reader = SourceReader::new();
//! let loaded = reader.load(&FileEntry::from_path("plan.pdf", 1))?;
//! println!("{} pages in {:?}", loaded.page_count, loaded.load_time);
//! # Ok::<(), pdfcombine::CombineError>(())
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::entry::{FileEntry, FileKind};
use crate::error::{CombineError, Result, SourceProblem};
use crate::io::png::png_page_document;

/// A source ready to be appended.
#[derive(Debug)]
pub struct LoadedSource {
    /// The document holding the source's pages.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Kind of the source.
    pub kind: FileKind,

    /// Number of pages the source contributes.
    pub page_count: usize,

    /// Time taken to load the source.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// Loads PDF and PNG sources.
#[derive(Debug, Clone, Default)]
pub struct SourceReader {
    _private: (),
}

impl SourceReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one entry.
    ///
    /// # Errors
    ///
    /// Returns a `SourceRead` error if:
    /// - The file does not exist
    /// - The kind is unsupported
    /// - The PDF is encrypted, corrupt or has no pages
    /// - The PNG cannot be decoded, or PNG support is compiled out
    pub fn load(&self, entry: &FileEntry) -> Result<LoadedSource> {
        let path = entry.path.as_path();

        if !path.is_file() {
            return Err(CombineError::source_read(path, SourceProblem::NotFound));
        }

        let start = Instant::now();
        let document = match entry.kind {
            FileKind::Pdf => load_pdf(path)?,
            FileKind::Png => png_page_document(path)?,
            FileKind::Unsupported => {
                return Err(CombineError::source_read(path, SourceProblem::Unsupported));
            }
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(CombineError::source_read(path, SourceProblem::Empty));
        }

        let load_time = start.elapsed();
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        log::debug!(
            "Loaded {} ({}, {page_count} page(s)) in {load_time:?}",
            path.display(),
            entry.kind
        );

        Ok(LoadedSource {
            document,
            path: path.to_path_buf(),
            kind: entry.kind,
            page_count,
            load_time,
            file_size,
        })
    }
}

fn load_pdf(path: &Path) -> Result<Document> {
    let doc = Document::load(path).map_err(|e| {
        let err_msg = e.to_string();
        let lower = err_msg.to_lowercase();
        if lower.contains("encrypt") || lower.contains("password") {
            CombineError::source_read(path, SourceProblem::Encrypted)
        } else {
            CombineError::source_read(path, SourceProblem::Corrupt(err_msg))
        }
    })?;

    if doc.is_encrypted() {
        return Err(CombineError::source_read(path, SourceProblem::Encrypted));
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};
    use tempfile::TempDir;

    fn write_pdf(dir: &TempDir, name: &str, pages: usize) -> PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.path().join(name);
        doc.save(&path).unwrap();
        path
    }

    fn problem_of(err: CombineError) -> SourceProblem {
        match err {
            CombineError::SourceRead { problem, .. } => problem,
            other => panic!("expected SourceRead, got {other:?}"),
        }
    }

    #[test]
    fn test_load_pdf() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "three.pdf", 3);

        let loaded = SourceReader::new()
            .load(&FileEntry::from_path(&path, 1))
            .unwrap();

        assert_eq!(loaded.page_count, 3);
        assert_eq!(loaded.kind, FileKind::Pdf);
        assert_eq!(loaded.path, path);
        assert!(loaded.file_size > 0);
    }

    #[test]
    fn test_missing_file() {
        let err = SourceReader::new()
            .load(&FileEntry::from_path("/no/such/file.pdf", 1))
            .unwrap_err();
        assert_eq!(problem_of(err), SourceProblem::NotFound);
    }

    #[test]
    fn test_unsupported_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = SourceReader::new()
            .load(&FileEntry::from_path(path, 1))
            .unwrap_err();
        assert_eq!(problem_of(err), SourceProblem::Unsupported);
    }

    #[test]
    fn test_corrupt_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = SourceReader::new()
            .load(&FileEntry::from_path(path, 1))
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(problem_of(err), SourceProblem::Corrupt(_)));
    }

    #[test]
    fn test_pdf_without_pages() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "empty.pdf", 0);

        let err = SourceReader::new()
            .load(&FileEntry::from_path(path, 1))
            .unwrap_err();
        assert_eq!(problem_of(err), SourceProblem::Empty);
    }
}
