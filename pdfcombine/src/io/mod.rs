//! I/O operations for pdfcombine.
//!
//! This module handles all file I/O:
//! - Loading PDF sources from disk
//! - Turning PNG sources into one-page documents
//! - Rendering the first page of a PDF as an image (with the `pdfium` feature)
//! - Writing the combined PDF atomically
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::config::OverwriteMode;
//! use pdfcombine::entry::FileEntry;
//! use pdfcombine::io::{PdfWriter, SourceReader};
//! use std::path::Path;
//!
//! # fn example() -> pdfcombine::Result<()> {
//! let mut loaded = SourceReader::new().load(&FileEntry::from_path("scan.png", 1))?;
//! PdfWriter::new().save(&mut loaded.document, Path::new("scan.pdf"), OverwriteMode::Force)?;
//! # Ok(())
//! # }
//! ```

pub mod png;
pub mod reader;
#[cfg(feature = "png")]
pub mod render;
pub mod writer;

pub use png::{PNG_SUPPORTED, png_page_document};
pub use reader::{LoadedSource, SourceReader};
pub use writer::{PdfWriter, PendingOutput, WriteOptions, WriteStatistics};
