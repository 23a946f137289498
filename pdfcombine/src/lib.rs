//! pdfcombine - Order, select and combine PDF and PNG files into one PDF.
//!
//! This library provides the core of a working-directory based combine
//! workflow:
//!
//! - Listing a working directory, ranked by filename keywords
//! - Ordering and selecting entries
//! - Combining PDFs and PNGs (one full page per image) into a single PDF
//! - Per-file failure reporting and cooperative cancellation
//! - Atomic output writing
//! - Persistent settings and external editor hand-off
//! - PNG/PDF single-file conversion and two-image blending
//!
//! # Examples
//!
//! ## Combine a working directory
//!
//! ```no_run
//! use pdfcombine::config::{Config, Settings};
//! use pdfcombine::entry::{CompilationRequest, SelectionMode};
//! use pdfcombine::{listing, merge};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(&Settings::default_path())?;
//! let dir = settings.require_working_dir()?;
//!
//! let entries = listing::list_entries(dir, &settings.ordering_keywords)?;
//! let request = CompilationRequest::new(entries, SelectionMode::All);
//!
//! let outcome = merge::compile(&request, Config::new(dir.join("Combined.pdf")), None)?;
//! println!("Created {} page document", outcome.document.page_count);
//! for failure in &outcome.failed {
//!     eprintln!("skipped {}: {}", failure.path.display(), failure.error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use pdfcombine::config::OverwriteMode;
//! use pdfcombine::entry::FileEntry;
//! use pdfcombine::io::{PdfWriter, SourceReader};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load a source
//! let reader = SourceReader::new();
//! let mut loaded = reader.load(&FileEntry::from_path("scan.png", 1))?;
//! println!("{} has {} page(s)", loaded.path.display(), loaded.page_count);
//!
//! // Save it
//! let writer = PdfWriter::new();
//! writer.save(&mut loaded.document, Path::new("scan.pdf"), OverwriteMode::NoClobber)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "png")]
pub mod blend;
pub mod config;
pub mod convert;
pub mod entry;
pub mod error;
pub mod io;
pub mod launch;
pub mod listing;
pub mod merge;
pub mod output;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, Settings};
pub use entry::{CompilationRequest, FileEntry, FileKind, SelectionMode};
pub use error::{CombineError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
