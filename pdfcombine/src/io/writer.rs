//! PDF writing.
//!
//! Output is always written atomically: the document is serialised to a
//! temporary file in the destination directory, flushed, then renamed over
//! the target. Writing happens in two steps so that the destination can be
//! checked before any source is read:
//!
//! 1. [`PdfWriter::prepare`] validates the target and creates the temporary
//!    file, returning a [`PendingOutput`].
//! 2. [`PendingOutput::commit`] compresses, writes and renames.
//!
//! Dropping a `PendingOutput` without committing removes the temporary file,
//! so an aborted compile never leaves anything at the target.
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::config::OverwriteMode;
//! use pdfcombine::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # fn example(mut doc: Document) -> pdfcombine::Result<()> {
//! let writer = PdfWriter::new();
//! let pending = writer.prepare(Path::new("out/combined.pdf"), OverwriteMode::Force)?;
//! let stats = pending.commit(&mut doc)?;
//! println!("Wrote {} in {:?}", stats.format_file_size(), stats.write_time);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use crate::config::{CompressionLevel, OverwriteMode};
use crate::error::{CombineError, Result};
use crate::utils::format_file_size;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// How much to compress the document before writing.
    pub compression: CompressionLevel,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::Standard,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Compression that was applied.
    pub compression: CompressionLevel,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer that applies the given compression level.
    pub fn with_compression(compression: CompressionLevel) -> Self {
        Self {
            options: WriteOptions {
                compression,
                ..Default::default()
            },
        }
    }

    /// Check the destination without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `DestinationWrite` if the destination is a directory, and
    /// `OutputExists` if it exists under `NoClobber`.
    pub fn check(&self, path: &Path, overwrite: OverwriteMode) -> Result<()> {
        if path.is_dir() {
            return Err(CombineError::destination_write(
                path,
                io::Error::other("destination is a directory"),
            ));
        }

        if overwrite == OverwriteMode::NoClobber && path.exists() {
            return Err(CombineError::output_exists(path));
        }

        Ok(())
    }

    /// Check the destination and reserve a temporary file next to it.
    ///
    /// The parent directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The destination is a directory (`DestinationWrite`)
    /// - The destination exists and `overwrite` is `NoClobber` (`OutputExists`)
    /// - The parent directory cannot be created (`DestinationWrite`)
    /// - No temporary file can be created next to it (`DestinationWrite`)
    pub fn prepare(&self, path: &Path, overwrite: OverwriteMode) -> Result<PendingOutput> {
        self.check(path, overwrite)?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        if !parent.exists() {
            log::debug!("Creating output directory {}", parent.display());
            std::fs::create_dir_all(parent)
                .map_err(|e| CombineError::destination_write(parent, e))?;
        }

        let temp = tempfile::Builder::new()
            .prefix(".pdfcombine-")
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| CombineError::destination_write(path, e))?;

        Ok(PendingOutput {
            temp,
            target: path.to_path_buf(),
            no_clobber: overwrite == OverwriteMode::NoClobber,
            options: self.options.clone(),
        })
    }

    /// Prepare and commit in one step.
    pub fn save(&self, doc: &mut Document, path: &Path, overwrite: OverwriteMode) -> Result<WriteStatistics> {
        self.prepare(path, overwrite)?.commit(doc)
    }
}

/// A destination that passed its checks and holds a temporary file.
#[derive(Debug)]
pub struct PendingOutput {
    temp: NamedTempFile,
    target: PathBuf,
    no_clobber: bool,
    options: WriteOptions,
}

impl PendingOutput {
    /// Final path the document will be written to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Compress `doc`, write it to the temporary file and rename it over the
    /// target.
    ///
    /// # Errors
    ///
    /// Returns `DestinationWrite` if serialising, flushing or renaming fails,
    /// and `OutputExists` if the target appeared meanwhile under `NoClobber`.
    /// The temporary file is removed in every error case.
    pub fn commit(self, doc: &mut Document) -> Result<WriteStatistics> {
        apply_compression(doc, self.options.compression);
        self.commit_with(|writer| doc.save_to(writer).map_err(io::Error::other))
    }

    /// Write the temporary file with `write` and rename it over the target.
    ///
    /// Used for outputs that are not PDF documents, such as rendered
    /// images. The compression option does not apply.
    ///
    /// # Errors
    ///
    /// Same as [`PendingOutput::commit`]; an error returned by `write` is
    /// reported as `DestinationWrite`.
    pub fn commit_with<F>(mut self, write: F) -> Result<WriteStatistics>
    where
        F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> io::Result<()>,
    {
        let start = Instant::now();
        let target = self.target.clone();
        let no_clobber = self.no_clobber;

        {
            let mut writer = BufWriter::with_capacity(self.options.buffer_size, &mut self.temp);
            write(&mut writer).map_err(|e| CombineError::destination_write(&target, e))?;
            writer
                .flush()
                .map_err(|e| CombineError::destination_write(&target, e))?;
        }

        self.temp
            .as_file()
            .sync_all()
            .map_err(|e| CombineError::destination_write(&target, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(self.temp.path(), std::fs::Permissions::from_mode(0o644))
                .map_err(|e| CombineError::destination_write(&target, e))?;
        }

        let persisted = if no_clobber {
            self.temp.persist_noclobber(&target)
        } else {
            self.temp.persist(&target)
        };
        persisted.map_err(|e| {
            if no_clobber && e.error.kind() == io::ErrorKind::AlreadyExists {
                CombineError::output_exists(&target)
            } else {
                CombineError::destination_write(&target, e.error)
            }
        })?;

        let file_size = std::fs::metadata(&target).map(|m| m.len()).unwrap_or(0);

        Ok(WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            output_path: target,
            compression: self.options.compression,
        })
    }
}

fn apply_compression(doc: &mut Document, level: CompressionLevel) {
    match level {
        CompressionLevel::None => {}
        CompressionLevel::Standard => {
            doc.compress();
        }
        CompressionLevel::Maximum => {
            let pruned = doc.prune_objects();
            log::debug!("Pruned {} unreferenced object(s)", pruned.len());
            doc.renumber_objects();
            doc.compress();
        }
    }
}
