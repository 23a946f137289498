//! The compile pipeline.
//!
//! A compile validates the destination first, then appends every entry of a
//! [`CompilationRequest`] in order. Sources that cannot be used are recorded
//! and skipped; only destination problems, cancellation and an empty result
//! abort the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::entry::{CompilationRequest, FileEntry, FileKind};
use crate::error::{CombineError, Result, SourceProblem};
use crate::io::{PdfWriter, SourceReader, WriteOptions};
use crate::merge::metadata::MetadataManager;
use crate::merge::pages::PageAssembler;
use crate::utils::format_file_size;

/// Cooperative cancellation shared between a compile and its caller.
///
/// The compiler checks the flag before each source and before writing.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The written output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    /// Output path.
    pub path: PathBuf,
    /// Pages in the output.
    pub page_count: usize,
}

/// A source that contributed pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Source path.
    pub path: PathBuf,
    /// Source kind.
    pub kind: FileKind,
    /// Pages contributed.
    pub pages: usize,
}

/// A source that was skipped.
#[derive(Debug)]
pub struct SourceFailure {
    /// Source path.
    pub path: PathBuf,
    /// Why it was skipped. Always a recoverable error.
    pub error: CombineError,
}

/// Timing and size figures for a compile.
#[derive(Debug, Clone, Default)]
pub struct CompileStatistics {
    /// Time spent loading and appending sources.
    pub compile_time: Duration,
    /// Time spent writing the output.
    pub write_time: Duration,
    /// Total size of the sources that were appended.
    pub input_size: u64,
    /// Size of the written output, zero for a dry run.
    pub output_size: u64,
}

impl CompileStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Everything a compile produced.
#[derive(Debug)]
pub struct CompileOutcome {
    /// The output document.
    pub document: CompiledDocument,
    /// Sources appended, in output order.
    pub succeeded: Vec<SourceReport>,
    /// Sources skipped, in request order.
    pub failed: Vec<SourceFailure>,
    /// Degraded-mode notices, e.g. PNG support being compiled out.
    pub warnings: Vec<String>,
    /// Whether the output was written (false for a dry run).
    pub written: bool,
    /// Timing and size figures.
    pub statistics: CompileStatistics,
}

impl CompileOutcome {
    /// Whether every source was appended.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What happened to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// All pages were appended.
    Appended {
        /// Pages contributed.
        pages: usize,
    },
    /// The source was skipped.
    Skipped {
        /// Human-readable reason.
        reason: String,
    },
}

/// Per-source progress report.
#[derive(Debug)]
pub struct SourceProgress<'a> {
    /// Zero-based position in the request.
    pub index: usize,
    /// Number of entries in the request.
    pub total: usize,
    /// The entry just processed.
    pub entry: &'a FileEntry,
    /// Its outcome.
    pub status: SourceStatus,
}

/// Callback invoked after each source.
pub type ProgressCallback = Arc<dyn Fn(&SourceProgress<'_>) + Send + Sync>;

/// Combines ordered sources into one PDF.
#[derive(Clone)]
pub struct Compiler {
    config: Config,
    reader: SourceReader,
    writer: PdfWriter,
    metadata_manager: MetadataManager,
    cancellation: Option<CancellationFlag>,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .field("cancellation", &self.cancellation)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Compiler {
    /// Create a compiler for the given configuration.
    pub fn new(config: Config) -> Self {
        let writer = PdfWriter::with_options(WriteOptions {
            compression: config.compression,
            ..Default::default()
        });

        Self {
            config,
            reader: SourceReader::new(),
            writer,
            metadata_manager: MetadataManager::new(),
            cancellation: None,
            progress: None,
        }
    }

    /// Attach a cancellation flag.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The configuration this compiler runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the compile on the current thread.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The destination is a directory, is one of the sources, or cannot be
    ///   prepared (`DestinationWrite`)
    /// - The destination exists under `NoClobber` (`OutputExists`)
    /// - Cancellation was requested (`Cancelled`)
    /// - No source contributed a page (`EmptyResult`)
    /// - Writing the output fails (`DestinationWrite`)
    ///
    /// No file is left at the destination in any error case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pdfcombine::config::Config;
    /// use pdfcombine::entry::CompilationRequest;
    /// use pdfcombine::merge::Compiler;
    ///
    /// # fn example() -> pdfcombine::Result<()> {
    /// let request = CompilationRequest::from_paths(["plan.pdf", "photo.png"]);
    /// let outcome = Compiler::new(Config::new("combined.pdf")).compile(&request)?;
    /// println!(
    ///     "{} pages, {} source(s) skipped",
    ///     outcome.document.page_count,
    ///     outcome.failed.len()
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn compile(&self, request: &CompilationRequest) -> Result<CompileOutcome> {
        let start = Instant::now();
        let destination = self.config.output.as_path();

        if let Some(source) = request.paths().find(|p| same_file(p, destination)) {
            return Err(CombineError::destination_write(
                destination,
                std::io::Error::other(format!(
                    "destination is also a source: {}",
                    source.display()
                )),
            ));
        }

        let pending = if self.config.dry_run {
            self.writer.check(destination, self.config.overwrite_mode)?;
            None
        } else {
            Some(self.writer.prepare(destination, self.config.overwrite_mode)?)
        };

        log::info!(
            "Compiling {} source(s) into {}",
            request.len(),
            destination.display()
        );

        let mut assembler = PageAssembler::new();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut warnings = Vec::new();
        let mut input_size = 0;

        for (index, entry) in request.entries().iter().enumerate() {
            self.check_cancelled()?;

            let status = match self.append_source(&mut assembler, entry) {
                Ok((pages, file_size)) => {
                    input_size += file_size;
                    succeeded.push(SourceReport {
                        path: entry.path.clone(),
                        kind: entry.kind,
                        pages,
                    });
                    SourceStatus::Appended { pages }
                }
                Err(err) if err.is_recoverable() => {
                    log::warn!("Skipping {}: {err}", entry.path.display());
                    if let CombineError::SourceRead {
                        problem: SourceProblem::PngUnsupported,
                        ..
                    } = &err
                    {
                        warnings.push(format!(
                            "PNG support is not available; skipped {}",
                            entry.path.display()
                        ));
                    }
                    let reason = match &err {
                        CombineError::SourceRead { problem, .. } => problem.to_string(),
                        other => other.to_string(),
                    };
                    failed.push(SourceFailure {
                        path: entry.path.clone(),
                        error: err,
                    });
                    SourceStatus::Skipped { reason }
                }
                Err(err) => return Err(err),
            };

            if let Some(progress) = &self.progress {
                progress(&SourceProgress {
                    index,
                    total: request.len(),
                    entry,
                    status,
                });
            }
        }

        self.check_cancelled()?;

        if succeeded.is_empty() {
            return Err(CombineError::EmptyResult {
                failed: failed.len(),
            });
        }

        let compile_time = start.elapsed();
        let page_count = assembler.page_count();
        let mut doc = assembler.finish();
        self.metadata_manager
            .set_metadata(&mut doc, &self.config.metadata);

        let mut statistics = CompileStatistics {
            compile_time,
            input_size,
            ..Default::default()
        };

        let written = match pending {
            Some(pending) => {
                let write_stats = pending.commit(&mut doc)?;
                statistics.write_time = write_stats.write_time;
                statistics.output_size = write_stats.file_size;
                true
            }
            None => false,
        };

        log::info!(
            "Compiled {page_count} page(s) from {} source(s), {} skipped",
            succeeded.len(),
            failed.len()
        );

        Ok(CompileOutcome {
            document: CompiledDocument {
                path: destination.to_path_buf(),
                page_count,
            },
            succeeded,
            failed,
            warnings,
            written,
            statistics,
        })
    }

    /// Run the compile on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`Compiler::compile`], plus `CombineFailed` if the blocking
    /// task panics.
    pub async fn compile_async(self, request: CompilationRequest) -> Result<CompileOutcome> {
        tokio::task::spawn_blocking(move || self.compile(&request))
            .await
            .map_err(|e| CombineError::combine_failed(format!("Compile task failed: {e}")))?
    }

    fn append_source(&self, assembler: &mut PageAssembler, entry: &FileEntry) -> Result<(usize, u64)> {
        let loaded = self.reader.load(entry)?;
        let file_size = loaded.file_size;
        let pages = assembler.append(loaded.document).map_err(|e| {
            CombineError::source_read(&entry.path, SourceProblem::Corrupt(e.to_string()))
        })?;
        Ok((pages, file_size))
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancellation {
            Some(flag) if flag.is_cancelled() => {
                log::info!("Compile cancelled");
                Err(CombineError::Cancelled)
            }
            _ => Ok(()),
        }
    }
}

/// Whether two paths name the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
