//! Combining sources into one PDF.
//!
//! This module provides the core compile functionality:
//! - Ordered concatenation of PDF and PNG sources
//! - Per-source failure recording
//! - Cooperative cancellation
//! - Page tree assembly
//! - Metadata management
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::config::Config;
//! use pdfcombine::entry::{CompilationRequest, FileEntry, SelectionMode};
//! use pdfcombine::merge::{self, CancellationFlag};
//!
//! # fn example() -> pdfcombine::Result<()> {
//! let entries = vec![
//!     FileEntry::from_path("site_plan.pdf", 2).with_selected(true),
//!     FileEntry::from_path("drawing.png", 1).with_selected(true),
//! ];
//! let request = CompilationRequest::new(entries, SelectionMode::Selected);
//!
//! let cancel = CancellationFlag::new();
//! let outcome = merge::compile(&request, Config::new("combined.pdf"), Some(cancel))?;
//! for failure in &outcome.failed {
//!     eprintln!("skipped {}: {}", failure.path.display(), failure.error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod metadata;
pub mod pages;

pub use compiler::{
    CancellationFlag, CompileOutcome, CompileStatistics, CompiledDocument, Compiler,
    ProgressCallback, SourceFailure, SourceProgress, SourceReport, SourceStatus,
};
pub use metadata::MetadataManager;
pub use pages::PageAssembler;

use crate::config::Config;
use crate::entry::CompilationRequest;
use crate::error::Result;

fn compiler_for(config: Config, cancel: Option<CancellationFlag>) -> Compiler {
    let compiler = Compiler::new(config);
    match cancel {
        Some(flag) => compiler.with_cancellation(flag),
        None => compiler,
    }
}

/// Compile `request` on the current thread.
///
/// Convenience wrapper around [`Compiler::compile`].
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(
    request: &CompilationRequest,
    config: Config,
    cancel: Option<CancellationFlag>,
) -> Result<CompileOutcome> {
    compiler_for(config, cancel).compile(request)
}

/// Compile `request` on tokio's blocking pool.
///
/// # Errors
///
/// See [`Compiler::compile_async`].
pub async fn compile_async(
    request: CompilationRequest,
    config: Config,
    cancel: Option<CancellationFlag>,
) -> Result<CompileOutcome> {
    compiler_for(config, cancel).compile_async(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverwriteMode;
    use crate::error::CombineError;
    use tempfile::TempDir;

    #[test]
    fn test_compile_convenience() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.pdf");
        pages::tests::create_multi_page_pdf(2, 300)
            .save(&source)
            .unwrap();

        let mut config = Config::new(dir.path().join("out.pdf"));
        config.overwrite_mode = OverwriteMode::NoClobber;

        let outcome = compile(&CompilationRequest::from_paths([source]), config, None).unwrap();
        assert_eq!(outcome.document.page_count, 2);
    }

    #[tokio::test]
    async fn test_compile_async_cancelled() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.pdf");
        pages::tests::create_multi_page_pdf(1, 300)
            .save(&source)
            .unwrap();
        let output = dir.path().join("out.pdf");

        let flag = CancellationFlag::new();
        flag.cancel();

        let err = compile_async(
            CompilationRequest::from_paths([source]),
            Config::new(output.clone()),
            Some(flag),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CombineError::Cancelled));
        assert!(!output.exists());
    }
}
