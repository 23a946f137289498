//! Error types for pdfcombine.
//!
//! Errors fall into two groups. Per-source errors ([`CombineError::SourceRead`]
//! and friends) are recorded by the compiler and never abort a compile on
//! their own. Everything else is fatal for the operation that raised it.
//!
//! # Error Categories
//!
//! - **Configuration**: missing or invalid paths and settings
//! - **Source**: a single input could not be read, decoded or appended
//! - **Destination**: the output cannot be created or written
//! - **Empty result**: no source contributed a page
//! - **Launch**: an external editor could not be started

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pdfcombine operations.
pub type Result<T> = std::result::Result<T, CombineError>;

/// Why a single source could not be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceProblem {
    /// The file does not exist.
    NotFound,
    /// The extension is neither `.pdf` nor `.png`.
    Unsupported,
    /// The PDF is encrypted.
    Encrypted,
    /// The file could not be parsed or decoded.
    Corrupt(String),
    /// The file parsed but has nothing to append.
    Empty,
    /// PNG support was not compiled in.
    PngUnsupported,
    /// PDF pages cannot be rendered: support was not compiled in or the
    /// pdfium library could not be loaded.
    RenderUnavailable(String),
    /// Reading the file failed.
    Io(String),
}

impl std::fmt::Display for SourceProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::Unsupported => write!(f, "unsupported file type (expected .pdf or .png)"),
            Self::Encrypted => write!(f, "PDF is encrypted"),
            Self::Corrupt(details) => write!(f, "corrupted or invalid file: {details}"),
            Self::Empty => write!(f, "document has no pages"),
            Self::PngUnsupported => write!(f, "PNG conversion is not available in this build"),
            Self::RenderUnavailable(reason) => write!(f, "PDF rendering is not available: {reason}"),
            Self::Io(reason) => write!(f, "read failed: {reason}"),
        }
    }
}

/// Main error type for pdfcombine operations.
#[derive(Debug, Error)]
pub enum CombineError {
    /// Invalid or missing configuration (paths, settings, arguments).
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Description of what is wrong.
        message: String,
    },

    /// A single source file could not be used.
    #[error("Cannot use source: {}\n  Reason: {problem}", .path.display())]
    SourceRead {
        /// Path of the offending source.
        path: PathBuf,
        /// What went wrong.
        problem: SourceProblem,
    },

    /// The destination cannot be created or written.
    #[error("Cannot write output: {}\n  Reason: {source}", .path.display())]
    DestinationWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Output file already exists and overwriting is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// No source contributed any page, so no output was produced.
    #[error("No pages were produced: all {failed} source(s) failed or were skipped")]
    EmptyResult {
        /// Number of sources that were attempted.
        failed: usize,
    },

    /// The settings file could not be parsed or serialised.
    #[error("Settings file {}: {source}", .path.display())]
    Settings {
        /// Settings file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// PDF structure could not be built or modified.
    #[error("Combine operation failed: {reason}")]
    CombineFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// An external editor could not be started.
    #[error("Cannot launch {}: {source}", .executable.display())]
    LaunchFailed {
        /// Executable that failed to start.
        executable: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The operation was cancelled before completion.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CombineError {
    /// Create a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a SourceRead error.
    pub fn source_read(path: impl Into<PathBuf>, problem: SourceProblem) -> Self {
        Self::SourceRead {
            path: path.into(),
            problem,
        }
    }

    /// Create a DestinationWrite error.
    pub fn destination_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DestinationWrite {
            path: path.into(),
            source,
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create a CombineFailed error.
    pub fn combine_failed(reason: impl Into<String>) -> Self {
        Self::CombineFailed {
            reason: reason.into(),
        }
    }

    /// Check if this error only affects one source.
    ///
    /// The compiler records recoverable errors and keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceRead { .. })
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 1,
            Self::SourceRead { problem, .. } => match problem {
                SourceProblem::NotFound => 2,
                _ => 3,
            },
            Self::OutputExists { .. } => 4,
            Self::DestinationWrite { .. } => 5,
            Self::Io(_) => 5,
            Self::EmptyResult { .. } => 6,
            Self::CombineFailed { .. } => 6,
            Self::Settings { .. } => 1,
            Self::LaunchFailed { .. } => 7,
            Self::Cancelled => 130, // Standard exit code for SIGINT
        }
    }
}

impl From<lopdf::Error> for CombineError {
    fn from(err: lopdf::Error) -> Self {
        Self::combine_failed(err.to_string())
    }
}
