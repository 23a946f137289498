//! CLI argument parsing for pdfcombine.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Settings file: {:?}", cli.config);
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pdfcombine::config::{CompressionLevel, Config, Metadata, OverwriteMode};
use pdfcombine::entry::SelectionMode;
use pdfcombine::error::{CombineError, Result};

/// Directory created inside the working directory for compiled output.
pub const DEFAULT_OUTPUT_DIR: &str = "Combined_Output";

/// File name used when no output is given.
pub const DEFAULT_OUTPUT_NAME: &str = "Combined_Document.pdf";

/// Order, select and combine PDF and PNG files into a single PDF.
///
/// pdfcombine works on a working directory of PDF and PNG files: list it
/// ranked by filename keywords, import files into it, and combine any
/// ordered selection of them into one document. PNG files become one
/// full page each.
#[derive(Parser, Debug)]
#[command(name = "pdfcombine")]
#[command(version)]
#[command(about = "Order, select and combine PDF and PNG files into a single PDF", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE", env = "PDFCOMBINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output - show per-file details and statistics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the PDF and PNG files of the working directory, ranked
    List(ListArgs),

    /// Combine files into one PDF
    ///
    /// Sources come from, in order of precedence: a plan file, the FILE
    /// arguments, or the whole working directory listing.
    ///
    /// Examples:
    ///   pdfcombine compile plan.pdf photo.png -o pack.pdf
    ///   pdfcombine compile --plan plan.json --selected-only
    ///   pdfcombine compile --dir ./job-42
    Compile(CompileArgs),

    /// Copy PDF and PNG files into the working directory
    Import(ImportArgs),

    /// Convert a PNG into a one-page PDF, or page 1 of a PDF into a PNG
    ///
    /// The result is written next to the input with the other extension.
    /// Rendering PDFs needs a build with the `pdfium` feature.
    Convert(ConvertArgs),

    /// Blend two images (or the first pages of PDFs) into one image
    ///
    /// The layer is resized to the base image when their sizes differ.
    ///
    /// Examples:
    ///   pdfcombine blend plan.png overlay.png --mode multiply -o out.png
    ///   pdfcombine blend site.pdf stamp.png -o stamped.jpg
    Blend(BlendArgs),

    /// Open files in an external editor
    Open(OpenArgs),

    /// Show or change settings
    Settings {
        /// Settings action
        #[command(subcommand)]
        action: SettingsAction,
    },
}

/// Arguments of `list`.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Directory to list instead of the configured working directory
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Print the listing as a JSON plan that `compile --plan` accepts
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Files to combine, in order (glob patterns allowed)
    #[arg(value_name = "FILE", conflicts_with = "plan")]
    pub files: Vec<String>,

    /// JSON plan: an array of {"path", "order"?, "selected"?}
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Working directory to use instead of the configured one
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only combine entries marked as selected in the plan
    #[arg(short, long, requires = "plan")]
    pub selected_only: bool,

    /// Output PDF file path
    ///
    /// Defaults to Combined_Output/Combined_Document.pdf inside the
    /// working directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Dry run - check sources and destination without writing output
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress content streams (default)
    /// - maximum: Also drop unreferenced objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Open the result in an editor (in addition to the settings toggles)
    #[arg(long, value_name = "EDITOR")]
    #[arg(value_parser = ["inkscape", "libreoffice"])]
    pub open_with: Vec<String>,
}

/// Arguments of `import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Files to import (glob patterns allowed)
    ///
    /// Defaults to every PDF and PNG file in the configured source directory.
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    /// Working directory to import into instead of the configured one
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Replace files that already exist in the working directory
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments of `convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// PNG or PDF file to convert
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Replace an existing file of the same name
    #[arg(short, long)]
    pub force: bool,

    /// Delete the input afterwards (also enabled by the delete_originals setting)
    #[arg(long)]
    pub delete_original: bool,
}

/// Arguments for the blend command
#[derive(Args, Debug)]
pub struct BlendArgs {
    /// Base image or PDF
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    /// Image or PDF laid over the base
    #[arg(value_name = "LAYER")]
    pub layer: PathBuf,

    /// Blend mode
    #[arg(
        short,
        long,
        default_value = "normal",
        value_parser = [
            "normal", "add", "subtract", "multiply", "screen",
            "lighten", "darken", "difference", "overlay",
        ],
        ignore_case = true
    )]
    pub mode: String,

    /// Output image (.png or .jpg)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Replace an existing output file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments of `open`.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Editor to use
    #[arg(short, long = "with", value_name = "EDITOR")]
    #[arg(value_parser = ["inkscape", "gimp", "libreoffice"])]
    pub editor: String,

    /// Files to open
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Settings actions.
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print all settings
    Show,
    /// Print one setting
    Get {
        /// Settings key
        key: String,
    },
    /// Change one setting and save
    ///
    /// Examples:
    ///   pdfcombine settings set working_dir ~/jobs/current
    ///   pdfcombine settings set ordering_keywords '{"cover": 1, "plan": 2}'
    Set {
        /// Settings key
        key: String,
        /// New value (an empty string clears a path)
        value: String,
    },
    /// Print the settings file location
    Path,
}

/// Default output path inside a working directory.
pub fn default_output(working_dir: &Path) -> PathBuf {
    working_dir.join(DEFAULT_OUTPUT_DIR).join(DEFAULT_OUTPUT_NAME)
}

impl CompileArgs {
    /// Overwrite mode selected by `--force` / `--no-clobber`.
    pub fn overwrite_mode(&self) -> OverwriteMode {
        if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        }
    }

    /// Which entries take part.
    pub fn selection_mode(&self) -> SelectionMode {
        if self.selected_only {
            SelectionMode::Selected
        } else {
            SelectionMode::All
        }
    }

    /// Convert the arguments into a validated Config.
    ///
    /// `working_dir` supplies the default output location when `--output`
    /// is not given.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level is invalid
    /// - No output is given and there is no working directory
    /// - Configuration validation fails
    pub fn to_config(&self, working_dir: Option<&Path>, verbose: bool, quiet: bool) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let output = match (&self.output, working_dir) {
            (Some(output), _) => output.clone(),
            (None, Some(dir)) => default_output(dir),
            (None, None) => {
                return Err(CombineError::configuration(
                    "No output file specified and no working directory configured (use -o)",
                ));
            }
        };

        let metadata = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );

        let config = Config {
            output,
            mode: self.selection_mode(),
            dry_run: self.dry_run,
            verbose,
            quiet,
            overwrite_mode: self.overwrite_mode(),
            compression,
            metadata,
        };

        config.validate()?;
        Ok(config)
    }
}
