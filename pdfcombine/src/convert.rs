//! Single-file conversion and cleanup of originals.
//!
//! A PNG becomes a one-page PDF next to it, built exactly like a PNG page
//! in a compile and written through the same atomic writer. The other
//! direction renders page 1 of a PDF into a PNG, which needs the `pdfium`
//! feature; without it the PDF is reported with
//! [`SourceProblem::RenderUnavailable`].
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::convert::{convert_png_to_pdf, remove_sources};
//! use std::path::Path;
//!
//! # fn example() -> pdfcombine::Result<()> {
//! let png = Path::new("work/site_photo.png");
//! let stats = convert_png_to_pdf(png, false)?;
//! println!("Wrote {}", stats.output_path.display());
//!
//! for (path, err) in remove_sources([png]) {
//!     eprintln!("could not delete {}: {err}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::config::{Metadata, OverwriteMode};
use crate::entry::FileKind;
use crate::error::{CombineError, Result, SourceProblem};
use crate::io::{PdfWriter, PendingOutput, WriteStatistics, png_page_document};
use crate::merge::MetadataManager;

/// Where the PDF converted from `png` is written: same directory and stem.
pub fn converted_path(png: &Path) -> PathBuf {
    png.with_extension("pdf")
}

/// Where the PNG rendered from `pdf` is written: same directory and stem.
pub fn rendered_path(pdf: &Path) -> PathBuf {
    pdf.with_extension("png")
}

fn overwrite_mode(overwrite: bool) -> OverwriteMode {
    if overwrite {
        OverwriteMode::Force
    } else {
        OverwriteMode::NoClobber
    }
}

/// Convert a PNG into a one-page PDF written as `<stem>.pdf` next to it.
///
/// # Errors
///
/// - `SourceRead` if `png` is missing, not a `.png` file or cannot be decoded
/// - `OutputExists` if the PDF exists and `overwrite` is false
/// - `DestinationWrite` if the PDF cannot be written
pub fn convert_png_to_pdf(png: &Path, overwrite: bool) -> Result<WriteStatistics> {
    if FileKind::from_path(png) != FileKind::Png {
        return Err(CombineError::source_read(png, SourceProblem::Unsupported));
    }
    if !png.is_file() {
        return Err(CombineError::source_read(png, SourceProblem::NotFound));
    }

    let output = converted_path(png);
    let pending = PdfWriter::new().prepare(&output, overwrite_mode(overwrite))?;

    let mut doc = png_page_document(png)?;
    MetadataManager::new().set_metadata(&mut doc, &Metadata::default());

    let stats = pending.commit(&mut doc)?;
    log::info!("Converted {} to {}", png.display(), output.display());

    Ok(stats)
}

/// Render page 1 of a PDF into a PNG written as `<stem>.png` next to it.
///
/// The image has one pixel per point of the page.
///
/// # Errors
///
/// - `SourceRead` if `pdf` is missing, not a `.pdf` file, has no pages or
///   cannot be rendered (including [`SourceProblem::RenderUnavailable`])
/// - `OutputExists` if the PNG exists and `overwrite` is false
/// - `DestinationWrite` if the PNG cannot be written
pub fn convert_pdf_to_png(pdf: &Path, overwrite: bool) -> Result<WriteStatistics> {
    if FileKind::from_path(pdf) != FileKind::Pdf {
        return Err(CombineError::source_read(pdf, SourceProblem::Unsupported));
    }
    if !pdf.is_file() {
        return Err(CombineError::source_read(pdf, SourceProblem::NotFound));
    }

    let output = rendered_path(pdf);
    let pending = PdfWriter::new().prepare(&output, overwrite_mode(overwrite))?;

    let stats = write_first_page(pdf, pending)?;
    log::info!("Rendered {} to {}", pdf.display(), output.display());

    Ok(stats)
}

#[cfg(feature = "png")]
fn write_first_page(pdf: &Path, pending: PendingOutput) -> Result<WriteStatistics> {
    let page = crate::io::render::render_first_page(pdf)?;
    pending.commit_with(|w| {
        page.write_to(w, image::ImageFormat::Png)
            .map_err(io::Error::other)
    })
}

#[cfg(not(feature = "png"))]
fn write_first_page(pdf: &Path, _pending: PendingOutput) -> Result<WriteStatistics> {
    Err(CombineError::source_read(
        pdf,
        SourceProblem::RenderUnavailable("built without image support".to_string()),
    ))
}

/// Delete the given files.
///
/// Every path is attempted; the ones that could not be removed are
/// returned with their error.
pub fn remove_sources<I, P>(paths: I) -> Vec<(PathBuf, io::Error)>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut failures = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Deleted {}", path.display()),
            Err(err) => {
                log::warn!("Could not delete {}: {err}", path.display());
                failures.push((path.to_path_buf(), err));
            }
        }
    }

    failures
}
