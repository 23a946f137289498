//! Rasterising the first page of a PDF.
//!
//! Rendering goes through pdfium (the `pdfium` feature). The library is
//! bound once per process, looked up in this order:
//!
//! 1. the path in `PDFCOMBINE_PDFIUM_LIB_PATH`
//! 2. the platform library name in the current directory
//! 3. the system library
//!
//! Pages are rendered at 72 dpi, so one point becomes one pixel; this is
//! the inverse of how PNG sources are laid out as pages.

use image::RgbaImage;
use std::path::Path;

use crate::error::{CombineError, Result, SourceProblem};

/// Whether this build can render PDF pages.
pub const PDF_RENDER_SUPPORTED: bool = cfg!(feature = "pdfium");

/// Environment variable naming the pdfium library to bind.
pub const PDFIUM_LIB_ENV: &str = "PDFCOMBINE_PDFIUM_LIB_PATH";

/// Render page 1 of the PDF at `path` as an RGBA image.
///
/// # Errors
///
/// Returns a `SourceRead` error if the file is missing, cannot be opened,
/// has no pages, or pdfium is unavailable
/// ([`SourceProblem::RenderUnavailable`]).
#[cfg(feature = "pdfium")]
pub fn render_first_page(path: &Path) -> Result<RgbaImage> {
    use pdfium_render::prelude::{PdfBitmapFormat, PdfRenderConfig};

    if !path.is_file() {
        return Err(CombineError::source_read(path, SourceProblem::NotFound));
    }

    let pdfium = pdfium()
        .map_err(|reason| CombineError::source_read(path, SourceProblem::RenderUnavailable(reason)))?;
    let corrupt = |e: pdfium_render::prelude::PdfiumError| {
        CombineError::source_read(path, SourceProblem::Corrupt(e.to_string()))
    };

    let document = pdfium.load_pdf_from_file(path, None).map_err(corrupt)?;
    let pages = document.pages();
    if pages.len() == 0 {
        return Err(CombineError::source_read(path, SourceProblem::Empty));
    }
    let page = pages.get(0).map_err(corrupt)?;

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(1.0)
        .render_form_data(false)
        .set_reverse_byte_order(false)
        .set_format(PdfBitmapFormat::BGRA);
    let bitmap = page.render_with_config(&render_config).map_err(corrupt)?;

    let width = bitmap.width().max(0) as u32;
    let height = bitmap.height().max(0) as u32;
    let raw = bitmap.as_raw_bytes();

    log::debug!("Rendered page 1 of {} at {width}x{height}", path.display());
    bgra_to_rgba(width, height, &raw).ok_or_else(|| {
        CombineError::source_read(
            path,
            SourceProblem::Corrupt(format!("unexpected bitmap size for {width}x{height}")),
        )
    })
}

/// PDF rendering is compiled out; every request is reported as unavailable.
///
/// # Errors
///
/// Returns `NotFound` for a missing file, otherwise always
/// [`SourceProblem::RenderUnavailable`].
#[cfg(not(feature = "pdfium"))]
pub fn render_first_page(path: &Path) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(CombineError::source_read(path, SourceProblem::NotFound));
    }
    Err(CombineError::source_read(
        path,
        SourceProblem::RenderUnavailable("built without the pdfium feature".to_string()),
    ))
}

#[cfg(feature = "pdfium")]
fn pdfium() -> std::result::Result<&'static pdfium_render::prelude::Pdfium, String> {
    use std::sync::OnceLock;

    static PDFIUM: OnceLock<std::result::Result<pdfium_render::prelude::Pdfium, String>> =
        OnceLock::new();
    PDFIUM.get_or_init(bind_pdfium).as_ref().map_err(Clone::clone)
}

#[cfg(feature = "pdfium")]
fn bind_pdfium() -> std::result::Result<pdfium_render::prelude::Pdfium, String> {
    use pdfium_render::prelude::Pdfium;

    let bindings = match std::env::var_os(PDFIUM_LIB_ENV) {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            Pdfium::bind_to_library(&path)
                .map_err(|e| format!("{e} (from {PDFIUM_LIB_ENV}={})", path.display()))?
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| format!("{e} (set {PDFIUM_LIB_ENV} to the pdfium library)"))?,
    };

    log::debug!("Bound pdfium library");
    Ok(Pdfium::new(bindings))
}

/// Convert a BGRA bitmap with arbitrary row stride into an RGBA image.
///
/// Returns `None` if `raw` is too short for `width` x `height` pixels.
pub fn bgra_to_rgba(width: u32, height: u32, raw: &[u8]) -> Option<RgbaImage> {
    let row_len = width as usize * 4;
    if height == 0 || width == 0 {
        return RgbaImage::from_raw(width, height, Vec::new());
    }

    let stride = raw.len() / height as usize;
    if stride < row_len {
        return None;
    }

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in raw.chunks(stride).take(height as usize) {
        for bgra in row[..row_len].chunks_exact(4) {
            pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
        }
    }

    RgbaImage::from_raw(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_to_rgba_swaps_channels() {
        let raw = [1, 2, 3, 4, 10, 20, 30, 40];
        let img = bgra_to_rgba(2, 1, &raw).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [3, 2, 1, 4]);
        assert_eq!(img.get_pixel(1, 0).0, [30, 20, 10, 40]);
    }

    #[test]
    fn test_bgra_to_rgba_skips_row_padding() {
        // One pixel per row, rows padded to 8 bytes
        let raw = [1, 2, 3, 255, 0, 0, 0, 0, 5, 6, 7, 128, 0, 0, 0, 0];
        let img = bgra_to_rgba(1, 2, &raw).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [3, 2, 1, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [7, 6, 5, 128]);
    }

    #[test]
    fn test_bgra_to_rgba_rejects_short_buffer() {
        assert!(bgra_to_rgba(4, 2, &[0; 16]).is_none());
    }

    #[test]
    fn test_render_missing_file() {
        let err = render_first_page(Path::new("/no/such/plan.pdf")).unwrap_err();
        assert!(matches!(
            err,
            CombineError::SourceRead {
                problem: SourceProblem::NotFound,
                ..
            }
        ));
    }

    #[cfg(not(feature = "pdfium"))]
    #[test]
    fn test_render_without_pdfium_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let pdf = dir.path().join("plan.pdf");
        std::fs::write(&pdf, b"%PDF-1.5").unwrap();

        let err = render_first_page(&pdf).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            CombineError::SourceRead {
                problem: SourceProblem::RenderUnavailable(_),
                ..
            }
        ));
    }
}
