//! Blending two images into one.
//!
//! The layer is resized to the base with a Lanczos filter when their sizes
//! differ, then combined pixel by pixel. `Normal` composites the layer over
//! the base using both alpha channels; `Overlay` works on RGB and produces
//! an opaque image; every other mode applies its channel operation to all
//! four channels, alpha included.
//!
//! A PDF input contributes its first page, rendered at 72 dpi (needs the
//! `pdfium` feature).
//!
//! # Examples
//!
//! ```no_run
//! use pdfcombine::blend::{BlendMode, blend_files};
//! use pdfcombine::config::OverwriteMode;
//! use std::path::Path;
//!
//! # fn example() -> pdfcombine::Result<()> {
//! blend_files(
//!     Path::new("site_plan.png"),
//!     Path::new("markup.png"),
//!     BlendMode::Multiply,
//!     Path::new("marked_up_plan.png"),
//!     OverwriteMode::NoClobber,
//! )?;
//! # Ok(())
//! # }
//! ```

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageFormat, Rgba, RgbaImage};
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::config::OverwriteMode;
use crate::entry::FileKind;
use crate::error::{CombineError, Result, SourceProblem};
use crate::io::render::render_first_page;
use crate::io::{PdfWriter, WriteStatistics};

/// How the layer is combined with the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Layer composited over the base.
    #[default]
    Normal,
    /// Channel sum, saturating at white.
    Add,
    /// Base minus layer, saturating at black.
    Subtract,
    /// Channel product; darkens.
    Multiply,
    /// Inverse product of the inverses; lightens.
    Screen,
    /// Per-channel maximum.
    Lighten,
    /// Per-channel minimum.
    Darken,
    /// Absolute channel difference.
    Difference,
    /// Multiply in the base's shadows, screen in its highlights.
    Overlay,
}

impl BlendMode {
    /// Every mode, in menu order.
    pub const ALL: [BlendMode; 9] = [
        Self::Normal,
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Screen,
        Self::Lighten,
        Self::Darken,
        Self::Difference,
        Self::Overlay,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Lighten => "lighten",
            Self::Darken => "darken",
            Self::Difference => "difference",
            Self::Overlay => "overlay",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = CombineError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                CombineError::configuration(format!(
                    "Unknown blend mode '{s}' (expected one of: {})",
                    names.join(", ")
                ))
            })
    }
}

/// Blend `layer` onto `base`. The result has the base's size.
pub fn blend(base: &RgbaImage, layer: &RgbaImage, mode: BlendMode) -> RgbaImage {
    let resized;
    let layer = if layer.dimensions() == base.dimensions() {
        layer
    } else {
        log::debug!(
            "Resizing layer from {:?} to {:?}",
            layer.dimensions(),
            base.dimensions()
        );
        resized = imageops::resize(layer, base.width(), base.height(), FilterType::Lanczos3);
        &resized
    };

    let mut out = RgbaImage::new(base.width(), base.height());
    for ((px, b), l) in out.pixels_mut().zip(base.pixels()).zip(layer.pixels()) {
        *px = blend_pixel(*b, *l, mode);
    }
    out
}

fn blend_pixel(base: Rgba<u8>, layer: Rgba<u8>, mode: BlendMode) -> Rgba<u8> {
    let op: fn(u8, u8) -> u8 = match mode {
        BlendMode::Normal => return composite_over(base, layer),
        BlendMode::Overlay => {
            return Rgba([
                overlay_channel(base[0], layer[0]),
                overlay_channel(base[1], layer[1]),
                overlay_channel(base[2], layer[2]),
                u8::MAX,
            ]);
        }
        BlendMode::Add => |a: u8, b: u8| a.saturating_add(b),
        BlendMode::Subtract => |a: u8, b: u8| a.saturating_sub(b),
        BlendMode::Multiply => |a: u8, b: u8| (u16::from(a) * u16::from(b) / 255) as u8,
        BlendMode::Screen => {
            |a: u8, b: u8| 255 - ((255 - u16::from(a)) * (255 - u16::from(b)) / 255) as u8
        }
        BlendMode::Lighten => |a: u8, b: u8| a.max(b),
        BlendMode::Darken => |a: u8, b: u8| a.min(b),
        BlendMode::Difference => |a: u8, b: u8| a.abs_diff(b),
    };

    Rgba([
        op(base[0], layer[0]),
        op(base[1], layer[1]),
        op(base[2], layer[2]),
        op(base[3], layer[3]),
    ])
}

fn composite_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let value = (f32::from(src[i]) * src_a + f32::from(dst[i]) * dst_a * (1.0 - src_a)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}

fn overlay_channel(base: u8, layer: u8) -> u8 {
    let b = f32::from(base) / 255.0;
    let l = f32::from(layer) / 255.0;
    let value = if b < 0.5 {
        2.0 * b * l
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - l)
    };
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// Load an input as RGBA: page 1 of a PDF, or any PNG/JPEG image.
///
/// # Errors
///
/// Returns a `SourceRead` error if the file is missing, of an unsupported
/// type, cannot be decoded, or is a PDF that cannot be rendered.
pub fn load_layer(path: &Path) -> Result<RgbaImage> {
    if FileKind::from_path(path) == FileKind::Pdf {
        return render_first_page(path);
    }
    if !path.is_file() {
        return Err(CombineError::source_read(path, SourceProblem::NotFound));
    }

    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| {
            let problem = match e {
                ImageError::Unsupported(_) => SourceProblem::Unsupported,
                ImageError::IoError(err) => SourceProblem::Io(err.to_string()),
                other => SourceProblem::Corrupt(other.to_string()),
            };
            CombineError::source_read(path, problem)
        })
}

fn output_format(output: &Path) -> Result<ImageFormat> {
    match ImageFormat::from_path(output) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => Ok(format),
        _ => Err(CombineError::configuration(format!(
            "Cannot save an image as {} (expected .png, .jpg or .jpeg)",
            output.display()
        ))),
    }
}

/// Save `img` atomically as PNG or JPEG, chosen by the extension of
/// `output`. JPEG output drops the alpha channel.
///
/// # Errors
///
/// Returns a configuration error for other extensions, and the writer's
/// errors (`OutputExists`, `DestinationWrite`) otherwise.
pub fn save_image(img: &RgbaImage, output: &Path, overwrite: OverwriteMode) -> Result<WriteStatistics> {
    let format = output_format(output)?;
    let pending = PdfWriter::new().prepare(output, overwrite)?;

    pending.commit_with(|w| {
        let written = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgba8(img.clone()).to_rgb8().write_to(w, format)
        } else {
            img.write_to(w, format)
        };
        written.map_err(io::Error::other)
    })
}

/// Blend the files `base` and `layer` with `mode` and save the result to
/// `output`.
///
/// The destination is checked before either input is read.
///
/// # Errors
///
/// See [`load_layer`] and [`save_image`].
pub fn blend_files(
    base: &Path,
    layer: &Path,
    mode: BlendMode,
    output: &Path,
    overwrite: OverwriteMode,
) -> Result<WriteStatistics> {
    output_format(output)?;
    PdfWriter::new().check(output, overwrite)?;

    let base_img = load_layer(base)?;
    let layer_img = load_layer(layer)?;
    let blended = blend(&base_img, &layer_img, mode);

    let stats = save_image(&blended, output, overwrite)?;
    log::info!(
        "Blended {} and {} ({mode}) into {}",
        base.display(),
        layer.display(),
        output.display()
    );
    Ok(stats)
}
