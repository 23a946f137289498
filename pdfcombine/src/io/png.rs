//! PNG sources as single-page PDF documents.
//!
//! The page is the image's pixel size in points (72 dpi), with the image
//! drawn over the whole page. Alpha is kept through a soft mask.

use lopdf::Document;
use std::path::Path;

use crate::error::{CombineError, Result, SourceProblem};

/// Whether this build can turn PNG files into pages.
pub const PNG_SUPPORTED: bool = cfg!(feature = "png");

/// Build a one-page document showing the PNG at `path`.
///
/// # Errors
///
/// Returns a `SourceRead` error if the file cannot be read or decoded, or
/// with [`SourceProblem::PngUnsupported`] when the `png` feature is off.
#[cfg(feature = "png")]
pub fn png_page_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)
        .map_err(|e| CombineError::source_read(path, SourceProblem::Io(e.to_string())))?;
    png_bytes_to_document(&bytes)
        .map_err(|problem| CombineError::source_read(path, problem))
}

/// PNG support is compiled out; every PNG is reported as unsupported.
///
/// # Errors
///
/// Always returns a `SourceRead` error with [`SourceProblem::PngUnsupported`].
#[cfg(not(feature = "png"))]
pub fn png_page_document(path: &Path) -> Result<Document> {
    Err(CombineError::source_read(path, SourceProblem::PngUnsupported))
}

#[cfg(feature = "png")]
fn png_bytes_to_document(bytes: &[u8]) -> std::result::Result<Document, SourceProblem> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| SourceProblem::Corrupt(e.to_string()))?;

    let (width, height) = (img.width() as i64, img.height() as i64);
    if width == 0 || height == 0 {
        return Err(SourceProblem::Empty);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if img.color().has_alpha() {
        let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let smask = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let smask_id = doc.add_object(Stream::new(smask, deflate(&alpha)?).with_compression(false));
        image_dict.set("SMask", smask_id);
    }

    let rgb = img.to_rgb8().into_raw();
    let image_id = doc.add_object(Stream::new(image_dict, deflate(&rgb)?).with_compression(false));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| SourceProblem::Corrupt(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

#[cfg(feature = "png")]
fn deflate(data: &[u8]) -> std::result::Result<Vec<u8>, SourceProblem> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| SourceProblem::Io(e.to_string()))
}
