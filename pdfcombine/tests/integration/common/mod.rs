//! Shared helpers for the integration tests.
//!
//! Fixtures are generated on the fly: PDFs with lopdf, PNGs with image.
//! Every PDF page gets a distinctive MediaBox so that the combined output
//! can be checked page by page.

#![allow(dead_code)]

use lopdf::{Document, Object, dictionary};
use pdfcombine::config::{Config, OverwriteMode};
use std::path::{Path, PathBuf};

/// Write a PDF whose pages are `width` wide and `700 + index` high.
pub fn write_pdf(dir: &Path, name: &str, pages: usize, width: i64) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|index| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), (700 + index as i64).into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("Failed to write PDF fixture");
    path
}

/// Write a `width` x `height` PNG, with a half-transparent alpha channel
/// when `alpha` is set.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, alpha: bool) -> PathBuf {
    let path = dir.join(name);
    if alpha {
        image::RgbaImage::from_pixel(width, height, image::Rgba([10, 120, 200, 128]))
            .save(&path)
            .expect("Failed to write PNG fixture");
    } else {
        image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]))
            .save(&path)
            .expect("Failed to write PNG fixture");
    }
    path
}

/// Write a file with a `.pdf` extension that is not a PDF.
pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"this is not a pdf at all").expect("Failed to write fixture");
    path
}

/// Compile configuration writing to `output`, overwriting freely.
pub fn config(output: impl Into<PathBuf>) -> Config {
    let mut config = Config::new(output);
    config.overwrite_mode = OverwriteMode::Force;
    config.quiet = true;
    config
}

fn number(obj: &Object) -> i64 {
    match obj {
        Object::Integer(i) => *i,
        Object::Real(r) => *r as i64,
        other => panic!("MediaBox entry is not a number: {other:?}"),
    }
}

/// `(width, height)` of every page of the PDF at `path`, in page order.
pub fn page_sizes(path: &Path) -> Vec<(i64, i64)> {
    let doc = Document::load(path).expect("Failed to load output");
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).expect("Page is not a dictionary");
            let media_box = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("Page has no MediaBox");
            (number(&media_box[2]), number(&media_box[3]))
        })
        .collect()
}

/// Names of the files left in `dir`.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|e| e.expect("Bad dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
