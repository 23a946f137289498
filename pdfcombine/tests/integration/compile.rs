//! Integration tests for combining sources.

use lopdf::Document;
use pdfcombine::config::{CompressionLevel, Metadata};
use pdfcombine::entry::{CompilationRequest, FileEntry, FileKind, SelectionMode};
use pdfcombine::merge::{self, Compiler, MetadataManager, SourceProgress, SourceStatus};
use rstest::rstest;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::common::{config, page_sizes, write_pdf};

#[test]
fn test_page_count_is_sum_of_sources() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let b = write_pdf(dir.path(), "b.pdf", 3, 400);
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile(&CompilationRequest::from_paths([a, b]), config(&output), None)
        .unwrap();

    assert!(outcome.written);
    assert!(outcome.is_complete());
    assert_eq!(outcome.document.page_count, 5);
    assert_eq!(outcome.document.path, output);
    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.succeeded[1].pages, 3);
    assert_eq!(page_sizes(&output).len(), 5);
}

#[test]
fn test_pages_follow_entry_and_internal_order() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let b = write_pdf(dir.path(), "b.pdf", 3, 400);
    let output = dir.path().join("combined.pdf");

    merge::compile(&CompilationRequest::from_paths([a, b]), config(&output), None).unwrap();

    assert_eq!(
        page_sizes(&output),
        [(300, 700), (300, 701), (400, 700), (400, 701), (400, 702)]
    );
}

#[test]
fn test_swapping_orders_swaps_page_blocks() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let b = write_pdf(dir.path(), "b.pdf", 2, 400);
    let output = dir.path().join("combined.pdf");

    let entries = vec![FileEntry::from_path(&a, 2), FileEntry::from_path(&b, 1)];
    merge::compile(
        &CompilationRequest::new(entries, SelectionMode::All),
        config(&output),
        None,
    )
    .unwrap();
    assert_eq!(page_sizes(&output), [(400, 700), (400, 701), (300, 700)]);

    let entries = vec![FileEntry::from_path(&a, 1), FileEntry::from_path(&b, 2)];
    merge::compile(
        &CompilationRequest::new(entries, SelectionMode::All),
        config(&output),
        None,
    )
    .unwrap();
    assert_eq!(page_sizes(&output), [(300, 700), (400, 700), (400, 701)]);
}

#[test]
fn test_equal_orders_keep_listing_position() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let b = write_pdf(dir.path(), "b.pdf", 1, 400);
    let c = write_pdf(dir.path(), "c.pdf", 1, 500);
    let output = dir.path().join("combined.pdf");

    let entries = vec![
        FileEntry::from_path(&b, 5),
        FileEntry::from_path(&c, 1),
        FileEntry::from_path(&a, 5),
    ];
    merge::compile(
        &CompilationRequest::new(entries, SelectionMode::All),
        config(&output),
        None,
    )
    .unwrap();

    let widths: Vec<i64> = page_sizes(&output).into_iter().map(|(w, _)| w).collect();
    assert_eq!(widths, [500, 400, 300]);
}

#[test]
fn test_selected_mode_skips_unselected_entries() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let b = write_pdf(dir.path(), "b.pdf", 2, 400);
    let c = write_pdf(dir.path(), "c.pdf", 1, 500);
    let output = dir.path().join("combined.pdf");

    let entries = vec![
        FileEntry::from_path(&a, 1).with_selected(true),
        FileEntry::from_path(&b, 2),
        FileEntry::from_path(&c, 3).with_selected(true),
    ];
    let mut config = config(&output);
    config.mode = SelectionMode::Selected;

    let request = CompilationRequest::new(entries, config.mode);
    let outcome = merge::compile(&request, config, None).unwrap();

    assert_eq!(outcome.document.page_count, 2);
    assert_eq!(page_sizes(&output), [(300, 700), (500, 700)]);
}

#[cfg(feature = "png")]
#[test]
fn test_png_adds_one_page_of_its_pixel_size() {
    use crate::common::write_png;

    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let png = write_png(dir.path(), "photo.png", 120, 80, false);
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile(&CompilationRequest::from_paths([png, a]), config(&output), None)
        .unwrap();

    assert_eq!(outcome.document.page_count, 3);
    assert_eq!(outcome.succeeded[0].kind, FileKind::Png);
    assert_eq!(outcome.succeeded[0].pages, 1);
    assert_eq!(page_sizes(&output), [(120, 80), (300, 700), (300, 701)]);
}

#[cfg(feature = "png")]
#[test]
fn test_png_alpha_is_kept_as_soft_mask() {
    use crate::common::write_png;
    use lopdf::Object;

    let dir = TempDir::new().unwrap();
    let png = write_png(dir.path(), "overlay.png", 16, 16, true);
    let output = dir.path().join("combined.pdf");

    merge::compile(&CompilationRequest::from_paths([png]), config(&output), None).unwrap();

    let doc = Document::load(&output).unwrap();
    let has_smask = doc.objects.values().any(|obj| {
        matches!(obj, Object::Stream(stream) if stream.dict.has(b"SMask"))
    });
    assert!(has_smask);
}

#[cfg(not(feature = "png"))]
#[test]
fn test_png_without_support_is_a_warning() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let png = dir.path().join("photo.png");
    std::fs::write(&png, b"not decoded anyway").unwrap();
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile(&CompilationRequest::from_paths([a, png]), config(&output), None)
        .unwrap();

    assert_eq!(outcome.document.page_count, 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.warnings.len(), 1);
}

#[test]
fn test_missing_output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let output = dir
        .path()
        .join("Combined_Output")
        .join("nested")
        .join("Combined_Document.pdf");

    merge::compile(&CompilationRequest::from_paths([a]), config(&output), None).unwrap();

    assert!(output.is_file());
}

#[test]
fn test_metadata_is_written() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let output = dir.path().join("combined.pdf");

    let mut config = config(&output);
    config.metadata = Metadata::new(
        Some("Job 42".to_string()),
        Some("Site office".to_string()),
        None,
        None,
    );
    merge::compile(&CompilationRequest::from_paths([a]), config, None).unwrap();

    let doc = Document::load(&output).unwrap();
    let manager = MetadataManager::new();
    let metadata = manager.get_metadata(&doc);
    assert_eq!(metadata.title.as_deref(), Some("Job 42"));
    assert_eq!(metadata.author.as_deref(), Some("Site office"));
    assert_eq!(manager.get_producer(&doc).as_deref(), Some("pdfcombine"));
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
fn test_compression_levels_keep_pages(#[case] level: CompressionLevel) {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let b = write_pdf(dir.path(), "b.pdf", 1, 400);
    let output = dir.path().join("combined.pdf");

    let mut config = config(&output);
    config.compression = level;
    merge::compile(&CompilationRequest::from_paths([a, b]), config, None).unwrap();

    assert_eq!(page_sizes(&output), [(300, 700), (300, 701), (400, 700)]);
}

#[test]
fn test_progress_reports_every_source() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let missing = dir.path().join("missing.pdf");
    let output = dir.path().join("combined.pdf");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let seen = Arc::clone(&seen);
        move |p: &SourceProgress<'_>| {
            seen.lock().unwrap().push((p.index, p.total, p.status.clone()));
        }
    };

    Compiler::new(config(&output))
        .with_progress(Arc::new(recorder))
        .compile(&CompilationRequest::from_paths([a, missing]))
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], (0, 2, SourceStatus::Appended { pages: 2 }));
    assert!(matches!(seen[1], (1, 2, SourceStatus::Skipped { .. })));
}

#[tokio::test]
async fn test_compile_async() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let b = write_pdf(dir.path(), "b.pdf", 1, 400);
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile_async(
        CompilationRequest::from_paths([a, b]),
        config(&output),
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome.document.page_count, 3);
    assert!(output.is_file());
}
