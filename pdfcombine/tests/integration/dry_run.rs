//! Integration tests for dry-run functionality.

use pdfcombine::config::OverwriteMode;
use pdfcombine::entry::CompilationRequest;
use pdfcombine::error::CombineError;
use pdfcombine::merge;
use tempfile::TempDir;

use crate::common::{config, dir_entries, write_corrupt, write_pdf};

#[test]
fn test_dry_run_does_not_create_output() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 2, 300);
    let b = write_pdf(dir.path(), "b.pdf", 1, 400);
    let output = dir.path().join("Combined_Output").join("combined.pdf");

    let mut config = config(&output);
    config.dry_run = true;

    let outcome = merge::compile(&CompilationRequest::from_paths([a, b]), config, None).unwrap();

    assert!(!outcome.written);
    assert_eq!(outcome.document.page_count, 3);
    assert_eq!(outcome.statistics.output_size, 0);
    assert!(!output.exists(), "Output file should not be created in dry run");
    assert!(!output.parent().unwrap().exists(), "Dry run should not create directories");
}

#[test]
fn test_dry_run_reports_failures() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let bad = write_corrupt(dir.path(), "bad.pdf");
    let gone = dir.path().join("gone.pdf");
    let output = dir.path().join("combined.pdf");

    let mut config = config(&output);
    config.dry_run = true;

    let outcome = merge::compile(
        &CompilationRequest::from_paths([a, bad, gone]),
        config,
        None,
    )
    .unwrap();

    assert_eq!(outcome.succeeded.len(), 1);
    assert_eq!(outcome.failed.len(), 2);
    assert_eq!(dir_entries(dir.path()), ["a.pdf", "bad.pdf"]);
}

#[test]
fn test_dry_run_with_no_usable_source() {
    let dir = TempDir::new().unwrap();
    let bad = write_corrupt(dir.path(), "bad.pdf");

    let mut config = config(dir.path().join("combined.pdf"));
    config.dry_run = true;

    let err = merge::compile(&CompilationRequest::from_paths([bad]), config, None).unwrap_err();
    assert!(matches!(err, CombineError::EmptyResult { failed: 1 }));
}

#[test]
fn test_dry_run_checks_destination() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);

    let mut config = config(dir.path());
    config.dry_run = true;

    let err = merge::compile(&CompilationRequest::from_paths([a]), config, None).unwrap_err();
    assert!(matches!(err, CombineError::DestinationWrite { .. }));
}

#[test]
fn test_dry_run_no_clobber_existing_file() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let output = dir.path().join("combined.pdf");
    std::fs::write(&output, b"existing").unwrap();

    let mut config = config(&output);
    config.dry_run = true;
    config.overwrite_mode = OverwriteMode::NoClobber;

    let err = merge::compile(&CompilationRequest::from_paths([a]), config, None).unwrap_err();
    assert!(matches!(err, CombineError::OutputExists { .. }));
}
