//! Integration tests for error handling and edge cases.

use pdfcombine::config::OverwriteMode;
use pdfcombine::entry::CompilationRequest;
use pdfcombine::error::{CombineError, SourceProblem};
use pdfcombine::merge::{self, CancellationFlag, Compiler, SourceProgress};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{config, dir_entries, page_sizes, write_corrupt, write_pdf};

#[test]
fn test_corrupt_source_is_skipped() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let bad = write_corrupt(dir.path(), "bad.pdf");
    let c = write_pdf(dir.path(), "c.pdf", 2, 500);
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile(
        &CompilationRequest::from_paths([a, bad.clone(), c]),
        config(&output),
        None,
    )
    .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.document.page_count, 3);
    assert_eq!(page_sizes(&output), [(300, 700), (500, 700), (500, 701)]);

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].path, bad);
    assert!(matches!(
        outcome.failed[0].error,
        CombineError::SourceRead {
            problem: SourceProblem::Corrupt(_),
            ..
        }
    ));
}

#[test]
fn test_missing_and_unsupported_sources_are_recorded() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, b"meeting notes").unwrap();
    let gone = dir.path().join("gone.pdf");
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile(
        &CompilationRequest::from_paths([gone, a, notes]),
        config(&output),
        None,
    )
    .unwrap();

    assert_eq!(outcome.document.page_count, 1);
    let problems: Vec<&SourceProblem> = outcome
        .failed
        .iter()
        .map(|f| match &f.error {
            CombineError::SourceRead { problem, .. } => problem,
            other => panic!("unexpected error: {other}"),
        })
        .collect();
    assert_eq!(problems, [&SourceProblem::NotFound, &SourceProblem::Unsupported]);
}

#[test]
fn test_empty_pdf_is_skipped() {
    let dir = TempDir::new().unwrap();
    let empty = write_pdf(dir.path(), "empty.pdf", 0, 300);
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let output = dir.path().join("combined.pdf");

    let outcome = merge::compile(
        &CompilationRequest::from_paths([empty, a]),
        config(&output),
        None,
    )
    .unwrap();

    assert_eq!(outcome.document.page_count, 1);
    assert_eq!(outcome.failed.len(), 1);
}

#[test]
fn test_all_sources_failing_produces_no_file() {
    let dir = TempDir::new().unwrap();
    let bad1 = write_corrupt(dir.path(), "bad1.pdf");
    let bad2 = write_corrupt(dir.path(), "bad2.pdf");
    let output = dir.path().join("combined.pdf");

    let err = merge::compile(
        &CompilationRequest::from_paths([bad1, bad2]),
        config(&output),
        None,
    )
    .unwrap_err();

    assert!(matches!(err, CombineError::EmptyResult { failed: 2 }));
    assert!(!output.exists());
    // No temporary file left behind either
    assert_eq!(dir_entries(dir.path()), ["bad1.pdf", "bad2.pdf"]);
}

#[test]
fn test_empty_request_is_empty_result() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("combined.pdf");

    let err = merge::compile(&CompilationRequest::default(), config(&output), None).unwrap_err();

    assert!(matches!(err, CombineError::EmptyResult { failed: 0 }));
    assert!(!output.exists());
}

#[test]
fn test_failed_compile_keeps_existing_output() {
    let dir = TempDir::new().unwrap();
    let bad = write_corrupt(dir.path(), "bad.pdf");
    let output = dir.path().join("combined.pdf");
    std::fs::write(&output, b"previous result").unwrap();

    let err = merge::compile(&CompilationRequest::from_paths([bad]), config(&output), None)
        .unwrap_err();

    assert!(matches!(err, CombineError::EmptyResult { .. }));
    assert_eq!(std::fs::read(&output).unwrap(), b"previous result");
}

#[test]
fn test_directory_destination_fails_before_sources() {
    let dir = TempDir::new().unwrap();
    // Only corrupt sources: reading them first would give EmptyResult instead
    let bad = write_corrupt(dir.path(), "bad.pdf");
    let output = dir.path().join("out.pdf");
    std::fs::create_dir(&output).unwrap();

    let err = merge::compile(&CompilationRequest::from_paths([bad]), config(&output), None)
        .unwrap_err();

    assert!(matches!(err, CombineError::DestinationWrite { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_destination_equal_to_source_is_rejected() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);

    let err = merge::compile(
        &CompilationRequest::from_paths([a.clone()]),
        config(&a),
        None,
    )
    .unwrap_err();

    assert!(matches!(err, CombineError::DestinationWrite { .. }));
    assert_eq!(page_sizes(&a), [(300, 700)]);
}

#[test]
fn test_no_clobber_keeps_existing_output() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let output = dir.path().join("combined.pdf");
    std::fs::write(&output, b"keep me").unwrap();

    let mut config = config(&output);
    config.overwrite_mode = OverwriteMode::NoClobber;

    let err = merge::compile(&CompilationRequest::from_paths([a]), config, None).unwrap_err();

    assert!(matches!(err, CombineError::OutputExists { .. }));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(std::fs::read(&output).unwrap(), b"keep me");
}

#[test]
fn test_cancelled_before_start_produces_no_file() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let output = dir.path().join("combined.pdf");

    let flag = CancellationFlag::new();
    flag.cancel();

    let err = merge::compile(&CompilationRequest::from_paths([a]), config(&output), Some(flag))
        .unwrap_err();

    assert!(matches!(err, CombineError::Cancelled));
    assert!(!output.exists());
}

#[test]
fn test_cancelled_between_sources_produces_no_file() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", 1, 300);
    let b = write_pdf(dir.path(), "b.pdf", 1, 400);
    let output = dir.path().join("combined.pdf");

    let flag = CancellationFlag::new();
    let cancel_after_first = {
        let flag = flag.clone();
        move |_: &SourceProgress<'_>| flag.cancel()
    };

    let err = Compiler::new(config(&output))
        .with_cancellation(flag.clone())
        .with_progress(Arc::new(cancel_after_first))
        .compile(&CompilationRequest::from_paths([a, b]))
        .unwrap_err();

    assert!(matches!(err, CombineError::Cancelled));
    assert!(flag.is_cancelled());
    assert!(!output.exists());
    assert_eq!(dir_entries(dir.path()), ["a.pdf", "b.pdf"]);
}
