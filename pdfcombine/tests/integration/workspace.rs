//! Integration tests for the working-directory workflow: settings, listing,
//! import, selection and compile.

use pdfcombine::config::Settings;
use pdfcombine::entry::{CompilationRequest, SelectionMode, parse_plan};
use pdfcombine::{convert, listing, merge};
use tempfile::TempDir;

use crate::common::{config, page_sizes, write_pdf};

#[test]
fn test_settings_drive_listing_order() {
    let config_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let settings_path = config_dir.path().join("pdfcombine").join("config.json");

    let mut settings = Settings::load(&settings_path).unwrap();
    settings
        .set("working_dir", &work.path().display().to_string())
        .unwrap();
    settings
        .set("ordering_keywords", r#"{"cover": 1, "plan": 5}"#)
        .unwrap();
    settings.save(&settings_path).unwrap();

    write_pdf(work.path(), "b_plan.pdf", 1, 300);
    write_pdf(work.path(), "a_plan.pdf", 1, 300);
    write_pdf(work.path(), "zz_cover.pdf", 1, 300);
    write_pdf(work.path(), "drawing.pdf", 1, 300);

    let settings = Settings::load(&settings_path).unwrap();
    let dir = settings.require_working_dir().unwrap();
    let names: Vec<String> = listing::list_entries(dir, &settings.ordering_keywords)
        .unwrap()
        .iter()
        .map(|e| e.file_name())
        .collect();

    // "drawing" is no longer a keyword, so it ranks with the others
    assert_eq!(names, ["zz_cover.pdf", "a_plan.pdf", "b_plan.pdf", "drawing.pdf"]);
}

#[test]
fn test_import_then_compile_selection() {
    let source = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let keywords = Settings::default().ordering_keywords;

    let plan = write_pdf(source.path(), "site_plan.pdf", 2, 300);
    let drawing = write_pdf(source.path(), "drawing_01.pdf", 1, 400);
    let report_file = write_pdf(source.path(), "report.pdf", 1, 500);
    let notes = source.path().join("notes.txt");
    std::fs::write(&notes, b"not imported").unwrap();

    let imported = listing::import_files(
        &[plan, drawing, report_file, notes],
        work.path(),
        false,
    )
    .unwrap();
    assert_eq!(imported.copied.len(), 3);
    assert_eq!(imported.skipped.len(), 1);

    let mut entries = listing::list_entries(work.path(), &keywords).unwrap();
    let names: Vec<String> = entries.iter().map(|e| e.file_name()).collect();
    assert_eq!(names, ["drawing_01.pdf", "site_plan.pdf", "report.pdf"]);

    // Select the report and the drawing, report first
    entries[2].selected = true;
    entries[2].order = 1;
    entries[0].selected = true;
    entries[0].order = 2;

    let output = work.path().join("Combined_Output").join("Combined_Document.pdf");
    let mut config = config(&output);
    config.mode = SelectionMode::Selected;
    let request = CompilationRequest::new(entries, config.mode);

    let outcome = merge::compile(&request, config, None).unwrap();
    assert_eq!(outcome.document.page_count, 2);
    assert_eq!(page_sizes(&output), [(500, 700), (400, 700)]);

    // The output folder is not part of the next listing
    assert_eq!(listing::list_entries(work.path(), &keywords).unwrap().len(), 3);
}

#[test]
fn test_listing_as_plan_round_trip() {
    let work = TempDir::new().unwrap();
    write_pdf(work.path(), "detail.pdf", 1, 300);
    write_pdf(work.path(), "plan.pdf", 1, 400);
    let keywords = Settings::default().ordering_keywords;

    let entries = listing::list_entries(work.path(), &keywords).unwrap();
    let json = serde_json::to_string(&entries).unwrap();
    let parsed = parse_plan(&json, work.path()).unwrap();

    let paths: Vec<_> = parsed.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths, [work.path().join("plan.pdf"), work.path().join("detail.pdf")]);
    assert!(parsed.iter().all(|e| !e.selected));
}

#[test]
fn test_deleting_originals_after_compile() {
    let work = TempDir::new().unwrap();
    let a = write_pdf(work.path(), "a.pdf", 1, 300);
    let b = write_pdf(work.path(), "b.pdf", 1, 400);
    let output = work.path().join("out").join("combined.pdf");

    let outcome = merge::compile(
        &CompilationRequest::from_paths([a.clone(), b.clone()]),
        config(&output),
        None,
    )
    .unwrap();

    let originals: Vec<_> = outcome.succeeded.iter().map(|s| s.path.clone()).collect();
    assert!(convert::remove_sources(&originals).is_empty());
    assert!(!a.exists());
    assert!(!b.exists());
    assert_eq!(page_sizes(&output), [(300, 700), (400, 700)]);
}

#[test]
fn test_missing_entries_after_external_delete() {
    let work = TempDir::new().unwrap();
    write_pdf(work.path(), "a.pdf", 1, 300);
    let b = write_pdf(work.path(), "b.pdf", 1, 400);
    let keywords = Settings::default().ordering_keywords;

    let entries = listing::list_entries(work.path(), &keywords).unwrap();
    std::fs::remove_file(&b).unwrap();

    let missing = listing::missing_entries(&entries);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].path, b);
}

#[cfg(feature = "png")]
#[test]
fn test_converted_png_compiles_like_the_png() {
    use crate::common::write_png;

    let work = TempDir::new().unwrap();
    let png = write_png(work.path(), "photo.png", 64, 48, false);

    let stats = convert::convert_png_to_pdf(&png, false).unwrap();
    assert_eq!(page_sizes(&stats.output_path), [(64, 48)]);

    let output = work.path().join("combined.pdf");
    merge::compile(
        &CompilationRequest::from_paths([png, stats.output_path]),
        config(&output),
        None,
    )
    .unwrap();
    assert_eq!(page_sizes(&output), [(64, 48), (64, 48)]);
}
