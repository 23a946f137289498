#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfcombine::entry::{CompilationRequest, SelectionMode, parse_plan};
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    // Malformed plans must be rejected, never panic
    let Ok(entries) = parse_plan(json, Path::new("/work")) else {
        return;
    };

    let selected = entries.iter().filter(|e| e.selected).count();
    let request = CompilationRequest::new(entries.clone(), SelectionMode::Selected);
    assert_eq!(request.len(), selected);

    let all = CompilationRequest::new(entries, SelectionMode::All);
    assert!(all.entries().windows(2).all(|w| w[0].order <= w[1].order));
});
