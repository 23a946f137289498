#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfcombine::entry::FileEntry;
use pdfcombine::io::SourceReader;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };

    // Arbitrary bytes as both kinds of source: either loads or is a recorded problem
    for name in ["input.pdf", "input.png"] {
        let path = dir.path().join(name);
        if std::fs::write(&path, data).is_err() {
            return;
        }
        let result = SourceReader::new().load(&FileEntry::from_path(&path, 1));
        if let Err(err) = result {
            assert!(err.is_recoverable(), "{err}");
        }
    }
});
