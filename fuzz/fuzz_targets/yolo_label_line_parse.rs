//! Fuzz target for YOLO label parsing.
//!
//! The input goes through the single-line parser (and, when it parses, the
//! pixel-space conversion) and then through the whole-file parser, which
//! collects malformed lines instead of failing.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use yolotile::label::{fuzz_parse_label_line, parse_label_str};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(first) = text.lines().next() {
        let _ = fuzz_parse_label_line(first);
    }

    let file = parse_label_str(text, Path::new("<fuzz>"));
    assert!(file.records.len() + file.malformed.len() <= text.lines().count());
});
