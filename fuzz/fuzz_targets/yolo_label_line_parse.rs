//! Fuzz target for YOLO single-line label parsing.
//!
//! Arbitrary UTF-8 lines go through the line parser. Every line that
//! parses is written back with `format_label_line` and parsed again; that
//! output must parse and must format to the same text.

#![no_main]

use framecurate::ir::io_yolo::{format_label_line, fuzz_parse_label_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(Some(row)) = fuzz_parse_label_line(line) else {
        return;
    };

    let written = format_label_line(row.label, &row.bbox);
    let reparsed = fuzz_parse_label_line(&written)
        .expect("formatted label line must parse")
        .expect("formatted label line is not blank");
    assert_eq!(reparsed.label, row.label);
    assert_eq!(format_label_line(reparsed.label, &reparsed.bbox), written);
});
