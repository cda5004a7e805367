#![no_main]

use glyph_layout::textual::{format_polygon, parse_polygon};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    // Anything that parses must survive being written back out and parsed again.
    if let Ok(polygon) = parse_polygon(text) {
        let again = parse_polygon(&format_polygon(&polygon)).unwrap();
        assert_eq!(polygon, again);
    }
});
