#![no_main]

use arbitrary::Arbitrary;
use glyph_layout::{Point, Polygon, signed_distance_with_gradient};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|setup: Setup| {
    let vertices = setup
        .vertices
        .into_iter()
        .map(|(x, y)| Point::new(x, y))
        .collect();
    let Ok(polygon) = Polygon::new(vertices) else {
        return;
    };
    let (x, y) = setup.query;
    if !(x.is_finite() && y.is_finite()) {
        return;
    }
    let _ = signed_distance_with_gradient(&polygon, Point::new(x, y));
});

#[derive(Debug, Arbitrary)]
struct Setup {
    vertices: Vec<(f64, f64)>,
    query: (f64, f64),
}
