//! A basic example of laying out shapes and dragging one of them.
use glyph_layout::{
    Config, Controller, EnergyModel, EnergySettings, GlyphSet, PairBoundary, PairKey, PairTable,
    Placement, Point, Polygon,
};

fn main() {
    // Two glyphs, both unit squares. The boundary for a pair of them is the
    // square of displacements at which they touch: half-width 1 + 1 = 2.
    let mut glyphs = GlyphSet::default();
    let a = glyphs.intern("A");
    let boundary = Polygon::new(vec![
        Point::new(-2.0, -2.0),
        Point::new(2.0, -2.0),
        Point::new(2.0, 2.0),
        Point::new(-2.0, 2.0),
    ])
    .unwrap();
    let mut table = PairTable::default();
    table.insert(PairKey::new(a, a), PairBoundary::new(boundary));

    // Three shapes piled up near the origin, to be kept 1 unit apart.
    let model = EnergyModel::new(vec![a; 3], table, EnergySettings::default(), &glyphs).unwrap();
    let placement = Placement::new([
        Point::new(0.0, 0.0),
        Point::new(1.2, 0.3),
        Point::new(0.4, 1.7),
    ]);
    let mut controller = Controller::new(model, placement, Config::default()).unwrap();

    // Run frames until the layout settles.
    for frame in 0.. {
        let outcome = controller.frame();
        if outcome.is_settled() {
            println!("settled after {frame} frames: {:?}", outcome.status());
            break;
        }
    }

    // Grab the first shape and drag it away. The others follow it.
    controller.select(Point::new(0.0, 0.0));
    controller.drag(Point::new(20.0, 5.0));
    for _ in 0..200 {
        if controller.frame().is_settled() {
            break;
        }
    }
    controller.release();

    for (id, p) in controller.placement().positions() {
        println!("shape {id} at {p}");
    }
}
