//! Parse the session text format, load boundaries for it from memory,
//! then lay it out.
use std::str::FromStr;

use glyph_layout::{
    Config,
    textual::{InMemory, Session, parse_polygon},
};

fn main() {
    let file = "\
# shapes
a is A at (0, 0)
b is A at (1, 0.5)
c is A at (0.2, -1)

# settings
gap = 0.5
";
    let session = Session::from_str(file).unwrap();

    // Boundary files hold a vertex count, then one `x y` line per vertex.
    let boundary = parse_polygon("4\n-2 -2\n2 -2\n2 2\n-2 2\n").unwrap();
    let mut source = InMemory::default();
    source.insert_pair("A", "A", boundary);

    let loaded = session.load(&mut source).unwrap();
    let labels: Vec<String> = loaded.labels().map(ToString::to_string).collect();
    let mut controller = loaded.into_controller(Config::default()).unwrap();
    for warning in controller.lint() {
        println!("warning: {}", warning.content);
    }
    for _ in 0..500 {
        if controller.frame().is_settled() {
            break;
        }
    }
    for ((_, p), label) in controller.placement().positions().zip(&labels) {
        println!("{label} at {p}");
    }
}
