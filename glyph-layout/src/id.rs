/// The ID of one shape being laid out.
/// Shape `n` owns coordinates `2n` and `2n + 1` of the position vector.
pub type ShapeId = u32;

/// Generates an incrementing sequence of shape IDs starting from 0.
#[derive(Default)]
pub struct IdGenerator {
    next: ShapeId,
}

impl IdGenerator {
    /// Generates an incrementing sequence of IDs starting from 0.
    pub fn next_id(&mut self) -> ShapeId {
        let out = self.next;
        self.next += 1;
        out
    }
}

/// Fixed-width key for one glyph outline.
/// Many shapes may share a glyph, and therefore share its pair boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u16);

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "glyph#{}", self.0)
    }
}
