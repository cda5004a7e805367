use super::Label;
use crate::datatypes::Point;

/// `a is A at (0, 0)`: shape `a` uses glyph `A` and starts at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDecl {
    /// The shape's own name.
    pub label: Label,
    /// Which glyph outline it uses.
    pub glyph: Label,
    /// Where it starts.
    pub at: Point,
}

/// One line of the `# settings` section.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Setting {
    /// `gap = 1`
    Gap(f64),
    /// `units_per_world = 1`
    UnitsPerWorld(f64),
    /// `flip_y = false`
    FlipY(bool),
    /// `container = S`
    Container(Label),
}
