//! Interactive layout of rigid 2D glyph outlines.
//!
//! Every ordered pair of glyphs has a precomputed boundary polygon: the set of
//! displacements at which the two outlines just touch. The engine keeps every
//! pair of shapes at least a gap outside that boundary, pulls neighbouring
//! shapes back within the gap, and optionally keeps all shapes inside a
//! container. A bounded-memory quasi-Newton optimizer moves the shapes a few
//! steps per animation frame while a user drags one of them around.

pub use crate::controller::Controller;
pub use crate::datatypes::{Point, Polygon};
pub use crate::distance::{SignedDistance, signed_distance, signed_distance_with_gradient};
pub use crate::energy::{EnergyModel, EnergySettings, Term};
pub use crate::error::{ConfigError, Error, LoadError};
pub use crate::frame_outcome::FrameOutcome;
pub use crate::glyphs::GlyphSet;
pub use crate::id::{GlyphId, IdGenerator, ShapeId};
pub use crate::lbfgs::{Config, FailureReason, OptimizerState, StepStatus};
pub use crate::oracle::{CentralDifference, GradientOracle};
pub use crate::pair_table::{BoundaryFrame, PairBoundary, PairKey, PairTable};
pub use crate::placement::Placement;
pub use crate::warnings::{Warning, WarningContent, lint};

/// Runs the optimizer in response to frames and pointer input.
mod controller;
/// Geometric data (points, polygons).
pub mod datatypes;
/// Signed distance from a point to a polygon.
mod distance;
/// The layout energy and its gradient.
mod energy;
/// Renders distance and energy fields to images, for debugging.
#[cfg(feature = "energy-viz")]
pub mod energy_viz;
mod error;
mod frame_outcome;
/// Interned glyph names.
mod glyphs;
/// IDs of shapes and glyphs.
mod id;
/// Limited-memory BFGS, one step at a time.
pub mod lbfgs;
mod oracle;
/// Boundary polygons for every glyph pair.
mod pair_table;
mod placement;
/// Unit tests
#[cfg(test)]
mod tests;
/// Parser for textual representation of layout sessions.
pub mod textual;
mod vector;
/// Things that look wrong about a layout before it is run.
mod warnings;

const EPSILON: f64 = 1e-5;
