//! Text formats: polygon records, and session files naming shapes and settings.

mod executor;
mod instruction;
mod parser;

use std::str::FromStr;

pub use executor::{BoundarySource, Directory, InMemory, LoadedSession};
pub use instruction::{Setting, ShapeDecl};
use winnow::Parser;

use crate::{
    datatypes::{Point, Polygon},
    error::LoadError,
};

/// A parsed session file. Nothing has been checked against boundary data yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Shapes, in the order they'll be laid out (and linked into a cycle).
    pub shapes: Vec<ShapeDecl>,
    /// Settings, in file order. Later settings override earlier ones.
    pub settings: Vec<Setting>,
}

impl FromStr for Session {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Session::parse
            .parse(s)
            .map_err(|e| LoadError::Parse {
                what: "session",
                message: e.to_string(),
            })
    }
}

/// Parse a polygon record: a vertex count, then one `x y` line per vertex.
pub fn parse_polygon(text: &str) -> Result<Polygon, LoadError> {
    let (declared, vertices) = parser::polygon_record
        .parse(text)
        .map_err(|e| LoadError::Parse {
            what: "polygon record",
            message: e.to_string(),
        })?;
    if declared != vertices.len() {
        return Err(LoadError::VertexCountMismatch {
            declared,
            found: vertices.len(),
        });
    }
    Polygon::new(vertices)
}

/// Write a polygon in the same format [`parse_polygon`] reads.
pub fn format_polygon(polygon: &Polygon) -> String {
    let mut out = format!("{}\n", polygon.len());
    for Point { x, y } in polygon.vertices() {
        out.push_str(&format!("{x} {y}\n"));
    }
    out
}

/// Name of a shape or glyph in a session file.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Label(String);

impl Label {
    /// The label's text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        &self.0 == other
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
