//! Plain geometric values shared by every layer of the engine.

use crate::{EPSILON, error::LoadError, vector::V};

/// A point (or displacement) in the plane.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance between two points.
    pub fn distance_squared(&self, other: Point) -> f64 {
        (V::from(*self) - V::from(other)).magnitude_squared()
    }

    /// Euclidean distance between two points.
    pub fn euclidean_distance(&self, other: Point) -> f64 {
        V::from(*self).euclidean_distance(V::from(other))
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A closed polygon with at least 3 vertices.
/// The closing edge from the last vertex back to the first is implicit.
/// Either orientation is accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<V>,
}

impl Polygon {
    /// Validate and wrap these vertices.
    pub fn new(vertices: Vec<Point>) -> Result<Self, LoadError> {
        if vertices.len() < 3 {
            return Err(LoadError::TooFewVertices {
                count: vertices.len(),
            });
        }
        if let Some(index) = vertices
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(LoadError::NonFiniteVertex { index });
        }
        Ok(Self {
            vertices: vertices.into_iter().map(V::from).collect(),
        })
    }

    /// How many vertices (and edges) this polygon has.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Never true, polygons have at least 3 vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The vertices, in order.
    pub fn vertices(&self) -> impl DoubleEndedIterator<Item = Point> + ExactSizeIterator + '_ {
        self.vertices.iter().map(|v| Point::from(*v))
    }

    pub(crate) fn raw(&self) -> &[V] {
        &self.vertices
    }

    /// Twice the signed area. Positive for counter-clockwise vertex order.
    pub fn signed_area_doubled(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| self.vertices[i].cross_2d(&self.vertices[(i + 1) % n]))
            .sum()
    }

    /// Indices `i` where the edge from vertex `i` to vertex `i + 1` has (nearly) zero length.
    pub fn degenerate_edges(&self) -> Vec<usize> {
        let n = self.vertices.len();
        (0..n)
            .filter(|&i| (self.vertices[(i + 1) % n] - self.vertices[i]).magnitude() < EPSILON)
            .collect()
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min.x = libm::fmin(min.x, v.x);
            min.y = libm::fmin(min.y, v.y);
            max.x = libm::fmax(max.x, v.x);
            max.y = libm::fmax(max.y, v.y);
        }
        (min.into(), max.into())
    }
}
