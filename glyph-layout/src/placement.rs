use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{datatypes::Point, id::ShapeId};

/// Current position of every shape.
///
/// Stored as one flat vector `[x0, y0, x1, y1, ...]`, which is exactly the
/// vector the optimizer works on. Its length is always twice the shape count.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    coords: Vec<f64>,
}

impl Placement {
    /// Place shape `n` at `positions[n]`.
    pub fn new(positions: impl IntoIterator<Item = Point>) -> Self {
        Self {
            coords: positions.into_iter().flat_map(|p| [p.x, p.y]).collect(),
        }
    }

    /// Scatter `count` shapes uniformly over `[0, width) x [0, height)`.
    /// The same seed always gives the same placement.
    pub fn scatter(count: usize, width: f64, height: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new((0..count).map(|_| {
            Point::new(
                width * rng.gen_range(0.0..1.0),
                height * rng.gen_range(0.0..1.0),
            )
        }))
    }

    /// Number of shapes.
    pub fn len(&self) -> usize {
        self.coords.len() / 2
    }

    /// True if there are no shapes.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Where this shape is.
    pub fn position(&self, id: ShapeId) -> Point {
        let i = 2 * id as usize;
        Point::new(self.coords[i], self.coords[i + 1])
    }

    /// Move this shape.
    pub fn set_position(&mut self, id: ShapeId, p: Point) {
        let i = 2 * id as usize;
        self.coords[i] = p.x;
        self.coords[i + 1] = p.y;
    }

    /// Every shape's position, in ID order.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = (ShapeId, Point)> + '_ {
        self.coords
            .chunks_exact(2)
            .enumerate()
            .map(|(i, xy)| (i as ShapeId, Point::new(xy[0], xy[1])))
    }

    /// The flat coordinate vector.
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub(crate) fn coords_mut(&mut self) -> &mut [f64] {
        &mut self.coords
    }

    /// The shape nearest to `point` (squared Euclidean distance).
    /// Ties go to the lowest ID.
    pub fn nearest(&self, point: Point) -> Option<ShapeId> {
        let mut best: Option<(ShapeId, f64)> = None;
        for (id, p) in self.positions() {
            let d = p.distance_squared(point);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((id, d)),
            }
        }
        best.map(|(id, _)| id)
    }
}
