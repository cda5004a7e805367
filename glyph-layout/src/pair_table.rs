//! Precomputed pair boundaries, and queries against them.
//!
//! A pair boundary for glyphs `(a, b)` is the locus of displacements of `b`
//! relative to `a` at which their outlines touch (the Minkowski sum of `a` and
//! the reflection of `b`). Querying it with the actual displacement gives a
//! signed separation: negative while the outlines overlap.

use indexmap::IndexMap;

use crate::{
    datatypes::{Point, Polygon},
    distance::{SignedDistance, signed_distance_with_gradient},
    error::LoadError,
    glyphs::GlyphSet,
    id::GlyphId,
    vector::V,
};

/// Ordered pair of glyphs. `(a, b)` and `(b, a)` are different keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    /// The glyph whose position is the origin of the displacement.
    pub first: GlyphId,
    /// The glyph being displaced.
    pub second: GlyphId,
}

impl PairKey {
    /// Create a new key.
    pub fn new(first: GlyphId, second: GlyphId) -> Self {
        Self { first, second }
    }
}

/// Affine map from world displacements into the units boundary polygons were
/// generated in. Distances come back out in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryFrame {
    /// Boundary units per world unit.
    pub units_per_world: f64,
    /// Boundary polygons use a Y axis pointing the other way.
    pub flip_y: bool,
}

impl Default for BoundaryFrame {
    fn default() -> Self {
        Self {
            units_per_world: 1.0,
            flip_y: false,
        }
    }
}

impl BoundaryFrame {
    fn y_sign(&self) -> f64 {
        if self.flip_y { -1.0 } else { 1.0 }
    }

    pub(crate) fn to_boundary(self, displacement: V) -> V {
        V::new(
            displacement.x * self.units_per_world,
            displacement.y * self.units_per_world * self.y_sign(),
        )
    }

    /// Bring a boundary-space signed distance and gradient back to world space.
    /// The scale cancels in the gradient; only the flip survives.
    pub(crate) fn to_world(self, sd: SignedDistance) -> SignedDistance {
        SignedDistance {
            value: sd.value / self.units_per_world,
            gradient: Point::new(sd.gradient.x, sd.gradient.y * self.y_sign()),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), LoadError> {
        if !(self.units_per_world.is_finite() && self.units_per_world > 0.0) {
            return Err(LoadError::InvalidSetting {
                name: "units_per_world",
                value: self.units_per_world,
                reason: "must be a positive finite number",
            });
        }
        Ok(())
    }
}

/// An immutable boundary polygon for one ordered glyph pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PairBoundary {
    polygon: Polygon,
}

impl PairBoundary {
    /// Wrap an already-validated polygon.
    pub fn new(polygon: Polygon) -> Self {
        Self { polygon }
    }

    /// The boundary polygon, in boundary units.
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Signed separation (world units) for this world displacement.
    pub fn query(&self, frame: BoundaryFrame, displacement: Point) -> f64 {
        self.query_with_gradient(frame, displacement).value
    }

    /// Signed separation (world units) and its gradient w.r.t. the displacement.
    pub fn query_with_gradient(&self, frame: BoundaryFrame, displacement: Point) -> SignedDistance {
        let local = frame.to_boundary(displacement.into());
        frame.to_world(signed_distance_with_gradient(&self.polygon, local.into()))
    }
}

/// Every boundary the energy model may query, keyed by ordered glyph pair.
/// Built once when a session loads, then only read.
#[derive(Clone, Debug, Default)]
pub struct PairTable {
    frame: BoundaryFrame,
    pairs: IndexMap<PairKey, PairBoundary>,
    /// Keyed by (container, contained glyph).
    containers: IndexMap<PairKey, PairBoundary>,
}

impl PairTable {
    /// An empty table using this boundary frame.
    pub fn new(frame: BoundaryFrame) -> Result<Self, LoadError> {
        frame.validate()?;
        Ok(Self {
            frame,
            pairs: IndexMap::new(),
            containers: IndexMap::new(),
        })
    }

    /// The coordinate convention shared by every boundary in this table.
    pub fn frame(&self) -> BoundaryFrame {
        self.frame
    }

    /// Store the boundary for an ordered pair, replacing any previous one.
    pub fn insert(&mut self, key: PairKey, boundary: PairBoundary) {
        self.pairs.insert(key, boundary);
    }

    /// Store the boundary that keeps `glyph` inside `container`.
    pub fn insert_container(&mut self, container: GlyphId, glyph: GlyphId, boundary: PairBoundary) {
        self.containers
            .insert(PairKey::new(container, glyph), boundary);
    }

    /// Boundary for this ordered pair, if loaded.
    pub fn get(&self, key: PairKey) -> Option<&PairBoundary> {
        self.pairs.get(&key)
    }

    /// Containment boundary for this glyph, if loaded.
    pub fn get_container(&self, container: GlyphId, glyph: GlyphId) -> Option<&PairBoundary> {
        self.containers.get(&PairKey::new(container, glyph))
    }

    pub(crate) fn pair_index(&self, key: PairKey) -> Option<usize> {
        self.pairs.get_index_of(&key)
    }

    pub(crate) fn container_index(&self, container: GlyphId, glyph: GlyphId) -> Option<usize> {
        self.containers.get_index_of(&PairKey::new(container, glyph))
    }

    /// Panics if `index` didn't come from [`Self::pair_index`].
    pub(crate) fn pair_at(&self, index: usize) -> &PairBoundary {
        &self.pairs[index]
    }

    /// Panics if `index` didn't come from [`Self::container_index`].
    pub(crate) fn container_at(&self, index: usize) -> &PairBoundary {
        &self.containers[index]
    }

    /// All pair boundaries, in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (PairKey, &PairBoundary)> + '_ {
        self.pairs.iter().map(|(k, b)| (*k, b))
    }

    /// All containment boundaries, in insertion order, keyed by (container, glyph).
    pub fn containers(&self) -> impl Iterator<Item = (PairKey, &PairBoundary)> + '_ {
        self.containers.iter().map(|(k, b)| (*k, b))
    }

    /// How many pair boundaries are loaded.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no pair boundaries are loaded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Check that every one of these keys has a boundary.
    pub fn ensure_pairs(
        &self,
        glyphs: &GlyphSet,
        keys: impl IntoIterator<Item = PairKey>,
    ) -> Result<(), LoadError> {
        for key in keys {
            if !self.pairs.contains_key(&key) {
                return Err(LoadError::MissingPair {
                    first: glyphs.name(key.first).to_owned(),
                    second: glyphs.name(key.second).to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Check that every one of these glyphs has a containment boundary.
    pub fn ensure_containers(
        &self,
        glyphs: &GlyphSet,
        container: GlyphId,
        contained: impl IntoIterator<Item = GlyphId>,
    ) -> Result<(), LoadError> {
        for glyph in contained {
            if self.get_container(container, glyph).is_none() {
                return Err(LoadError::MissingContainer {
                    container: glyphs.name(container).to_owned(),
                    glyph: glyphs.name(glyph).to_owned(),
                });
            }
        }
        Ok(())
    }
}
