//! The layout objective: a sum of one-sided quadratic penalties.

use indexmap::IndexSet;

use crate::{
    datatypes::Point,
    error::LoadError,
    glyphs::GlyphSet,
    id::{GlyphId, ShapeId},
    pair_table::{PairBoundary, PairKey, PairTable},
};

/// Tuning for the energy model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergySettings {
    /// Desired separation between neighbouring outlines, in world units.
    pub gap: f64,
    /// If set, every shape is also pulled inside this glyph's outline.
    pub container: Option<GlyphId>,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            gap: 1.0,
            container: None,
        }
    }
}

/// One penalty term of the energy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Term {
    /// Penalize `first` and `second` being closer than the gap.
    Separation {
        /// Origin of the displacement.
        first: ShapeId,
        /// Displaced shape.
        second: ShapeId,
    },
    /// Penalize cyclic neighbours being farther apart than the gap.
    Cohesion {
        /// Origin of the displacement.
        first: ShapeId,
        /// The next shape around the cycle.
        second: ShapeId,
    },
    /// Penalize a shape poking outside the container glyph.
    Containment {
        /// The contained shape.
        shape: ShapeId,
    },
}

impl Term {
    /// Human-readable term name, useful for debugging.
    #[mutants::skip]
    pub fn kind(&self) -> &'static str {
        match self {
            Term::Separation { .. } => "Separation",
            Term::Cohesion { .. } => "Cohesion",
            Term::Containment { .. } => "Containment",
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ResolvedTerm {
    term: Term,
    /// Index into the table's pairs (or containers, for containment).
    boundary: usize,
}

/// All penalty terms over a fixed set of shapes.
#[derive(Clone, Debug)]
pub struct EnergyModel {
    shape_glyphs: Vec<GlyphId>,
    table: PairTable,
    settings: EnergySettings,
    terms: Vec<ResolvedTerm>,
}

impl EnergyModel {
    /// Build the model, checking the table holds every boundary it will need.
    pub fn new(
        shape_glyphs: Vec<GlyphId>,
        table: PairTable,
        settings: EnergySettings,
        glyphs: &GlyphSet,
    ) -> Result<Self, LoadError> {
        if shape_glyphs.is_empty() {
            return Err(LoadError::NoShapes);
        }
        if !settings.gap.is_finite() {
            return Err(LoadError::InvalidSetting {
                name: "gap",
                value: settings.gap,
                reason: "must be finite",
            });
        }
        table.ensure_pairs(glyphs, Self::required_pairs(&shape_glyphs))?;
        if let Some(container) = settings.container {
            table.ensure_containers(glyphs, container, shape_glyphs.iter().copied())?;
        }

        let mut terms = Vec::new();
        let pair_index = |first: ShapeId, second: ShapeId| {
            let key = PairKey::new(shape_glyphs[first as usize], shape_glyphs[second as usize]);
            table
                .pair_index(key)
                .ok_or_else(|| LoadError::MissingPair {
                    first: glyphs.name(key.first).to_owned(),
                    second: glyphs.name(key.second).to_owned(),
                })
        };
        for (first, second) in separation_pairs(shape_glyphs.len()) {
            terms.push(ResolvedTerm {
                term: Term::Separation { first, second },
                boundary: pair_index(first, second)?,
            });
        }
        for (first, second) in cyclic_pairs(shape_glyphs.len()) {
            terms.push(ResolvedTerm {
                term: Term::Cohesion { first, second },
                boundary: pair_index(first, second)?,
            });
        }
        if let Some(container) = settings.container {
            for (shape, glyph) in shape_glyphs.iter().enumerate() {
                let boundary = table.container_index(container, *glyph).ok_or_else(|| {
                    LoadError::MissingContainer {
                        container: glyphs.name(container).to_owned(),
                        glyph: glyphs.name(*glyph).to_owned(),
                    }
                })?;
                terms.push(ResolvedTerm {
                    term: Term::Containment {
                        shape: shape as ShapeId,
                    },
                    boundary,
                });
            }
        }

        Ok(Self {
            shape_glyphs,
            table,
            settings,
            terms,
        })
    }

    /// Every ordered glyph pair the energy will query for shapes with these glyphs.
    pub fn required_pairs(shape_glyphs: &[GlyphId]) -> Vec<PairKey> {
        let n = shape_glyphs.len();
        let key = |(a, b): (ShapeId, ShapeId)| {
            PairKey::new(shape_glyphs[a as usize], shape_glyphs[b as usize])
        };
        let keys: IndexSet<PairKey> = separation_pairs(n)
            .chain(cyclic_pairs(n))
            .map(key)
            .collect();
        keys.into_iter().collect()
    }

    /// How many shapes are being laid out.
    pub fn num_shapes(&self) -> usize {
        self.shape_glyphs.len()
    }

    /// Which glyph each shape uses, by shape ID.
    pub fn shape_glyphs(&self) -> &[GlyphId] {
        &self.shape_glyphs
    }

    /// Settings this model was built with.
    pub fn settings(&self) -> EnergySettings {
        self.settings
    }

    /// The boundaries this model queries.
    pub fn table(&self) -> &PairTable {
        &self.table
    }

    /// Every penalty term, in evaluation order.
    pub fn terms(&self) -> impl ExactSizeIterator<Item = Term> + '_ {
        self.terms.iter().map(|t| t.term)
    }

    /// Signed separation of `second` from `first` in this flat coordinate vector.
    pub fn separation(&self, first: ShapeId, second: ShapeId, coords: &[f64]) -> Option<f64> {
        let key = PairKey::new(
            self.shape_glyphs[first as usize],
            self.shape_glyphs[second as usize],
        );
        let boundary = self.table.get(key)?;
        Some(boundary.query(self.table.frame(), displacement(coords, first, second)))
    }

    /// Total energy of this flat coordinate vector.
    pub fn energy(&self, coords: &[f64]) -> f64 {
        self.evaluate(coords, None)
    }

    /// Total energy, writing its gradient into `grad` (same length as `coords`).
    pub fn energy_and_gradient(&self, coords: &[f64], grad: &mut [f64]) -> f64 {
        self.evaluate(coords, Some(grad))
    }

    fn boundary_for(&self, term: &ResolvedTerm) -> &PairBoundary {
        match term.term {
            Term::Containment { .. } => self.table.container_at(term.boundary),
            Term::Separation { .. } | Term::Cohesion { .. } => self.table.pair_at(term.boundary),
        }
    }

    fn evaluate(&self, coords: &[f64], mut grad: Option<&mut [f64]>) -> f64 {
        debug_assert_eq!(
            coords.len(),
            2 * self.num_shapes(),
            "position vector must hold 2 coordinates per shape"
        );
        if let Some(g) = grad.as_deref_mut() {
            g.fill(0.0);
        }
        let frame = self.table.frame();
        let gap = self.settings.gap;
        let mut total = 0.0;

        for resolved in &self.terms {
            let boundary = self.boundary_for(resolved);
            match resolved.term {
                Term::Separation { first, second } | Term::Cohesion { first, second } => {
                    let sd = boundary.query_with_gradient(frame, displacement(coords, first, second));
                    let excess = match resolved.term {
                        Term::Separation { .. } => gap - sd.value,
                        _ => sd.value - gap,
                    };
                    if excess <= 0.0 {
                        continue;
                    }
                    total += excess * excess;
                    if let Some(g) = grad.as_deref_mut() {
                        // d(excess)/dz is -1 for separation and +1 for cohesion.
                        let dz = match resolved.term {
                            Term::Separation { .. } => -2.0 * excess,
                            _ => 2.0 * excess,
                        };
                        let (i, j) = (2 * first as usize, 2 * second as usize);
                        g[j] += dz * sd.gradient.x;
                        g[j + 1] += dz * sd.gradient.y;
                        g[i] -= dz * sd.gradient.x;
                        g[i + 1] -= dz * sd.gradient.y;
                    }
                }
                Term::Containment { shape } => {
                    let i = 2 * shape as usize;
                    let sd =
                        boundary.query_with_gradient(frame, Point::new(coords[i], coords[i + 1]));
                    if sd.value <= 0.0 {
                        continue;
                    }
                    total += sd.value;
                    if let Some(g) = grad.as_deref_mut() {
                        g[i] += sd.gradient.x;
                        g[i + 1] += sd.gradient.y;
                    }
                }
            }
        }
        total
    }
}

/// Position of `second` relative to `first`.
fn displacement(coords: &[f64], first: ShapeId, second: ShapeId) -> Point {
    let (i, j) = (2 * first as usize, 2 * second as usize);
    Point::new(coords[j] - coords[i], coords[j + 1] - coords[i + 1])
}

/// Every unordered pair, as `(lower, higher)`.
fn separation_pairs(n: usize) -> impl Iterator<Item = (ShapeId, ShapeId)> {
    (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i as ShapeId, j as ShapeId)))
}

/// Each shape and the next one around the cycle.
fn cyclic_pairs(n: usize) -> impl Iterator<Item = (ShapeId, ShapeId)> {
    let n = if n < 2 { 0 } else { n };
    (0..n).map(move |i| (i as ShapeId, ((i + 1) % n) as ShapeId))
}
