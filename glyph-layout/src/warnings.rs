use crate::{
    energy::{EnergyModel, Term},
    id::ShapeId,
    pair_table::PairKey,
    placement::Placement,
};

/// Something that won't stop the layout from running, but is probably a mistake.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Warning {
    /// The shape this is about, if it's about one shape in particular.
    pub about_shape: Option<ShapeId>,
    /// What's wrong.
    pub content: WarningContent,
}

/// The kinds of problem [`lint`] looks for.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
#[non_exhaustive]
pub enum WarningContent {
    /// A boundary polygon has consecutive vertices on top of each other.
    DegenerateEdge {
        /// Which boundary.
        pair: PairKey,
        /// Whether it's a containment boundary rather than a pair boundary.
        container: bool,
        /// Index of the edge's first vertex.
        edge: usize,
    },
    /// Two shapes start out overlapping.
    Overlapping {
        /// The other shape.
        other: ShapeId,
        /// Their signed separation (negative).
        separation: f64,
    },
    /// The gap is zero or negative, so touching or overlapping shapes cost nothing.
    NonPositiveGap(f64),
}

/// Look for likely mistakes in the model and the starting placement.
pub fn lint(model: &EnergyModel, placement: &Placement) -> Vec<Warning> {
    let mut warnings = Vec::default();
    let gap = model.settings().gap;
    if gap <= 0.0 {
        warnings.push(Warning {
            about_shape: None,
            content: WarningContent::NonPositiveGap(gap),
        });
    }

    let table = model.table();
    let boundaries = table
        .pairs()
        .map(|(pair, b)| (pair, false, b))
        .chain(table.containers().map(|(pair, b)| (pair, true, b)));
    for (pair, container, boundary) in boundaries {
        for edge in boundary.polygon().degenerate_edges() {
            warnings.push(Warning {
                about_shape: None,
                content: WarningContent::DegenerateEdge {
                    pair,
                    container,
                    edge,
                },
            });
        }
    }

    for term in model.terms() {
        let Term::Separation { first, second } = term else {
            continue;
        };
        match model.separation(first, second, placement.coords()) {
            Some(separation) if separation < 0.0 => warnings.push(Warning {
                about_shape: Some(first),
                content: WarningContent::Overlapping {
                    other: second,
                    separation,
                },
            }),
            _ => {}
        }
    }
    warnings
}

impl std::fmt::Display for WarningContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningContent::DegenerateEdge {
                pair,
                container,
                edge,
            } => write!(
                f,
                "The {} boundary for {} and {} has a zero-length edge starting at vertex {edge}. This is probably a bug in whatever generated it.",
                if *container { "containment" } else { "pair" },
                pair.first,
                pair.second
            ),
            WarningContent::Overlapping { other, separation } => write!(
                f,
                "This shape overlaps shape {other} by {} at the start. The layout will push them apart, but you may want better starting positions.",
                -separation
            ),
            WarningContent::NonPositiveGap(gap) => write!(
                f,
                "The gap is {gap}, so shapes are allowed to touch or overlap. Use a positive gap to keep them apart."
            ),
        }
    }
}
