use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::{Label, Session, Setting, parse_polygon};
use crate::{
    Controller, IdGenerator,
    datatypes::{Point, Polygon},
    energy::{EnergyModel, EnergySettings},
    error::{Error, LoadError},
    glyphs::GlyphSet,
    id::{GlyphId, ShapeId},
    lbfgs::Config,
    pair_table::{BoundaryFrame, PairBoundary, PairTable},
    placement::Placement,
};

/// Somewhere pair and containment boundaries can be fetched from, by glyph name.
/// `Ok(None)` means the boundary simply isn't there.
pub trait BoundarySource {
    /// Boundary for the ordered pair `first`, `second`.
    fn pair(&mut self, first: &str, second: &str) -> Result<Option<Polygon>, LoadError>;
    /// Boundary keeping `glyph` inside `container`.
    fn container(&mut self, container: &str, glyph: &str) -> Result<Option<Polygon>, LoadError>;
}

/// Boundary files in one directory: `A-B.dat` for pairs and
/// `S-contains-A.dat` for containment.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    /// Read boundaries from files in this directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, name: String) -> Result<Option<Polygon>, LoadError> {
        let path = self.root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => parse_polygon(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LoadError::Io { path, source }),
        }
    }
}

impl BoundarySource for Directory {
    fn pair(&mut self, first: &str, second: &str) -> Result<Option<Polygon>, LoadError> {
        self.read(format!("{first}-{second}.dat"))
    }

    fn container(&mut self, container: &str, glyph: &str) -> Result<Option<Polygon>, LoadError> {
        self.read(format!("{container}-contains-{glyph}.dat"))
    }
}

/// Boundaries already held in memory, e.g. handed over by a browser.
#[derive(Debug, Clone, Default)]
pub struct InMemory {
    pairs: IndexMap<(String, String), Polygon>,
    containers: IndexMap<(String, String), Polygon>,
}

impl InMemory {
    /// Store the boundary for an ordered glyph pair.
    pub fn insert_pair(&mut self, first: &str, second: &str, polygon: Polygon) {
        self.pairs
            .insert((first.to_owned(), second.to_owned()), polygon);
    }

    /// Store the boundary keeping `glyph` inside `container`.
    pub fn insert_container(&mut self, container: &str, glyph: &str, polygon: Polygon) {
        self.containers
            .insert((container.to_owned(), glyph.to_owned()), polygon);
    }
}

impl BoundarySource for InMemory {
    fn pair(&mut self, first: &str, second: &str) -> Result<Option<Polygon>, LoadError> {
        Ok(self
            .pairs
            .get(&(first.to_owned(), second.to_owned()))
            .cloned())
    }

    fn container(&mut self, container: &str, glyph: &str) -> Result<Option<Polygon>, LoadError> {
        Ok(self
            .containers
            .get(&(container.to_owned(), glyph.to_owned()))
            .cloned())
    }
}

/// A session whose boundaries have all been found and checked.
#[derive(Debug)]
pub struct LoadedSession {
    glyphs: GlyphSet,
    labels: IndexMap<Label, ShapeId>,
    model: EnergyModel,
    placement: Placement,
}

impl Session {
    /// Shapes, their glyphs and starting positions, before any boundaries are needed.
    fn resolve(&self) -> Result<(GlyphSet, IndexMap<Label, ShapeId>, Vec<GlyphId>, Placement), LoadError> {
        if self.shapes.is_empty() {
            return Err(LoadError::NoShapes);
        }
        let mut glyphs = GlyphSet::default();
        let mut ids = IdGenerator::default();
        let mut labels = IndexMap::new();
        let mut shape_glyphs = Vec::with_capacity(self.shapes.len());
        let mut positions = Vec::with_capacity(self.shapes.len());
        for decl in &self.shapes {
            if labels.contains_key(&decl.label) {
                return Err(LoadError::DuplicateShape {
                    label: decl.label.to_string(),
                });
            }
            labels.insert(decl.label.clone(), ids.next_id());
            shape_glyphs.push(glyphs.intern(decl.glyph.as_str()));
            positions.push(decl.at);
        }
        Ok((glyphs, labels, shape_glyphs, Placement::new(positions)))
    }

    /// Energy settings and boundary frame, with later settings winning.
    fn energy_settings(&self, glyphs: &mut GlyphSet) -> (EnergySettings, BoundaryFrame) {
        let mut settings = EnergySettings::default();
        let mut frame = BoundaryFrame::default();
        for setting in &self.settings {
            match setting {
                Setting::Gap(gap) => settings.gap = *gap,
                Setting::UnitsPerWorld(u) => frame.units_per_world = *u,
                Setting::FlipY(flip) => frame.flip_y = *flip,
                Setting::Container(glyph) => settings.container = Some(glyphs.intern(glyph.as_str())),
            }
        }
        (settings, frame)
    }

    /// Fetch every boundary this session needs and build its energy model.
    pub fn load(&self, source: &mut impl BoundarySource) -> Result<LoadedSession, LoadError> {
        let (mut glyphs, labels, shape_glyphs, placement) = self.resolve()?;
        let (settings, frame) = self.energy_settings(&mut glyphs);
        let mut table = PairTable::new(frame)?;

        for key in EnergyModel::required_pairs(&shape_glyphs) {
            let (first, second) = (glyphs.name(key.first), glyphs.name(key.second));
            let polygon = source
                .pair(first, second)?
                .ok_or_else(|| LoadError::MissingPair {
                    first: first.to_owned(),
                    second: second.to_owned(),
                })?;
            table.insert(key, PairBoundary::new(polygon));
        }
        if let Some(container) = settings.container {
            let mut contained = shape_glyphs.clone();
            contained.sort_unstable();
            contained.dedup();
            for glyph in contained {
                let (outer, inner) = (glyphs.name(container), glyphs.name(glyph));
                let polygon = source.container(outer, inner)?.ok_or_else(|| {
                    LoadError::MissingContainer {
                        container: outer.to_owned(),
                        glyph: inner.to_owned(),
                    }
                })?;
                table.insert_container(container, glyph, PairBoundary::new(polygon));
            }
        }

        let model = EnergyModel::new(shape_glyphs, table, settings, &glyphs)?;
        tracing::debug!(
            shapes = model.num_shapes(),
            glyphs = glyphs.len(),
            pairs = model.table().len(),
            "session loaded"
        );
        Ok(LoadedSession {
            glyphs,
            labels,
            model,
            placement,
        })
    }

    /// Load from a directory of boundary files.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<LoadedSession, LoadError> {
        self.load(&mut Directory::new(dir.as_ref()))
    }
}

impl LoadedSession {
    /// Glyph names used by this session.
    pub fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }

    /// Shape labels, in shape ID order.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &Label> + '_ {
        self.labels.keys()
    }

    /// Which shape has this label.
    pub fn shape_id(&self, label: &str) -> Option<ShapeId> {
        self.labels.get(&Label::from(label)).copied()
    }

    /// The label of this shape.
    pub fn label(&self, id: ShapeId) -> Option<&Label> {
        self.labels.get_index(id as usize).map(|(label, _)| label)
    }

    /// The energy model built from the session's boundaries.
    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Starting positions from the session file.
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Swap the starting positions for a reproducible random scatter.
    pub fn scatter(&mut self, width: f64, height: f64, seed: u64) {
        self.placement = Placement::scatter(self.placement.len(), width, height, seed);
    }

    /// Move one shape's starting position.
    pub fn place(&mut self, id: ShapeId, at: Point) {
        self.placement.set_position(id, at);
    }

    /// Hand the model and placement over to a controller.
    pub fn into_controller(self, config: Config) -> Result<Controller, Error> {
        Controller::new(self.model, self.placement, config)
    }
}
