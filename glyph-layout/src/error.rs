use std::path::PathBuf;

/// Errors from loading shapes, boundaries and sessions.
/// These are fatal: a session cannot start until they are fixed.
#[derive(thiserror::Error, Debug)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum LoadError {
    /// A polygon needs at least 3 vertices.
    #[error("A polygon needs at least 3 vertices, but this one has {count}")]
    TooFewVertices {
        /// How many vertices were given.
        count: usize,
    },
    /// A vertex had an infinite or NaN coordinate.
    #[error("Vertex {index} has a non-finite coordinate")]
    NonFiniteVertex {
        /// Which vertex.
        index: usize,
    },
    /// The record header disagrees with the number of coordinate lines.
    #[error("The record declares {declared} vertices but contains {found}")]
    VertexCountMismatch {
        /// Count from the header line.
        declared: usize,
        /// Count of coordinate lines actually present.
        found: usize,
    },
    /// Text could not be parsed.
    #[error("Could not parse {what}: {message}")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// The parser's explanation.
        message: String,
    },
    /// A file could not be read.
    #[error("Could not read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The session defined no shapes.
    #[error("Cannot lay out an empty set of shapes")]
    NoShapes,
    /// Two shapes share a label.
    #[error("The shape {label} was declared more than once")]
    DuplicateShape {
        /// The repeated label.
        label: String,
    },
    /// A glyph was referenced but never registered.
    #[error("You referred to the glyph {label} but it was never defined")]
    UnknownGlyph {
        /// The undefined glyph.
        label: String,
    },
    /// No boundary was loaded for an ordered glyph pair the energy needs.
    #[error("No pair boundary was loaded for {first}-{second}")]
    MissingPair {
        /// First glyph of the ordered pair.
        first: String,
        /// Second glyph of the ordered pair.
        second: String,
    },
    /// No containment boundary was loaded for a glyph, but a container is set.
    #[error("No containment boundary was loaded for {glyph} inside {container}")]
    MissingContainer {
        /// The container glyph.
        container: String,
        /// The contained glyph.
        glyph: String,
    },
    /// A setting had a value outside its domain.
    #[error("Setting {name} = {value} is invalid: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Invalid optimizer tuning parameters.
#[derive(thiserror::Error, Debug, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum ConfigError {
    /// Armijo coefficient must lie strictly between 0 and 1.
    #[error("armijo must be in (0, 1), but was {0}")]
    Armijo(f64),
    /// Wolfe coefficient must lie strictly between the Armijo coefficient and 1.
    #[error("wolfe must be in (armijo, 1), but was {wolfe} with armijo {armijo}")]
    Wolfe {
        /// Given Wolfe coefficient.
        wolfe: f64,
        /// Given Armijo coefficient.
        armijo: f64,
    },
    /// Minimum bracket interval must be positive.
    #[error("min_interval must be positive, but was {0}")]
    MinInterval(f64),
    /// Numerical floor must be positive.
    #[error("epsd must be positive, but was {0}")]
    Epsd(f64),
    /// Convergence tolerance must be positive.
    #[error("convergence_tolerance must be positive, but was {0}")]
    Tolerance(f64),
    /// A frame must be allowed at least one step.
    #[error("max_steps must be at least 1")]
    NoSteps,
}

/// Anything that stops a [`crate::Controller`] from being built.
#[derive(thiserror::Error, Debug)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Error {
    /// Bad input data.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Bad optimizer tuning.
    #[error("Invalid optimizer config: {0}")]
    Config(#[from] ConfigError),
    /// The placement and the energy model disagree on how many shapes there are.
    #[error("The energy model has {shapes} shapes but the placement has {positions}")]
    PlacementSize {
        /// Shapes in the energy model.
        shapes: usize,
        /// Positions in the placement.
        positions: usize,
    },
}
