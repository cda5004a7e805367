//! Field visualization for pair boundaries and the energy.
//!
//! Renders a scalar field over a window of the plane and saves it as an image,
//! useful as a sanity check when changing distance or energy math: the image should change.

use std::io;
use std::path::Path;

use crate::{
    datatypes::Point,
    energy::EnergyModel,
    id::ShapeId,
    pair_table::{BoundaryFrame, PairBoundary},
};

/// Field magnitude below this is drawn as turquoise (the zero level set).
const ZERO_LEVEL_THRESHOLD: f64 = 0.08;

/// Turquoise color for the zero level set (R, G, B).
const TURQUOISE: [u8; 3] = [64, 224, 208];

/// The rectangle of the plane to draw, and how many pixels to draw it with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    /// Lowest X coordinate (left edge).
    pub x_min: f64,
    /// Highest X coordinate (right edge).
    pub x_max: f64,
    /// Lowest Y coordinate (top row).
    pub y_min: f64,
    /// Highest Y coordinate (bottom row).
    pub y_max: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Window {
    /// World coordinates of the center of this pixel.
    fn world(&self, px: u32, py: u32) -> Point {
        Point::new(
            self.x_min + (self.x_max - self.x_min) * (f64::from(px) + 0.5) / f64::from(self.width),
            self.y_min + (self.y_max - self.y_min) * (f64::from(py) + 0.5) / f64::from(self.height),
        )
    }
}

/// Paint `field` over `window`: concentric grey rings by magnitude,
/// turquoise where it is nearly zero.
fn render_field(window: Window, mut field: impl FnMut(Point) -> f64) -> image::RgbImage {
    let ring_scale = 1.0_f64;
    let mut buf = image::RgbImage::new(window.width, window.height);
    for py in 0..window.height {
        for px in 0..window.width {
            let mag = field(window.world(px, py)).abs();
            let pixel = if mag < ZERO_LEVEL_THRESHOLD {
                image::Rgb(TURQUOISE)
            } else {
                let value = mag * ring_scale;
                let fractional = value - value.trunc();
                let intensity = (255.0 - fractional * 255.0).round() as u8;
                image::Rgb([intensity, intensity, intensity])
            };
            buf.put_pixel(px, py, pixel);
        }
    }
    buf
}

/// Renders the signed separation of a pair boundary, as a function of the displacement.
/// The turquoise ring is where the two outlines touch.
pub fn render_boundary_field_to_image(
    boundary: &PairBoundary,
    frame: BoundaryFrame,
    window: Window,
) -> image::RgbImage {
    render_field(window, |d| boundary.query(frame, d))
}

/// Renders the energy as one shape moves over the window, with every other shape held still.
pub fn render_shape_energy_to_image(
    model: &EnergyModel,
    coords: &[f64],
    shape: ShapeId,
    window: Window,
) -> image::RgbImage {
    let mut scratch = coords.to_vec();
    let i = 2 * shape as usize;
    render_field(window, |p| {
        scratch[i] = p.x;
        scratch[i + 1] = p.y;
        model.energy(&scratch)
    })
}

/// Renders a pair boundary's field and writes it as an image.
///
/// Returns an error if the image could not be written.
pub fn render_boundary_field(
    path: &Path,
    boundary: &PairBoundary,
    frame: BoundaryFrame,
    window: Window,
) -> Result<(), io::Error> {
    let buf = render_boundary_field_to_image(boundary, frame, window);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    buf.save(path).map_err(io::Error::other)
}
