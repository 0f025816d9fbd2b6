use anyhow::{Context, Result};

use crate::config::RasterConfig;
use crate::geometric::wkb::Footprint;

/// Local pixel frame anchored at the target footprint's centroid.
///
/// The centroid maps to the canvas center cell; one pixel covers
/// `1 / pixels_per_meter` metres.
#[derive(Debug, Clone, Copy)]
pub struct AnchorFrame {
    pub center_x: f64,
    pub center_y: f64,
    pub canvas_size: usize,
    pub pixels_per_meter: f64,
}

impl AnchorFrame {
    /// Derive the frame from the target footprint in metric space.
    pub fn from_target(target: &Footprint, config: &RasterConfig) -> Result<Self> {
        let centroid = target
            .centroid()
            .context("target footprint has no centroid (empty or non-areal geometry)")?;
        Ok(AnchorFrame {
            center_x: centroid.x(),
            center_y: centroid.y(),
            canvas_size: config.canvas_size,
            pixels_per_meter: config.pixels_per_meter,
        })
    }

    /// Map a metric coordinate to grid cell coordinates.
    ///
    /// The Y axis is inverted: increasing metric Y maps to a decreasing row
    /// index (top-down raster row order). Results are not clamped;
    /// out-of-range cells are legal and handled by the rasterizer.
    pub fn to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let half = self.canvas_size as f64 / 2.0;
        let px = ((x - self.center_x) * self.pixels_per_meter + half).round() as i64;
        let py = (half - (y - self.center_y) * self.pixels_per_meter).round() as i64;
        (px, py)
    }

    /// Exterior rings of the footprint in pixel coordinates, one vertex per
    /// ring coordinate.
    pub fn pixel_rings(&self, footprint: &Footprint) -> Vec<Vec<(i64, i64)>> {
        footprint
            .exterior_rings()
            .iter()
            .map(|ring| ring.coords().map(|c| self.to_pixel(c.x, c.y)).collect())
            .collect()
    }
}
