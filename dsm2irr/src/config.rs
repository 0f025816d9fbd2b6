use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raster canvas and height knobs for one conversion request.
///
/// Grid dimensions and scale are fixed for the duration of a conversion;
/// `validate` is checked once per request before any processing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Canvas edge length in cells (the grid is square)
    pub canvas_size: usize,
    /// Grid resolution in pixels per metre
    pub pixels_per_meter: f64,
    /// Height of one storey in metres
    pub floor_height: f64,
    /// Minimum applied building height in metres
    pub min_height: f64,
    /// Optional reprojection of incoming geometry
    pub projection: ProjectionConfig,
}

impl Default for RasterConfig {
    fn default() -> Self {
        RasterConfig {
            canvas_size: 1000,
            pixels_per_meter: 1.0,
            floor_height: 3.3,
            min_height: 3.3,
            projection: ProjectionConfig::default(),
        }
    }
}

/// Reprojection settings.
///
/// Disabled by default: upstream stores that already hold projected metric
/// geometry pass through untouched. Which frame pair applies is always a
/// deployment choice made here, never inferred from the coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub enabled: bool,
    pub source_epsg: i32,
    pub target_epsg: i32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            enabled: false,
            source_epsg: 4326,
            target_epsg: 5186,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("canvas_size must be positive (got {0})")]
    CanvasSize(usize),
    #[error("pixels_per_meter must be positive and finite (got {0})")]
    PixelsPerMeter(f64),
}

impl RasterConfig {
    /// Reject unusable knobs before any grid is allocated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_size == 0 {
            return Err(ConfigError::CanvasSize(self.canvas_size));
        }
        if !self.pixels_per_meter.is_finite() || self.pixels_per_meter <= 0.0 {
            return Err(ConfigError::PixelsPerMeter(self.pixels_per_meter));
        }
        Ok(())
    }
}
