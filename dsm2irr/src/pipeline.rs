use anyhow::{Context, Result};
use ndarray::Array2;
use std::path::Path;

use crate::config::RasterConfig;
use crate::geometric::building::Building;
use crate::projection::Reprojector;
use crate::raster::anchor::AnchorFrame;
use crate::raster::fill::{entirely_outside, fill_footprint};
use crate::raster::layers::{write_layers, LayerPaths};

/// File-based inputs handed to the external simulation engine.
#[derive(Debug, Clone)]
pub struct SimulationInputs {
    pub layers: LayerPaths,
    /// Buildings actually drawn onto the grids; skipped ones excluded.
    pub buildings_drawn: usize,
}

/// Convert one request's buildings into the raster input set.
///
/// The target's centroid anchors the grid. Buildings are drawn in the order
/// supplied by the caller: height-surface overlap is last-write-wins, so
/// callers that need reproducible output must pin that order. The roof mask
/// accumulates an OR over all target-flagged buildings and is order
/// independent.
///
/// Holds no shared state between invocations; concurrent requests are safe
/// as long as each uses its own output directory or prefix.
pub fn create_simulation_inputs(
    target: &Building,
    buildings: &[Building],
    config: &RasterConfig,
    output_dir: &Path,
    prefix: &str,
) -> Result<SimulationInputs> {
    config.validate().context("invalid raster configuration")?;

    let reprojector = Reprojector::new(&config.projection)?;
    let target_metric = reprojector
        .project_footprint(&target.footprint)
        .with_context(|| format!("failed to reproject target building {}", target.id))?;
    let anchor = AnchorFrame::from_target(&target_metric, config)
        .with_context(|| format!("cannot anchor grid on target building {}", target.id))?;

    let size = config.canvas_size;
    let mut dsm = Array2::<f64>::zeros((size, size));
    let mut roof_mask = Array2::<u8>::zeros((size, size));

    let mut drawn = 0usize;
    for building in buildings {
        if !building.footprint.is_areal() {
            println!("Skipping building {} (no areal footprint)", building.id);
            continue;
        }
        let metric = reprojector
            .project_footprint(&building.footprint)
            .with_context(|| format!("failed to reproject building {}", building.id))?;
        let rings = anchor.pixel_rings(&metric);
        if entirely_outside(&rings, size) {
            continue;
        }
        draw_building(&mut dsm, &mut roof_mask, building, &rings, config);
        drawn += 1;
    }

    // facade masking is not computed; the engine receives the roof mask twice
    let facade_mask = roof_mask.clone();
    let layers = write_layers(output_dir, prefix, &dsm, &roof_mask, &facade_mask)
        .with_context(|| format!("failed to write raster layers for prefix {}", prefix))?;
    println!("Simulation inputs saved to: {:?}", output_dir);

    Ok(SimulationInputs {
        layers,
        buildings_drawn: drawn,
    })
}

/// Write one building's height over its footprint; target-flagged buildings
/// also raise the roof mask over the same cells. The mask is only ever set
/// to 1, never cleared.
pub fn draw_building(
    dsm: &mut Array2<f64>,
    roof_mask: &mut Array2<u8>,
    building: &Building,
    pixel_rings: &[Vec<(i64, i64)>],
    config: &RasterConfig,
) {
    fill_footprint(dsm, pixel_rings, building.height(config));
    if building.is_target {
        fill_footprint(roof_mask, pixel_rings, 1u8);
    }
}
