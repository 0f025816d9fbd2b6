use anyhow::{Context, Result};
use ndarray::Array2;
use ndarray_npy::write_npy;
use std::path::{Path, PathBuf};

/// Paths of the three raster layers consumed by the simulation engine.
#[derive(Debug, Clone)]
pub struct LayerPaths {
    pub dsm: PathBuf,
    pub roof_mask: PathBuf,
    pub facade_mask: PathBuf,
}

/// Persist the produced grids as NumPy arrays.
///
/// Writes `{prefix}_floco.npy` (float64 height surface), `{prefix}_rm_roof.npy`
/// and `{prefix}_rm_facade.npy` (uint8 masks), each keeping the exact dtype
/// and `canvas × canvas` shape of its in-memory grid. The output directory
/// and any missing parents are created; repeated calls with the same prefix
/// overwrite earlier output.
///
/// The facade mask is currently always an exact copy of the roof mask: real
/// facade masking needs a height-aware silhouette projection that is not
/// computed here.
pub fn write_layers(
    output_dir: &Path,
    prefix: &str,
    dsm: &Array2<f64>,
    roof_mask: &Array2<u8>,
    facade_mask: &Array2<u8>,
) -> Result<LayerPaths> {
    std::fs::create_dir_all(output_dir).context(format!(
        "Failed to create output directory: {:?}",
        output_dir
    ))?;

    let paths = LayerPaths {
        dsm: output_dir.join(format!("{}_floco.npy", prefix)),
        roof_mask: output_dir.join(format!("{}_rm_roof.npy", prefix)),
        facade_mask: output_dir.join(format!("{}_rm_facade.npy", prefix)),
    };

    write_npy(&paths.dsm, dsm).context(format!(
        "Failed to write height surface: {:?}",
        paths.dsm
    ))?;
    write_npy(&paths.roof_mask, roof_mask).context(format!(
        "Failed to write roof mask: {:?}",
        paths.roof_mask
    ))?;
    write_npy(&paths.facade_mask, facade_mask).context(format!(
        "Failed to write facade mask: {:?}",
        paths.facade_mask
    ))?;

    Ok(paths)
}
