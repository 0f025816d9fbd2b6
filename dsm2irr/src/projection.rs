use anyhow::{Context, Result};
use geo::algorithm::map_coords::MapCoords;
use proj::Proj;

use crate::config::ProjectionConfig;
use crate::geometric::wkb::Footprint;

/// Source-frame to metric-frame transform for one conversion request.
///
/// Built once per request. The identity when reprojection is disabled or
/// both frames are the same EPSG code; no `proj` handle is created in that
/// case.
pub struct Reprojector {
    proj: Option<Proj>,
}

impl Reprojector {
    pub fn new(config: &ProjectionConfig) -> Result<Self> {
        if !config.enabled || config.source_epsg == config.target_epsg {
            return Ok(Reprojector { proj: None });
        }
        let from_crs = format!("EPSG:{}", config.source_epsg);
        let to_crs = format!("EPSG:{}", config.target_epsg);
        let proj = Proj::new_known_crs(&from_crs, &to_crs, None).context(format!(
            "Failed to create projection {} -> {}",
            from_crs, to_crs
        ))?;
        Ok(Reprojector { proj: Some(proj) })
    }

    /// True when coordinates pass through unchanged.
    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    /// Transform a single coordinate pair.
    pub fn project_coords(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match &self.proj {
            None => Ok((x, y)),
            Some(proj) => proj
                .convert((x, y))
                .context("Failed to transform coordinates"),
        }
    }

    /// Transform every coordinate of a footprint into the target frame.
    pub fn project_footprint(&self, footprint: &Footprint) -> Result<Footprint> {
        let Some(proj) = &self.proj else {
            return Ok(footprint.clone());
        };
        match footprint {
            Footprint::Polygon(p) => {
                let projected = p
                    .try_map_coords(|c| {
                        let (x, y) = proj.convert((c.x, c.y))?;
                        Ok::<_, proj::ProjError>(geo::coord! { x: x, y: y })
                    })
                    .context("Failed to transform polygon coordinates")?;
                Ok(Footprint::Polygon(projected))
            }
            Footprint::MultiPolygon(mp) => {
                let projected = mp
                    .try_map_coords(|c| {
                        let (x, y) = proj.convert((c.x, c.y))?;
                        Ok::<_, proj::ProjError>(geo::coord! { x: x, y: y })
                    })
                    .context("Failed to transform multipolygon coordinates")?;
                Ok(Footprint::MultiPolygon(projected))
            }
            Footprint::Unsupported { .. } => Ok(footprint.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_disabled_is_identity() {
        let reprojector = Reprojector::new(&ProjectionConfig::default()).unwrap();
        assert!(reprojector.is_identity());
        assert_eq!(reprojector.project_coords(127.2, 37.6).unwrap(), (127.2, 37.6));
    }

    #[test]
    fn test_same_frame_is_identity() {
        let config = ProjectionConfig {
            enabled: true,
            source_epsg: 5186,
            target_epsg: 5186,
        };
        let reprojector = Reprojector::new(&config).unwrap();
        assert!(reprojector.is_identity());
    }

    #[test]
    fn test_identity_footprint_unchanged() {
        let reprojector = Reprojector::new(&ProjectionConfig::default()).unwrap();
        let footprint = Footprint::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ]);
        assert_eq!(reprojector.project_footprint(&footprint).unwrap(), footprint);
    }

    #[test]
    fn test_geographic_to_projected() {
        // Needs proj data installed; only assert when the transform builds
        let config = ProjectionConfig {
            enabled: true,
            source_epsg: 4326,
            target_epsg: 5186,
        };
        if let Ok(reprojector) = Reprojector::new(&config) {
            let (x, y) = reprojector.project_coords(127.2, 37.6).unwrap();
            assert!(x.is_finite() && y.is_finite());
            assert!((x - 127.2).abs() > 1.0, "projected frame should be metric");
        }
    }
}
