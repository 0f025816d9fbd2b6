use anyhow::{Context, Result};
use geojson::Feature;
use serde::{Deserialize, Serialize};

use crate::config::RasterConfig;
use crate::geometric::wkb::{self, Footprint};

/// One building as supplied by the data source, read-only input to a
/// conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub footprint: Footprint,
    /// Number of storeys; absent or zero falls back to one storey.
    pub floor_count: Option<i64>,
    pub is_target: bool,
}

impl Building {
    pub fn new(id: i64, footprint: Footprint) -> Self {
        Building {
            id,
            footprint,
            floor_count: None,
            is_target: false,
        }
    }

    /// Decode a building from its raw geometry payload (WKB bytes or the
    /// hexadecimal text form).
    pub fn from_wkb(
        id: i64,
        payload: &[u8],
        floor_count: Option<i64>,
        is_target: bool,
    ) -> Result<Self> {
        let footprint = wkb::decode(payload)
            .with_context(|| format!("failed to decode geometry for building {}", id))?;
        Ok(Building {
            id,
            footprint,
            floor_count,
            is_target,
        })
    }

    /// Applied height in metres: `max(floors * floor_height, min_height)`,
    /// with one storey substituted when the floor count is absent or zero.
    pub fn height(&self, config: &RasterConfig) -> f64 {
        let floors = match self.floor_count {
            None | Some(0) => 1,
            Some(n) => n,
        };
        (floors as f64 * config.floor_height).max(config.min_height)
    }

    /// Build from a GeoJSON feature. Returns `None` for features without an
    /// areal geometry, so collections with stray points or lines load
    /// cleanly. Storey counts are picked up from the usual property names.
    pub fn from_geojson_feature(id: i64, feature: &Feature) -> Result<Option<Self>> {
        let Some(geometry) = feature.geometry.as_ref() else {
            return Ok(None);
        };
        let geo_geom: geo::Geometry<f64> = geometry
            .try_into()
            .context("failed to convert GeoJSON geometry")?;
        let footprint = match geo_geom {
            geo::Geometry::Polygon(p) => Footprint::Polygon(p),
            geo::Geometry::MultiPolygon(mp) => Footprint::MultiPolygon(mp),
            _ => return Ok(None),
        };

        let mut building = Building::new(id, footprint);
        if let Some(properties) = &feature.properties {
            for (key, value) in properties {
                match key.to_lowercase().as_str() {
                    "floors" | "floor_count" | "gro_flo_co" | "storeys" => {
                        if let Some(n) = value.as_i64() {
                            building.floor_count = Some(n);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(Some(building))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn unit_square() -> Footprint {
        Footprint::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ])
    }

    #[test]
    fn test_height_from_floors() {
        let config = RasterConfig::default();
        let mut building = Building::new(1, unit_square());
        building.floor_count = Some(3);
        assert!((building.height(&config) - 9.9).abs() < 1e-9);
    }

    #[test]
    fn test_height_defaults_to_one_storey() {
        let config = RasterConfig::default();
        for floors in [None, Some(0)] {
            let mut building = Building::new(1, unit_square());
            building.floor_count = floors;
            assert!(
                (building.height(&config) - 3.3).abs() < 1e-9,
                "floor_count {:?} should give the minimum height",
                floors
            );
        }
    }

    #[test]
    fn test_height_never_below_minimum() {
        let config = RasterConfig::default();
        let mut building = Building::new(1, unit_square());
        building.floor_count = Some(-2);
        assert!((building.height(&config) - 3.3).abs() < 1e-9);
    }

    #[test]
    fn test_from_wkb_error_names_building() {
        let err = Building::from_wkb(42, b"", None, false).unwrap_err();
        assert!(format!("{}", err).contains("building 42"));
    }

    #[test]
    fn test_from_geojson_feature() {
        let feature: Feature = serde_json::from_str(
            r#"{
                "type": "Feature",
                "properties": { "floors": 4, "name": "Warehouse" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]
                }
            }"#,
        )
        .unwrap();
        let building = Building::from_geojson_feature(7, &feature).unwrap().unwrap();
        assert_eq!(building.id, 7);
        assert_eq!(building.floor_count, Some(4));
        assert!(building.footprint.is_areal());
    }

    #[test]
    fn test_from_geojson_point_skipped() {
        let feature: Feature = serde_json::from_str(
            r#"{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            }"#,
        )
        .unwrap();
        assert!(Building::from_geojson_feature(1, &feature).unwrap().is_none());
    }
}
