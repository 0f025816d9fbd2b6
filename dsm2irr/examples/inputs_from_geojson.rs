// Example: preparing simulation inputs from GeoJSON buildings
// Loads a small FeatureCollection, anchors the grid on the target building,
// and writes the three raster layers to ./output
use anyhow::{Context, Result};
use dsm2irr::config::RasterConfig;
use dsm2irr::geometric::building::Building;
use dsm2irr::pipeline::create_simulation_inputs;
use geojson::GeoJson;
use std::path::Path;

fn main() -> Result<()> {
    println!("=== Example: simulation inputs from GeoJSON ===\n");

    let geojson_data = r#"
    {
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "floors": 3, "name": "Office block" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": { "floors": 1, "name": "Warehouse" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [50.0, 0.0], [60.0, 0.0], [60.0, 10.0], [50.0, 10.0], [50.0, 0.0]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Bus stop" },
                "geometry": { "type": "Point", "coordinates": [30.0, 5.0] }
            }
        ]
    }
    "#;

    let geojson: GeoJson = geojson_data.parse().context("failed to parse GeoJSON")?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        anyhow::bail!("expected a FeatureCollection");
    };

    let mut buildings = Vec::new();
    for (idx, feature) in collection.features.iter().enumerate() {
        match Building::from_geojson_feature(idx as i64 + 1, feature)? {
            Some(building) => buildings.push(building),
            None => println!("Feature {} has no areal footprint, skipping", idx + 1),
        }
    }
    println!("Buildings loaded: {}", buildings.len());

    // anchor on the first building
    let mut target = buildings[0].clone();
    target.is_target = true;
    buildings[0].is_target = true;

    let config = RasterConfig::default();
    let inputs = create_simulation_inputs(
        &target,
        &buildings,
        &config,
        Path::new("./output"),
        "sample",
    )?;

    println!("\nBuildings drawn: {}", inputs.buildings_drawn);
    println!("Height surface: {:?}", inputs.layers.dsm);
    println!("Roof mask:      {:?}", inputs.layers.roof_mask);
    println!("Facade mask:    {:?}", inputs.layers.facade_mask);

    Ok(())
}
