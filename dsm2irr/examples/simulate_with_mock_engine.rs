// Example: full request flow with the mock engine
// Builds an in-memory building store, queries the simulation neighborhood
// around a target id, prepares raster inputs in a per-request workspace,
// and runs the (mock) irradiance engine over them
use anyhow::Result;
use dsm2irr::config::RasterConfig;
use dsm2irr::engine::{EngineHandle, MockEngine, SimulationJob, WeatherStation};
use dsm2irr::geometric::building::Building;
use dsm2irr::geometric::wkb::Footprint;
use dsm2irr::pipeline::create_simulation_inputs;
use dsm2irr::source::{BuildingSource, MemoryBuildingSource};
use dsm2irr::workspace::RequestWorkspace;
use geo::polygon;
use std::path::Path;

fn square(origin_x: f64, origin_y: f64, edge: f64) -> Footprint {
    Footprint::Polygon(polygon![
        (x: origin_x, y: origin_y),
        (x: origin_x + edge, y: origin_y),
        (x: origin_x + edge, y: origin_y + edge),
        (x: origin_x, y: origin_y + edge),
        (x: origin_x, y: origin_y),
    ])
}

fn main() -> Result<()> {
    println!("=== Example: simulation request with the mock engine ===\n");

    let mut store = Vec::new();
    for (id, (x, floors)) in [(0.0, 3i64), (40.0, 1), (-60.0, 8), (2000.0, 5)]
        .into_iter()
        .enumerate()
    {
        let mut building = Building::new(id as i64 + 1, square(x, 0.0, 12.0));
        building.floor_count = Some(floors);
        store.push(building);
    }
    let source = MemoryBuildingSource::new(store);

    let target_id = 1;
    let target = source.target(target_id)?;
    // canvas is 1000 m across, so 700 m covers every drawable neighbor
    let neighbors = source.neighbors_within(target_id, 700.0)?;
    println!(
        "Neighborhood of building {}: {} of {} buildings",
        target_id,
        neighbors.len(),
        source.len()
    );

    let workspace = RequestWorkspace::create(Path::new("./temp"))?;
    let config = RasterConfig::default();
    let inputs = create_simulation_inputs(
        &target,
        &neighbors,
        &config,
        workspace.path(),
        "request",
    )?;
    println!("Buildings drawn: {}", inputs.buildings_drawn);

    let weather = WeatherStation {
        csv_path: "weather/38.csv".into(),
        latitude: 37.6,
        longitude: 127.2,
        elevation: 129.0,
    };
    let job = SimulationJob::roof(&inputs, weather, workspace.path().join("result_roof.csv"));

    let engine = EngineHandle::new(MockEngine);
    let records = engine.run(&job)?;
    println!("\nEngine returned {} records:", records.len());
    for record in &records {
        println!("  {:?}", record);
    }

    // workspace (and the rasters in it) are removed when it drops
    Ok(())
}
