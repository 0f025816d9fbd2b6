use anyhow::{Context, Result};
use rstar::{primitives::GeomWithData, RTree};

use crate::geometric::building::Building;

/// Query contract of the building store.
///
/// Mirrors the upstream spatial database: one lookup for the target row and
/// one radius search for the simulation neighborhood. The target building
/// appears in its own neighborhood, flagged by id equality.
pub trait BuildingSource {
    fn target(&self, id: i64) -> Result<Building>;

    /// All buildings whose footprint centroid lies within `radius_m` metres
    /// of the target's centroid, with `is_target` set by id equality,
    /// ordered by id.
    fn neighbors_within(&self, id: i64, radius_m: f64) -> Result<Vec<Building>>;
}

type CentroidEntry = GeomWithData<[f64; 2], usize>;

/// In-memory building store over an R-tree of footprint centroids.
/// Buildings without a centroid (unsupported geometry) are stored but never
/// returned from the radius search.
pub struct MemoryBuildingSource {
    buildings: Vec<Building>,
    tree: RTree<CentroidEntry>,
}

impl MemoryBuildingSource {
    pub fn new(buildings: Vec<Building>) -> Self {
        let entries = buildings
            .iter()
            .enumerate()
            .filter_map(|(idx, b)| {
                b.footprint
                    .centroid()
                    .map(|c| CentroidEntry::new([c.x(), c.y()], idx))
            })
            .collect();
        MemoryBuildingSource {
            tree: RTree::bulk_load(entries),
            buildings,
        }
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

impl BuildingSource for MemoryBuildingSource {
    fn target(&self, id: i64) -> Result<Building> {
        self.buildings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .with_context(|| format!("target building {} not found", id))
    }

    fn neighbors_within(&self, id: i64, radius_m: f64) -> Result<Vec<Building>> {
        let target = self.target(id)?;
        let center = target
            .footprint
            .centroid()
            .with_context(|| format!("target building {} has no centroid", id))?;

        let mut neighbors: Vec<Building> = self
            .tree
            .locate_within_distance([center.x(), center.y()], radius_m * radius_m)
            .map(|entry| {
                let mut building = self.buildings[entry.data].clone();
                building.is_target = building.id == id;
                building
            })
            .collect();
        // R-tree iteration order is unspecified; downstream height overlap
        // is last-write-wins, so pin a stable order here
        neighbors.sort_by_key(|b| b.id);
        Ok(neighbors)
    }
}
