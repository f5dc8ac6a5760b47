#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the statistics view.

use crowdwatch_location_models::{DensityLevel, Location};
use serde::{Deserialize, Serialize};

/// A location singled out by the statistics (most or least crowded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdedLocation {
    /// Location id.
    pub id: String,
    /// Location name.
    pub name: String,
    /// Current density.
    pub current_density: f64,
    /// Maximum capacity.
    pub max_capacity: u32,
    /// `current_density / max_capacity * 100`.
    pub occupancy_percent: f64,
    /// Qualitative level.
    pub level: DensityLevel,
}

impl From<&Location> for CrowdedLocation {
    fn from(loc: &Location) -> Self {
        Self {
            id: loc.id.clone(),
            name: loc.name.clone(),
            current_density: loc.current_density,
            max_capacity: loc.max_capacity,
            occupancy_percent: loc.occupancy_percent(),
            level: loc.density_level(),
        }
    }
}

/// One bar of the per-location occupancy chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyBar {
    /// Location name.
    pub name: String,
    /// Occupancy percentage.
    pub density: f64,
}

/// Aggregate statistics across all locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Number of locations aggregated.
    pub location_count: usize,
    /// Sum of current densities.
    pub total_density: f64,
    /// Sum of capacities.
    pub total_capacity: u64,
    /// `total_density / total_capacity * 100`, or `0` with no capacity.
    pub average_density: f64,
    /// Highest occupancy ratio; first encountered wins ties.
    pub most_crowded: Option<CrowdedLocation>,
    /// Lowest occupancy ratio; first encountered wins ties.
    pub least_crowded: Option<CrowdedLocation>,
    /// Per-location occupancy, in registry order.
    pub chart: Vec<OccupancyBar>,
}
