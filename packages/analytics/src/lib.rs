#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate crowd statistics.
//!
//! All functions are pure and operate on a slice of locations in registry
//! order. Ratios use [`Location::occupancy_ratio`], so zero-capacity
//! locations never divide by zero.

use crowdwatch_analytics_models::{CrowdedLocation, OccupancyBar, StatsSummary};
use crowdwatch_location_models::Location;

/// Overall density as a percentage: `Σ current / Σ capacity × 100`.
///
/// Returns `0.0` when the total capacity is zero (including when there are
/// no locations).
#[must_use]
pub fn average_density(locations: &[Location]) -> f64 {
    let total_capacity = total_capacity(locations);
    if total_capacity == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let capacity = total_capacity as f64;
    total_density(locations) / capacity * 100.0
}

/// Location with the highest occupancy ratio. Ties keep the first one.
#[must_use]
pub fn most_crowded(locations: &[Location]) -> Option<&Location> {
    locations.iter().fold(None, |best, loc| match best {
        Some(b) if b.occupancy_ratio() >= loc.occupancy_ratio() => Some(b),
        _ => Some(loc),
    })
}

/// Location with the lowest occupancy ratio. Ties keep the first one.
#[must_use]
pub fn least_crowded(locations: &[Location]) -> Option<&Location> {
    locations.iter().fold(None, |best, loc| match best {
        Some(b) if b.occupancy_ratio() <= loc.occupancy_ratio() => Some(b),
        _ => Some(loc),
    })
}

/// Occupancy percentage per location, for the bar chart.
#[must_use]
pub fn occupancy_chart(locations: &[Location]) -> Vec<OccupancyBar> {
    locations
        .iter()
        .map(|loc| OccupancyBar {
            name: loc.name.clone(),
            density: loc.occupancy_percent(),
        })
        .collect()
}

/// Computes the full statistics summary.
#[must_use]
pub fn summarize(locations: &[Location]) -> StatsSummary {
    log::debug!("Summarizing {} locations", locations.len());

    StatsSummary {
        location_count: locations.len(),
        total_density: total_density(locations),
        total_capacity: total_capacity(locations),
        average_density: average_density(locations),
        most_crowded: most_crowded(locations).map(CrowdedLocation::from),
        least_crowded: least_crowded(locations).map(CrowdedLocation::from),
        chart: occupancy_chart(locations),
    }
}

fn total_density(locations: &[Location]) -> f64 {
    locations.iter().map(|l| l.current_density).sum()
}

fn total_capacity(locations: &[Location]) -> u64 {
    locations.iter().map(|l| u64::from(l.max_capacity)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: &str, density: f64, capacity: u32) -> Location {
        Location {
            id: id.to_string(),
            name: format!("Location {id}"),
            current_density: density,
            max_capacity: capacity,
            historical_data: Vec::new(),
        }
    }

    #[test]
    fn average_is_ratio_of_sums() {
        let locations = vec![loc("a", 30.0, 100), loc("b", 90.0, 300)];
        assert!((average_density(&locations) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert!(average_density(&[]).abs() < f64::EPSILON);
        assert!(average_density(&[loc("a", 5.0, 0)]).abs() < f64::EPSILON);
    }

    #[test]
    fn extremes_by_ratio_not_absolute_density() {
        let locations = vec![
            loc("a", 100.0, 1000), // 10%
            loc("b", 45.0, 50),    // 90%
            loc("c", 20.0, 100),   // 20%
        ];
        assert_eq!(most_crowded(&locations).unwrap().id, "b");
        assert_eq!(least_crowded(&locations).unwrap().id, "a");
    }

    #[test]
    fn ties_resolve_to_first_encountered() {
        let locations = vec![
            loc("a", 50.0, 100),
            loc("b", 25.0, 50),
            loc("c", 10.0, 20),
        ];
        assert_eq!(most_crowded(&locations).unwrap().id, "a");
        assert_eq!(least_crowded(&locations).unwrap().id, "a");
    }

    #[test]
    fn empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.location_count, 0);
        assert!(summary.most_crowded.is_none());
        assert!(summary.least_crowded.is_none());
        assert!(summary.chart.is_empty());
    }

    #[test]
    fn summary_chart_follows_registry_order() {
        let locations = vec![loc("a", 30.0, 100), loc("b", 80.0, 100)];
        let summary = summarize(&locations);
        assert_eq!(summary.chart.len(), 2);
        assert_eq!(summary.chart[0].name, "Location a");
        assert!((summary.chart[1].density - 80.0).abs() < 1e-9);
        assert_eq!(summary.most_crowded.unwrap().id, "b");
        assert_eq!(summary.total_capacity, 200);
    }
}
