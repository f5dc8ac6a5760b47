#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory location registry.
//!
//! The registry is the dashboard's working set: a list of locations plus
//! the currently selected one. It starts from hardcoded seed data, only
//! ever grows by appending, and is never written to durable storage.

pub mod labels;
pub mod seed;

use crowdwatch_location_models::Location;
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No location has the requested id.
    #[error("Location not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A location with a negative or non-finite density was rejected.
    #[error("Invalid density {density} for location {name}")]
    InvalidDensity {
        /// Location name.
        name: String,
        /// The offending value.
        density: f64,
    },
}

/// Ordered list of locations with a single selection.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    locations: Vec<Location>,
    selected_id: Option<String>,
    last_id: u64,
}

impl LocationRegistry {
    /// Creates a registry from an initial list, selecting the first entry.
    #[must_use]
    pub fn new(locations: Vec<Location>) -> Self {
        let selected_id = locations.first().map(|l| l.id.clone());
        let last_id = locations
            .iter()
            .filter_map(|l| l.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            locations,
            selected_id,
            last_id,
        }
    }

    /// Creates a registry populated with [`seed::locations`].
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(seed::locations())
    }

    /// All locations in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    /// Number of locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the registry holds no locations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Looks up a location by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// The selected location, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Location> {
        self.selected_id.as_deref().and_then(|id| self.get(id))
    }

    /// Id of the selected location, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Makes the location with `id` the selected one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no location has that id; the
    /// previous selection is kept.
    pub fn select(&mut self, id: &str) -> Result<&Location, RegistryError> {
        let idx = self
            .locations
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
        self.selected_id = Some(id.to_string());
        Ok(&self.locations[idx])
    }

    /// Appends `location` and selects it.
    ///
    /// An empty or already-used id is replaced with a fresh one from
    /// [`Self::next_id`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDensity`] if the current density is
    /// negative or not finite.
    pub fn add(&mut self, mut location: Location) -> Result<&Location, RegistryError> {
        if !location.current_density.is_finite() || location.current_density < 0.0 {
            return Err(RegistryError::InvalidDensity {
                name: location.name,
                density: location.current_density,
            });
        }

        if location.id.is_empty() || self.get(&location.id).is_some() {
            location.id = self.next_id();
        } else if let Ok(id) = location.id.parse::<u64>() {
            self.last_id = self.last_id.max(id);
        }

        log::debug!("Adding location {} ({})", location.name, location.id);

        self.selected_id = Some(location.id.clone());
        self.locations.push(location);
        Ok(&self.locations[self.locations.len() - 1])
    }

    /// Locations whose name contains `term`, ignoring case.
    ///
    /// An empty term matches every location.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Location> {
        filter_by_name(&self.locations, term)
    }

    /// Issues a new timestamp-derived id (milliseconds since the epoch),
    /// bumped past any id this registry has already seen.
    pub fn next_id(&mut self) -> String {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id.to_string()
    }
}

/// Case-insensitive substring filter on location names.
#[must_use]
pub fn filter_by_name<'a>(locations: &'a [Location], term: &str) -> Vec<&'a Location> {
    if term.is_empty() {
        return locations.iter().collect();
    }
    let needle = term.to_lowercase();
    locations
        .iter()
        .filter(|l| l.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdwatch_location_models::DataPoint;

    fn loc(id: &str, name: &str) -> Location {
        Location {
            id: id.to_string(),
            name: name.to_string(),
            current_density: 10.0,
            max_capacity: 100,
            historical_data: vec![DataPoint::new("9am", 10.0)],
        }
    }

    #[test]
    fn first_location_is_selected_initially() {
        let registry = LocationRegistry::new(vec![loc("1", "Plaza"), loc("2", "Station")]);
        assert_eq!(registry.selected_id(), Some("1"));
        assert!(LocationRegistry::default().selected().is_none());
    }

    #[test]
    fn add_appends_and_selects() {
        let mut registry = LocationRegistry::new(vec![loc("1", "Plaza"), loc("2", "Station")]);
        let added_id = registry.add(loc("", "Market")).unwrap().id.clone();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.all()[0].name, "Plaza");
        assert_eq!(registry.all()[2].name, "Market");
        assert_eq!(registry.selected_id(), Some(added_id.as_str()));
        assert!(!added_id.is_empty());
    }

    #[test]
    fn add_never_replaces_existing_id() {
        let mut registry = LocationRegistry::new(vec![loc("1", "Plaza")]);
        let id = registry.add(loc("1", "Copy")).unwrap().id.clone();
        assert_ne!(id, "1");
        assert_eq!(registry.get("1").unwrap().name, "Plaza");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn add_rejects_negative_density() {
        let mut registry = LocationRegistry::new(vec![loc("1", "Plaza")]);
        let mut bad = loc("", "Void");
        bad.current_density = -1.0;
        assert!(matches!(
            registry.add(bad),
            Err(RegistryError::InvalidDensity { .. })
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.selected_id(), Some("1"));
    }

    #[test]
    fn next_id_is_strictly_increasing() {
        let mut registry = LocationRegistry::default();
        let a: u64 = registry.next_id().parse().unwrap();
        let b: u64 = registry.next_id().parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn select_unknown_keeps_selection() {
        let mut registry = LocationRegistry::new(vec![loc("1", "Plaza"), loc("2", "Station")]);
        assert!(registry.select("9").is_err());
        assert_eq!(registry.selected_id(), Some("1"));
        assert_eq!(registry.select("2").unwrap().name, "Station");
        assert_eq!(registry.selected().unwrap().id, "2");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let registry = LocationRegistry::new(vec![
            loc("1", "Central Plaza"),
            loc("2", "Union Station"),
            loc("3", "Plaza Mall"),
        ]);
        let names: Vec<&str> = registry
            .search("PLAZA")
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["Central Plaza", "Plaza Mall"]);
        assert_eq!(registry.search("").len(), 3);
        assert!(registry.search("airport").is_empty());
    }

    #[test]
    fn search_term_whitespace_is_significant() {
        let locations = vec![loc("1", "Central Plaza"), loc("2", "Plaza Mall")];
        let names: Vec<&str> = filter_by_name(&locations, " plaza")
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["Central Plaza"]);
        assert!(filter_by_name(&locations, "   ").is_empty());
    }

    #[test]
    fn next_id_stays_ahead_of_added_numeric_ids() {
        let far_future = u64::MAX - 1;
        let mut registry = LocationRegistry::new(vec![loc("1", "Plaza")]);
        registry.add(loc(&far_future.to_string(), "Future")).unwrap();

        let next: u64 = registry.next_id().parse().unwrap();
        assert!(next > far_future);
        assert!(registry.get(&next.to_string()).is_none());
    }

    #[test]
    fn next_id_does_not_overflow() {
        let mut registry = LocationRegistry::new(vec![loc(&u64::MAX.to_string(), "Edge")]);
        assert_eq!(registry.next_id(), u64::MAX.to_string());
    }
}
