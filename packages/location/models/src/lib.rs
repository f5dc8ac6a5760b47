#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Location and crowd density types.
//!
//! A [`Location`] carries its current density, its maximum capacity and a
//! labelled history of density observations. The qualitative
//! [`DensityLevel`] is always derived from the occupancy ratio and is never
//! stored.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Occupancy ratio below which a location is considered [`DensityLevel::Low`].
pub const LOW_THRESHOLD: f64 = 0.40;

/// Occupancy ratio at or above which a location is [`DensityLevel::High`].
pub const HIGH_THRESHOLD: f64 = 0.70;

/// A labelled density observation, e.g. `{ time: "5pm", density: 120 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Time label. Hourly labels use the `9am`, `12pm`, `5pm` form.
    pub time: String,
    /// Observed (or predicted) density.
    pub density: f64,
}

impl DataPoint {
    /// Creates a new data point.
    #[must_use]
    pub fn new(time: impl Into<String>, density: f64) -> Self {
        Self {
            time: time.into(),
            density,
        }
    }
}

/// A monitored location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Timestamp-derived identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current density. Never negative, may exceed `max_capacity`.
    pub current_density: f64,
    /// Maximum capacity.
    pub max_capacity: u32,
    /// Past observations, oldest first.
    pub historical_data: Vec<DataPoint>,
}

impl Location {
    /// `current_density / max_capacity`.
    ///
    /// A zero capacity yields `0.0` for an empty location and
    /// [`f64::INFINITY`] otherwise, so an over-full zero-capacity location
    /// still classifies as [`DensityLevel::High`].
    #[must_use]
    pub fn occupancy_ratio(&self) -> f64 {
        occupancy_ratio(self.current_density, self.max_capacity)
    }

    /// Occupancy as a percentage of capacity.
    #[must_use]
    pub fn occupancy_percent(&self) -> f64 {
        self.occupancy_ratio() * 100.0
    }

    /// Qualitative crowd level for the current density.
    #[must_use]
    pub fn density_level(&self) -> DensityLevel {
        DensityLevel::from_ratio(self.occupancy_ratio())
    }

    /// The last `count` historical densities, oldest first.
    #[must_use]
    pub fn recent_densities(&self, count: usize) -> Vec<f64> {
        let skip = self.historical_data.len().saturating_sub(count);
        self.historical_data
            .iter()
            .skip(skip)
            .map(|p| p.density)
            .collect()
    }
}

/// Computes `density / capacity` with the zero-capacity convention
/// described on [`Location::occupancy_ratio`].
#[must_use]
pub fn occupancy_ratio(density: f64, capacity: u32) -> f64 {
    if capacity == 0 {
        if density > 0.0 { f64::INFINITY } else { 0.0 }
    } else {
        density / f64::from(capacity)
    }
}

/// Qualitative crowd level.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DensityLevel {
    /// Under 40% of capacity.
    Low,
    /// 40% up to (but excluding) 70% of capacity.
    Medium,
    /// 70% of capacity or more.
    High,
}

impl DensityLevel {
    /// Classifies an occupancy ratio.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < LOW_THRESHOLD {
            Self::Low
        } else if ratio < HIGH_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Classifies a raw density against a capacity.
    #[must_use]
    pub fn classify(density: f64, capacity: u32) -> Self {
        Self::from_ratio(occupancy_ratio(density, capacity))
    }
}

/// Who authored a chat message.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    /// The person using the dashboard.
    User,
    /// The assistant.
    Model,
}

/// One message in a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author.
    pub role: ChatRole,
    /// Message body.
    pub text: String,
}

impl ChatMessage {
    /// A message authored by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// A message authored by the assistant.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(density: f64, capacity: u32) -> Location {
        Location {
            id: "1".to_string(),
            name: "Plaza".to_string(),
            current_density: density,
            max_capacity: capacity,
            historical_data: Vec::new(),
        }
    }

    #[test]
    fn classifies_documented_examples() {
        assert_eq!(location(30.0, 100).density_level(), DensityLevel::Low);
        assert_eq!(location(50.0, 100).density_level(), DensityLevel::Medium);
        assert_eq!(location(90.0, 100).density_level(), DensityLevel::High);
    }

    #[test]
    fn classification_boundaries_are_inclusive_at_lower_edge() {
        assert_eq!(DensityLevel::classify(39.0, 100), DensityLevel::Low);
        assert_eq!(DensityLevel::classify(40.0, 100), DensityLevel::Medium);
        assert_eq!(DensityLevel::classify(69.0, 100), DensityLevel::Medium);
        assert_eq!(DensityLevel::classify(70.0, 100), DensityLevel::High);
        assert_eq!(DensityLevel::classify(250.0, 100), DensityLevel::High);
    }

    #[test]
    fn zero_capacity_ratio() {
        assert!(occupancy_ratio(0.0, 0).abs() < f64::EPSILON);
        assert!(occupancy_ratio(5.0, 0).is_infinite());
        assert_eq!(DensityLevel::classify(5.0, 0), DensityLevel::High);
        assert_eq!(DensityLevel::classify(0.0, 0), DensityLevel::Low);
    }

    #[test]
    fn recent_densities_takes_tail() {
        let mut loc = location(10.0, 100);
        loc.historical_data = (0..7)
            .map(|i| DataPoint::new(format!("{i}"), f64::from(i)))
            .collect();
        assert_eq!(loc.recent_densities(5), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(loc.recent_densities(20).len(), 7);
    }

    #[test]
    fn location_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(location(12.0, 40)).unwrap();
        assert_eq!(json["currentDensity"], 12.0);
        assert_eq!(json["maxCapacity"], 40);
        assert!(json["historicalData"].is_array());
    }

    #[test]
    fn chat_role_parses_lowercase() {
        assert_eq!("model".parse::<ChatRole>().unwrap(), ChatRole::Model);
        assert_eq!(ChatRole::User.to_string(), "user");
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"model","text":"hi"}"#).unwrap();
        assert_eq!(msg, ChatMessage::model("hi"));
    }
}
