//! Hardcoded locations the dashboard starts with.

use crowdwatch_location_models::{DataPoint, Location};

use crate::labels::hour_range;

/// First hour of the seeded working day (24-hour clock).
pub const DAY_START_HOUR: u32 = 9;

/// Last hour of the seeded working day (24-hour clock).
pub const DAY_END_HOUR: u32 = 17;

const SEED: &[(&str, &str, u32, [u32; 9])] = &[
    (
        "1",
        "Central Plaza",
        500,
        [80, 120, 210, 340, 410, 380, 300, 260, 310],
    ),
    (
        "2",
        "Union Station",
        1200,
        [950, 700, 420, 390, 450, 430, 520, 780, 1020],
    ),
    (
        "3",
        "Riverside Park",
        800,
        [60, 90, 150, 220, 260, 240, 210, 180, 150],
    ),
    (
        "4",
        "City Library",
        250,
        [20, 45, 70, 95, 110, 120, 105, 90, 60],
    ),
    (
        "5",
        "Harbor Market",
        600,
        [150, 260, 380, 470, 520, 480, 400, 330, 270],
    ),
];

/// Builds the seed locations, each with nine hourly observations from
/// 9am to 5pm and a current density equal to the 5pm observation.
#[must_use]
pub fn locations() -> Vec<Location> {
    let labels = hour_range(DAY_START_HOUR, DAY_END_HOUR);

    SEED.iter()
        .map(|(id, name, capacity, densities)| {
            let historical_data: Vec<DataPoint> = labels
                .iter()
                .zip(densities.iter())
                .map(|(time, density)| DataPoint::new(time.clone(), f64::from(*density)))
                .collect();
            let current_density = historical_data.last().map_or(0.0, |p| p.density);

            Location {
                id: (*id).to_string(),
                name: (*name).to_string(),
                current_density,
                max_capacity: *capacity,
                historical_data,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_locations_are_well_formed() {
        let locations = locations();
        assert_eq!(locations.len(), 5);
        for loc in &locations {
            assert_eq!(loc.historical_data.len(), 9);
            assert_eq!(loc.historical_data[0].time, "9am");
            assert_eq!(loc.historical_data[8].time, "5pm");
            let last = loc.historical_data[8].density;
            assert!((loc.current_density - last).abs() < f64::EPSILON);
        }
    }
}
