use fleetcore::fleet::{TelemetryState, VehicleRecord};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const MODELS: [(&str, &str); 5] = [
    ("Cargo Van", "Diesel Van"),
    ("City Runner", "EV Hatchback"),
    ("Hauler", "Diesel Truck"),
    ("Shuttle", "Petrol Minibus"),
    ("Courier", "EV Van"),
];

const LOCATIONS: [&str; 4] = [
    "Park Street, Kolkata",
    "Connaught Place, New Delhi",
    "Andheri East, Mumbai",
    "Whitefield, Bengaluru",
];

/// Settings for generating a synthetic fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetProfile {
    pub count: usize,
    pub seed: u64,
    pub prefix: String,
}

impl Default for FleetProfile {
    fn default() -> Self {
        Self {
            count: 6,
            seed: 0,
            prefix: "FLT".into(),
        }
    }
}

/// Builds `count` available vehicles with randomised starting readings.
pub fn build_fleet(profile: &FleetProfile) -> Vec<VehicleRecord> {
    let mut rng = StdRng::seed_from_u64(profile.seed);

    (0..profile.count)
        .map(|index| {
            let (name, vehicle_type) = MODELS[rng.gen_range(0..MODELS.len())];
            let location = LOCATIONS[index % LOCATIONS.len()];
            let reading = TelemetryState::new(
                f64::from(rng.gen_range(20u8..=100)),
                f64::from(rng.gen_range(60u8..=100)),
                f64::from(rng.gen_range(0u8..=40)),
            );
            VehicleRecord::new(
                format!("{}-{:03}", profile.prefix, index + 1),
                name,
                vehicle_type,
            )
            .with_location(Some(location))
            .with_reading(reading)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcore::fleet::{EnergySource, LifecycleStatus};

    #[test]
    fn generator_builds_requested_count_with_unique_ids() {
        let fleet = build_fleet(&FleetProfile {
            count: 12,
            ..Default::default()
        });
        assert_eq!(fleet.len(), 12);
        assert_eq!(fleet[0].identity.as_str(), "FLT-001");
        assert_eq!(fleet[11].identity.as_str(), "FLT-012");
        assert!(fleet
            .iter()
            .all(|v| v.status() == LifecycleStatus::Available));
    }

    #[test]
    fn generator_readings_stay_in_profile_ranges() {
        let fleet = build_fleet(&FleetProfile {
            count: 50,
            seed: 9,
            prefix: "T".into(),
        });
        for vehicle in &fleet {
            assert!((20.0..=100.0).contains(&vehicle.reading.fuel_level));
            assert!((60.0..=100.0).contains(&vehicle.reading.engine_health));
            assert!((0.0..=40.0).contains(&vehicle.reading.tire_wear));
        }
        assert!(fleet.iter().any(|v| v.energy == EnergySource::Battery));
    }

    #[test]
    fn same_seed_same_fleet() {
        let profile = FleetProfile {
            count: 8,
            seed: 3,
            ..Default::default()
        };
        assert_eq!(build_fleet(&profile), build_fleet(&profile));
    }
}
