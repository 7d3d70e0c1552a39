pub mod fit;
pub mod geo;
pub mod gpx;
pub mod source;

pub use geo::{LatLon, haversine_distance_m};
pub use source::{TrackFormat, parse_track};

use log::info;
use serde::{Deserialize, Serialize};

use crate::TelesyncError;

/// One telemetry observation. Invalid fixes keep their timestamp so timing is
/// preserved across GPS dropouts, but carry no position at all.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    Valid {
        /// Milliseconds since Unix epoch (UTC)
        timestamp_ms: f64,
        position: LatLon,
        /// Meters
        elevation: Option<f64>,
        /// Meters per second
        speed: Option<f64>,
    },
    Invalid {
        timestamp_ms: f64,
        elevation: Option<f64>,
        speed: Option<f64>,
    },
}

impl Sample {
    /// Builds a sample from raw receiver values, degrading it to `Invalid`
    /// when the coordinates are missing, out of range, or a zero fix.
    pub fn from_raw(
        timestamp_ms: f64,
        lat: Option<f64>,
        lon: Option<f64>,
        elevation: Option<f64>,
        speed: Option<f64>,
    ) -> Self {
        match LatLon::checked(lat, lon) {
            Some(position) => Sample::Valid {
                timestamp_ms,
                position,
                elevation,
                speed,
            },
            None => Sample::Invalid {
                timestamp_ms,
                elevation,
                speed,
            },
        }
    }

    /// Re-applies the validity rule, downgrading a `Valid` sample whose
    /// coordinates are out of range or a zero fix.
    pub fn revalidated(self) -> Self {
        match self {
            Sample::Valid {
                timestamp_ms,
                position,
                elevation,
                speed,
            } => Sample::from_raw(
                timestamp_ms,
                Some(position.lat),
                Some(position.lon),
                elevation,
                speed,
            ),
            invalid => invalid,
        }
    }

    /// Placeholder for a time with no usable data at all.
    pub fn no_data(timestamp_ms: f64) -> Self {
        Sample::Invalid {
            timestamp_ms,
            elevation: None,
            speed: None,
        }
    }

    pub fn timestamp_ms(&self) -> f64 {
        match self {
            Sample::Valid { timestamp_ms, .. } | Sample::Invalid { timestamp_ms, .. } => {
                *timestamp_ms
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Sample::Valid { .. })
    }

    pub fn position(&self) -> Option<LatLon> {
        match self {
            Sample::Valid { position, .. } => Some(*position),
            Sample::Invalid { .. } => None,
        }
    }

    fn position_ref(&self) -> Option<&LatLon> {
        match self {
            Sample::Valid { position, .. } => Some(position),
            Sample::Invalid { .. } => None,
        }
    }

    pub fn elevation(&self) -> Option<f64> {
        match self {
            Sample::Valid { elevation, .. } | Sample::Invalid { elevation, .. } => *elevation,
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match self {
            Sample::Valid { speed, .. } | Sample::Invalid { speed, .. } => *speed,
        }
    }
}

/// The full recording for a session: samples sorted by time plus the derived
/// list of valid fixes. Immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    samples: Vec<Sample>,
    valid_samples: Vec<Sample>,
    total_distance_m: f64,
}

impl Track {
    pub fn load(samples: Vec<Sample>) -> Result<Self, TelesyncError> {
        if samples.is_empty() {
            return Err(TelesyncError::MalformedTrack {
                reason: "track contains no samples".to_string(),
            });
        }
        if let Some(bad) = samples.iter().find(|s| !s.timestamp_ms().is_finite()) {
            return Err(TelesyncError::MalformedTrack {
                reason: format!("sample has an unusable timestamp: {:?}", bad),
            });
        }

        let mut samples = samples.into_iter().map(Sample::revalidated).collect::<Vec<_>>();
        // sort_by is stable, ties keep their recorded order
        samples.sort_by(|a, b| a.timestamp_ms().total_cmp(&b.timestamp_ms()));

        let valid_samples: Vec<Sample> = samples.iter().filter(|s| s.is_valid()).copied().collect();
        let total_distance_m =
            geo::path_length_m(valid_samples.iter().filter_map(Sample::position_ref));

        info!(
            "Loaded {} GPS points ({} valid), {:.2} km",
            samples.len(),
            valid_samples.len(),
            total_distance_m / 1000.
        );

        Ok(Self {
            samples,
            valid_samples,
            total_distance_m,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn valid_samples(&self) -> &[Sample] {
        &self.valid_samples
    }

    pub fn total_count(&self) -> usize {
        self.samples.len()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_samples.len()
    }

    pub fn start_time_ms(&self) -> f64 {
        // load() guarantees at least one sample
        self.samples[0].timestamp_ms()
    }

    pub fn end_time_ms(&self) -> f64 {
        self.samples[self.samples.len() - 1].timestamp_ms()
    }

    pub fn duration_ms(&self) -> f64 {
        self.end_time_ms() - self.start_time_ms()
    }

    /// Haversine length of the path through valid fixes only. Invalid samples
    /// are skipped without breaking the running sum.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m / 1000.
    }

    pub fn first_valid_position(&self) -> Option<LatLon> {
        self.valid_samples.first().and_then(Sample::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid(t: f64, lat: f64, lon: f64) -> Sample {
        Sample::from_raw(t, Some(lat), Some(lon), None, None)
    }

    #[test]
    fn test_empty_track_is_malformed() {
        match Track::load(Vec::new()) {
            Err(TelesyncError::MalformedTrack { .. }) => {}
            other => panic!("Expected MalformedTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_timestamp_is_malformed() {
        let result = Track::load(vec![valid(f64::NAN, 10., 20.)]);
        assert!(matches!(result, Err(TelesyncError::MalformedTrack { .. })));
    }

    #[test]
    fn test_load_sorts_and_keeps_tie_order() {
        let a = Sample::from_raw(1000., Some(10.), Some(20.), Some(1.), None);
        let b = Sample::from_raw(1000., Some(11.), Some(21.), Some(2.), None);
        let c = valid(0., 12., 22.);
        let track = Track::load(vec![a, b, c]).unwrap();
        assert_eq!(track.samples(), &[c, a, b]);
    }

    #[test]
    fn test_valid_samples_are_filtered_once() {
        let track = Track::load(vec![
            valid(0., 10., 20.),
            Sample::from_raw(1000., None, None, Some(5.), None),
            valid(2000., 10.1, 20.1),
        ])
        .unwrap();
        assert_eq!(track.total_count(), 3);
        assert_eq!(track.valid_count(), 2);
        assert!(track.valid_samples().iter().all(Sample::is_valid));
        assert_eq!(track.start_time_ms(), 0.);
        assert_eq!(track.end_time_ms(), 2000.);
    }

    #[test]
    fn test_bad_valid_fixes_are_downgraded() {
        let zero = Sample::Valid {
            timestamp_ms: 0.,
            position: LatLon::new(0., 0.),
            elevation: Some(3.),
            speed: None,
        };
        let out_of_range = Sample::Valid {
            timestamp_ms: 1000.,
            position: LatLon::new(95., 200.),
            elevation: None,
            speed: Some(2.),
        };
        let track = Track::load(vec![zero, out_of_range, valid(2000., 10., 20.)]).unwrap();

        assert_eq!(track.valid_count(), 1);
        assert_eq!(track.total_distance_km(), 0.);
        assert_eq!(
            track.samples()[0],
            Sample::Invalid {
                timestamp_ms: 0.,
                elevation: Some(3.),
                speed: None,
            }
        );
        assert!(track.samples()[1].position().is_none());
        assert_eq!(track.samples()[1].speed(), Some(2.));
    }

    #[test]
    fn test_distance_follows_path_not_endpoints() {
        // right angle near the equator: north then east
        let track = Track::load(vec![
            valid(0., 1.0, 1.0),
            valid(1000., 1.01, 1.0),
            valid(2000., 1.01, 1.01),
        ])
        .unwrap();
        let leg_a = haversine_distance_m(1.0, 1.0, 1.01, 1.0);
        let leg_b = haversine_distance_m(1.01, 1.0, 1.01, 1.01);
        let straight = haversine_distance_m(1.0, 1.0, 1.01, 1.01);

        assert!((track.total_distance_km() - (leg_a + leg_b) / 1000.).abs() < 1e-9);
        assert!(track.total_distance_km() > straight / 1000.);
    }

    #[test]
    fn test_distance_skips_invalid_without_resetting() {
        let with_dropout = Track::load(vec![
            valid(0., 1.0, 1.0),
            Sample::no_data(500.),
            valid(1000., 1.01, 1.0),
            Sample::from_raw(1500., Some(0.), Some(0.), None, None),
            valid(2000., 1.01, 1.01),
        ])
        .unwrap();
        let without = Track::load(vec![
            valid(0., 1.0, 1.0),
            valid(1000., 1.01, 1.0),
            valid(2000., 1.01, 1.01),
        ])
        .unwrap();
        assert_eq!(with_dropout.total_distance_km(), without.total_distance_km());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_loaded_samples_are_sorted(
            times in proptest::collection::vec(-1.0e12f64..1.0e12f64, 1..200),
        ) {
            let samples = times
                .iter()
                .enumerate()
                .map(|(i, t)| valid(*t, 10. + i as f64 * 1e-4, 20.))
                .collect::<Vec<_>>();
            let track = Track::load(samples).unwrap();
            prop_assert!(track
                .samples()
                .windows(2)
                .all(|w| w[0].timestamp_ms() <= w[1].timestamp_ms()));
        }

        #[test]
        fn prop_invalid_samples_have_no_position(
            lat in proptest::option::of(-200.0f64..200.0),
            lon in proptest::option::of(-400.0f64..400.0),
        ) {
            let sample = Sample::from_raw(0., lat, lon, None, None);
            if !sample.is_valid() {
                prop_assert!(sample.position().is_none());
            } else {
                let position = sample.position().unwrap();
                prop_assert!((-90.0..=90.0).contains(&position.lat));
                prop_assert!((-180.0..=180.0).contains(&position.lon));
            }
        }
    }
}
