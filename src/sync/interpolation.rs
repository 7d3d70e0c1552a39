use crate::track::{LatLon, Sample, Track};

fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Interpolates an optional channel; when only one side has a value it is
/// taken as is.
fn lerp_optional(a: Option<f64>, b: Option<f64>, ratio: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, ratio)),
        (a, b) => a.or(b),
    }
}

/// The samples bracketing `target_ms`: the last one at or before it (the
/// latest of any tied timestamps) and the first one strictly after it.
pub fn bracket(samples: &[Sample], target_ms: f64) -> (Option<&Sample>, Option<&Sample>) {
    let idx = samples.partition_point(|s| s.timestamp_ms() <= target_ms);
    let before = idx.checked_sub(1).and_then(|i| samples.get(i));
    (before, samples.get(idx))
}

/// Estimates the telemetry sample at `target_ms`.
///
/// Returns `None` when the target sits between two invalid fixes: no usable
/// position exists there and the caller is expected to hold the last valid
/// one. Outside the recording the nearest end sample is returned as is. A
/// dropout on one side is never interpolated across; the valid neighbour is
/// returned instead.
pub fn interpolate_at(target_ms: f64, track: &Track) -> Option<Sample> {
    match bracket(track.samples(), target_ms) {
        (None, None) => None,
        (Some(before), None) => Some(*before),
        (None, Some(after)) => Some(*after),
        (Some(before), Some(after)) => match (before, after) {
            (Sample::Invalid { .. }, Sample::Invalid { .. }) => None,
            (Sample::Valid { .. }, Sample::Invalid { .. }) => Some(*before),
            (Sample::Invalid { .. }, Sample::Valid { .. }) => Some(*after),
            (
                Sample::Valid {
                    timestamp_ms: t0,
                    position: p0,
                    elevation: e0,
                    speed: s0,
                },
                Sample::Valid {
                    timestamp_ms: t1,
                    position: p1,
                    elevation: e1,
                    speed: s1,
                },
            ) => {
                let span = t1 - t0;
                if span <= 0. {
                    return Some(*before);
                }
                let ratio = (target_ms - t0) / span;
                Some(Sample::Valid {
                    timestamp_ms: target_ms,
                    position: LatLon::new(lerp(p0.lat, p1.lat, ratio), lerp(p0.lon, p1.lon, ratio)),
                    elevation: lerp_optional(*e0, *e1, ratio),
                    speed: lerp_optional(*s0, *s1, ratio),
                })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MINUTE_MS: f64 = 60_000.;

    fn valid(t: f64, lat: f64, lon: f64) -> Sample {
        Sample::from_raw(t, Some(lat), Some(lon), None, None)
    }

    #[test]
    fn test_midpoint_is_linear() {
        let track = Track::load(vec![valid(0., 10., 20.), valid(MINUTE_MS, 20., 40.)]).unwrap();
        let mid = interpolate_at(MINUTE_MS / 2., &track).unwrap();
        assert_eq!(mid.position(), Some(LatLon::new(15., 30.)));
        assert_eq!(mid.timestamp_ms(), MINUTE_MS / 2.);
        assert!(mid.is_valid());
    }

    #[test]
    fn test_speed_and_elevation_use_both_neighbours() {
        let track = Track::load(vec![
            Sample::from_raw(0., Some(10.), Some(20.), Some(100.), Some(2.)),
            Sample::from_raw(1000., Some(10.1), Some(20.1), Some(200.), Some(6.)),
        ])
        .unwrap();
        let sample = interpolate_at(250., &track).unwrap();
        assert_eq!(sample.elevation(), Some(125.));
        assert_eq!(sample.speed(), Some(3.));
    }

    #[test]
    fn test_one_sided_channels_are_taken_as_is() {
        let track = Track::load(vec![
            Sample::from_raw(0., Some(10.), Some(20.), None, Some(4.)),
            Sample::from_raw(1000., Some(10.1), Some(20.1), Some(50.), None),
        ])
        .unwrap();
        let sample = interpolate_at(500., &track).unwrap();
        assert_eq!(sample.elevation(), Some(50.));
        assert_eq!(sample.speed(), Some(4.));
    }

    #[test]
    fn test_dropout_between_valid_fixes() {
        // A valid at 0s, invalid at 5s, B valid at 10s
        let a = valid(0., 10., 20.);
        let gap = Sample::no_data(5_000.);
        let b = valid(10_000., 10.1, 20.1);
        let track = Track::load(vec![a, gap, b]).unwrap();

        // before = invalid at 5s (timestamp <= target), after = B
        assert_eq!(interpolate_at(5_000., &track), Some(b));
        // before = A, after = invalid at 5s
        assert_eq!(interpolate_at(2_500., &track), Some(a));
        // before = invalid at 5s, after = B
        assert_eq!(interpolate_at(7_500., &track), Some(b));
    }

    #[test]
    fn test_between_two_invalid_fixes_is_none() {
        let track = Track::load(vec![
            valid(0., 10., 20.),
            Sample::no_data(1_000.),
            Sample::no_data(2_000.),
            valid(3_000., 10.1, 20.1),
        ])
        .unwrap();
        assert_eq!(interpolate_at(1_500., &track), None);
    }

    #[test]
    fn test_tied_timestamps_use_latest_as_before() {
        let first = valid(1_000., 10., 20.);
        let second = valid(1_000., 11., 21.);
        let after = valid(2_000., 12., 22.);
        let track = Track::load(vec![first, second, after]).unwrap();

        let (before, next) = bracket(track.samples(), 1_000.);
        assert_eq!(before, Some(&second));
        assert_eq!(next, Some(&after));

        let sample = interpolate_at(1_500., &track).unwrap();
        assert_eq!(sample.position(), Some(LatLon::new(11.5, 21.5)));
    }

    #[test]
    fn test_outside_recording_returns_end_samples() {
        let first = Sample::no_data(1_000.);
        let last = valid(2_000., 10., 20.);
        let track = Track::load(vec![first, last]).unwrap();

        // validity of the end sample is preserved
        assert_eq!(interpolate_at(0., &track), Some(first));
        assert_eq!(interpolate_at(5_000., &track), Some(last));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_before_start_copies_first_sample(
            offsets in proptest::collection::vec(1.0f64..10_000.0, 1..50),
            lead in 0.001f64..1.0e6,
        ) {
            let mut t = 0.;
            let samples = offsets
                .iter()
                .enumerate()
                .map(|(i, dt)| {
                    t += dt;
                    if i % 3 == 1 {
                        Sample::no_data(t)
                    } else {
                        valid(t, 10. + i as f64 * 1e-3, 20.)
                    }
                })
                .collect::<Vec<_>>();
            let track = Track::load(samples).unwrap();
            let first = track.samples()[0];
            let last = track.samples()[track.total_count() - 1];

            prop_assert_eq!(interpolate_at(first.timestamp_ms() - lead, &track), Some(first));
            prop_assert_eq!(interpolate_at(last.timestamp_ms(), &track), Some(last));
            prop_assert_eq!(interpolate_at(last.timestamp_ms() + lead, &track), Some(last));
        }

        #[test]
        fn prop_interpolated_position_stays_between_neighbours(
            lat0 in -80.0f64..80.0,
            lat1 in -80.0f64..80.0,
            ratio in 0.0f64..1.0,
        ) {
            let track = Track::load(vec![
                valid(0., lat0, 20.),
                valid(1_000., lat1, 21.),
            ])
            .unwrap();
            if let Some(Sample::Valid { position, .. }) = interpolate_at(ratio * 1_000., &track) {
                let (lo, hi) = if lat0 < lat1 { (lat0, lat1) } else { (lat1, lat0) };
                prop_assert!(position.lat >= lo - 1e-9 && position.lat <= hi + 1e-9);
            } else {
                prop_assert!(false, "expected a valid interpolated sample");
            }
        }
    }
}
