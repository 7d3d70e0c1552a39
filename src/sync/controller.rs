use log::info;

use super::projection::{ProjectedPoint, Projection};
use crate::TelesyncError;
use crate::track::{LatLon, Track};
use crate::video::VideoInfo;

/// Holds the offset between the video and track clocks. Positive values make
/// each frame read later telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncController {
    offset_ms: i64,
}

impl SyncController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset_ms: i64) -> Self {
        Self { offset_ms }
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    /// Returns true when the stored offset actually changed.
    pub fn set_offset(&mut self, offset_ms: i64) -> bool {
        if self.offset_ms == offset_ms {
            return false;
        }
        info!(
            "Applied sync offset: {}ms (was {}ms)",
            offset_ms, self.offset_ms
        );
        self.offset_ms = offset_ms;
        true
    }

    pub fn reproject(&self, track: &Track, video: &VideoInfo) -> Projection {
        Projection::build(track, video, self.offset_ms)
    }
}

/// Parses an offset typed by the user, in whole milliseconds.
pub fn parse_offset(text: &str) -> Result<i64, TelesyncError> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| TelesyncError::InvalidUserInput {
            field: "sync offset".to_string(),
            reason: format!("{:?} is not a whole number of milliseconds ({})", text, e),
        })
}

/// The valid projected point closest to `target` by great-circle distance.
/// On equal distances the earliest point wins.
pub fn nearest_valid_point(target: LatLon, points: &[ProjectedPoint]) -> Option<&ProjectedPoint> {
    let mut best: Option<(&ProjectedPoint, f64)> = None;
    for point in points {
        let Some(position) = point.sample.position() else {
            continue;
        };
        let distance = position.distance_m(&target);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }
    best.map(|(point, _)| point)
}
