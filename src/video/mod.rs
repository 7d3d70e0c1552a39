pub mod concat;
pub mod probe;

pub use concat::{check_compatibility, concatenate};
pub use probe::{parse_frame_rate, parse_probe_output, probe};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TelesyncError;

/// Metadata of the video being synchronized. Immutable once probed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub frames_per_second: f64,
    pub width: u32,
    pub height: u32,
    pub codec: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
}

impl VideoInfo {
    pub fn new(duration_seconds: f64, frames_per_second: f64, width: u32, height: u32) -> Self {
        Self {
            duration_seconds,
            frames_per_second,
            width,
            height,
            codec: None,
            creation_time: None,
        }
    }

    /// Rejects metadata the timeline cannot be built from.
    pub fn validate(&self) -> Result<(), TelesyncError> {
        if !self.frames_per_second.is_finite() || self.frames_per_second <= 0. {
            return Err(TelesyncError::ProbeFailed {
                reason: format!("unusable frame rate {}", self.frames_per_second),
            });
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds < 0. {
            return Err(TelesyncError::ProbeFailed {
                reason: format!("unusable duration {}", self.duration_seconds),
            });
        }
        Ok(())
    }

    /// `floor(duration * fps)`, the number of frames the timeline covers.
    pub fn frame_count(&self) -> usize {
        let frames = (self.duration_seconds * self.frames_per_second).floor();
        if frames.is_finite() && frames > 0. {
            frames as usize
        } else {
            0
        }
    }

    pub fn whole_seconds(&self) -> usize {
        let seconds = self.duration_seconds.floor();
        if seconds.is_finite() && seconds > 0. {
            seconds as usize
        } else {
            0
        }
    }

    pub fn frame_at(&self, time_s: f64) -> usize {
        let frame = (time_s * self.frames_per_second).floor();
        if frame.is_finite() && frame > 0. {
            frame as usize
        } else {
            0
        }
    }

    pub fn frame_time_s(&self, frame: usize) -> f64 {
        frame as f64 / self.frames_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_floors() {
        assert_eq!(VideoInfo::new(10., 30., 1920, 1080).frame_count(), 300);
        assert_eq!(VideoInfo::new(10.5, 29.97, 1920, 1080).frame_count(), 314);
        assert_eq!(VideoInfo::new(0., 30., 1920, 1080).frame_count(), 0);
    }

    #[test]
    fn test_frame_at_time() {
        let video = VideoInfo::new(10., 30., 1920, 1080);
        assert_eq!(video.frame_at(0.), 0);
        assert_eq!(video.frame_at(1.0), 30);
        assert_eq!(video.frame_at(1.0 / 30. * 7.5), 7);
        assert_eq!(video.frame_at(-3.), 0);
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let video = VideoInfo::new(10., 0., 1920, 1080);
        assert!(matches!(
            video.validate(),
            Err(TelesyncError::ProbeFailed { .. })
        ));
        assert!(VideoInfo::new(10., 25., 1, 1).validate().is_ok());
    }
}
