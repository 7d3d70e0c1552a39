use log::debug;
use serde::{Deserialize, Serialize};

use super::interpolation::interpolate_at;
use crate::track::{Sample, Track};
use crate::video::VideoInfo;

/// Telemetry estimate for one point of the video timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub frame_index: usize,
    pub video_time_ms: f64,
    pub sample: Sample,
}

impl ProjectedPoint {
    pub fn is_valid(&self) -> bool {
        self.sample.is_valid()
    }
}

/// Telemetry for a video instant: `track start + video time + offset`,
/// interpolated when inside the recording, a no-data placeholder otherwise
/// or when the engine finds no usable fix.
fn sample_at_video_time(track: &Track, video_time_ms: f64, sync_offset_ms: i64) -> Sample {
    let target_ms = track.start_time_ms() + video_time_ms + sync_offset_ms as f64;
    if target_ms < track.start_time_ms() || target_ms > track.end_time_ms() {
        return Sample::no_data(target_ms);
    }
    interpolate_at(target_ms, track).unwrap_or_else(|| Sample::no_data(target_ms))
}

/// One projected point per video frame, `floor(duration * fps)` of them.
pub fn project(track: &Track, video: &VideoInfo, sync_offset_ms: i64) -> Vec<ProjectedPoint> {
    let points = (0..video.frame_count())
        .map(|frame_index| {
            let video_time_ms = frame_index as f64 / video.frames_per_second * 1000.;
            ProjectedPoint {
                frame_index,
                video_time_ms,
                sample: sample_at_video_time(track, video_time_ms, sync_offset_ms),
            }
        })
        .collect::<Vec<_>>();
    debug!("Created {} interpolated points", points.len());
    points
}

/// One projected point per whole second of video, for charting long
/// recordings without a point per frame. `frame_index` is the frame showing
/// at that second.
pub fn project_per_second(
    track: &Track,
    video: &VideoInfo,
    sync_offset_ms: i64,
) -> Vec<ProjectedPoint> {
    (0..video.whole_seconds())
        .map(|second| {
            let video_time_ms = second as f64 * 1000.;
            ProjectedPoint {
                frame_index: video.frame_at(second as f64),
                video_time_ms,
                sample: sample_at_video_time(track, video_time_ms, sync_offset_ms),
            }
        })
        .collect()
}

/// Frame-accurate and per-second projections built together from the same
/// track, video, and offset. Replaced as a whole whenever any input changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    sync_offset_ms: i64,
    frames: Vec<ProjectedPoint>,
    seconds: Vec<ProjectedPoint>,
}

impl Projection {
    pub fn build(track: &Track, video: &VideoInfo, sync_offset_ms: i64) -> Self {
        Self {
            sync_offset_ms,
            frames: project(track, video, sync_offset_ms),
            seconds: project_per_second(track, video, sync_offset_ms),
        }
    }

    pub fn sync_offset_ms(&self) -> i64 {
        self.sync_offset_ms
    }

    pub fn frames(&self) -> &[ProjectedPoint] {
        &self.frames
    }

    pub fn seconds(&self) -> &[ProjectedPoint] {
        &self.seconds
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frames are stored by index, so lookup is direct.
    pub fn at_frame(&self, frame_index: usize) -> Option<&ProjectedPoint> {
        self.frames.get(frame_index)
    }

    pub fn valid_frame_count(&self) -> usize {
        self.frames.iter().filter(|p| p.is_valid()).count()
    }
}
