pub mod smoothing;

pub use smoothing::{MarkerAnimator, ease_toward};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::TelesyncError;
use crate::sync::{Projection, SyncController, nearest_valid_point};
use crate::track::{LatLon, Track};
use crate::video::VideoInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// Nothing loaded
    Idle,
    /// Loaded and parked on frame 0
    Ready,
    Playing,
    Paused,
}

/// The track, video, and projection of one loaded recording. Always replaced
/// as a whole.
#[derive(Clone, Debug)]
pub struct Session {
    track: Track,
    video: VideoInfo,
    projection: Projection,
}

impl Session {
    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn video(&self) -> &VideoInfo {
        &self.video
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// What the telemetry panel shows for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReadout {
    pub frame_index: usize,
    pub video_time_s: f64,
    /// The frame's own fix when valid, otherwise the last valid one seen.
    pub display_position: Option<LatLon>,
    pub is_valid: bool,
    /// Meters per second
    pub speed: Option<f64>,
    /// Meters
    pub elevation: Option<f64>,
}

/// Notifications for the map, graph, and readout collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    SessionLoaded {
        frame_count: usize,
        valid_frame_count: usize,
        total_distance_km: f64,
    },
    PlayStateChanged(PlayMode),
    /// `snap` asks the marker to jump instead of easing toward the position.
    PositionChanged { position: LatLon, snap: bool },
    ReadoutChanged(FrameReadout),
    GraphIndicator { frame_index: usize, video_time_s: f64 },
    OffsetChanged { offset_ms: i64 },
}

/// Single source of truth for what is loaded, which frame is showing, and
/// where the marker belongs. Every mutation returns the events the UI needs
/// to apply, in order.
#[derive(Debug)]
pub struct PlaybackState {
    session: Option<Session>,
    sync: SyncController,
    mode: PlayMode,
    dragging: bool,
    current_frame: usize,
    last_known_good: Option<LatLon>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    pub fn with_offset(offset_ms: i64) -> Self {
        Self {
            session: None,
            sync: SyncController::with_offset(offset_ms),
            mode: PlayMode::Idle,
            dragging: false,
            current_frame: 0,
            last_known_good: None,
        }
    }

    /// Projects `track` against `video` and installs the result. On error
    /// nothing changes, an idle state stays idle.
    pub fn load(
        &mut self,
        track: Track,
        video: VideoInfo,
    ) -> Result<Vec<PlaybackEvent>, TelesyncError> {
        video.validate()?;
        let projection = self.sync.reproject(&track, &video);
        if projection.frame_count() == 0 {
            return Err(TelesyncError::ProbeFailed {
                reason: format!(
                    "video is shorter than one frame ({}s at {} fps)",
                    video.duration_seconds, video.frames_per_second
                ),
            });
        }

        let loaded = PlaybackEvent::SessionLoaded {
            frame_count: projection.frame_count(),
            valid_frame_count: projection.valid_frame_count(),
            total_distance_km: track.total_distance_km(),
        };
        info!(
            "Session ready: {} frames, {} with a valid fix",
            projection.frame_count(),
            projection.valid_frame_count()
        );

        self.last_known_good = track.first_valid_position();
        self.session = Some(Session {
            track,
            video,
            projection,
        });
        self.mode = PlayMode::Ready;
        self.dragging = false;
        self.current_frame = 0;

        let mut events = vec![loaded, PlaybackEvent::PlayStateChanged(PlayMode::Ready)];
        events.extend(self.render(0));
        Ok(events)
    }

    pub fn play(&mut self) -> Vec<PlaybackEvent> {
        match self.mode {
            PlayMode::Ready | PlayMode::Paused => self.change_mode(PlayMode::Playing),
            PlayMode::Idle | PlayMode::Playing => Vec::new(),
        }
    }

    pub fn pause(&mut self) -> Vec<PlaybackEvent> {
        match self.mode {
            PlayMode::Playing => self.change_mode(PlayMode::Paused),
            _ => Vec::new(),
        }
    }

    pub fn toggle(&mut self) -> Vec<PlaybackEvent> {
        if self.mode == PlayMode::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    fn change_mode(&mut self, mode: PlayMode) -> Vec<PlaybackEvent> {
        debug!("Playback {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        vec![PlaybackEvent::PlayStateChanged(mode)]
    }

    /// Follows the video clock. Ignored while the marker is being dragged.
    pub fn on_time_update(&mut self, current_time_s: f64) -> Vec<PlaybackEvent> {
        if self.dragging {
            return Vec::new();
        }
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let frame = session.video.frame_at(current_time_s);
        self.render(frame)
    }

    pub fn seek(&mut self, frame: usize) -> Vec<PlaybackEvent> {
        if self.session.is_none() {
            return Vec::new();
        }
        self.render(frame)
    }

    /// Stores the offset and, when it changed, rebuilds the projection and
    /// re-renders the current frame against it.
    pub fn set_offset(&mut self, offset_ms: i64) -> Vec<PlaybackEvent> {
        if !self.sync.set_offset(offset_ms) {
            return Vec::new();
        }
        let mut events = vec![PlaybackEvent::OffsetChanged { offset_ms }];
        if let Some(session) = &mut self.session {
            session.projection = self.sync.reproject(&session.track, &session.video);
            events.extend(self.render(self.current_frame));
        }
        events
    }

    pub fn begin_drag(&mut self) {
        if self.session.is_some() {
            self.dragging = true;
        }
    }

    /// Releases the marker at `released_at` and seeks to the closest frame
    /// with a valid fix. Nothing moves if the projection has no valid fix.
    pub fn end_drag(&mut self, released_at: LatLon) -> Vec<PlaybackEvent> {
        self.dragging = false;
        match self.resolve_click(released_at) {
            Some(frame) => self.seek(frame),
            None => Vec::new(),
        }
    }

    pub fn resolve_click(&self, target: LatLon) -> Option<usize> {
        let session = self.session.as_ref()?;
        nearest_valid_point(target, session.projection.frames()).map(|p| p.frame_index)
    }

    /// Moves to `frame` (clamped to the last one), updating the held
    /// position, and reports it to every collaborator.
    fn render(&mut self, frame: usize) -> Vec<PlaybackEvent> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let frame = frame.min(session.projection.frame_count().saturating_sub(1));
        let Some(point) = session.projection.at_frame(frame) else {
            return Vec::new();
        };
        let video_time_s = point.video_time_ms / 1000.;

        if let Some(position) = point.sample.position() {
            self.last_known_good = Some(position);
        }
        self.current_frame = frame;

        let readout = FrameReadout {
            frame_index: frame,
            video_time_s,
            display_position: self.last_known_good,
            is_valid: point.is_valid(),
            speed: point.sample.speed(),
            elevation: point.sample.elevation(),
        };

        let mut events = Vec::with_capacity(3);
        if let Some(position) = self.last_known_good {
            events.push(PlaybackEvent::PositionChanged {
                position,
                snap: self.mode != PlayMode::Playing,
            });
        }
        events.push(PlaybackEvent::ReadoutChanged(readout));
        events.push(PlaybackEvent::GraphIndicator {
            frame_index: frame,
            video_time_s,
        });
        events
    }

    pub fn current_readout(&self) -> Option<FrameReadout> {
        let session = self.session.as_ref()?;
        let point = session.projection.at_frame(self.current_frame)?;
        Some(FrameReadout {
            frame_index: self.current_frame,
            video_time_s: point.video_time_ms / 1000.,
            display_position: self.last_known_good,
            is_valid: point.is_valid(),
            speed: point.sample.speed(),
            elevation: point.sample.elevation(),
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn current_time_s(&self) -> f64 {
        self.session
            .as_ref()
            .map(|s| s.video.frame_time_s(self.current_frame))
            .unwrap_or(0.)
    }

    pub fn held_position(&self) -> Option<LatLon> {
        self.last_known_good
    }

    pub fn sync_offset_ms(&self) -> i64 {
        self.sync.offset_ms()
    }

    pub fn total_distance_km(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.track.total_distance_km())
    }
}
