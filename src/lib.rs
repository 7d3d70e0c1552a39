// Library interface for telesync
// This allows integration tests and benches to access the sync engine

pub mod config;
pub mod errors;
pub mod playback;
pub mod sync;
pub mod track;
pub mod video;
pub mod writer;

// Re-export commonly used types
pub use errors::TelesyncError;
pub use playback::{FrameReadout, PlayMode, PlaybackEvent, PlaybackState};
pub use sync::{ProjectedPoint, Projection, SyncController};
pub use track::{LatLon, Sample, Track};
pub use video::VideoInfo;
