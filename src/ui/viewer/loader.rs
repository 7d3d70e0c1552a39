use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use log::{error, info};
use telesync::{TelesyncError, Track, VideoInfo, config::ToolPaths, video};

pub(crate) struct LoadedFiles {
    pub track: Track,
    pub video: VideoInfo,
    pub video_path: PathBuf,
}

pub(crate) enum LoaderMessage {
    SessionReady(Result<LoadedFiles, TelesyncError>),
    VideosJoined(Result<PathBuf, TelesyncError>),
}

/// Parses the track and probes the video off the UI thread. Exactly one
/// message is sent back when both are done or either fails.
pub(crate) fn spawn_load(
    track_path: PathBuf,
    video_path: PathBuf,
    tools: ToolPaths,
    sender: Sender<LoaderMessage>,
) {
    thread::spawn(move || {
        let result = crate::load_inputs(&track_path, &video_path, &tools).map(|(track, video)| {
            LoadedFiles {
                track,
                video,
                video_path,
            }
        });
        if let Err(e) = &result {
            error!("Loading failed: {}", e);
        }
        if sender.send(LoaderMessage::SessionReady(result)).is_err() {
            info!("Viewer closed before loading finished");
        }
    });
}

pub(crate) fn spawn_concat(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    tools: ToolPaths,
    sender: Sender<LoaderMessage>,
) {
    thread::spawn(move || {
        let result = video::concatenate(&inputs, &output, &tools);
        if sender.send(LoaderMessage::VideosJoined(result)).is_err() {
            info!("Viewer closed before concatenation finished");
        }
    });
}
