use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::TelesyncError;

const CONFIG_DIR_NAME: &str = "telesync";
const CONFIG_FILE_NAME: &str = "config.json";

/// Fraction of the remaining distance the map marker covers per 60 Hz tick.
pub const DEFAULT_MARKER_EASING: f64 = 0.1;

/// External binaries. Bare names are resolved through `PATH`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub gpsbabel: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            gpsbabel: PathBuf::from("gpsbabel"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub tools: ToolPaths,
    pub default_sync_offset_ms: i64,
    pub follow_marker: bool,
    pub marker_easing: f64,
    pub last_track_dir: Option<PathBuf>,
    pub last_video_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            default_sync_offset_ms: 0,
            follow_marker: false,
            marker_easing: DEFAULT_MARKER_EASING,
            last_track_dir: None,
            last_video_dir: None,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads the user's config. A missing file yields `None`; an unreadable
    /// one is logged and ignored so the app still starts with defaults.
    pub fn from_local_file() -> Option<Self> {
        let config_path = Self::default_path()?;
        if !config_path.exists() {
            return None;
        }
        Self::load_from(&config_path)
            .map_err(|e| warn!("Ignoring config file {:?}: {}", config_path, e))
            .ok()
    }

    pub fn load_from(path: &Path) -> Result<Self, TelesyncError> {
        let file =
            std::fs::File::open(path).map_err(|e| TelesyncError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| TelesyncError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), TelesyncError> {
        let config_path = Self::default_path().ok_or(TelesyncError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TelesyncError> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| TelesyncError::ConfigIOError { source: e })?;
        }

        let file =
            std::fs::File::create(path).map_err(|e| TelesyncError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| TelesyncError::ConfigSerializeError { source: e })
    }
}
