use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Deserialize;

use super::VideoInfo;
use crate::TelesyncError;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Parses an ffprobe rational such as `30000/1001`, or a plain number.
/// Zero denominators and non-positive rates are rejected.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0. {
                return None;
            }
            num / den
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (fps.is_finite() && fps > 0.).then_some(fps)
}

/// Builds `VideoInfo` from `ffprobe -print_format json -show_format -show_streams`.
pub fn parse_probe_output(json: &str, path: &Path) -> Result<VideoInfo, TelesyncError> {
    let output: ProbeOutput =
        serde_json::from_str(json).map_err(|e| TelesyncError::ProbeParseError { source: e })?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| TelesyncError::NoVideoStream {
            path: path.display().to_string(),
        })?;

    let frames_per_second = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| TelesyncError::ProbeFailed {
            reason: format!(
                "no usable frame rate (r_frame_rate={:?}, avg_frame_rate={:?})",
                stream.r_frame_rate, stream.avg_frame_rate
            ),
        })?;

    let duration_seconds = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(stream.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .ok_or_else(|| TelesyncError::ProbeFailed {
            reason: "no duration reported".to_string(),
        })?;

    let creation_time = output
        .format
        .as_ref()
        .and_then(|f| f.tags.get("creation_time"))
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));

    let info = VideoInfo {
        duration_seconds,
        frames_per_second,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        codec: stream.codec_name.clone(),
        creation_time,
    };
    info.validate()?;
    Ok(info)
}

pub fn probe(path: &Path, ffprobe: &Path) -> Result<VideoInfo, TelesyncError> {
    debug!("Probing {:?} with {:?}", path, ffprobe);
    let output = Command::new(ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| TelesyncError::ToolLaunchError {
            tool: ffprobe.display().to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(TelesyncError::ProbeFailed {
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout), path)?;
    info!(
        "Video metadata for {:?}: {:.2}s at {:.2} fps, {}x{}",
        path, info.duration_seconds, info.frames_per_second, info.width, info.height
    );
    Ok(info)
}
