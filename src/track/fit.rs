use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::TelesyncError;

/// Where the converted GPX for a FIT recording is written.
pub fn gpx_path_for(fit_path: &Path) -> PathBuf {
    fit_path.with_extension("gpx")
}

/// Converts a FIT recording to GPX with gpsbabel, keeping every record
/// (`allpoints=1`) so records without a position still mark time. A GPX file
/// already sitting next to the input is reused.
pub fn convert_fit_to_gpx(fit_path: &Path, gpsbabel: &Path) -> Result<PathBuf, TelesyncError> {
    let gpx_path = gpx_path_for(fit_path);
    if gpx_path.exists() {
        debug!("Reusing converted track {:?}", gpx_path);
        return Ok(gpx_path);
    }

    info!("Converting {:?} to GPX", fit_path);
    let output = Command::new(gpsbabel)
        .arg("-i")
        .arg("garmin_fit,allpoints=1")
        .arg("-f")
        .arg(fit_path)
        .arg("-o")
        .arg("gpx")
        .arg("-F")
        .arg(&gpx_path)
        .output()
        .map_err(|e| TelesyncError::ToolLaunchError {
            tool: gpsbabel.display().to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(TelesyncError::FitConversionError {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(gpx_path)
}
