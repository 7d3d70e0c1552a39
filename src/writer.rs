use std::path::Path;

use log::info;

use crate::{TelesyncError, sync::ProjectedPoint};

/// Writes one JSON object per projected point.
pub fn write_projection(file: &Path, points: &[ProjectedPoint]) -> Result<(), TelesyncError> {
    serde_jsonlines::write_json_lines(file, points)
        .map_err(|e| TelesyncError::WriterError { source: e })?;
    info!("Wrote {} projected points to {:?}", points.len(), file);
    Ok(())
}

pub fn read_projection(file: &Path) -> Result<Vec<ProjectedPoint>, TelesyncError> {
    serde_jsonlines::json_lines(file)
        .map_err(|e| TelesyncError::TrackIoError { source: e })?
        .collect::<Result<Vec<ProjectedPoint>, std::io::Error>>()
        .map_err(|e| TelesyncError::TrackIoError { source: e })
}
