use std::path::Path;

use log::info;

use super::{Track, fit, gpx};
use crate::{TelesyncError, config::ToolPaths};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackFormat {
    Gpx,
    Fit,
}

impl TrackFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "gpx" => Some(TrackFormat::Gpx),
            "fit" => Some(TrackFormat::Fit),
            _ => None,
        }
    }
}

/// Loads a track from a GPX file, or from a FIT file after converting it.
pub fn parse_track(path: &Path, tools: &ToolPaths) -> Result<Track, TelesyncError> {
    let format = TrackFormat::from_path(path).ok_or_else(|| TelesyncError::MalformedTrack {
        reason: format!("unsupported track file {:?}, expected .gpx or .fit", path),
    })?;

    let gpx_path = match format {
        TrackFormat::Gpx => path.to_path_buf(),
        TrackFormat::Fit => fit::convert_fit_to_gpx(path, &tools.gpsbabel)?,
    };
    info!("Parsing GPX data from {:?}", gpx_path);
    gpx::parse_gpx_file(&gpx_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TrackFormat::from_path(Path::new("a.GPX")), Some(TrackFormat::Gpx));
        assert_eq!(TrackFormat::from_path(Path::new("a.fit")), Some(TrackFormat::Fit));
        assert_eq!(TrackFormat::from_path(Path::new("a.tcx")), None);
        assert_eq!(TrackFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_extension_is_malformed() {
        let result = parse_track(Path::new("ride.tcx"), &ToolPaths::default());
        assert!(matches!(result, Err(TelesyncError::MalformedTrack { .. })));
    }

    #[test]
    fn test_parse_gpx_track_from_file() {
        let mut file = Builder::new().suffix(".gpx").tempfile().unwrap();
        write!(
            file,
            r#"<gpx><trk><trkseg>
                <trkpt lat="10" lon="20"><time>2024-05-01T10:00:00Z</time></trkpt>
                <trkpt lat="10.01" lon="20.02"><time>2024-05-01T10:01:00Z</time></trkpt>
            </trkseg></trk></gpx>"#
        )
        .unwrap();
        file.flush().unwrap();

        let track = parse_track(file.path(), &ToolPaths::default()).unwrap();
        assert_eq!(track.total_count(), 2);
        assert_eq!(track.duration_ms(), 60_000.);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse_track(Path::new("/no/such/ride.gpx"), &ToolPaths::default());
        assert!(matches!(result, Err(TelesyncError::TrackIoError { .. })));
    }
}
