// Error types for telesync

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum TelesyncError {
    // Track loading errors
    #[snafu(display("Malformed track: {reason}"))]
    MalformedTrack { reason: String },
    #[snafu(display("Error reading track file"))]
    TrackIoError { source: io::Error },
    #[snafu(display("Error parsing GPX data"))]
    GpxParseError { source: quick_xml::Error },
    #[snafu(display("FIT to GPX conversion failed: {stderr}"))]
    FitConversionError { stderr: String },

    // External tools
    #[snafu(display("Failed to run {tool}"))]
    ToolLaunchError { tool: String, source: io::Error },

    // Video metadata errors
    #[snafu(display("No video stream found in {path}"))]
    NoVideoStream { path: String },
    #[snafu(display("Video metadata probe failed: {reason}"))]
    ProbeFailed { reason: String },
    #[snafu(display("Error parsing video metadata"))]
    ProbeParseError { source: serde_json::Error },

    // Video pre-processing errors
    #[snafu(display("Videos cannot be joined: {}", issues.join("; ")))]
    IncompatibleInputs { issues: Vec<String> },
    #[snafu(display("Video concatenation failed: {stderr}"))]
    ConcatFailed { stderr: String },
    #[snafu(display("Error writing concat list {path}"))]
    ConcatListError { path: String, source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },

    // Viewer errors
    #[snafu(display("Could not start viewer: {description}"))]
    ViewerError { description: String },

    // Projection export
    #[snafu(display("Error writing projection file"))]
    WriterError { source: io::Error },
}
