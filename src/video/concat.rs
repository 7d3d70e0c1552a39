use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use super::{VideoInfo, probe};
use crate::{TelesyncError, config::ToolPaths};

/// Frame rates closer than this are considered the same stream rate.
const FPS_TOLERANCE: f64 = 0.01;

/// Lists every way the inputs differ from the first one in codec,
/// resolution, or frame rate. Stream copy concatenation needs all three to
/// match, so an empty list means the inputs can be joined.
pub fn check_compatibility(inputs: &[(PathBuf, VideoInfo)]) -> Vec<String> {
    let Some((first_path, reference)) = inputs.first() else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    for (path, info) in inputs.iter().skip(1) {
        if info.codec != reference.codec {
            issues.push(format!(
                "{:?} uses codec {} but {:?} uses {}",
                path,
                info.codec.as_deref().unwrap_or("unknown"),
                first_path,
                reference.codec.as_deref().unwrap_or("unknown"),
            ));
        }
        if (info.width, info.height) != (reference.width, reference.height) {
            issues.push(format!(
                "{:?} is {}x{} but {:?} is {}x{}",
                path, info.width, info.height, first_path, reference.width, reference.height
            ));
        }
        if (info.frames_per_second - reference.frames_per_second).abs() > FPS_TOLERANCE {
            issues.push(format!(
                "{:?} runs at {:.3} fps but {:?} runs at {:.3} fps",
                path, info.frames_per_second, first_path, reference.frames_per_second
            ));
        }
    }
    issues
}

/// Line for ffmpeg's concat demuxer list, quoting the path.
fn concat_list_entry(path: &Path) -> String {
    format!("file '{}'", path.display().to_string().replace('\'', r"'\''"))
}

fn write_concat_list(list_path: &Path, inputs: &[PathBuf]) -> Result<(), TelesyncError> {
    let list = inputs
        .iter()
        .map(|p| {
            // the demuxer resolves relative entries against the list file
            let absolute = fs::canonicalize(p).unwrap_or_else(|_| p.clone());
            concat_list_entry(&absolute)
        })
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(list_path, list).map_err(|e| TelesyncError::ConcatListError {
        path: list_path.display().to_string(),
        source: e,
    })
}

/// Joins several recordings into one file with ffmpeg's concat demuxer,
/// without re-encoding. Inputs that cannot be stream-copied together are
/// refused with the full list of incompatibilities.
pub fn concatenate(
    inputs: &[PathBuf],
    output: &Path,
    tools: &ToolPaths,
) -> Result<PathBuf, TelesyncError> {
    if inputs.len() < 2 {
        return Err(TelesyncError::InvalidUserInput {
            field: "inputs".to_string(),
            reason: "at least two videos are needed to concatenate".to_string(),
        });
    }

    let probed = inputs
        .iter()
        .map(|p| probe(p, &tools.ffprobe).map(|info| (p.clone(), info)))
        .collect::<Result<Vec<_>, TelesyncError>>()?;

    let issues = check_compatibility(&probed);
    if !issues.is_empty() {
        return Err(TelesyncError::IncompatibleInputs { issues });
    }

    let list_path = output.with_extension("concat.txt");
    write_concat_list(&list_path, inputs)?;

    info!("Concatenating {} videos into {:?}", inputs.len(), output);
    let result = Command::new(&tools.ffmpeg)
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(output)
        .output();

    if let Err(e) = fs::remove_file(&list_path) {
        warn!("Could not remove concat list {:?}: {}", list_path, e);
    }

    let result = result.map_err(|e| TelesyncError::ToolLaunchError {
        tool: tools.ffmpeg.display().to_string(),
        source: e,
    })?;
    if !result.status.success() {
        return Err(TelesyncError::ConcatFailed {
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(codec: &str, width: u32, height: u32, fps: f64) -> VideoInfo {
        VideoInfo {
            codec: Some(codec.to_string()),
            ..VideoInfo::new(60., fps, width, height)
        }
    }

    #[test]
    fn test_matching_inputs_are_compatible() {
        let inputs = vec![
            (PathBuf::from("a.mp4"), info("h264", 1920, 1080, 29.97)),
            (PathBuf::from("b.mp4"), info("h264", 1920, 1080, 29.97)),
        ];
        assert!(check_compatibility(&inputs).is_empty());
    }

    #[test]
    fn test_every_mismatch_is_listed() {
        let inputs = vec![
            (PathBuf::from("a.mp4"), info("h264", 1920, 1080, 30.)),
            (PathBuf::from("b.mp4"), info("hevc", 3840, 2160, 60.)),
            (PathBuf::from("c.mp4"), info("h264", 1920, 1080, 25.)),
        ];
        let issues = check_compatibility(&inputs);
        assert_eq!(issues.len(), 4);
        assert!(issues[0].contains("hevc"));
        assert!(issues[1].contains("3840x2160"));
        assert!(issues[3].contains("c.mp4"));
    }

    #[test]
    fn test_concat_list_entry_escapes_quotes() {
        assert_eq!(
            concat_list_entry(Path::new("/videos/bob's ride.mp4")),
            r"file '/videos/bob'\''s ride.mp4'"
        );
    }

    #[test]
    fn test_single_input_is_rejected() {
        let result = concatenate(
            &[PathBuf::from("a.mp4")],
            Path::new("out.mp4"),
            &ToolPaths::default(),
        );
        assert!(matches!(result, Err(TelesyncError::InvalidUserInput { .. })));
    }

    #[test]
    fn test_incompatible_error_lists_issues() {
        let err = TelesyncError::IncompatibleInputs {
            issues: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "Videos cannot be joined: first; second");
    }

    #[test]
    fn test_concat_list_lists_every_input() {
        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("joined.concat.txt");
        let inputs = vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")];
        write_concat_list(&list_path, &inputs).unwrap();

        let list = fs::read_to_string(&list_path).unwrap();
        assert_eq!(list.lines().count(), 2);
        assert!(list.lines().all(|l| l.starts_with("file '")));
    }

    #[test]
    fn test_concat_list_write_failure_names_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("missing").join("joined.concat.txt");
        let inputs = vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")];
        let err = write_concat_list(&list_path, &inputs).unwrap_err();

        assert!(matches!(err, TelesyncError::ConcatListError { .. }));
        let message = err.to_string();
        assert!(message.starts_with("Error writing concat list"));
        assert!(message.contains("joined.concat.txt"));
    }
}
