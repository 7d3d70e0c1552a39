mod ui;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, arg};
use log::{error, info};
use telesync::{
    Projection, TelesyncError, Track, VideoInfo,
    config::{AppConfig, ToolPaths},
    sync::SyncController,
    track::parse_track,
    video, writer,
};
use ui::viewer::TelesyncViewerApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the viewer, loading the files right away when both are given
    View {
        #[arg(short, long)]
        track: Option<PathBuf>,

        #[arg(short, long)]
        video: Option<PathBuf>,

        #[arg(short, long, allow_hyphen_values = true)]
        offset: Option<i64>,
    },
    /// Print a summary of how the track lines up with the video
    Inspect {
        #[arg(short, long)]
        track: PathBuf,

        #[arg(short, long)]
        video: PathBuf,

        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Write the projected telemetry as JSON lines
    Export {
        #[arg(short, long)]
        track: PathBuf,

        #[arg(short, long)]
        video: PathBuf,

        #[arg(short = 'O', long)]
        output: PathBuf,

        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,

        /// One point per second of video instead of one per frame
        #[arg(long)]
        per_second: bool,
    },
    /// Join several recordings into one video without re-encoding
    Concat {
        #[arg(short = 'O', long)]
        output: PathBuf,

        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
    },
}

/// Parses the track and probes the video. Both must succeed before anything
/// is handed to the playback state.
pub(crate) fn load_inputs(
    track_path: &Path,
    video_path: &Path,
    tools: &ToolPaths,
) -> Result<(Track, VideoInfo), TelesyncError> {
    let track = parse_track(track_path, tools)?;
    let video = video::probe(video_path, &tools.ffprobe)?;
    video.validate()?;
    Ok((track, video))
}

fn view(
    track: Option<PathBuf>,
    video: Option<PathBuf>,
    offset: Option<i64>,
    app_config: AppConfig,
) -> Result<(), TelesyncError> {
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_title("Telesync")
        .with_inner_size([1280., 800.]);

    eframe::run_native(
        "Telesync",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(TelesyncViewerApp::new(
                app_config, track, video, offset, cc,
            )))
        }),
    )
    .map_err(|e| TelesyncError::ViewerError {
        description: e.to_string(),
    })
}

fn inspect(
    track_path: &Path,
    video_path: &Path,
    offset: i64,
    tools: &ToolPaths,
) -> Result<(), TelesyncError> {
    let (track, video) = load_inputs(track_path, video_path, tools)?;
    let projection = SyncController::with_offset(offset).reproject(&track, &video);

    println!(
        "Track: {} points ({} valid), {:.2} km over {:.1}s",
        track.total_count(),
        track.valid_count(),
        track.total_distance_km(),
        track.duration_ms() / 1000.
    );
    println!(
        "Video: {:.2}s at {:.2} fps, {}x{}",
        video.duration_seconds, video.frames_per_second, video.width, video.height
    );
    if let Some(created) = video.creation_time {
        println!("Video created: {}", created.to_rfc3339());
    }
    print_coverage(&projection);
    Ok(())
}

fn print_coverage(projection: &Projection) {
    let frames = projection.frame_count();
    let valid = projection.valid_frame_count();
    let coverage = if frames == 0 {
        0.
    } else {
        valid as f64 / frames as f64 * 100.
    };
    println!(
        "Offset {}ms: {} of {} frames have a GPS fix ({:.1}%)",
        projection.sync_offset_ms(),
        valid,
        frames,
        coverage
    );
}

fn export(
    track_path: &Path,
    video_path: &Path,
    output: &Path,
    offset: i64,
    per_second: bool,
    tools: &ToolPaths,
) -> Result<(), TelesyncError> {
    let (track, video) = load_inputs(track_path, video_path, tools)?;
    let projection = SyncController::with_offset(offset).reproject(&track, &video);
    let points = if per_second {
        projection.seconds()
    } else {
        projection.frames()
    };
    writer::write_projection(output, points)
}

fn concat(inputs: &[PathBuf], output: &Path, tools: &ToolPaths) -> Result<(), TelesyncError> {
    let joined = video::concatenate(inputs, output, tools)?;
    println!("Joined {} videos into {}", inputs.len(), joined.display());
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        error!("Could not set Ctrl-C handler: {}", e);
    }

    let app_config = AppConfig::from_local_file().unwrap_or_default();
    info!("Using tools {:?}", app_config.tools);
    let tools = app_config.tools.clone();

    let result = match cli.command {
        Commands::View {
            track,
            video,
            offset,
        } => view(track, video, offset, app_config),
        Commands::Inspect {
            track,
            video,
            offset,
        } => inspect(&track, &video, offset, &tools),
        Commands::Export {
            track,
            video,
            output,
            offset,
            per_second,
        } => export(&track, &video, &output, offset, per_second, &tools),
        Commands::Concat { output, inputs } => concat(&inputs, &output, &tools),
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
