use bytetrack_core::{ByteTracker, Detection, TrackerConfig};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::{
    env,
    error::Error,
    fs,
    path::{Path, PathBuf},
};

/* ----------------------------------------------------------------------------
 * Json schema
 * ---------------------------------------------------------------------------- */

/// One frame of detector output, each row `[x1, y1, x2, y2, score]`.
#[derive(Debug, Deserialize)]
struct FrameJson {
    detections: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct TrackJson {
    track_id: usize,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

#[derive(Debug, Serialize)]
struct FrameTracksJson {
    frame_id: usize,
    tracks: Vec<TrackJson>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        return Ok(());
    }

    let input = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/detections.json"));
    let output = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tracks.json"));
    let config = match args.get(3) {
        Some(path) => load_config(Path::new(path))?,
        None => TrackerConfig::default(),
    };

    let mut tracker = ByteTracker::with_config(config)?;
    log::info!("tracker config: {:?}", tracker.config());

    let frames = load_frames(&input)?;
    let progress = ProgressBar::new(frames.len() as u64);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )?
    .progress_chars("=>-");
    progress.set_style(style);
    progress.set_message("tracking");

    let mut results = Vec::with_capacity(frames.len());
    for frame in frames {
        let objects = frame
            .detections
            .iter()
            .map(|row| Detection::try_from(row.as_slice()))
            .collect::<Result<Vec<_>, _>>()?;
        let tracked = tracker.update(&objects)?;

        results.push(FrameTracksJson {
            frame_id: tracker.frame_id(),
            tracks: tracked
                .iter()
                .map(|obj| {
                    let (track_id, x1, y1, x2, y2) = obj.to_tuple();
                    TrackJson {
                        track_id,
                        x1,
                        y1,
                        x2,
                        y2,
                    }
                })
                .collect(),
        });
        progress.inc(1);
    }
    progress.finish_with_message("done");

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, serde_json::to_string_pretty(&results)?)?;
    log::info!(
        "wrote {} frames ({} live tracks at the end) to {}",
        results.len(),
        tracker.track_count(),
        output.display()
    );

    Ok(())
}

fn print_usage() {
    println!(
        "Usage: cargo run --example track_json [input_json] [output_json] [config_json]\n\
Defaults:\n\
  input_json: data/detections.json\n\
  output_json: data/tracks.json\n\
  config_json: built-in defaults\n\
Input is a JSON array of frames: [{{\"detections\": [[x1, y1, x2, y2, score], ...]}}, ...]"
    );
}

fn load_frames(path: &Path) -> Result<Vec<FrameJson>, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    let frames: Vec<FrameJson> = serde_json::from_str(&data)?;
    Ok(frames)
}

fn load_config(path: &Path) -> Result<TrackerConfig, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    let config: TrackerConfig = serde_json::from_str(&data)?;
    Ok(config)
}
