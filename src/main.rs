//! 記録済みランドマークを再生してストロークを生成する

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use air_writer::config::Config;
use air_writer::recording::load_recording;
use air_writer::session::AirWritingSession;
use air_writer::smoothing::{douglas_peucker, SmoothingKind};

const CONFIG_PATH: &str = "air_writer.toml";

#[derive(Parser, Debug)]
#[command(
    name = "air_writer",
    about = "Replay a hand-landmark recording through the air-writing pipeline"
)]
struct Cli {
    /// JSON Lines recording (one frame per line, `null` = no hand)
    recording: PathBuf,

    /// Config file (defaults are used if missing)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Consecutive frames required to confirm a gesture
    #[arg(long)]
    hold_frames: Option<u32>,

    /// Real-time smoothing method
    #[arg(long)]
    method: Option<String>,

    /// Jitter gate distance in pixels
    #[arg(long)]
    min_distance: Option<f32>,

    /// Disable stroke smoothing
    #[arg(long)]
    no_smoothing: bool,

    /// Print every committed stroke as a JSON line
    #[arg(long)]
    strokes: bool,

    /// Simplify printed strokes with Douglas-Peucker (tolerance in pixels)
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "2.0",
        value_parser = parse_tolerance
    )]
    simplify: Option<f32>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// 0 以上の有限値だけを許可する
fn parse_tolerance(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("tolerance must be a non-negative number, got {s}"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "air_writer=info".into()),
        )
        .init();

    let mut config = Config::load_or_default(&cli.config);
    if let Some(hold_frames) = cli.hold_frames {
        config.gesture.hold_frames = hold_frames;
    }
    if let Some(name) = &cli.method {
        let names = SmoothingKind::ALL.map(|k| k.as_str());
        config.smoothing.method = name
            .parse::<SmoothingKind>()
            .with_context(|| format!("--method must be one of {:?}", names))?;
    }
    if let Some(distance) = cli.min_distance {
        config.stroke.min_distance_threshold = distance;
    }
    if cli.no_smoothing {
        config.smoothing.enabled = false;
    }

    let frames = load_recording(&cli.recording)?;
    info!(
        "replaying {} frames from {} (method: {}, hold: {})",
        frames.len(),
        cli.recording.display(),
        config.smoothing.method,
        config.gesture.hold_frames
    );

    let mut session = AirWritingSession::from_config(&config);
    for (index, frame) in frames.iter().enumerate() {
        for event in session.process_frame(frame.as_ref()) {
            info!("[frame {}] {}", index + 1, event);
        }
    }
    for event in session.finish() {
        info!("[end] {}", event);
    }

    if cli.strokes {
        for stroke in session.tracker().strokes() {
            let points = match cli.simplify {
                Some(epsilon) => douglas_peucker(&stroke.smoothed_points, epsilon),
                None => stroke.smoothed_points.clone(),
            };
            println!("{}", serde_json::to_string(&points)?);
        }
    }

    let summary = session.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("=== Session Summary ===");
        println!("{}", summary);
    }
    Ok(())
}
