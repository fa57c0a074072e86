// src/main.rs

use anyhow::{bail, Context, Result};
use std::fs;
use tracing::{info, warn};

use pitch_analytics::pipeline::{control_shares, run_pipeline};
use pitch_analytics::snapshot;
use pitch_analytics::types::{Config, Frame, PixelOffset};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("pitch_analytics={}", config.logging.level))
        .init();

    info!("⚽ Pitch Track Analytics starting");
    info!("✓ Configuration loaded from {}", config_path);

    let mut store = snapshot::load_tracks(&config.io.tracks_path)?;
    let frame_count = store.frame_count();
    if frame_count == 0 {
        bail!("track snapshot {} has no frames", config.io.tracks_path);
    }

    let camera_motion = match &config.io.camera_motion_path {
        Some(path) => {
            let offsets = snapshot::load_camera_motion(path)?;
            info!("✓ Camera motion loaded ({} offsets)", offsets.len());
            offsets
        }
        None => {
            warn!("no camera motion file configured; assuming a static camera");
            vec![PixelOffset::default(); frame_count]
        }
    };

    let frames = load_raw_frames(&config, frame_count)?;
    info!(
        "✓ {} raw frames loaded ({}x{})",
        frames.len(),
        config.io.frame_width,
        config.io.frame_height
    );

    let output = run_pipeline(&mut store, &frames, &camera_motion, &config)?;

    snapshot::save_tracks(&store, &config.io.output_tracks_path)?;
    snapshot::save_possession(&output.team_ball_control, &config.io.possession_path)?;
    info!("💾 Enriched tracks written to {}", config.io.output_tracks_path);
    info!("💾 Possession series written to {}", config.io.possession_path);

    let report = &output.report;
    let (team1, team2) = control_shares(&output.team_ball_control, frame_count - 1);
    info!("\n📊 Final Report:");
    info!("  Total frames: {}", report.frames);
    info!(
        "  In-bounds positions: {} | Ball frames interpolated: {}",
        report.transformed_positions, report.filled_ball_frames
    );
    info!(
        "  Possession resolved: {}/{} frames ({:.1}%)",
        report.resolved_possession_frames,
        report.frames,
        100.0 * report.resolved_possession_frames as f64 / report.frames.max(1) as f64
    );
    info!(
        "  Team 1 ball control: {:.2}% | Team 2: {:.2}%",
        team1 * 100.0,
        team2 * 100.0
    );

    Ok(())
}

/// Read a raw RGB24 dump (consecutive width*height*3 frames) matching the
/// snapshot's frame range.
fn load_raw_frames(config: &Config, expected: usize) -> Result<Vec<Frame>> {
    let (width, height) = (config.io.frame_width, config.io.frame_height);
    let frame_bytes = width * height * 3;

    let data = fs::read(&config.io.frames_path)
        .with_context(|| format!("reading raw frames {}", config.io.frames_path))?;
    if frame_bytes == 0 || data.len() % frame_bytes != 0 {
        bail!(
            "frame dump {} is not a whole number of {}x{} RGB24 frames",
            config.io.frames_path,
            width,
            height
        );
    }

    let frames: Vec<Frame> = data
        .chunks_exact(frame_bytes)
        .map(|chunk| Frame::new(chunk.to_vec(), width, height))
        .collect();
    if frames.len() != expected {
        bail!(
            "frame dump {} holds {} frames but the track snapshot has {}",
            config.io.frames_path,
            frames.len(),
            expected
        );
    }
    Ok(frames)
}
