// src/error.rs

use thiserror::Error;

/// Structural failures of the analytics core. Recoverable data gaps
/// (missing detections, out-of-bounds positions) are represented as
/// `Option`s in the track store, never as errors.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("team colors queried before seeding; call assign_team_colors first")]
    TeamColorsNotSeeded,

    #[error("team color seeding needs at least two players, got {0}")]
    NotEnoughPlayers(usize),

    #[error("bounding box crop produced too few pixels for color clustering")]
    DegenerateCrop,

    #[error("pixel quadrilateral is degenerate; homography has no solution")]
    DegenerateQuad,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{stage}: supplied {got} frames but the track store has {expected}")]
    FrameCountMismatch {
        stage: &'static str,
        got: usize,
        expected: usize,
    },
}
