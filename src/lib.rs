// src/lib.rs
//
// Track analytics core for football match footage: turns raw per-frame
// tracker output (bounding boxes with stable identities) into real-world
// positions, per-player speed and distance, team identities and a
// per-frame ball-possession series. Detection, tracking, camera-motion
// estimation and rendering live outside this crate.

pub mod ball_interp;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod possession;
pub mod snapshot;
pub mod speed_distance;
pub mod team_assigner;
pub mod track_store;
pub mod types;
pub mod view_transform;

mod config;

pub use error::TrackError;
pub use geometry::{BBox, Point};
pub use pipeline::{control_shares, run_pipeline, PipelineOutput, TeamControl};
pub use possession::PlayerBallAssigner;
pub use speed_distance::SpeedDistanceEstimator;
pub use team_assigner::{ColorClusterer, KMeans, TeamAssigner};
pub use track_store::{TrackRecord, TrackStore};
pub use types::{Config, Frame, PixelOffset, Rgb, TeamId, TrackId};
pub use view_transform::ViewTransformer;
