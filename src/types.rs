// src/types.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;

/// Stable identity assigned upstream by the tracker.
pub type TrackId = u32;

/// Team id, 1 or 2.
pub type TeamId = u8;

/// RGB color with 0-255 channels. Float channels because cluster
/// centroids are averages of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn distance(&self, other: Rgb) -> f32 {
        ((self.r - other.r).powi(2) + (self.g - other.g).powi(2) + (self.b - other.b).powi(2))
            .sqrt()
    }
}

/// Raw RGB24 frame buffer, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn rgb_at(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        if idx + 2 >= self.data.len() {
            return None;
        }
        Some(Rgb::new(
            self.data[idx] as f32,
            self.data[idx + 1] as f32,
            self.data[idx + 2] as f32,
        ))
    }
}

/// Per-frame camera-motion correction in pixels, supplied by the external
/// camera-motion estimator and added to image-space positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelOffset {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub view: ViewConfig,
    pub speed: SpeedConfig,
    pub possession: PossessionConfig,
    pub team: TeamConfig,
    pub io: IoConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject structurally invalid values before any stage runs.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.speed.frame_window < 2 {
            return Err(TrackError::InvalidConfig(format!(
                "speed.frame_window must be at least 2, got {}",
                self.speed.frame_window
            )));
        }
        if self.speed.frame_rate <= 0.0 {
            return Err(TrackError::InvalidConfig(format!(
                "speed.frame_rate must be positive, got {}",
                self.speed.frame_rate
            )));
        }
        if self.possession.max_distance <= 0.0 {
            return Err(TrackError::InvalidConfig(format!(
                "possession.max_distance must be positive, got {}",
                self.possession.max_distance
            )));
        }
        for (&id, &team) in &self.team.overrides {
            if team != 1 && team != 2 {
                return Err(TrackError::InvalidConfig(format!(
                    "team.overrides[{}] must be 1 or 2, got {}",
                    id, team
                )));
            }
        }
        Ok(())
    }
}

/// Pitch calibration: four image-pixel vertices and the matching
/// playing-surface vertices in meters, in consistent winding order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub pixel_vertices: [[f32; 2]; 4],
    pub target_vertices: [[f32; 2]; 4],
}

impl Default for ViewConfig {
    fn default() -> Self {
        // Calibration for the reference broadcast camera: the visible
        // trapezoid of a 68m-wide, 23.32m-deep slice of pitch.
        Self {
            pixel_vertices: [
                [110.0, 1035.0],
                [265.0, 275.0],
                [910.0, 260.0],
                [1640.0, 915.0],
            ],
            target_vertices: [[0.0, 68.0], [0.0, 0.0], [23.32, 0.0], [23.32, 68.0]],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Frames per speed window. Must be at least 2.
    pub frame_window: usize,
    pub frame_rate: f32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            frame_window: 5,
            frame_rate: 24.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PossessionConfig {
    /// Maximum foot-to-ball distance in pixels for a possession claim.
    pub max_distance: f32,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self { max_distance: 70.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Forced team per track id, for identities the color clustering is
    /// known to get wrong on a given dataset.
    pub overrides: HashMap<TrackId, TeamId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Cached track-store snapshot produced by the upstream tracker.
    pub tracks_path: String,
    /// Optional per-frame camera-motion offsets; zeros when absent.
    pub camera_motion_path: Option<String>,
    /// Raw RGB24 frame dump matching the snapshot's frame count.
    pub frames_path: String,
    pub frame_width: usize,
    pub frame_height: usize,
    pub output_tracks_path: String,
    pub possession_path: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            tracks_path: "stubs/track_stubs.json".to_string(),
            camera_motion_path: None,
            frames_path: "input/frames.rgb".to_string(),
            frame_width: 1920,
            frame_height: 1080,
            output_tracks_path: "output/tracks.json".to_string(),
            possession_path: "output/team_ball_control.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_single_frame_window() {
        let mut config = Config::default();
        config.speed.frame_window = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_override_team() {
        let mut config = Config::default();
        config.team.overrides.insert(91, 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_pixel_access() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1);
        let px = frame.rgb_at(1, 0).unwrap();
        assert!((px.r - 40.0).abs() < 1e-6);
        assert!(frame.rgb_at(2, 0).is_none());
    }
}
