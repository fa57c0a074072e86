// src/track_store.rs
//
// The shared per-frame, per-identity store every pipeline stage reads and
// mutates. Categories are typed fields rather than string keys; the ball
// has at most one instance per frame, so its per-frame map collapses to an
// `Option` under a fixed synthetic identity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::geometry::{BBox, Point};
use crate::types::{PixelOffset, Rgb, TeamId, TrackId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Players,
    Referees,
    Ball,
}

/// Per-frame, per-identity attribute record. `bbox` is required from
/// creation; everything else is populated progressively by the stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_adjusted: Option<Point>,
    /// Real-world position in meters, or `None` when the adjusted position
    /// falls outside the mapped playing surface. Never stale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_transformed: Option<Point>,
    /// Windowed speed in km/h. Players only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Cumulative real-world distance in meters. Players only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_color: Option<Rgb>,
    #[serde(default)]
    pub has_ball: bool,
}

impl TrackRecord {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            position: None,
            position_adjusted: None,
            position_transformed: None,
            speed: None,
            distance: None,
            team: None,
            team_color: None,
            has_ball: false,
        }
    }
}

/// One element per video frame in every category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackStore {
    pub players: Vec<HashMap<TrackId, TrackRecord>>,
    pub referees: Vec<HashMap<TrackId, TrackRecord>>,
    pub ball: Vec<Option<TrackRecord>>,
}

impl TrackStore {
    /// Build a store from raw tracker output. All categories must cover the
    /// same frame range.
    pub fn new(
        players: Vec<HashMap<TrackId, TrackRecord>>,
        referees: Vec<HashMap<TrackId, TrackRecord>>,
        ball: Vec<Option<TrackRecord>>,
    ) -> Result<Self, TrackError> {
        if referees.len() != players.len() {
            return Err(TrackError::FrameCountMismatch {
                stage: "track store referees",
                got: referees.len(),
                expected: players.len(),
            });
        }
        if ball.len() != players.len() {
            return Err(TrackError::FrameCountMismatch {
                stage: "track store ball",
                got: ball.len(),
                expected: players.len(),
            });
        }
        Ok(Self {
            players,
            referees,
            ball,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.players.len()
    }

    /// Stage 1: derive the image-space anchor point of every record.
    /// Ball → box center; players and referees → foot position.
    pub fn add_positions(&mut self) {
        for frame in self.players.iter_mut().chain(self.referees.iter_mut()) {
            for record in frame.values_mut() {
                record.position = Some(record.bbox.foot_position());
            }
        }
        for slot in self.ball.iter_mut().flatten() {
            slot.position = Some(slot.bbox.center());
        }
    }

    /// Stage 2: apply the external per-frame camera-motion offset to every
    /// record's position, producing `position_adjusted`.
    pub fn adjust_positions(&mut self, camera_motion: &[PixelOffset]) -> Result<(), TrackError> {
        if camera_motion.len() != self.frame_count() {
            return Err(TrackError::FrameCountMismatch {
                stage: "camera motion",
                got: camera_motion.len(),
                expected: self.frame_count(),
            });
        }
        for (frame_idx, offset) in camera_motion.iter().enumerate() {
            for record in self.players[frame_idx]
                .values_mut()
                .chain(self.referees[frame_idx].values_mut())
                .chain(self.ball[frame_idx].iter_mut())
            {
                record.position_adjusted = record
                    .position
                    .map(|p| Point::new(p.x + offset.dx, p.y + offset.dy));
            }
        }
        Ok(())
    }

    /// Visit every record of every category, mutably.
    pub fn for_each_record_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(EntityCategory, usize, &mut TrackRecord),
    {
        for (idx, frame) in self.players.iter_mut().enumerate() {
            for record in frame.values_mut() {
                f(EntityCategory::Players, idx, record);
            }
        }
        for (idx, frame) in self.referees.iter_mut().enumerate() {
            for record in frame.values_mut() {
                f(EntityCategory::Referees, idx, record);
            }
        }
        for (idx, slot) in self.ball.iter_mut().enumerate() {
            if let Some(record) = slot {
                f(EntityCategory::Ball, idx, record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_player_store() -> TrackStore {
        let mut frame = HashMap::new();
        frame.insert(7, TrackRecord::new(BBox::new(10.0, 10.0, 30.0, 50.0)));
        TrackStore::new(
            vec![frame],
            vec![HashMap::new()],
            vec![Some(TrackRecord::new(BBox::new(100.0, 100.0, 110.0, 110.0)))],
        )
        .unwrap()
    }

    #[test]
    fn test_frame_count_mismatch_is_rejected() {
        let result = TrackStore::new(vec![HashMap::new()], vec![], vec![None]);
        assert!(result.is_err());
    }

    #[test]
    fn test_positions_are_category_dependent() {
        let mut store = single_player_store();
        store.add_positions();

        let player = &store.players[0][&7];
        let pos = player.position.unwrap();
        assert!((pos.x - 20.0).abs() < 1e-6);
        assert!((pos.y - 50.0).abs() < 1e-6);

        let ball = store.ball[0].as_ref().unwrap();
        let pos = ball.position.unwrap();
        assert!((pos.x - 105.0).abs() < 1e-6);
        assert!((pos.y - 105.0).abs() < 1e-6);
    }

    #[test]
    fn test_camera_motion_is_added() {
        let mut store = single_player_store();
        store.add_positions();
        store
            .adjust_positions(&[PixelOffset { dx: -5.0, dy: 3.0 }])
            .unwrap();

        let adjusted = store.players[0][&7].position_adjusted.unwrap();
        assert!((adjusted.x - 15.0).abs() < 1e-6);
        assert!((adjusted.y - 53.0).abs() < 1e-6);
    }

    #[test]
    fn test_camera_motion_length_checked() {
        let mut store = single_player_store();
        store.add_positions();
        assert!(store.adjust_positions(&[]).is_err());
    }
}
