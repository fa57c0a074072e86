// src/possession.rs

use std::collections::HashMap;

use crate::geometry::{distance, BBox};
use crate::track_store::TrackRecord;
use crate::types::TrackId;

/// Nearest-player ball assignment: the player whose closest foot corner is
/// within `max_distance` pixels of the ball center claims possession.
pub struct PlayerBallAssigner {
    max_distance: f32,
}

impl Default for PlayerBallAssigner {
    fn default() -> Self {
        Self { max_distance: 70.0 }
    }
}

impl PlayerBallAssigner {
    pub fn new(max_distance: f32) -> Self {
        Self { max_distance }
    }

    /// Returns the claiming player, or `None` when nobody is close enough
    /// (an unresolved frame, not an error). Players are scanned in
    /// ascending track id, so ties on the minimum distance keep the lowest
    /// id — an implementation-defined tie-break.
    pub fn assign(
        &self,
        players: &HashMap<TrackId, TrackRecord>,
        ball_bbox: &BBox,
    ) -> Option<TrackId> {
        let ball = ball_bbox.center();

        let mut ids: Vec<TrackId> = players.keys().copied().collect();
        ids.sort_unstable();

        let mut best: Option<(TrackId, f32)> = None;
        for id in ids {
            let bbox = &players[&id].bbox;
            let left = distance(bbox.bottom_left(), ball);
            let right = distance(bbox.bottom_right(), ball);
            let d = left.min(right);

            if d < self.max_distance && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }

        best.map(|(id, _)| id)
    }
}
