// src/speed_distance.rs
//
// Windowed speed and cumulative distance over real-world positions.
// Referees have no meaningful workload stats and the ball gets its own
// treatment elsewhere, so only players are measured.

use std::collections::HashMap;

use tracing::debug;

use crate::error::TrackError;
use crate::geometry::distance;
use crate::track_store::TrackStore;
use crate::types::TrackId;

pub struct SpeedDistanceEstimator {
    frame_window: usize,
    frame_rate: f32,
}

impl Default for SpeedDistanceEstimator {
    fn default() -> Self {
        Self {
            frame_window: 5,
            frame_rate: 24.0,
        }
    }
}

impl SpeedDistanceEstimator {
    /// A window below two frames would make the time denominator zero, and
    /// a non-positive frame rate is meaningless, so both are rejected here
    /// rather than discovered as infinities later.
    pub fn new(frame_window: usize, frame_rate: f32) -> Result<Self, TrackError> {
        if frame_window < 2 {
            return Err(TrackError::InvalidConfig(format!(
                "speed frame_window must be at least 2, got {frame_window}"
            )));
        }
        if frame_rate <= 0.0 {
            return Err(TrackError::InvalidConfig(format!(
                "speed frame_rate must be positive, got {frame_rate}"
            )));
        }
        Ok(Self {
            frame_window,
            frame_rate,
        })
    }

    /// Partition the frame sequence into non-overlapping windows of
    /// `frame_window` frames and, for every player present at both window
    /// endpoints with transformed positions, write the window's speed and
    /// the player's running distance total into each in-window frame.
    ///
    /// Totals persist across windows; a player absent from a window's end
    /// frame is skipped for that window but keeps their total.
    pub fn add_speed_and_distance(&self, store: &mut TrackStore) {
        let frames = store.players.len();
        let mut totals: HashMap<TrackId, f32> = HashMap::new();

        let mut frame = 0;
        while frame < frames {
            let last = (frame + self.frame_window).min(frames - 1);
            if last == frame {
                // Clamped final window would span zero time.
                break;
            }

            let ids: Vec<TrackId> = store.players[frame].keys().copied().collect();
            for id in ids {
                let Some(start) = store.players[frame][&id].position_transformed else {
                    continue;
                };
                let Some(end) = store.players[last]
                    .get(&id)
                    .and_then(|r| r.position_transformed)
                else {
                    continue;
                };

                let covered = distance(start, end);
                let elapsed = (last - frame) as f32 / self.frame_rate;
                let speed_kmh = covered / elapsed * 3.6;

                let total = totals.entry(id).or_insert(0.0);
                *total += covered;
                let total = *total;

                debug!(
                    "player {} window [{frame}, {last}]: {:.2} m, {:.1} km/h",
                    id, covered, speed_kmh
                );

                for f in frame..last {
                    if let Some(record) = store.players[f].get_mut(&id) {
                        record.speed = Some(speed_kmh);
                        record.distance = Some(total);
                    }
                }
            }

            frame += self.frame_window;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BBox, Point};
    use crate::track_store::TrackRecord;

    fn record_at(x: f32, y: f32) -> TrackRecord {
        let mut record = TrackRecord::new(BBox::new(0.0, 0.0, 10.0, 10.0));
        record.position_transformed = Some(Point::new(x, y));
        record
    }

    fn store_with_player_path(positions: &[Option<(f32, f32)>]) -> TrackStore {
        let players = positions
            .iter()
            .map(|p| {
                let mut frame = HashMap::new();
                if let Some((x, y)) = p {
                    frame.insert(3, record_at(*x, *y));
                }
                frame
            })
            .collect::<Vec<_>>();
        let n = players.len();
        TrackStore::new(players, vec![HashMap::new(); n], vec![None; n]).unwrap()
    }

    #[test]
    fn test_window_speed_and_distance() {
        // 10 meters covered in 5 frames at 24 fps: 172.8 km/h.
        let path: Vec<Option<(f32, f32)>> = (0..6)
            .map(|i| Some((2.0 * i as f32, 0.0)))
            .collect();
        let mut store = store_with_player_path(&path);

        let estimator = SpeedDistanceEstimator::default();
        estimator.add_speed_and_distance(&mut store);

        for f in 0..5 {
            let record = &store.players[f][&3];
            assert!((record.speed.unwrap() - 172.8).abs() < 1e-2);
            assert!((record.distance.unwrap() - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_distance_accumulates_across_windows() {
        // Constant 2 m/frame over 11 frames: two full windows.
        let path: Vec<Option<(f32, f32)>> = (0..11)
            .map(|i| Some((2.0 * i as f32, 0.0)))
            .collect();
        let mut store = store_with_player_path(&path);

        SpeedDistanceEstimator::default().add_speed_and_distance(&mut store);

        assert!((store.players[2][&3].distance.unwrap() - 10.0).abs() < 1e-4);
        assert!((store.players[7][&3].distance.unwrap() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_transform_skips_window() {
        let path = vec![
            Some((0.0, 0.0)),
            Some((1.0, 0.0)),
            Some((2.0, 0.0)),
            None,
            Some((4.0, 0.0)),
            Some((5.0, 0.0)),
        ];
        let mut store = store_with_player_path(&path);
        // Remove the end-of-window transform: frame 5 present but unmapped.
        store.players[5].get_mut(&3).unwrap().position_transformed = None;

        SpeedDistanceEstimator::default().add_speed_and_distance(&mut store);

        assert!(store.players[0][&3].speed.is_none());
    }

    #[test]
    fn test_absent_at_window_end_preserves_total() {
        // Present for the first window, gone at frame 10 (second window's
        // end), back afterwards.
        let mut path: Vec<Option<(f32, f32)>> =
            (0..16).map(|i| Some((i as f32, 0.0))).collect();
        path[10] = None;
        let mut store = store_with_player_path(&path);

        SpeedDistanceEstimator::default().add_speed_and_distance(&mut store);

        // First window [0, 5] wrote 5 m into frames 0..5.
        assert!((store.players[4][&3].distance.unwrap() - 5.0).abs() < 1e-4);
        // Second window [5, 10] needs frame 10, which is absent: skipped
        // entirely, nothing written into frames 5..10.
        assert!(store.players[7][&3].speed.is_none());
        // Third window starts at the absent frame 10: no identities there.
        assert!(store.players[12][&3].speed.is_none());
    }

    #[test]
    fn test_referees_and_ball_untouched() {
        let mut store = store_with_player_path(&[Some((0.0, 0.0)), Some((1.0, 0.0))]);
        store.referees[0].insert(9, record_at(0.0, 0.0));
        store.referees[1].insert(9, record_at(3.0, 0.0));

        SpeedDistanceEstimator::default().add_speed_and_distance(&mut store);

        assert!(store.referees[0][&9].speed.is_none());
    }

    #[test]
    fn test_rejects_degenerate_window() {
        assert!(SpeedDistanceEstimator::new(1, 24.0).is_err());
        assert!(SpeedDistanceEstimator::new(5, 0.0).is_err());
    }
}
