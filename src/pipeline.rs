// src/pipeline.rs
//
// Orchestrates the analytics stages over one exclusively-owned track store,
// in the fixed order the derived fields depend on: image positions →
// camera adjustment → perspective mapping → ball gap-fill → speed/distance
// → team assignment → possession.

use serde::Serialize;
use tracing::{info, warn};

use crate::ball_interp::interpolate_ball_track;
use crate::error::TrackError;
use crate::possession::PlayerBallAssigner;
use crate::speed_distance::SpeedDistanceEstimator;
use crate::team_assigner::TeamAssigner;
use crate::track_store::TrackStore;
use crate::types::{Config, Frame, PixelOffset, TeamId};
use crate::view_transform::ViewTransformer;

/// Controlling team for one frame. `Undetermined` covers leading frames
/// before the first resolved possession; later unresolved frames inherit
/// the previous entry instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TeamControl {
    Undetermined,
    Team(TeamId),
}

/// Possession shares up to and including `upto_frame`, as fractions of the
/// determined frames. Undetermined frames count for neither team; both
/// shares are zero while nothing has resolved yet.
pub fn control_shares(series: &[TeamControl], upto_frame: usize) -> (f32, f32) {
    let end = series.len().min(upto_frame + 1);
    let mut team1 = 0usize;
    let mut team2 = 0usize;
    for entry in &series[..end] {
        match entry {
            TeamControl::Team(1) => team1 += 1,
            TeamControl::Team(2) => team2 += 1,
            _ => {}
        }
    }
    let determined = team1 + team2;
    if determined == 0 {
        return (0.0, 0.0);
    }
    (
        team1 as f32 / determined as f32,
        team2 as f32 / determined as f32,
    )
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub frames: usize,
    pub transformed_positions: usize,
    pub filled_ball_frames: usize,
    pub resolved_possession_frames: usize,
}

pub struct PipelineOutput {
    /// One controlling-team entry per frame, gap-free by construction.
    pub team_ball_control: Vec<TeamControl>,
    pub report: PipelineReport,
}

/// Run every stage over the store. `frames` feeds the jersey-color
/// clustering and `camera_motion` comes from the external estimator; both
/// must cover the store's frame range.
pub fn run_pipeline(
    store: &mut TrackStore,
    frames: &[Frame],
    camera_motion: &[PixelOffset],
    config: &Config,
) -> Result<PipelineOutput, TrackError> {
    config.validate()?;
    let frame_count = store.frame_count();
    let mut report = PipelineReport {
        frames: frame_count,
        ..Default::default()
    };

    store.add_positions();
    store.adjust_positions(camera_motion)?;
    info!("✓ positions enriched and camera-adjusted ({frame_count} frames)");

    let transformer = ViewTransformer::from_config(&config.view)?;
    transformer.add_transformed_positions(store);
    store.for_each_record_mut(|_, _, record| {
        if record.position_transformed.is_some() {
            report.transformed_positions += 1;
        }
    });
    info!(
        "✓ perspective mapping done ({} in-bounds positions)",
        report.transformed_positions
    );

    report.filled_ball_frames = interpolate_ball_track(store);
    info!(
        "✓ ball gap-fill done ({} frame(s) interpolated)",
        report.filled_ball_frames
    );

    let estimator =
        SpeedDistanceEstimator::new(config.speed.frame_window, config.speed.frame_rate)?;
    estimator.add_speed_and_distance(store);
    info!("✓ speed and distance computed");

    let mut team_assigner = TeamAssigner::new(config.team.overrides.clone());
    team_assigner.assign_teams(store, frames)?;
    info!("✓ teams assigned");

    let ball_assigner = PlayerBallAssigner::new(config.possession.max_distance);
    let mut team_ball_control = Vec::with_capacity(frame_count);
    for frame_idx in 0..frame_count {
        let assigned = store.ball[frame_idx]
            .as_ref()
            .map(|ball| ball.bbox)
            .and_then(|bbox| ball_assigner.assign(&store.players[frame_idx], &bbox));

        let mut entry = previous_control(&team_ball_control);
        if let Some(record) = assigned.and_then(|id| store.players[frame_idx].get_mut(&id)) {
            record.has_ball = true;
            report.resolved_possession_frames += 1;
            match record.team {
                Some(team) => entry = TeamControl::Team(team),
                // Players get teams in the stage above; reaching here means
                // the store was tampered with mid-run.
                None => warn!("possessing player has no team at frame {frame_idx}"),
            }
        }
        team_ball_control.push(entry);
    }
    info!(
        "✓ possession assigned ({}/{} frames resolved)",
        report.resolved_possession_frames, frame_count
    );

    Ok(PipelineOutput {
        team_ball_control,
        report,
    })
}

fn previous_control(series: &[TeamControl]) -> TeamControl {
    series.last().copied().unwrap_or(TeamControl::Undetermined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::track_store::TrackRecord;
    use std::collections::HashMap;

    // 40x20 white frame with a red and a blue shirt painted into the two
    // player boxes, repeated for every frame of the clip.
    fn test_frames(count: usize) -> Vec<Frame> {
        let (width, height) = (40usize, 20usize);
        let mut data = vec![255u8; width * height * 3];
        let mut paint = |x0: usize, x1: usize, y0: usize, y1: usize, rgb: [u8; 3]| {
            for y in y0..y1 {
                for x in x0..x1 {
                    let idx = (y * width + x) * 3;
                    data[idx..idx + 3].copy_from_slice(&rgb);
                }
            }
        };
        paint(2, 8, 2, 8, [200, 20, 20]);
        paint(22, 28, 2, 8, [20, 20, 200]);
        vec![Frame::new(data, width, height); count]
    }

    fn test_store(count: usize) -> TrackStore {
        let mut players = Vec::new();
        let mut ball = Vec::new();
        for _ in 0..count {
            let mut frame = HashMap::new();
            frame.insert(1, TrackRecord::new(BBox::new(0.0, 0.0, 10.0, 20.0)));
            frame.insert(2, TrackRecord::new(BBox::new(20.0, 0.0, 30.0, 20.0)));
            players.push(frame);
            // Ball next to player 1's feet.
            ball.push(Some(TrackRecord::new(BBox::new(3.0, 17.0, 7.0, 21.0))));
        }
        TrackStore::new(players, vec![HashMap::new(); count], ball).unwrap()
    }

    fn small_pitch_config() -> Config {
        let mut config = Config::default();
        // Map the whole 40x20 test frame onto a 40x20 meter surface.
        config.view.pixel_vertices =
            [[0.0, 0.0], [40.0, 0.0], [40.0, 20.0], [0.0, 20.0]];
        config.view.target_vertices =
            [[0.0, 0.0], [40.0, 0.0], [40.0, 20.0], [0.0, 20.0]];
        config
    }

    #[test]
    fn test_end_to_end_possession_has_no_gaps() {
        let mut store = test_store(3);
        let frames = test_frames(3);
        let motion = vec![PixelOffset::default(); 3];
        let config = small_pitch_config();

        let output = run_pipeline(&mut store, &frames, &motion, &config).unwrap();

        assert_eq!(output.team_ball_control.len(), 3);
        assert!(output
            .team_ball_control
            .iter()
            .all(|c| *c != TeamControl::Undetermined));
        assert_eq!(output.report.resolved_possession_frames, 3);

        // Player 1 is nearest the ball every frame; possession and team
        // must agree.
        for frame_idx in 0..3 {
            let holder = &store.players[frame_idx][&1];
            assert!(holder.has_ball);
            assert_eq!(
                output.team_ball_control[frame_idx],
                TeamControl::Team(holder.team.unwrap())
            );
            assert!(!store.players[frame_idx][&2].has_ball);
        }
    }

    #[test]
    fn test_unresolved_frame_inherits_previous_team() {
        let mut store = test_store(3);
        // Push the ball far from everyone on frame 1.
        store.ball[1] = Some(TrackRecord::new(BBox::new(500.0, 500.0, 504.0, 504.0)));
        let frames = test_frames(3);
        let motion = vec![PixelOffset::default(); 3];

        let output =
            run_pipeline(&mut store, &frames, &motion, &small_pitch_config()).unwrap();

        assert_eq!(output.team_ball_control[1], output.team_ball_control[0]);
        assert_eq!(output.report.resolved_possession_frames, 2);
    }

    #[test]
    fn test_unresolved_leading_frames_are_undetermined() {
        let mut store = test_store(2);
        store.ball[0] = Some(TrackRecord::new(BBox::new(500.0, 500.0, 504.0, 504.0)));
        let frames = test_frames(2);
        let motion = vec![PixelOffset::default(); 2];

        let output =
            run_pipeline(&mut store, &frames, &motion, &small_pitch_config()).unwrap();

        assert_eq!(output.team_ball_control[0], TeamControl::Undetermined);
        assert_ne!(output.team_ball_control[1], TeamControl::Undetermined);
    }

    #[test]
    fn test_control_shares_skip_undetermined() {
        let series = [
            TeamControl::Undetermined,
            TeamControl::Team(1),
            TeamControl::Team(1),
            TeamControl::Team(2),
        ];
        let (team1, team2) = control_shares(&series, 3);
        assert!((team1 - 2.0 / 3.0).abs() < 1e-6);
        assert!((team2 - 1.0 / 3.0).abs() < 1e-6);

        let (team1, _) = control_shares(&series, 0);
        assert!(team1 == 0.0);
    }
}
