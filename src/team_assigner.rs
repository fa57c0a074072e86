// src/team_assigner.rs
//
// Jersey-color clustering and per-player team assignment. Two passes:
// a one-time seeding that clusters the first frame's jersey colors into two
// team prototypes, then a per-observation lookup that is memoized per track
// id, so a player's team survives later occlusion and lighting noise.

use std::collections::HashMap;

use tracing::debug;

use crate::error::TrackError;
use crate::geometry::BBox;
use crate::track_store::{TrackRecord, TrackStore};
use crate::types::{Frame, Rgb, TeamId, TrackId};

/// Capability interface: cluster N color samples into K centroids.
/// Any standard clustering routine satisfies this contract.
pub trait ColorClusterer {
    fn cluster(&self, samples: &[Rgb], k: usize) -> ClusterOutcome;
}

pub struct ClusterOutcome {
    pub centroids: Vec<Rgb>,
    /// Per-sample index into `centroids`.
    pub labels: Vec<usize>,
}

/// Lloyd's k-means with deterministic farthest-first seeding, so repeated
/// runs over the same frame produce the same prototypes.
pub struct KMeans {
    pub max_iterations: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self { max_iterations: 20 }
    }
}

impl ColorClusterer for KMeans {
    fn cluster(&self, samples: &[Rgb], k: usize) -> ClusterOutcome {
        if samples.is_empty() || k == 0 {
            return ClusterOutcome {
                centroids: Vec::new(),
                labels: Vec::new(),
            };
        }

        // Farthest-first traversal: start from the first sample, then
        // repeatedly take the sample farthest from its nearest centroid.
        let mut centroids = vec![samples[0]];
        while centroids.len() < k {
            let next = samples
                .iter()
                .max_by(|a, b| {
                    let da = nearest(&centroids, **a).1;
                    let db = nearest(&centroids, **b).1;
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .copied()
                .unwrap_or(samples[0]);
            centroids.push(next);
        }

        let mut labels = vec![0usize; samples.len()];
        for _ in 0..self.max_iterations {
            let mut changed = false;
            for (i, sample) in samples.iter().enumerate() {
                let (label, _) = nearest(&centroids, *sample);
                if labels[i] != label {
                    labels[i] = label;
                    changed = true;
                }
            }

            let mut sums = vec![(0.0f32, 0.0f32, 0.0f32, 0usize); k];
            for (sample, &label) in samples.iter().zip(labels.iter()) {
                let entry = &mut sums[label];
                entry.0 += sample.r;
                entry.1 += sample.g;
                entry.2 += sample.b;
                entry.3 += 1;
            }
            for (centroid, (r, g, b, count)) in centroids.iter_mut().zip(sums) {
                if count > 0 {
                    *centroid = Rgb::new(
                        r / count as f32,
                        g / count as f32,
                        b / count as f32,
                    );
                }
            }

            if !changed {
                break;
            }
        }

        ClusterOutcome { centroids, labels }
    }
}

fn nearest(centroids: &[Rgb], sample: Rgb) -> (usize, f32) {
    let mut best = (0usize, f32::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = sample.distance(*c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

pub struct TeamAssigner<C: ColorClusterer = KMeans> {
    clusterer: C,
    /// Prototype jersey colors for teams 1 and 2; absent until seeded.
    team_colors: Option<[Rgb; 2]>,
    assignments: HashMap<TrackId, TeamId>,
    overrides: HashMap<TrackId, TeamId>,
}

impl TeamAssigner<KMeans> {
    pub fn new(overrides: HashMap<TrackId, TeamId>) -> Self {
        Self::with_clusterer(KMeans::default(), overrides)
    }
}

impl<C: ColorClusterer> TeamAssigner<C> {
    pub fn with_clusterer(clusterer: C, overrides: HashMap<TrackId, TeamId>) -> Self {
        Self {
            clusterer,
            team_colors: None,
            assignments: HashMap::new(),
            overrides,
        }
    }

    pub fn team_color(&self, team: TeamId) -> Option<Rgb> {
        let colors = self.team_colors?;
        match team {
            1 => Some(colors[0]),
            2 => Some(colors[1]),
            _ => None,
        }
    }

    /// One-time seeding: cluster the first frame's jersey colors into the
    /// two team prototypes. Needs at least two players on screen.
    pub fn assign_team_colors(
        &mut self,
        frame: &Frame,
        players: &HashMap<TrackId, TrackRecord>,
    ) -> Result<(), TrackError> {
        if players.len() < 2 {
            return Err(TrackError::NotEnoughPlayers(players.len()));
        }

        let mut ids: Vec<TrackId> = players.keys().copied().collect();
        ids.sort_unstable();

        let mut colors = Vec::with_capacity(ids.len());
        for id in &ids {
            colors.push(self.jersey_color(frame, &players[id].bbox)?);
        }

        let outcome = self.clusterer.cluster(&colors, 2);
        self.team_colors = Some([outcome.centroids[0], outcome.centroids[1]]);
        debug!(
            "team prototypes seeded from {} players: {:?} / {:?}",
            ids.len(),
            outcome.centroids[0],
            outcome.centroids[1]
        );
        Ok(())
    }

    /// Team for one player observation. Memoized: a previously assigned
    /// identity returns its cached team without touching pixels again.
    pub fn player_team(
        &mut self,
        frame: &Frame,
        bbox: &BBox,
        id: TrackId,
    ) -> Result<TeamId, TrackError> {
        if let Some(&team) = self.assignments.get(&id) {
            return Ok(team);
        }

        let prototypes = self.team_colors.ok_or(TrackError::TeamColorsNotSeeded)?;
        let color = self.jersey_color(frame, bbox)?;

        let mut team: TeamId = if color.distance(prototypes[0]) <= color.distance(prototypes[1]) {
            1
        } else {
            2
        };
        if let Some(&forced) = self.overrides.get(&id) {
            team = forced;
        }

        self.assignments.insert(id, team);
        Ok(team)
    }

    /// Dominant jersey color inside a box: cluster the top-half crop's
    /// pixels into two groups and drop the group the four crop corners vote
    /// for — corners are overwhelmingly grass or crowd, not shirt.
    fn jersey_color(&self, frame: &Frame, bbox: &BBox) -> Result<Rgb, TrackError> {
        let x1 = (bbox.x1.max(0.0) as usize).min(frame.width);
        let y1 = (bbox.y1.max(0.0) as usize).min(frame.height);
        let x2 = (bbox.x2.max(0.0) as usize).min(frame.width);
        let y2 = (bbox.y2.max(0.0) as usize).min(frame.height);

        let width = x2.saturating_sub(x1);
        let half_height = y2.saturating_sub(y1) / 2;
        if width == 0 || half_height == 0 {
            return Err(TrackError::DegenerateCrop);
        }

        let mut pixels = Vec::with_capacity(width * half_height);
        for y in y1..y1 + half_height {
            for x in x1..x2 {
                if let Some(px) = frame.rgb_at(x, y) {
                    pixels.push(px);
                }
            }
        }
        if pixels.len() < 2 {
            return Err(TrackError::DegenerateCrop);
        }

        let outcome = self.clusterer.cluster(&pixels, 2);

        let corner_label = |cx: usize, cy: usize| outcome.labels[cy * width + cx];
        let corners = [
            corner_label(0, 0),
            corner_label(width - 1, 0),
            corner_label(0, half_height - 1),
            corner_label(width - 1, half_height - 1),
        ];
        let zeros = corners.iter().filter(|&&l| l == 0).count();
        let background = if zeros >= 2 { 0 } else { 1 };
        let player_cluster = 1 - background;

        Ok(outcome.centroids[player_cluster])
    }

    /// Stage pass: seed from the first frame, then write `team` and
    /// `team_color` into every player record of every frame.
    pub fn assign_teams(
        &mut self,
        store: &mut TrackStore,
        frames: &[Frame],
    ) -> Result<(), TrackError> {
        if frames.len() != store.frame_count() {
            return Err(TrackError::FrameCountMismatch {
                stage: "team assignment",
                got: frames.len(),
                expected: store.frame_count(),
            });
        }
        if frames.is_empty() {
            return Ok(());
        }

        self.assign_team_colors(&frames[0], &store.players[0])?;

        for (frame_idx, frame) in frames.iter().enumerate() {
            let mut ids: Vec<TrackId> = store.players[frame_idx].keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                let bbox = store.players[frame_idx][&id].bbox;
                let team = self.player_team(frame, &bbox, id)?;
                if let Some(record) = store.players[frame_idx].get_mut(&id) {
                    record.team = Some(team);
                    record.team_color = self.team_color(team);
                }
            }
        }
        Ok(())
    }
}
