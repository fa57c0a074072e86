// src/ball_interp.rs
//
// The ball is small, fast and frequently occluded, so the detector misses
// it on many frames. Interior gaps are bridged by linear interpolation of
// the four box coordinates between the nearest surrounding detections;
// leading gaps take the first detection, trailing gaps the last.

use tracing::debug;

use crate::geometry::BBox;
use crate::track_store::{TrackRecord, TrackStore};

/// Fill per-coordinate gaps in a bounding-box sequence. A sequence with no
/// detections at all comes back unchanged.
pub fn fill_boxes(boxes: &[Option<BBox>]) -> Vec<Option<BBox>> {
    let detected: Vec<(usize, BBox)> = boxes
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.map(|bbox| (i, bbox)))
        .collect();

    let (Some(&(first, first_box)), Some(&(last, last_box))) =
        (detected.first(), detected.last())
    else {
        return boxes.to_vec();
    };

    let mut filled = Vec::with_capacity(boxes.len());
    // Index of the first detection at or after the current frame.
    let mut next_idx = 0usize;
    for (i, slot) in boxes.iter().enumerate() {
        while next_idx < detected.len() && detected[next_idx].0 < i {
            next_idx += 1;
        }

        if let Some(bbox) = slot {
            filled.push(Some(*bbox));
            continue;
        }

        let bbox = if i < first {
            first_box
        } else if i > last {
            last_box
        } else {
            // Interior gap: detections exist on both sides.
            let (next_i, next_box) = detected[next_idx];
            let (prev_i, prev_box) = detected[next_idx - 1];
            let t = (i - prev_i) as f32 / (next_i - prev_i) as f32;
            lerp_bbox(&prev_box, &next_box, t)
        };
        filled.push(Some(bbox));
    }
    filled
}

fn lerp_bbox(a: &BBox, b: &BBox, t: f32) -> BBox {
    let lerp = |a: f32, b: f32| a + (b - a) * t;
    BBox::new(
        lerp(a.x1, b.x1),
        lerp(a.y1, b.y1),
        lerp(a.x2, b.x2),
        lerp(a.y2, b.y2),
    )
}

/// Stage pass: fill the store's missing ball frames. Frames that already
/// have a record keep it untouched; filled frames get a fresh record whose
/// derived fields are left for later stages. Returns the number of frames
/// filled.
pub fn interpolate_ball_track(store: &mut TrackStore) -> usize {
    let boxes: Vec<Option<BBox>> = store
        .ball
        .iter()
        .map(|slot| slot.as_ref().map(|r| r.bbox))
        .collect();

    let filled = fill_boxes(&boxes);

    let mut new_frames = 0;
    for (slot, bbox) in store.ball.iter_mut().zip(filled) {
        if slot.is_none() {
            if let Some(bbox) = bbox {
                *slot = Some(TrackRecord::new(bbox));
                new_frames += 1;
            }
        }
    }

    debug!("ball gap-fill: {} frame(s) interpolated", new_frames);
    new_frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(v: f32) -> BBox {
        BBox::new(v, v, v + 10.0, v + 10.0)
    }

    #[test]
    fn test_interior_gap_is_linearly_interpolated() {
        // Detections at 0, 5 and 10; everything else missing.
        let mut boxes = vec![None; 11];
        boxes[0] = Some(square(0.0));
        boxes[5] = Some(square(50.0));
        boxes[10] = Some(square(100.0));

        let filled = fill_boxes(&boxes);
        assert!(filled.iter().all(|b| b.is_some()));

        // Frame 2 sits at t = 2/5 between frames 0 and 5.
        let frame2 = filled[2].unwrap();
        assert!((frame2.x1 - 20.0).abs() < 1e-4);
        assert!((frame2.y2 - 30.0).abs() < 1e-4);

        let frame7 = filled[7].unwrap();
        assert!((frame7.x1 - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_leading_gap_backfills_first_detection() {
        let mut boxes = vec![None; 5];
        boxes[3] = Some(square(30.0));
        boxes[4] = Some(square(40.0));

        let filled = fill_boxes(&boxes);
        for i in 0..3 {
            assert_eq!(filled[i].unwrap(), square(30.0));
        }
    }

    #[test]
    fn test_trailing_gap_repeats_last_detection() {
        let mut boxes = vec![None; 4];
        boxes[0] = Some(square(0.0));
        boxes[1] = Some(square(10.0));

        let filled = fill_boxes(&boxes);
        assert_eq!(filled[2].unwrap(), square(10.0));
        assert_eq!(filled[3].unwrap(), square(10.0));
    }

    #[test]
    fn test_no_detections_stays_empty() {
        let boxes = vec![None; 6];
        let filled = fill_boxes(&boxes);
        assert!(filled.iter().all(|b| b.is_none()));
    }

    #[test]
    fn test_store_pass_preserves_existing_records() {
        let mut store = TrackStore::default();
        let mut detected = TrackRecord::new(square(0.0));
        detected.position = Some(detected.bbox.center());
        store.ball = vec![Some(detected), None, Some(TrackRecord::new(square(20.0)))];
        store.players = vec![Default::default(); 3];
        store.referees = vec![Default::default(); 3];

        let filled = interpolate_ball_track(&mut store);
        assert_eq!(filled, 1);
        assert!(store.ball[0].as_ref().unwrap().position.is_some());
        let mid = store.ball[1].as_ref().unwrap();
        assert!((mid.bbox.x1 - 10.0).abs() < 1e-4);
    }
}
