// src/view_transform.rs
//
// Maps image-pixel positions onto the real playing surface through a planar
// homography fixed by four point correspondences. Points outside the source
// quadrilateral have no meaningful image on the pitch and map to `None`.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::error::TrackError;
use crate::geometry::Point;
use crate::track_store::TrackStore;
use crate::types::ViewConfig;

pub struct ViewTransformer {
    pixel_vertices: [Point; 4],
    matrix: Matrix3<f64>,
}

impl ViewTransformer {
    /// Build the homography from four pixel/target correspondences supplied
    /// in matching winding order. Solves the standard 8-unknown DLT system
    /// with h33 fixed to 1; a singular system means the quadrilateral is
    /// degenerate.
    pub fn new(
        pixel_vertices: [Point; 4],
        target_vertices: [Point; 4],
    ) -> Result<Self, TrackError> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (p, t)) in pixel_vertices.iter().zip(target_vertices.iter()).enumerate() {
            let (x, y) = (p.x as f64, p.y as f64);
            let (u, v) = (t.x as f64, t.y as f64);

            a[(2 * i, 0)] = x;
            a[(2 * i, 1)] = y;
            a[(2 * i, 2)] = 1.0;
            a[(2 * i, 6)] = -u * x;
            a[(2 * i, 7)] = -u * y;
            b[2 * i] = u;

            a[(2 * i + 1, 3)] = x;
            a[(2 * i + 1, 4)] = y;
            a[(2 * i + 1, 5)] = 1.0;
            a[(2 * i + 1, 6)] = -v * x;
            a[(2 * i + 1, 7)] = -v * y;
            b[2 * i + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(TrackError::DegenerateQuad)?;
        let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);

        Ok(Self {
            pixel_vertices,
            matrix,
        })
    }

    pub fn from_config(view: &ViewConfig) -> Result<Self, TrackError> {
        let to_points = |vs: &[[f32; 2]; 4]| {
            [
                Point::new(vs[0][0], vs[0][1]),
                Point::new(vs[1][0], vs[1][1]),
                Point::new(vs[2][0], vs[2][1]),
                Point::new(vs[3][0], vs[3][1]),
            ]
        };
        Self::new(to_points(&view.pixel_vertices), to_points(&view.target_vertices))
    }

    /// Whether a pixel point lies inside the source quadrilateral.
    /// Boundary points count as inside.
    pub fn contains(&self, p: Point) -> bool {
        point_in_quad(&self.pixel_vertices, p)
    }

    /// Map one pixel point onto the playing surface, in meters.
    /// Returns `None` for points outside the source quadrilateral.
    pub fn transform_point(&self, p: Point) -> Option<Point> {
        if !self.contains(p) {
            return None;
        }
        let v = self.matrix * Vector3::new(p.x as f64, p.y as f64, 1.0);
        if v.z.abs() < 1e-12 {
            return None;
        }
        Some(Point::new((v.x / v.z) as f32, (v.y / v.z) as f32))
    }

    /// Stage pass: map every record's `position_adjusted` to
    /// `position_transformed`. Out-of-bounds positions are written as
    /// `None`, never left stale.
    pub fn add_transformed_positions(&self, store: &mut TrackStore) {
        store.for_each_record_mut(|_, _, record| {
            record.position_transformed = record
                .position_adjusted
                .and_then(|p| self.transform_point(p));
        });
    }
}

/// Even-odd ray cast with an explicit on-edge test so the boundary is
/// inclusive.
fn point_in_quad(quad: &[Point; 4], p: Point) -> bool {
    for i in 0..4 {
        if on_segment(quad[i], quad[(i + 1) % 4], p) {
            return true;
        }
    }

    let mut inside = false;
    let mut j = 3;
    for i in 0..4 {
        let (pi, pj) = (quad[i], quad[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pj.x + (p.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let (apx, apy) = (p.x - a.x, p.y - a.y);
    let len = (abx * abx + aby * aby).sqrt();
    if len < 1e-6 {
        return (apx * apx + apy * apy).sqrt() < 1e-3;
    }
    let cross = (abx * apy - aby * apx).abs() / len;
    if cross > 1e-3 {
        return false;
    }
    let dot = (apx * abx + apy * aby) / (len * len);
    (-1e-6..=1.0 + 1e-6).contains(&dot)
}
