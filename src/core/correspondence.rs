// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Point-cloud projection and occlusion-aware pixel-to-point association.
//!
//! A visibility map is a per-frame grid mapping a discretized pixel to the
//! index of the 3D point that projects there, nearest depth wins. Built once
//! per frame, then cached to disk by the dataset adapter.

use serde::{Deserialize, Serialize};

use crate::misc::type_aliases::{Float, Mat3, Points2, Points3};

/// Perspective projection: divide the first two rows of `K P` by the third
/// (the depth).
///
/// Points are expected in a camera frame with positive depth; points behind
/// the camera produce sign-inverted pixels, which is not flagged here.
pub fn project(points_camera: &Points3, k: &Mat3) -> Points2 {
    let p = k * points_camera;
    Points2::from_fn(p.ncols(), |i, j| p[(i, j)] / p[(2, j)])
}

/// Per-frame mapping from discretized pixel (row, column) to the index of
/// the 3D point visible there, `-1` meaning "no point".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityMap {
    rows: usize,
    cols: usize,
    ids: Vec<i32>,
}

impl VisibilityMap {
    /// Grid shape (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Index of the point visible at this pixel, if any.
    ///
    /// An unset pixel is a defined "no correspondence" outcome the caller
    /// must check, not an error.
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        let id = self.ids[row * self.cols + col];
        if id < 0 {
            None
        } else {
            Some(id as usize)
        }
    }
}

/// Build the visibility map of one frame from the point cloud expressed in
/// that frame's camera coordinates.
///
/// Projected points are discretized by truncation (not rounding). When
/// several points land on the same pixel, the one with the smallest
/// camera-frame depth wins; a zero depth is the "unset" sentinel.
pub fn build_visibility_map(
    points_camera: &Points3,
    k: &Mat3,
    rows: usize,
    cols: usize,
) -> VisibilityMap {
    let pixels = project(points_camera, k);
    let mut depths = vec![0.0; rows * cols];
    let mut ids = vec![-1i32; rows * cols];
    for i in 0..pixels.ncols() {
        let row = pixels[(1, i)] as i64;
        let col = pixels[(0, i)] as i64;
        if row < 0 || row >= rows as i64 || col < 0 || col >= cols as i64 {
            continue;
        }
        let cell = row as usize * cols + col as usize;
        let depth = points_camera[(2, i)];
        if depths[cell] == 0.0 || depth < depths[cell] {
            depths[cell] = depth;
            ids[cell] = i as i32;
        }
    }
    VisibilityMap { rows, cols, ids }
}

/// Discretize a projected pixel `(x, y)` to integer `(row, col)`
/// by truncation, matching the visibility map construction.
pub fn discretize(x: Float, y: Float) -> (i64, i64) {
    (y as i64, x as i64)
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use crate::misc::type_aliases::Vec3;
    use approx::assert_abs_diff_eq;

    fn simple_k() -> Mat3 {
        Mat3::new(100.0, 0.0, 50.0, 0.0, 100.0, 40.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn project_divides_by_depth() {
        let points = Points3::from_columns(&[Vec3::new(0.0, 0.0, 2.0), Vec3::new(1.0, -1.0, 4.0)]);
        let pixels = project(&points, &simple_k());
        assert_abs_diff_eq!(pixels[(0, 0)], 50.0);
        assert_abs_diff_eq!(pixels[(1, 0)], 40.0);
        assert_abs_diff_eq!(pixels[(0, 1)], 75.0);
        assert_abs_diff_eq!(pixels[(1, 1)], 15.0);
    }

    #[test]
    fn nearest_point_wins_the_pixel() {
        // Both points project to the principal point, the nearer one wins.
        let points = Points3::from_columns(&[Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 2.0)]);
        let map = build_visibility_map(&points, &simple_k(), 80, 100);
        assert_eq!(map.get(40, 50), Some(1));
    }

    #[test]
    fn out_of_grid_points_are_dropped() {
        let points = Points3::from_columns(&[Vec3::new(100.0, 0.0, 1.0)]);
        let map = build_visibility_map(&points, &simple_k(), 80, 100);
        for row in 0..80 {
            for col in 0..100 {
                assert_eq!(map.get(row, col), None);
            }
        }
    }

    #[test]
    fn empty_pixel_has_no_correspondence() {
        let points = Points3::from_columns(&[Vec3::new(0.0, 0.0, 2.0)]);
        let map = build_visibility_map(&points, &simple_k(), 80, 100);
        assert_eq!(map.get(0, 0), None);
        assert_eq!(map.get(40, 50), Some(0));
    }

    #[test]
    fn discretization_truncates() {
        assert_eq!(discretize(10.9, 3.2), (3, 10));
    }
}
