// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loader for DTU robot image sets (mono, with point-cloud correspondences).
//!
//! Each set has 119 frames taken from repeatable robot positions under
//! varying lighting; a sequence fixes one light index. The structured-light
//! reconstruction gives a 3D point cloud shared by all frames, from which
//! per-frame visibility maps are computed once and cached on disk next to
//! the images.
//!
//! Calibration and reconstructions are consumed as plain-text exports:
//!
//! ```text
//! <root>/calibration/fc.txt            focal lengths (2 values)
//! <root>/calibration/cc.txt            principal point (2 values)
//! <root>/calibration/T_C_W.txt         119 flattened 3x4 camera-from-world rows
//! <root>/reconstructions/points_<set>.txt   one x y z point per row
//! <root>/half|full/SET<set>/Img<frame>_<light>.bmp
//! ```

use itertools::iproduct;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::path::PathBuf;

use crate::core::correspondence::{self, build_visibility_map, VisibilityMap};
use crate::core::sequence::{ImageSequence, RectifiedMonoSequence};
use crate::dataset::DataRoot;
use crate::error::{Error, Result};
use crate::math::pose::Pose;
use crate::misc::cache::{BincodeCache, Fingerprint};
use crate::misc::helper;
use crate::misc::type_aliases::{Float, Mat3, Mat34, Points3};

/// Frames per set (robot positions 1 to 119).
pub const NUM_FRAMES: usize = 119;

/// Image grid at half resolution.
pub const GRID_HALF: (usize, usize) = (600, 800);
/// Image grid at full resolution.
pub const GRID_FULL: (usize, usize) = (1200, 1600);

/// Camera calibration shared by every set: intrinsics and the fixed
/// camera-from-world pose of each robot position.
#[derive(Debug)]
pub struct Calibration {
    fc: [Float; 2],
    cc: [Float; 2],
    poses_c_w: Vec<Pose>,
}

impl Calibration {
    /// Read the plain-text calibration export below the dataset root.
    pub fn read(root: &DataRoot) -> Result<Self> {
        let dir = root.join("calibration");
        let fc = read_pair(&dir.join("fc.txt"))?;
        let cc = read_pair(&dir.join("cc.txt"))?;
        let poses_path = dir.join("T_C_W.txt");
        let rows = helper::read_float_rows(&poses_path)?;
        if rows.len() != NUM_FRAMES {
            return Err(Error::parse(
                &poses_path,
                format!("expected {} pose rows, got {}", NUM_FRAMES, rows.len()),
            ));
        }
        let mut poses_c_w = Vec::with_capacity(NUM_FRAMES);
        for row in &rows {
            if row.len() != 12 {
                return Err(Error::parse(
                    &poses_path,
                    format!("expected 12 values per pose row, got {}", row.len()),
                ));
            }
            poses_c_w.push(Pose::from_matrix3x4(&Mat34::from_row_slice(row)));
        }
        Ok(Calibration { fc, cc, poses_c_w })
    }

    /// Intrinsic matrix; half-resolution images halve focal lengths and
    /// principal point.
    pub fn k(&self, half: bool) -> Mat3 {
        let scale = if half { 0.5 } else { 1.0 };
        let mut k = Mat3::identity();
        k[(0, 0)] = scale * self.fc[0];
        k[(1, 1)] = scale * self.fc[1];
        k[(0, 2)] = scale * self.cc[0];
        k[(1, 2)] = scale * self.cc[1];
        k
    }

    /// World-from-camera pose of each robot position.
    pub fn poses_w_c(&self) -> Vec<Pose> {
        self.poses_c_w.iter().map(|p| p.inverse()).collect()
    }

    /// Camera-from-world pose of each robot position.
    pub fn poses_c_w(&self) -> &[Pose] {
        &self.poses_c_w
    }
}

fn read_pair(path: &std::path::Path) -> Result<[Float; 2]> {
    let values = helper::read_floats(path)?;
    if values.len() != 2 {
        return Err(Error::parse(
            path,
            format!("expected 2 values, got {}", values.len()),
        ));
    }
    Ok([values[0], values[1]])
}

/// Read the reconstruction point cloud of one set (one `x y z` row per
/// point, transposed to 3xN). Fails with an explicit instruction when the
/// export has not been produced yet.
pub fn point_cloud(root: &DataRoot, set_i: usize) -> Result<Points3> {
    let path = root
        .join("reconstructions")
        .join(format!("points_{:02}.txt", set_i));
    if !path.exists() {
        return Err(Error::MissingPreprocessing {
            artifact: path.display().to_string(),
            instruction: format!("the DTU reconstruction export for set {}", set_i),
        });
    }
    let rows = helper::read_float_rows(&path)?;
    for row in &rows {
        if row.len() != 3 {
            return Err(Error::parse(
                &path,
                format!("expected 3 values per point row, got {}", row.len()),
            ));
        }
    }
    Ok(Points3::from_fn(rows.len(), |i, j| rows[j][i]))
}

/// A DTU set at a fixed light index, with the shared point cloud and the
/// per-frame visibility maps attached.
#[derive(Debug)]
pub struct SameLightSequence {
    /// The frames with calibration and world poses.
    pub mono: RectifiedMonoSequence,
    /// Camera-from-world pose of each frame.
    pub poses_c_w: Vec<Pose>,
    /// The 3D point cloud shared by all frames, in world coordinates.
    pub points: Points3,
    visibility: Vec<VisibilityMap>,
}

/// Load one DTU set at a fixed light index.
///
/// The per-frame visibility maps are loaded from the on-disk cache next to
/// the images, or computed (in parallel over frames, these are independent)
/// and stored on first use.
pub fn load_same_light(
    root: &DataRoot,
    set_i: usize,
    light_i: usize,
    half: bool,
) -> Result<SameLightSequence> {
    let resolution = if half { "half" } else { "full" };
    let (grid_rows, grid_cols) = if half { GRID_HALF } else { GRID_FULL };
    let set_path = root.join(resolution).join(format!("SET{:03}", set_i));
    let image_paths: Vec<PathBuf> = (1..=NUM_FRAMES)
        .map(|i| set_path.join(format!("Img{:03}_{:02}.bmp", i, light_i)))
        .collect();

    let calibration = Calibration::read(root)?;
    let k = calibration.k(half);
    let poses_c_w = calibration.poses_c_w().to_vec();

    let frames = ImageSequence::new(
        image_paths,
        format!("dtu_{}", resolution),
        format!("{:03}_{:02}", set_i, light_i),
    );
    let mono = RectifiedMonoSequence::new(frames, k, calibration.poses_w_c())?;

    let points = point_cloud(root, set_i)?;

    // The maps depend on the grid resolution, not on the light index,
    // so all lights of a set share the cached artifact.
    let cache = BincodeCache::new(&set_path);
    let key = format!(
        "point_ids_{}",
        Fingerprint::new()
            .with("rows", grid_rows)
            .with("cols", grid_cols)
            .key()
    );
    let visibility = cache.get_or_compute(&key, || {
        log::info!("computing visibility maps for {}", mono.frames.name());
        Ok((0..NUM_FRAMES)
            .into_par_iter()
            .map(|i| {
                log::debug!("observed points of frame {}", i);
                build_visibility_map(&poses_c_w[i].apply(&points), &k, grid_rows, grid_cols)
            })
            .collect())
    })?;

    Ok(SameLightSequence {
        mono,
        poses_c_w,
        points,
        visibility,
    })
}

impl SameLightSequence {
    /// The visibility map of one frame.
    pub fn visibility(&self, frame: usize) -> &VisibilityMap {
        &self.visibility[frame]
    }

    /// Ground-truth correspondence of a source pixel in a destination frame.
    ///
    /// Resolves the pixel to a 3D point through the source frame's
    /// visibility map, then reprojects that point into the destination
    /// frame. Returns `None` when no point projects onto the source pixel;
    /// that is a defined outcome the caller must check, not an error.
    pub fn correspondence(
        &self,
        src: usize,
        dst: usize,
        pixel: (usize, usize),
    ) -> Option<(i64, i64)> {
        let i = self.visibility[src].get(pixel.0, pixel.1)?;
        let point_camera = self.poses_c_w[dst].r * self.points.column(i) + self.poses_c_w[dst].t;
        let p = self.mono.intrinsics * point_camera;
        Some(correspondence::discretize(p.x / p.z, p.y / p.z))
    }

    /// Dense depth image of one frame, zero where no point is visible.
    pub fn depth_image(&self, frame: usize) -> DMatrix<Float> {
        let points_camera = self.poses_c_w[frame].apply(&self.points);
        let (rows, cols) = self.visibility[frame].shape();
        let mut depths = DMatrix::zeros(rows, cols);
        for (r, c) in iproduct!(0..rows, 0..cols) {
            if let Some(i) = self.visibility[frame].get(r, c) {
                depths[(r, c)] = points_camera[(2, i)];
            }
        }
        depths
    }
}

// TESTS #############################################################
