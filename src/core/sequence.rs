// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ordered image sequences with calibration and per-frame world poses.
//!
//! Capabilities are layered by composition: a plain frame list, a rectified
//! mono sequence adding intrinsics and poses, a stereo sequence adding the
//! right camera on top.

use nalgebra::DMatrix;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::math::pose::Pose;
use crate::misc::interop;
use crate::misc::type_aliases::{Float, Mat3};

/// An ordered list of frame image paths, tagged with a dataset-set name and
/// a sequence name. Frame order is the lexicographic order of the file names.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    images: Vec<PathBuf>,
    set_name: String,
    seq_name: String,
}

impl ImageSequence {
    /// Build a sequence from already-ordered image paths.
    pub fn new(images: Vec<PathBuf>, set_name: impl Into<String>, seq_name: impl Into<String>) -> Self {
        ImageSequence {
            images,
            set_name: set_name.into(),
            seq_name: seq_name.into(),
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Is the sequence empty?
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Path of the i-th frame image.
    pub fn get(&self, index: usize) -> &Path {
        &self.images[index]
    }

    /// Iterate over the frame image paths.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.images.iter().map(|p| p.as_path())
    }

    /// Concatenation of the set name and the sequence name, e.g. `kt06`.
    pub fn name(&self) -> String {
        format!("{}{}", self.set_name, self.seq_name)
    }

    /// Decode the i-th frame as a gray matrix.
    pub fn load(&self, index: usize) -> std::result::Result<DMatrix<u8>, image::ImageError> {
        interop::read_gray(self.get(index))
    }
}

/// A rectified (distortion-free) mono sequence: frames, a constant intrinsic
/// matrix valid for every frame, and one world-from-camera pose per frame.
#[derive(Debug, Clone)]
pub struct RectifiedMonoSequence {
    /// The underlying frame list.
    pub frames: ImageSequence,
    /// Camera intrinsic matrix, constant across the sequence.
    pub intrinsics: Mat3,
    /// World-from-camera pose of each frame, aligned with `frames`.
    pub poses_w_c: Vec<Pose>,
}

impl RectifiedMonoSequence {
    /// Build a mono sequence; the pose list must be aligned one-to-one with
    /// the frames.
    pub fn new(frames: ImageSequence, intrinsics: Mat3, poses_w_c: Vec<Pose>) -> Result<Self> {
        if frames.len() != poses_w_c.len() {
            return Err(Error::LengthMismatch {
                left_name: "images",
                left: frames.len(),
                right_name: "poses",
                right: poses_w_c.len(),
            });
        }
        Ok(RectifiedMonoSequence {
            frames,
            intrinsics,
            poses_w_c,
        })
    }

    /// Per-frame camera positions as an Nx3 matrix (row i is the translation
    /// of frame i). Handy for trajectory visualization and analysis.
    pub fn positions(&self) -> DMatrix<Float> {
        DMatrix::from_fn(self.poses_w_c.len(), 3, |i, j| self.poses_w_c[i].t[j])
    }

    /// Pose of frame `j` expressed in the local frame of frame `i`:
    /// `T_A_B = inverse(T_W_A) * T_W_B`.
    ///
    /// Panics on out-of-range indices, like any indexed access.
    pub fn relative_pose(&self, i: usize, j: usize) -> Pose {
        self.poses_w_c[i].inverse().compose(&self.poses_w_c[j])
    }
}

/// A rectified stereo sequence: a mono sequence for the left camera, plus
/// right images, right intrinsics and the stereo baseline.
///
/// This is a pure data aggregate, the baseline is stored exactly as given
/// by the dataset and never recomputed.
#[derive(Debug, Clone)]
pub struct RectifiedStereoSequence {
    /// Left camera sequence with calibration and poses.
    pub mono: RectifiedMonoSequence,
    /// Right camera image paths, aligned with the left frames.
    pub right_images: Vec<PathBuf>,
    /// Right camera intrinsic matrix.
    pub right_intrinsics: Mat3,
    /// Distance between the two camera optical centers.
    pub baseline: Float,
}

impl RectifiedStereoSequence {
    /// Build a stereo sequence; the right images must be aligned one-to-one
    /// with the left frames.
    pub fn new(
        mono: RectifiedMonoSequence,
        right_images: Vec<PathBuf>,
        right_intrinsics: Mat3,
        baseline: Float,
    ) -> Result<Self> {
        if mono.frames.len() != right_images.len() {
            return Err(Error::LengthMismatch {
                left_name: "left images",
                left: mono.frames.len(),
                right_name: "right images",
                right: right_images.len(),
            });
        }
        Ok(RectifiedStereoSequence {
            mono,
            right_images,
            right_intrinsics,
            baseline,
        })
    }
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use crate::misc::type_aliases::Vec3;
    use approx::assert_abs_diff_eq;

    fn mono_with_poses(poses: Vec<Pose>) -> RectifiedMonoSequence {
        let images = (0..poses.len())
            .map(|i| PathBuf::from(format!("{:06}.png", i)))
            .collect();
        let frames = ImageSequence::new(images, "kt", "00");
        RectifiedMonoSequence::new(frames, Mat3::identity(), poses).unwrap()
    }

    #[test]
    fn name_concatenates_set_and_sequence() {
        let frames = ImageSequence::new(vec![], "kt", "06");
        assert_eq!(frames.name(), "kt06");
        assert!(frames.is_empty());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let frames = ImageSequence::new(vec![PathBuf::from("0.png")], "kt", "00");
        let result = RectifiedMonoSequence::new(frames, Mat3::identity(), vec![]);
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn positions_lists_translations_in_order() {
        let translations = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.5, 0.0),
            Vec3::new(2.0, 1.0, -0.5),
        ];
        let poses = translations
            .iter()
            .map(|t| Pose::new(Mat3::identity(), *t))
            .collect();
        let positions = mono_with_poses(poses).positions();
        assert_eq!(positions.shape(), (3, 3));
        for (i, t) in translations.iter().enumerate() {
            for j in 0..3 {
                assert_eq!(positions[(i, j)], t[j]);
            }
        }
    }

    #[test]
    fn relative_poses_chain() {
        let poses = vec![
            Pose::roll_pitch_yaw_deg(10.0, 0.0, 5.0),
            Pose::new(Pose::y_rotation_deg(20.0).r, Vec3::new(1.0, 0.0, 0.0)),
            Pose::new(Pose::z_rotation_deg(-15.0).r, Vec3::new(2.0, 0.3, 0.0)),
        ];
        let seq = mono_with_poses(poses);
        let direct = seq.relative_pose(0, 2);
        let chained = seq.relative_pose(0, 1).compose(&seq.relative_pose(1, 2));
        assert_abs_diff_eq!(direct.r, chained.r, epsilon = 1e-9);
        assert_abs_diff_eq!(direct.t, chained.t, epsilon = 1e-9);
    }

    #[test]
    fn stereo_preserves_baseline_exactly() {
        let mono = mono_with_poses(vec![Pose::identity()]);
        let stereo = RectifiedStereoSequence::new(
            mono,
            vec![PathBuf::from("r.png")],
            Mat3::identity(),
            0.54,
        )
        .unwrap();
        assert_eq!(stereo.baseline, 0.54);
    }
}
