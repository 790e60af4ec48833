// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loader for Oxford RobotCar sequences preprocessed to cropped gray stereo.
//!
//! RobotCar needs a heavy SDK-based offline conversion (demosaicing,
//! undistortion, cropping, downscaling, INS pose interpolation). That
//! conversion is not part of this crate; this loader reads its output:
//!
//! ```text
//! <root>/<seq>/rect/left/*.png
//! <root>/<seq>/rect/right/*.png
//! <root>/<seq>/left_K.txt
//! <root>/<seq>/right_K.txt
//! <root>/<seq>/T_W_C.txt       one flattened 4x4 world pose per frame
//! ```

use crate::core::sequence::{ImageSequence, RectifiedMonoSequence, RectifiedStereoSequence};
use crate::dataset::DataRoot;
use crate::error::{Error, Result};
use crate::math::pose::Pose;
use crate::misc::helper;
use crate::misc::type_aliases::{Float, Mat4};

/// Stereo baseline of the Bumblebee rig after preprocessing, in meters.
pub const BASELINE: Float = 0.24;

/// Load one preprocessed cropped-gray RobotCar sequence.
pub fn load_cropped_gray(root: &DataRoot, sequence_id: &str) -> Result<RectifiedStereoSequence> {
    let seq_folder = root.join(sequence_id);
    if !seq_folder.exists() {
        return Err(Error::MissingPreprocessing {
            artifact: seq_folder.display().to_string(),
            instruction: format!(
                "the RobotCar cropped-gray preprocessing on sequence {}",
                sequence_id
            ),
        });
    }

    let rect_dir = seq_folder.join("rect");
    let mut image_lists = helper::images_from_subdirs(&rect_dir, &["left", "right"], "png")?;
    let right_images = image_lists.pop().unwrap();
    let left_images = image_lists.pop().unwrap();
    if left_images.is_empty() {
        return Err(Error::parse(&rect_dir, "no images found"));
    }
    if left_images.len() != right_images.len() {
        return Err(Error::LengthMismatch {
            left_name: "left images",
            left: left_images.len(),
            right_name: "right images",
            right: right_images.len(),
        });
    }

    let left_k = helper::read_mat3(&seq_folder.join("left_K.txt"))?;
    let right_k = helper::read_mat3(&seq_folder.join("right_K.txt"))?;

    let poses_path = seq_folder.join("T_W_C.txt");
    let pose_rows = helper::read_float_rows(&poses_path)?;
    let mut poses_w_c = Vec::with_capacity(pose_rows.len());
    for row in &pose_rows {
        if row.len() != 16 {
            return Err(Error::parse(
                &poses_path,
                format!("expected 16 values per pose row, got {}", row.len()),
            ));
        }
        poses_w_c.push(Pose::from_matrix(&Mat4::from_row_slice(row)));
    }

    let frames = ImageSequence::new(left_images, "rc", sequence_id);
    let mono = RectifiedMonoSequence::new(frames, left_k, poses_w_c)?;
    RectifiedStereoSequence::new(mono, right_images, right_k, BASELINE)
}

// TESTS #############################################################
