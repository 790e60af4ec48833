// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loader for the KITTI odometry benchmark (stereo, rectified).
//!
//! Expected layout below the dataset root:
//!
//! ```text
//! <root>/<seq>/image_0/*.png    left frames
//! <root>/<seq>/image_1/*.png    right frames
//! <root>/<seq>/calib.txt        four labeled 3x4 projection rows
//! <root>/poses/<seq>.txt        one flattened 3x4 world pose per frame
//! ```

use crate::core::sequence::{ImageSequence, RectifiedMonoSequence, RectifiedStereoSequence};
use crate::dataset::{DataRoot, Split};
use crate::error::{Error, Result};
use crate::math::pose::Pose;
use crate::misc::helper;
use crate::misc::type_aliases::{Float, Mat3, Mat34};

/// Stereo baseline of the KITTI odometry rig, in meters.
pub const BASELINE: Float = 0.54;

/// Load one KITTI odometry sequence.
pub fn load(root: &DataRoot, sequence_id: &str) -> Result<RectifiedStereoSequence> {
    let seq_folder = root.join(sequence_id);
    let mut image_lists = helper::images_from_subdirs(&seq_folder, &["image_0", "image_1"], "png")?;
    let right_images = image_lists.pop().unwrap();
    let left_images = image_lists.pop().unwrap();
    if left_images.is_empty() {
        return Err(Error::parse(&seq_folder, "no images found"));
    }
    if left_images.len() != right_images.len() {
        return Err(Error::LengthMismatch {
            left_name: "left images",
            left: left_images.len(),
            right_name: "right images",
            right: right_images.len(),
        });
    }

    let poses_path = root.join("poses").join(format!("{}.txt", sequence_id));
    let pose_rows = helper::read_float_rows(&poses_path)?;
    let mut poses_w_c = Vec::with_capacity(pose_rows.len());
    for row in &pose_rows {
        if row.len() != 12 {
            return Err(Error::parse(
                &poses_path,
                format!("expected 12 values per pose row, got {}", row.len()),
            ));
        }
        poses_w_c.push(Pose::from_matrix3x4(&Mat34::from_row_slice(row)));
    }

    let (left_k, right_k) = read_calibration(&seq_folder)?;

    let frames = ImageSequence::new(left_images, "kt", sequence_id);
    let mono = RectifiedMonoSequence::new(frames, left_k, poses_w_c)?;
    RectifiedStereoSequence::new(mono, right_images, right_k, BASELINE)
}

/// Intrinsics of the left and right cameras, from the 3x3 blocks of the
/// first two projection matrices of `calib.txt`.
fn read_calibration(seq_folder: &std::path::Path) -> Result<(Mat3, Mat3)> {
    let calib_path = seq_folder.join("calib.txt");
    let content = std::fs::read_to_string(&calib_path).map_err(Error::io(&calib_path))?;
    let mut projections = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        // Rows look like `P0: <12 values>`.
        let values_part = line.split(':').nth(1).unwrap_or(line);
        let values = values_part
            .split_whitespace()
            .map(|s| {
                s.parse()
                    .map_err(|_| Error::parse(&calib_path, format!("invalid number {:?}", s)))
            })
            .collect::<Result<Vec<Float>>>()?;
        if values.len() != 12 {
            return Err(Error::parse(
                &calib_path,
                format!("expected 12 values per projection row, got {}", values.len()),
            ));
        }
        projections.push(Mat34::from_row_slice(&values));
    }
    if projections.len() != 4 {
        return Err(Error::parse(
            &calib_path,
            format!("expected 4 projection rows, got {}", projections.len()),
        ));
    }
    let k_of = |p: &Mat34| p.fixed_view::<3, 3>(0, 0).into_owned();
    Ok((k_of(&projections[0]), k_of(&projections[1])))
}

/// Dataset partition originally defined in the SIPS paper.
/// Each split has consistent resolution.
pub fn split(tvt: Split) -> &'static [&'static str] {
    match tvt {
        Split::Training => &["06", "08", "09", "10"],
        Split::Validation => &["05"],
        Split::Testing => &["00"],
    }
}

// TESTS #############################################################
