// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loader for EuRoC MAV sequences (stereo, rectified offline).
//!
//! The raw dataset is distorted; an offline undistortion step must have
//! produced `rect0`/`rect1` image folders (with their `K.txt`) below
//! `<root>/<seq>/mav0` before a sequence can be loaded. Ground truth comes
//! from `state_groundtruth_estimate0/data.csv`, aligned to the image
//! timestamps by nearest timestamp, not interpolation.

use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::core::sequence::{ImageSequence, RectifiedMonoSequence, RectifiedStereoSequence};
use crate::dataset::DataRoot;
use crate::error::{Error, Result};
use crate::math::pose::Pose;
use crate::misc::helper;
use crate::misc::type_aliases::{Float, Mat3, Mat4, Vec3};

/// A `sensor.yaml` file: extrinsic transform plus, for cameras, the
/// intrinsics and distortion description.
#[derive(Debug, Deserialize)]
struct SensorYaml {
    #[serde(rename = "T_BS")]
    t_bs: MatrixYaml,
    intrinsics: Option<Vec<Float>>,
    resolution: Option<Vec<u32>>,
    distortion_model: Option<String>,
}

/// Row-major matrix block as stored in the yaml files.
#[derive(Debug, Deserialize)]
struct MatrixYaml {
    rows: usize,
    cols: usize,
    data: Vec<Float>,
}

impl MatrixYaml {
    fn to_mat4(&self, path: &Path) -> Result<Mat4> {
        if self.rows != 4 || self.cols != 4 || self.data.len() != 16 {
            return Err(Error::parse(path, "T_BS is not a 4x4 matrix"));
        }
        Ok(Mat4::from_row_slice(&self.data))
    }
}

fn read_sensor_yaml(path: &Path) -> Result<SensorYaml> {
    let file = File::open(path).map_err(Error::io(path))?;
    serde_yaml::from_reader(file).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// One camera of the rig, as described by its `sensor.yaml`.
#[derive(Debug)]
pub struct Cam {
    /// Body-from-camera extrinsic transform.
    pub t_b_c: Pose,
    /// Intrinsic matrix assembled from `(fx, fy, px, py)`.
    pub k: Mat3,
    /// Sensor resolution `(width, height)`.
    pub resolution: (u32, u32),
}

impl Cam {
    /// Read camera `i` (`cam0` or `cam1`) below the sequence's `mav0` folder.
    pub fn read(mav_root: &Path, cam_i: usize) -> Result<Cam> {
        let path = mav_root.join(format!("cam{}", cam_i)).join("sensor.yaml");
        let yaml = read_sensor_yaml(&path)?;
        if yaml.distortion_model.as_deref() != Some("radial-tangential") {
            return Err(Error::parse(
                &path,
                format!("unsupported distortion model {:?}", yaml.distortion_model),
            ));
        }
        let intrinsics = yaml
            .intrinsics
            .filter(|v| v.len() == 4)
            .ok_or_else(|| Error::parse(&path, "intrinsics must be [fx, fy, px, py]"))?;
        let resolution = yaml
            .resolution
            .filter(|v| v.len() == 2)
            .ok_or_else(|| Error::parse(&path, "resolution must be [width, height]"))?;
        Ok(Cam {
            t_b_c: Pose::from_matrix(&yaml.t_bs.to_mat4(&path)?),
            k: intrinsics_to_k(&intrinsics),
            resolution: (resolution[0], resolution[1]),
        })
    }
}

/// Assemble a pinhole matrix from `(fx, fy, px, py)`.
pub fn intrinsics_to_k(fxfypxpy: &[Float]) -> Mat3 {
    let mut k = Mat3::identity();
    k[(0, 0)] = fxfypxpy[0];
    k[(1, 1)] = fxfypxpy[1];
    k[(0, 2)] = fxfypxpy[2];
    k[(1, 2)] = fxfypxpy[3];
    k
}

/// One row of the ground-truth state estimate: timestamp in nanoseconds,
/// translation, unit quaternion (w first).
#[derive(Debug)]
struct GroundTruthRecord {
    timestamp: i64,
    t: Vec3,
    q: [Float; 4],
}

fn read_ground_truth(path: &Path) -> Result<Vec<GroundTruthRecord>> {
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        if row.len() < 8 {
            return Err(Error::parse(path, "expected at least 8 columns"));
        }
        let number = |i: usize| -> Result<Float> {
            row[i]
                .parse()
                .map_err(|_| Error::parse(path, format!("invalid number {:?}", &row[i])))
        };
        records.push(GroundTruthRecord {
            timestamp: row[0]
                .parse()
                .map_err(|_| Error::parse(path, format!("invalid timestamp {:?}", &row[0])))?,
            t: Vec3::new(number(1)?, number(2)?, number(3)?),
            q: [number(4)?, number(5)?, number(6)?, number(7)?],
        });
    }
    if records.is_empty() {
        return Err(Error::parse(path, "no ground-truth records"));
    }
    Ok(records)
}

/// Index of the ground-truth record closest in time to `timestamp`.
fn nearest_record(records: &[GroundTruthRecord], timestamp: i64) -> usize {
    let mut best = 0;
    let mut best_diff = i64::MAX;
    for (i, record) in records.iter().enumerate() {
        let diff = (record.timestamp - timestamp).abs();
        if diff < best_diff {
            best_diff = diff;
            best = i;
        }
    }
    best
}

/// Timestamps are the integer file stems of the rectified images.
fn image_timestamps(images: &[PathBuf], folder: &Path) -> Result<Vec<i64>> {
    images
        .iter()
        .map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
                .ok_or_else(|| {
                    Error::parse(folder, format!("image name {:?} is not a timestamp", path))
                })
        })
        .collect()
}

/// Load one EuRoC sequence. Fails with an explicit instruction when the
/// rectified image folders are missing.
pub fn load(root: &DataRoot, sequence_id: &str) -> Result<RectifiedStereoSequence> {
    let mav_root = root.join(sequence_id).join("mav0");

    let mut image_lists = Vec::new();
    let mut rect_ks = Vec::new();
    for i in 0..2 {
        let image_folder = mav_root.join(format!("rect{}", i));
        if !image_folder.exists() {
            return Err(Error::MissingPreprocessing {
                artifact: image_folder.display().to_string(),
                instruction: "the EuRoC undistortion preprocessing on this sequence".to_string(),
            });
        }
        rect_ks.push(helper::read_mat3(&image_folder.join("K.txt"))?);
        image_lists.push(helper::images_from_dir(&image_folder, "png")?);
    }
    let right_images = image_lists.pop().unwrap();
    let left_images = image_lists.pop().unwrap();
    if left_images.len() != right_images.len() {
        return Err(Error::LengthMismatch {
            left_name: "left images",
            left: left_images.len(),
            right_name: "right images",
            right: right_images.len(),
        });
    }
    let image_times = image_timestamps(&left_images, &mav_root.join("rect0"))?;

    // Ground-truth poses, only at image times.
    let gt_folder = mav_root.join("state_groundtruth_estimate0");
    let records = read_ground_truth(&gt_folder.join("data.csv"))?;
    let poses_w_gt: Vec<Pose> = image_times
        .iter()
        .map(|&time| {
            let record = &records[nearest_record(&records, time)];
            Pose::from_quaternion(
                record.q[0],
                record.q[1],
                record.q[2],
                record.q[3],
                record.t,
            )
        })
        .collect();

    // The ground-truth extrinsic block drifts, orthonormalize it.
    let gt_sensor = read_sensor_yaml(&gt_folder.join("sensor.yaml"))?;
    let t_b_gt =
        Pose::from_approximate_matrix(&gt_sensor.t_bs.to_mat4(&gt_folder.join("sensor.yaml"))?);
    let t_gt_b = t_b_gt.inverse();

    let cams = [Cam::read(&mav_root, 0)?, Cam::read(&mav_root, 1)?];
    let poses_w_c = poses_w_gt
        .iter()
        .map(|t_w_gt| t_w_gt.compose(&t_gt_b).compose(&cams[0].t_b_c))
        .collect();

    let baseline = cams[0].t_b_c.inverse().compose(&cams[1].t_b_c).t.x;

    let right_k = rect_ks.pop().unwrap();
    let left_k = rect_ks.pop().unwrap();
    let frames = ImageSequence::new(left_images, "euroc", sequence_id);
    let mono = RectifiedMonoSequence::new(frames, left_k, poses_w_c)?;
    RectifiedStereoSequence::new(mono, right_images, right_k, baseline)
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn intrinsics_assemble_into_pinhole_matrix() {
        let k = intrinsics_to_k(&[458.6, 457.3, 367.2, 248.4]);
        assert_eq!(k[(0, 0)], 458.6);
        assert_eq!(k[(1, 1)], 457.3);
        assert_eq!(k[(0, 2)], 367.2);
        assert_eq!(k[(1, 2)], 248.4);
        assert_eq!(k[(2, 2)], 1.0);
        assert_eq!(k[(1, 0)], 0.0);
    }

    #[test]
    fn nearest_record_picks_smallest_time_difference() {
        let records = vec![
            GroundTruthRecord { timestamp: 100, t: Vec3::zeros(), q: [1.0, 0.0, 0.0, 0.0] },
            GroundTruthRecord { timestamp: 200, t: Vec3::zeros(), q: [1.0, 0.0, 0.0, 0.0] },
            GroundTruthRecord { timestamp: 330, t: Vec3::zeros(), q: [1.0, 0.0, 0.0, 0.0] },
        ];
        assert_eq!(nearest_record(&records, 90), 0);
        assert_eq!(nearest_record(&records, 170), 1);
        assert_eq!(nearest_record(&records, 1000), 2);
    }
}
