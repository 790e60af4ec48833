// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Vision Datasets in Rust
//!
//! Research-support utilities for computer-vision datasets:
//!
//! - [`math`]: rigid-body pose algebra (rotation + translation composition,
//!   inversion, exponential/logarithmic maps between twist and matrix forms).
//! - [`core`]: image sequence abstractions (mono and stereo rectified
//!   sequences with per-frame world poses) and point-cloud correspondence
//!   geometry (projection, occlusion-aware visibility maps).
//! - [`dataset`]: one loader per supported dataset (KITTI odometry, EuRoC
//!   MAV, TUM monoVO, DTU robot image sets, Oxford RobotCar), each parsing
//!   that dataset's on-disk calibration and trajectory formats into the
//!   sequence types.
//! - [`misc`]: helpers that did not fit elsewhere, including a disk-backed
//!   compute-if-absent cache for expensive per-sequence artifacts.

#![warn(missing_docs)]

pub mod core;
pub mod dataset;
pub mod error;
pub mod math;
pub mod misc;

pub use crate::error::{Error, Result};
