// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Type aliases for common types used all over the code base.

use nalgebra as na;

/// Ground-truth trajectories and calibration are double precision.
pub type Float = f64;

/// A point with two Float coordinates.
pub type Point2 = na::Point2<Float>;
/// A point with three Float coordinates.
pub type Point3 = na::Point3<Float>;

/// A vector with three Float coordinates.
pub type Vec3 = na::Vector3<Float>;
/// A vector with six Float coordinates.
pub type Vec6 = na::Vector6<Float>;

/// A 3x3 matrix of Floats.
pub type Mat3 = na::Matrix3<Float>;
/// A 3x4 matrix of Floats, as stored in flattened pose records.
pub type Mat34 = na::Matrix3x4<Float>;
/// A 4x4 matrix of Floats.
pub type Mat4 = na::Matrix4<Float>;

/// A set of 2D points, one per column.
pub type Points2 = na::Matrix2xX<Float>;
/// A set of 3D points, one per column.
pub type Points3 = na::Matrix3xX<Float>;
