// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rigid transform between two coordinate frames: rotation + translation.
//!
//! A pose maps points expressed in a "child" frame into a "parent" frame.
//! Composition follows the transform-chaining convention:
//! `T_W_C = T_W_B.compose(T_B_C)`.

use nalgebra::{Quaternion, UnitQuaternion};

use crate::error::Result;
use crate::math::so3;
use crate::misc::type_aliases::{Float, Mat3, Mat34, Mat4, Point3, Points3, Vec3, Vec6};

/// A rigid transform: rotation matrix and translation vector.
///
/// The rotation is assumed orthonormal with determinant +1 at construction;
/// this is not re-checked by the operations. All operations return new
/// instances, a pose is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Rotation matrix, in SO(3).
    pub r: Mat3,
    /// Translation vector.
    pub t: Vec3,
}

impl Pose {
    /// Construct a pose from a rotation matrix and a translation vector.
    pub fn new(r: Mat3, t: Vec3) -> Self {
        Pose { r, t }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Pose::new(Mat3::identity(), Vec3::zeros())
    }

    /// Inverse transform: `(R^T, -R^T t)`.
    ///
    /// `pose.compose(&pose.inverse())` is the identity
    /// within floating-point tolerance.
    pub fn inverse(&self) -> Self {
        let r_t = self.r.transpose();
        Pose::new(r_t, -r_t * self.t)
    }

    /// Chain two transforms: `(R R_o, R t_o + t)`.
    ///
    /// If `self` maps frame B into frame A and `other` maps frame C into
    /// frame B, the result maps frame C into frame A.
    /// Associative, not commutative.
    pub fn compose(&self, other: &Pose) -> Pose {
        Pose::new(self.r * other.r, self.r * other.t + self.t)
    }

    /// Transform a set of points (one per column): `R P + t`.
    ///
    /// The 3xN shape is enforced by the type, there is no runtime
    /// shape inspection.
    pub fn apply(&self, points: &Points3) -> Points3 {
        let mut transformed = self.r * points;
        for mut column in transformed.column_iter_mut() {
            column += self.t;
        }
        transformed
    }

    /// Transform a single point.
    pub fn apply_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.r * point.coords + self.t)
    }

    /// The 4x4 homogeneous form `[[R, t], [0 0 0 1]]`.
    pub fn to_homogeneous(&self) -> Mat4 {
        let mut m = Mat4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.r);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.t);
        m
    }

    /// The twist representation: translation first, rotation vector last.
    ///
    /// Fails when the rotation angle is exactly pi, where the matrix
    /// logarithm is not unique. This is a documented singularity; callers
    /// either avoid that input range or pick another representation.
    pub fn to_twist(&self) -> Result<Vec6> {
        let w = so3::log(&self.r)?;
        Ok(Vec6::new(self.t.x, self.t.y, self.t.z, w.x, w.y, w.z))
    }

    /// Extract a pose from a 4x4 homogeneous matrix.
    pub fn from_matrix(m: &Mat4) -> Self {
        Pose::new(
            m.fixed_view::<3, 3>(0, 0).into_owned(),
            m.fixed_view::<3, 1>(0, 3).into_owned(),
        )
    }

    /// Extract a pose from a flattened 3x4 `[R|t]` record.
    pub fn from_matrix3x4(m: &Mat34) -> Self {
        Pose::new(
            m.fixed_view::<3, 3>(0, 0).into_owned(),
            m.fixed_view::<3, 1>(0, 3).into_owned(),
        )
    }

    /// Like [`Pose::from_matrix`], but first projects the rotation block onto
    /// the nearest proper rotation. For records whose rotation is only
    /// approximately orthonormal due to upstream numerical drift.
    pub fn from_approximate_matrix(m: &Mat4) -> Self {
        Pose::new(
            so3::project_rotation(&m.fixed_view::<3, 3>(0, 0).into_owned()),
            m.fixed_view::<3, 1>(0, 3).into_owned(),
        )
    }

    /// Build a pose from a twist (translation first, rotation vector last),
    /// with Rodrigues' formula. A rotation magnitude below 1e-6 is treated
    /// as the identity rotation, whatever the (ill-defined) axis direction.
    pub fn from_twist(xi: &Vec6) -> Self {
        let w = Vec3::new(xi[3], xi[4], xi[5]);
        Pose::new(so3::exp(&w), Vec3::new(xi[0], xi[1], xi[2]))
    }

    /// Build a pose from a unit quaternion (w first) and a translation.
    pub fn from_quaternion(qw: Float, qx: Float, qy: Float, qz: Float, t: Vec3) -> Self {
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));
        Pose::new(rotation.to_rotation_matrix().into_inner(), t)
    }

    /// Pure rotation around the X axis, angle in degrees.
    #[rustfmt::skip]
    pub fn x_rotation_deg(angle_deg: Float) -> Self {
        let (c, s) = cos_sin_deg(angle_deg);
        let r = Mat3::new(
            1.0, 0.0, 0.0,
            0.0,   c,  -s,
            0.0,   s,   c,
        );
        Pose::new(r, Vec3::zeros())
    }

    /// Pure rotation around the Y axis, angle in degrees.
    #[rustfmt::skip]
    pub fn y_rotation_deg(angle_deg: Float) -> Self {
        let (c, s) = cos_sin_deg(angle_deg);
        let r = Mat3::new(
              c, 0.0,   s,
            0.0, 1.0, 0.0,
             -s, 0.0,   c,
        );
        Pose::new(r, Vec3::zeros())
    }

    /// Pure rotation around the Z axis, angle in degrees.
    #[rustfmt::skip]
    pub fn z_rotation_deg(angle_deg: Float) -> Self {
        let (c, s) = cos_sin_deg(angle_deg);
        let r = Mat3::new(
              c,  -s, 0.0,
              s,   c, 0.0,
            0.0, 0.0, 1.0,
        );
        Pose::new(r, Vec3::zeros())
    }

    /// X, then Y, then Z rotation, composed in that order, zero translation.
    pub fn roll_pitch_yaw_deg(roll: Float, pitch: Float, yaw: Float) -> Self {
        Pose::x_rotation_deg(roll)
            .compose(&Pose::y_rotation_deg(pitch))
            .compose(&Pose::z_rotation_deg(yaw))
    }
}

fn cos_sin_deg(angle_deg: Float) -> (Float, Float) {
    let angle = angle_deg.to_radians();
    (angle.cos(), angle.sin())
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const EPSILON_APPROX: Float = 1e-9;

    fn gen_pose(roll: Float, pitch: Float, yaw: Float, t: [Float; 3]) -> Pose {
        let rotation = Pose::roll_pitch_yaw_deg(roll, pitch, yaw);
        Pose::new(rotation.r, Vec3::new(t[0], t[1], t[2]))
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let pose = gen_pose(10.0, -35.0, 123.0, [0.3, -1.2, 4.5]);
        let id = pose.compose(&pose.inverse());
        assert_abs_diff_eq!(id.r, Mat3::identity(), epsilon = EPSILON_APPROX);
        assert_abs_diff_eq!(id.t, Vec3::zeros(), epsilon = EPSILON_APPROX);
    }

    #[test]
    fn double_inverse_restores_values() {
        let pose = gen_pose(80.0, 20.0, -40.0, [1.0, 2.0, 3.0]);
        let back = pose.inverse().inverse();
        assert_abs_diff_eq!(back.r, pose.r, epsilon = EPSILON_APPROX);
        assert_abs_diff_eq!(back.t, pose.t, epsilon = EPSILON_APPROX);
    }

    #[test]
    fn x_rotation_sign_convention() {
        // 90 degrees around X sends (0,1,0) to (0,0,1).
        let rotated = Pose::x_rotation_deg(90.0).apply_point(&Point3::new(0.0, 1.0, 0.0));
        assert_abs_diff_eq!(
            rotated,
            Point3::new(0.0, 0.0, 1.0),
            epsilon = EPSILON_APPROX
        );
    }

    #[test]
    fn twist_round_trip() {
        let xi = Vec6::new(0.5, -0.2, 1.0, 0.3, -0.6, 0.2);
        let back = Pose::from_twist(&xi).to_twist().unwrap();
        assert_abs_diff_eq!(xi, back, epsilon = EPSILON_APPROX);
    }

    #[test]
    fn from_twist_near_zero_rotation_is_identity() {
        let xi = Vec6::new(1.0, 2.0, 3.0, 1e-9, -1e-9, 1e-9);
        let pose = Pose::from_twist(&xi);
        assert_eq!(pose.r, Mat3::identity());
        assert_eq!(pose.t, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn to_twist_fails_at_angle_pi() {
        let pose = Pose::x_rotation_deg(180.0);
        assert!(pose.to_twist().is_err());
    }

    #[test]
    fn homogeneous_matrix_round_trip() {
        let pose = gen_pose(5.0, 15.0, 25.0, [0.1, 0.2, 0.3]);
        let back = Pose::from_matrix(&pose.to_homogeneous());
        assert_eq!(pose, back);
    }

    #[test]
    fn approximate_matrix_is_orthonormalized() {
        let pose = gen_pose(12.0, -8.0, 30.0, [1.0, 0.0, -1.0]);
        let mut drifted = pose.to_homogeneous();
        drifted[(0, 1)] += 1e-5;
        let fixed = Pose::from_approximate_matrix(&drifted);
        assert_abs_diff_eq!(
            fixed.r.transpose() * fixed.r,
            Mat3::identity(),
            epsilon = EPSILON_APPROX
        );
        assert_abs_diff_eq!(fixed.r.determinant(), 1.0, epsilon = EPSILON_APPROX);
    }

    #[test]
    fn apply_broadcasts_translation() {
        let pose = Pose::new(Mat3::identity(), Vec3::new(1.0, 2.0, 3.0));
        let points = Points3::from_columns(&[Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)]);
        let moved = pose.apply(&points);
        assert_eq!(moved.column(0).into_owned(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(moved.column(1).into_owned(), Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn quaternion_constructor_matches_axis_rotation() {
        // Quaternion for 90 degrees around X.
        let half = 0.25 * PI;
        let pose = Pose::from_quaternion(half.cos(), half.sin(), 0.0, 0.0, Vec3::zeros());
        assert_abs_diff_eq!(pose.r, Pose::x_rotation_deg(90.0).r, epsilon = EPSILON_APPROX);
    }

    // PROPERTY TESTS ################################################

    #[quickcheck_macros::quickcheck]
    fn compose_is_associative(angles: (Float, Float, Float), t: (Float, Float, Float)) -> bool {
        let (r, p, y) = angles;
        if ![r, p, y, t.0, t.1, t.2].iter().all(|v| v.is_finite()) {
            return true;
        }
        let a = gen_pose(r % 360.0, p % 360.0, y % 360.0, [t.0.sin(), t.1.sin(), t.2.sin()]);
        let b = gen_pose(y % 360.0, r % 360.0, p % 360.0, [t.1.sin(), t.2.sin(), t.0.sin()]);
        let c = gen_pose(p % 360.0, y % 360.0, r % 360.0, [t.2.sin(), t.0.sin(), t.1.sin()]);
        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));
        (left.r - right.r).norm() < 1e-9 && (left.t - right.t).norm() < 1e-9
    }

    #[quickcheck_macros::quickcheck]
    fn twist_round_trips_below_pi(x: Float, y: Float, z: Float, scale: Float) -> bool {
        if ![x, y, z, scale].iter().all(|v| v.is_finite()) {
            return true;
        }
        let axis = Vec3::new(x.sin(), y.sin(), z.sin());
        if axis.norm() < 1e-3 {
            return true;
        }
        // Rotation magnitude strictly between 0 and pi.
        let theta = 1e-3 + (PI - 2e-3) * scale.sin().abs();
        let w = theta * axis.normalize();
        let xi = Vec6::new(x, y, z, w.x, w.y, w.z);
        match Pose::from_twist(&xi).to_twist() {
            Ok(back) => (xi - back).norm() < 1e-6 * (1.0 + xi.norm()),
            Err(_) => false,
        }
    }
}
