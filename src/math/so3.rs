// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lie algebra/group functions for 3D rotations, on rotation matrices.
//!
//! Interesting reads:
//! - Ethan Eade course on Lie Groups for 2D and 3D transformations:
//!     - details: <http://ethaneade.com/lie.pdf>
//!     - summary: <http://ethaneade.com/lie_groups.pdf>

use std::f64::consts::PI;

use crate::error::{Error, Result};
use crate::misc::type_aliases::{Float, Mat3, Vec3};

/// Below this angle a rotation is treated as the identity.
pub const EPSILON_ANGLE: Float = 1e-6;

/// Hat operator.
/// Goes from so3 parameterization to so3 element (skew-symmetric matrix).
#[rustfmt::skip]
pub fn hat(w: &Vec3) -> Mat3 {
    Mat3::new(
         0.0,  -w.z,   w.y,
         w.z,   0.0,  -w.x,
        -w.y,   w.x,   0.0,
    )
}

/// Vee operator. Inverse of hat operator.
/// Warning! does not check that the given matrix is skew-symmetric.
pub fn vee(mat: &Mat3) -> Vec3 {
    Vec3::new(mat.m32, mat.m13, mat.m21)
}

/// Compute the exponential map from Lie algebra so3 to Lie group SO3,
/// with Rodrigues' formula: `R = I + M sin(theta) + M^2 (1 - cos(theta))`
/// where `M` is the hat of the normalized axis.
///
/// A rotation magnitude below [`EPSILON_ANGLE`] yields the identity, which
/// avoids dividing by a near-zero angle when the axis is ill-defined.
pub fn exp(w: &Vec3) -> Mat3 {
    let theta = w.norm();
    if theta < EPSILON_ANGLE {
        return Mat3::identity();
    }
    let m = hat(&(w / theta));
    Mat3::identity() + m * theta.sin() + m * m * (1.0 - theta.cos())
}

/// Compute the logarithm map from the Lie group SO3 to the Lie algebra so3.
/// Inverse of the exponential map.
///
/// Fails when the rotation angle is pi: the logarithm of a rotation by
/// exactly pi is not unique (known singularity, deliberately not patched).
/// The rotation is assumed orthonormal and proper.
pub fn log(r: &Mat3) -> Result<Vec3> {
    let cos_theta = (0.5 * (r.trace() - 1.0)).max(-1.0).min(1.0);
    let theta = cos_theta.acos();
    if PI - theta < EPSILON_ANGLE {
        return Err(Error::RotationLogSingularity);
    }
    // The antisymmetric part of R is sin(theta) times the hat of the axis.
    let skew = 0.5 * (r - r.transpose());
    if theta < EPSILON_ANGLE {
        return Ok(vee(&skew));
    }
    Ok((theta / theta.sin()) * vee(&skew))
}

/// Project a matrix onto the nearest proper rotation (orthonormalization).
///
/// Used when an upstream 4x4 record carries a rotation block that is only
/// approximately orthonormal due to numerical drift.
pub fn project_rotation(m: &Mat3) -> Mat3 {
    let svd = m.svd(true, true);
    // svd(true, true) always computes both bases.
    let mut u = svd.u.unwrap();
    let v_t = svd.v_t.unwrap();
    if (u * v_t).determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    u * v_t
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    const EPSILON_ROUNDTRIP_APPROX: Float = 1e-9;

    #[test]
    fn exp_log_round_trip_zero() {
        let w = Vec3::zeros();
        assert_eq!(w, log(&exp(&w)).unwrap());
    }

    #[test]
    fn log_fails_at_angle_pi() {
        let w = Vec3::new(0.0, 0.0, PI);
        assert!(log(&exp(&w)).is_err());
    }

    #[test]
    fn projection_recovers_drifted_rotation() {
        let r = exp(&Vec3::new(0.3, -0.2, 0.5));
        let drifted = r + Mat3::from_element(1e-4);
        let fixed = project_rotation(&drifted);
        assert_abs_diff_eq!(fixed.determinant(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fixed.transpose() * fixed, Mat3::identity(), epsilon = 1e-9);
        assert_abs_diff_eq!(fixed, r, epsilon = 1e-3);
    }

    // PROPERTY TESTS ################################################

    #[quickcheck_macros::quickcheck]
    fn hat_vee_roundtrip(x: Float, y: Float, z: Float) -> bool {
        if ![x, y, z].iter().all(|v| v.is_finite()) {
            return true;
        }
        let element = Vec3::new(x, y, z);
        element == vee(&hat(&element))
    }

    #[quickcheck_macros::quickcheck]
    fn exp_log_round_trip(x: Float, y: Float, z: Float) -> bool {
        if ![x, y, z].iter().all(|v| v.is_finite()) {
            return true;
        }
        // Map the axis into the open ball of radius pi where log is defined.
        let w = 0.99 * PI * Vec3::new(x.sin(), y.sin(), z.sin()).normalize() * x.sin().abs();
        if !w.norm().is_finite() || w.norm() < EPSILON_ANGLE {
            return true;
        }
        match log(&exp(&w)) {
            Ok(w_back) => (w - w_back).norm() < EPSILON_ROUNDTRIP_APPROX * (1.0 + w.norm()),
            Err(_) => false,
        }
    }
}
