use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::bounds::Aabb;
use crate::error::GeometryError;
use crate::linalg::{self, IDENTITY33, IDENTITY44};

/// Tolerance on the dot product used to detect (anti)parallel unit vectors.
pub const PARALLEL_DOT_TOL: f64 = 1e-6;

/// Compute the rotation matrix from an axis and angle with Rodrigues' formula.
///
/// `R = I + sin(angle) K + (1 - cos(angle)) K^2`, with `K` the skew-symmetric matrix of
/// the normalized axis.
///
/// # Arguments
///
/// * `axis` - The axis of rotation, normalized internally.
/// * `angle` - The angle of rotation in radians.
///
/// Example:
///
/// ```
/// use plumb_3d::transforms::axis_angle_to_rotation_matrix;
///
/// let axis = [1.0, 0.0, 0.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = axis_angle_to_rotation_matrix(&axis, angle).unwrap();
/// assert!((rotation[1][2] + 1.0).abs() < 1e-12);
/// ```
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], GeometryError> {
    let axis = linalg::normalize3(axis).ok_or_else(|| {
        GeometryError::DegenerateGeometry(
            "cannot compute rotation matrix from a zero vector".to_string(),
        )
    })?;

    let k = linalg::skew_symmetric(&axis);
    let k2 = linalg::matmul33(&k, &k);
    let (s, c) = angle.sin_cos();

    let mut r = IDENTITY33;
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] += s * k[i][j] + (1.0 - c) * k2[i][j];
        }
    }
    Ok(r)
}

/// How a minimal rotation between two directions was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationCase {
    /// The directions were already aligned, the rotation is the identity.
    Aligned,
    /// The directions were opposite, the rotation is a half turn.
    Antiparallel,
    /// General case solved with Rodrigues' formula.
    Rodrigues,
}

/// Minimal rotation that maps the unit direction `from` onto the unit direction `to`.
///
/// Both inputs are normalized first. Opposite directions produce a half turn about an
/// axis perpendicular to `from`, built from the coordinate axis least aligned with it.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateGeometry`] if either direction has zero norm.
pub fn rotation_between(
    from: &[f64; 3],
    to: &[f64; 3],
) -> Result<([[f64; 3]; 3], RotationCase), GeometryError> {
    let from = linalg::normalize3(from).ok_or_else(|| {
        GeometryError::DegenerateGeometry("source direction has zero norm".to_string())
    })?;
    let to = linalg::normalize3(to).ok_or_else(|| {
        GeometryError::DegenerateGeometry("target direction has zero norm".to_string())
    })?;

    let dot = linalg::dot_product3(&from, &to);

    if (dot - 1.0).abs() < PARALLEL_DOT_TOL {
        return Ok((IDENTITY33, RotationCase::Aligned));
    }

    if (dot + 1.0).abs() < PARALLEL_DOT_TOL {
        // pick the coordinate axis least aligned with `from` for a stable perpendicular
        let least = (0..3)
            .min_by(|&a, &b| from[a].abs().total_cmp(&from[b].abs()))
            .unwrap_or(0);
        let mut e = [0.0; 3];
        e[least] = 1.0;
        let perp = linalg::normalize3(&linalg::cross_vec3(&from, &e)).ok_or_else(|| {
            GeometryError::DegenerateGeometry("no perpendicular axis found".to_string())
        })?;

        // half turn: 2 * p * p^T - I
        let outer = linalg::outer3(&perp, &perp);
        let mut r = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = 2.0 * outer[i][j] - IDENTITY33[i][j];
            }
        }
        return Ok((r, RotationCase::Antiparallel));
    }

    let axis = linalg::cross_vec3(&from, &to);
    let angle = dot.clamp(-1.0, 1.0).acos();
    Ok((
        axis_angle_to_rotation_matrix(&axis, angle)?,
        RotationCase::Rodrigues,
    ))
}

/// Convert a rotation matrix to XYZ Euler angles in radians.
///
/// The angles `[x, y, z]` satisfy `R = Rz(z) * Ry(y) * Rx(x)`. Near gimbal lock
/// (`sy < 1e-6`) the z angle is fixed to zero.
pub fn euler_xyz_from_rotation(r: &[[f64; 3]; 3]) -> [f64; 3] {
    let sy = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();

    if sy >= 1e-6 {
        [
            r[2][1].atan2(r[2][2]),
            (-r[2][0]).atan2(sy),
            r[1][0].atan2(r[0][0]),
        ]
    } else {
        [(-r[1][2]).atan2(r[1][1]), (-r[2][0]).atan2(sy), 0.0]
    }
}

/// Rotation matrix about a coordinate axis.
///
/// # Arguments
///
/// * `axis` - The coordinate axis to rotate about.
/// * `degrees` - The rotation angle in degrees, counter-clockwise looking down the axis.
pub fn rotation_about_axis(axis: Axis, degrees: f64) -> [[f64; 3]; 3] {
    let (s, c) = degrees.to_radians().sin_cos();
    match axis {
        Axis::X => [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
        Axis::Y => [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        Axis::Z => [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
    }
}

/// Pure translation as a homogeneous 4x4 transform.
pub fn translation44(t: &[f64; 3]) -> [[f64; 4]; 4] {
    linalg::compose_transform44(&IDENTITY33, t)
}

/// Point about which a manual rotation is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationCenter {
    /// Rotate about the coordinate origin.
    #[default]
    Origin,
    /// Rotate about the center of the axis-aligned bounds of the points.
    BoundsCenter,
}

impl RotationCenter {
    /// The pivot point for a set of points.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InsufficientPoints`] for [`RotationCenter::BoundsCenter`]
    /// on an empty set.
    pub fn pivot(self, points: &[[f64; 3]]) -> Result<[f64; 3], GeometryError> {
        match self {
            RotationCenter::Origin => Ok([0.0; 3]),
            RotationCenter::BoundsCenter => Ok(Aabb::from_points(points)?.center),
        }
    }
}

impl std::str::FromStr for RotationCenter {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "origin" => Ok(RotationCenter::Origin),
            "bounds_center" | "bbox_center" => Ok(RotationCenter::BoundsCenter),
            other => Err(GeometryError::UnsupportedConfiguration(format!(
                "unknown rotation center '{other}'"
            ))),
        }
    }
}

/// Homogeneous transform rotating `points` by `degrees` about `axis` through the chosen
/// pivot.
///
/// # Errors
///
/// Returns [`GeometryError::InsufficientPoints`] if the pivot is the bounds center and
/// `points` is empty.
pub fn manual_rotation(
    points: &[[f64; 3]],
    axis: Axis,
    degrees: f64,
    center: RotationCenter,
) -> Result<[[f64; 4]; 4], GeometryError> {
    let pivot = center.pivot(points)?;
    log::debug!("manual rotation of {degrees} deg about {axis} through {pivot:?}");
    Ok(rotation_transform(axis, degrees, &pivot))
}

/// Homogeneous transform rotating by `degrees` about `axis` through `center`.
///
/// Composed as `T(center) * R * T(-center)`.
pub fn rotation_transform(axis: Axis, degrees: f64, center: &[f64; 3]) -> [[f64; 4]; 4] {
    let rotation = linalg::compose_transform44(&rotation_about_axis(axis, degrees), &[0.0; 3]);
    if center.iter().all(|c| *c == 0.0) {
        return rotation;
    }
    let to_origin = translation44(&linalg::scale3(center, -1.0));
    let back = translation44(center);
    linalg::matmul44(&back, &linalg::matmul44(&rotation, &to_origin))
}

/// Promote a 3x4 affine matrix to a homogeneous 4x4 transform.
pub fn affine34_to_44(m: &[[f64; 4]; 3]) -> [[f64; 4]; 4] {
    let mut out = IDENTITY44;
    out[..3].copy_from_slice(m);
    out
}
