use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use plumb_3d::axis::UpAxis;
use plumb_3d::linalg;
use plumb_3d::plane;
use plumb_3d::transforms::{self, RotationCase};
use plumb_3d::{GeometryError, GeometryWarning};

use crate::ground;

/// Residual angle in degrees above which an alignment is reported as misaligned.
pub const RESIDUAL_WARNING_DEGREES: f64 = 5.0;

/// Tilt in degrees below which a corrected ground counts as level.
pub const LEVEL_TOLERANCE_DEGREES: f64 = 5.0;

const VERIFY_BAND_FRACTION: f64 = 0.05;
const VERIFY_MIN_POINTS: usize = 10;
const VERIFY_SAMPLE_CAP: usize = 1000;
const VERIFY_SEED: u64 = 42;

/// Rotation that brings a ground normal onto the up-axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationResult {
    /// Orthonormal 3x3 rotation.
    pub rotation: [[f64; 3]; 3],
    /// XYZ Euler angles of the rotation in radians.
    pub euler_xyz: [f64; 3],
    /// Homogeneous transform, rotation plus the translation that moves the rotated
    /// reference point to zero height.
    pub transform: [[f64; 4]; 4],
    /// How the rotation was constructed.
    pub case: RotationCase,
    /// Angle in degrees between the rotated normal and the up direction.
    pub residual_degrees: f64,
    /// Non-fatal issues, such as a residual misalignment.
    pub warnings: Vec<GeometryWarning>,
}

/// Minimal rotation aligning `normal` with `up_axis`, and the transform that also levels
/// the ground to zero height.
///
/// # Arguments
///
/// * `normal` - The ground normal, normalized internally.
/// * `reference_point` - A point on the ground.
/// * `up_axis` - The target up direction.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateGeometry`] if `normal` has zero norm.
pub fn align_to_up(
    normal: &[f64; 3],
    reference_point: &[f64; 3],
    up_axis: UpAxis,
) -> Result<RotationResult, GeometryError> {
    let normal = linalg::normalize3(normal).ok_or_else(|| {
        GeometryError::DegenerateGeometry("ground normal has zero norm".to_string())
    })?;
    let target = up_axis.direction();

    let (rotation, case) = transforms::rotation_between(&normal, &target)?;
    let euler_xyz = match case {
        RotationCase::Aligned => [0.0; 3],
        _ => transforms::euler_xyz_from_rotation(&rotation),
    };

    // move the rotated ground point to zero along the height axis
    let h = up_axis.index();
    let rotated_ref = linalg::mat33_mul_vec3(&rotation, reference_point);
    let mut translation = [0.0; 3];
    translation[h] = -rotated_ref[h];
    let transform = linalg::compose_transform44(&rotation, &translation);

    let rotated_normal = linalg::mat33_mul_vec3(&rotation, &normal);
    let residual_degrees = linalg::angle_between_deg(&rotated_normal, &target);

    let warnings: Vec<GeometryWarning> = residual_warning(residual_degrees).into_iter().collect();

    log::debug!(
        "aligned normal {normal:?} to {up_axis} ({case:?}), euler {euler_xyz:?}, residual {residual_degrees:.4} deg"
    );

    Ok(RotationResult {
        rotation,
        euler_xyz,
        transform,
        case,
        residual_degrees,
        warnings,
    })
}

/// A [`GeometryWarning::ResidualMisalignment`] if the residual exceeds
/// [`RESIDUAL_WARNING_DEGREES`].
fn residual_warning(residual_degrees: f64) -> Option<GeometryWarning> {
    if residual_degrees <= RESIDUAL_WARNING_DEGREES {
        return None;
    }
    let warning = GeometryWarning::ResidualMisalignment {
        degrees: residual_degrees,
    };
    log::warn!("{warning}");
    Some(warning)
}

/// Levelness of the ground after a correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentCheck {
    /// Normal of the lowest band, oriented toward up.
    pub normal: [f64; 3],
    /// Angle in degrees between `normal` and the up direction.
    pub tilt_degrees: f64,
    /// Whether the tilt is below [`LEVEL_TOLERANCE_DEGREES`].
    pub is_level: bool,
    /// Number of points in the lowest band.
    pub band_points: usize,
}

/// Check that the lowest band of a corrected cloud is level.
///
/// The normal is the least-squares normal of at most 1000 points sampled from the lowest
/// 5% band along `up_axis`.
///
/// # Errors
///
/// * [`GeometryError::InsufficientPoints`] if the band holds fewer than 10 points.
/// * [`GeometryError::DegenerateGeometry`] if the band is collinear.
pub fn verify_alignment(
    points: &[[f64; 3]],
    up_axis: UpAxis,
) -> Result<AlignmentCheck, GeometryError> {
    let band = ground::lowest_band_indices(points, up_axis, VERIFY_BAND_FRACTION);
    if band.len() < VERIFY_MIN_POINTS {
        return Err(GeometryError::InsufficientPoints {
            required: VERIFY_MIN_POINTS,
            actual: band.len(),
        });
    }

    let sample: Vec<[f64; 3]> = if band.len() > VERIFY_SAMPLE_CAP {
        let mut rng = StdRng::seed_from_u64(VERIFY_SEED);
        rand::seq::index::sample(&mut rng, band.len(), VERIFY_SAMPLE_CAP)
            .iter()
            .map(|i| points[band[i]])
            .collect()
    } else {
        band.iter().map(|&i| points[i]).collect()
    };

    let up = up_axis.direction();
    let fitted = plane::fit_plane_pca(&sample)?.oriented_toward(&up);
    let tilt_degrees = linalg::angle_between_deg(&fitted.normal, &up);
    let is_level = tilt_degrees < LEVEL_TOLERANCE_DEGREES;

    if is_level {
        log::debug!("corrected ground is level, tilt {tilt_degrees:.2} deg");
    } else {
        log::warn!("corrected ground is still tilted by {tilt_degrees:.2} deg");
    }

    Ok(AlignmentCheck {
        normal: fitted.normal,
        tilt_degrees,
        is_level,
        band_points: band.len(),
    })
}
