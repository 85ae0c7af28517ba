use serde::Serialize;

use crate::error::GeometryError;
use crate::linalg;

/// Norm of the sample cross product below which three points are treated as collinear.
pub const COLLINEAR_EPS: f64 = 1e-8;

/// Ratio of the second to the first singular value of a scatter matrix below which the
/// points are collinear.
pub const COLLINEAR_RATIO: f64 = 1e-10;

/// An infinite plane given by a unit normal and a reference point on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: [f64; 3],
    /// A point lying on the plane.
    pub point: [f64; 3],
}

impl Plane {
    /// Create a plane, normalizing `normal`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateGeometry`] if `normal` has zero norm.
    pub fn new(normal: [f64; 3], point: [f64; 3]) -> Result<Self, GeometryError> {
        let normal = linalg::normalize3(&normal).ok_or_else(|| {
            GeometryError::DegenerateGeometry("plane normal has zero norm".to_string())
        })?;
        Ok(Self { normal, point })
    }

    /// Plane through three points, `None` if they are collinear.
    ///
    /// The normal is `(b - a) x (c - a)` normalized, the reference point is `a`.
    pub fn from_three_points(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> Option<Self> {
        let n = linalg::cross_vec3(&linalg::sub3(b, a), &linalg::sub3(c, a));
        if linalg::norm3(&n) < COLLINEAR_EPS {
            return None;
        }
        linalg::normalize3(&n).map(|normal| Self { normal, point: *a })
    }

    /// Signed distance of a point to the plane, positive on the normal side.
    #[inline]
    pub fn signed_distance(&self, p: &[f64; 3]) -> f64 {
        linalg::dot_product3(&self.normal, &linalg::sub3(p, &self.point))
    }

    /// Absolute distance of a point to the plane.
    #[inline]
    pub fn distance(&self, p: &[f64; 3]) -> f64 {
        self.signed_distance(p).abs()
    }

    /// Return the plane with its normal flipped, if needed, to have a non-negative dot
    /// product with `direction`.
    pub fn oriented_toward(self, direction: &[f64; 3]) -> Self {
        if linalg::dot_product3(&self.normal, direction) < 0.0 {
            Self {
                normal: linalg::scale3(&self.normal, -1.0),
                point: self.point,
            }
        } else {
            self
        }
    }

    /// Count the points within `threshold` of the plane.
    pub fn count_inliers(&self, points: &[[f64; 3]], threshold: f64) -> usize {
        points
            .iter()
            .filter(|p| self.distance(p) <= threshold)
            .count()
    }

    /// Indices of the points within `threshold` of the plane.
    pub fn inlier_indices(&self, points: &[[f64; 3]], threshold: f64) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| (self.distance(p) <= threshold).then_some(i))
            .collect()
    }
}

/// Least-squares plane of a point set from its principal components.
///
/// The reference point is the centroid and the normal is the singular vector of the
/// centered scatter matrix with the smallest singular value.
///
/// # Errors
///
/// * [`GeometryError::InsufficientPoints`] with fewer than three points.
/// * [`GeometryError::DegenerateGeometry`] if the points are coincident or collinear, or
///   the decomposition fails.
pub fn fit_plane_pca(points: &[[f64; 3]]) -> Result<Plane, GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::InsufficientPoints {
            required: 3,
            actual: points.len(),
        });
    }

    let centroid = linalg::centroid3(points).ok_or(GeometryError::InsufficientPoints {
        required: 3,
        actual: 0,
    })?;
    let scatter = linalg::scatter_matrix3(points, &centroid);
    let svd = linalg::svd33(&scatter)?;

    let [s0, s1, _] = svd.singular_values;
    if s0 <= 0.0 || s1 <= COLLINEAR_RATIO * s0 {
        return Err(GeometryError::DegenerateGeometry(
            "points are coincident or collinear".to_string(),
        ));
    }

    Plane::new(svd.v[2], centroid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_distance() -> Result<(), GeometryError> {
        let plane = Plane::new([0.0, 0.0, 2.0], [0.0, 0.0, 1.0])?;
        assert_eq!(plane.normal, [0.0, 0.0, 1.0]);
        assert_relative_eq!(plane.signed_distance(&[5.0, 5.0, 3.0]), 2.0);
        assert_relative_eq!(plane.distance(&[5.0, 5.0, -1.0]), 2.0);
        assert_eq!(
            plane.inlier_indices(&[[0.0, 0.0, 1.0], [0.0, 0.0, 4.0], [1.0, 1.0, 1.01]], 0.05),
            vec![0, 2]
        );
        Ok(())
    }

    #[test]
    fn test_from_three_points_collinear() {
        let a = [0.0, 0.0, 0.0];
        assert!(Plane::from_three_points(&a, &[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]).is_none());

        let plane = Plane::from_three_points(&a, &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert_eq!(plane.map(|p| p.normal), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_oriented_toward() -> Result<(), GeometryError> {
        let plane = Plane::new([0.0, -1.0, 0.0], [0.0; 3])?.oriented_toward(&[0.0, 1.0, 0.0]);
        assert_eq!(plane.normal, [0.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_fit_plane_pca() -> Result<(), GeometryError> {
        // samples of x + y + z = 3
        let mut points = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                let (x, y) = (i as f64 * 0.3, j as f64 * 0.2);
                points.push([x, y, 3.0 - x - y]);
            }
        }
        let plane = fit_plane_pca(&points)?;
        let expected = 1.0 / 3f64.sqrt();
        for n in plane.normal {
            assert_relative_eq!(n.abs(), expected, epsilon = 1e-9);
        }
        assert_relative_eq!(plane.point.iter().sum::<f64>(), 3.0, epsilon = 1e-9);

        assert!(matches!(
            fit_plane_pca(&points[..2]),
            Err(GeometryError::InsufficientPoints { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_fit_plane_pca_degenerate() {
        let line: Vec<[f64; 3]> = (0..10).map(|i| [i as f64, 2.0 * i as f64, 1.0]).collect();
        assert!(matches!(
            fit_plane_pca(&line),
            Err(GeometryError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            fit_plane_pca(&[[1.0, 2.0, 3.0]; 5]),
            Err(GeometryError::DegenerateGeometry(_))
        ));
    }
}
