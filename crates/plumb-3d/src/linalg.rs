use crate::error::GeometryError;

/// Norm below which a vector is treated as zero.
pub const ZERO_NORM_EPS: f64 = 1e-12;

/// Compute the dot product of two 3d vectors.
#[inline]
pub fn dot_product3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Compute the cross product of two 3d vectors.
#[inline]
pub fn cross_vec3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Compute the euclidean norm of a 3d vector.
#[inline]
pub fn norm3(a: &[f64; 3]) -> f64 {
    dot_product3(a, a).sqrt()
}

/// Subtract two 3d vectors as `a - b`.
#[inline]
pub fn sub3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Add two 3d vectors.
#[inline]
pub fn add3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Multiply a 3d vector by a scalar.
#[inline]
pub fn scale3(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// Normalize a 3d vector to unit length.
///
/// Returns `None` when the norm is below [`ZERO_NORM_EPS`] or not finite.
pub fn normalize3(a: &[f64; 3]) -> Option<[f64; 3]> {
    let n = norm3(a);
    if !n.is_finite() || n < ZERO_NORM_EPS {
        return None;
    }
    Some(scale3(a, 1.0 / n))
}

/// Angle in degrees between two unit vectors.
///
/// The dot product is clamped to `[-1, 1]` before the arc cosine.
pub fn angle_between_deg(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    dot_product3(a, b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// The 3x3 identity matrix.
pub const IDENTITY33: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// The 4x4 identity matrix.
pub const IDENTITY44: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Multiply two 3x3 matrices as `a * b`.
pub fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut m = [[0.0; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    m
}

/// Multiply two 4x4 matrices as `a * b`.
pub fn matmul44(a: &[[f64; 4]; 4], b: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
    let mut m = [[0.0; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    m
}

/// Multiply a 3x3 matrix with a 3d vector.
#[inline]
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        dot_product3(&m[0], v),
        dot_product3(&m[1], v),
        dot_product3(&m[2], v),
    ]
}

/// Transpose a 3x3 matrix.
pub fn transpose33(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut t = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, val) in row.iter().enumerate() {
            t[j][i] = *val;
        }
    }
    t
}

/// Skew-symmetric cross-product matrix `K` such that `K * v == a x v`.
pub fn skew_symmetric(a: &[f64; 3]) -> [[f64; 3]; 3] {
    [[0.0, -a[2], a[1]], [a[2], 0.0, -a[0]], [-a[1], a[0], 0.0]]
}

/// Outer product `a * b^T`.
pub fn outer3(a: &[f64; 3], b: &[f64; 3]) -> [[f64; 3]; 3] {
    let mut m = [[0.0; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i] * b[j];
        }
    }
    m
}

/// Split a homogeneous 4x4 transform into its rotation block and translation.
pub fn split_transform44(m: &[[f64; 4]; 4]) -> ([[f64; 3]; 3], [f64; 3]) {
    let rotation = [
        [m[0][0], m[0][1], m[0][2]],
        [m[1][0], m[1][1], m[1][2]],
        [m[2][0], m[2][1], m[2][2]],
    ];
    (rotation, [m[0][3], m[1][3], m[2][3]])
}

/// Compose a homogeneous 4x4 transform from a rotation block and a translation.
pub fn compose_transform44(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> [[f64; 4]; 4] {
    let mut m = IDENTITY44;
    for i in 0..3 {
        m[i][..3].copy_from_slice(&rotation[i]);
        m[i][3] = translation[i];
    }
    m
}

/// Apply `rotation * p + translation` to every point, writing into `out`.
///
/// `out` must have the same length as `points`.
///
/// Example:
///
/// ```
/// use plumb_3d::linalg::{transform_points3d, IDENTITY33};
///
/// let points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let mut out = vec![[0.0; 3]; points.len()];
/// transform_points3d(&points, &IDENTITY33, &[0.0, 0.0, 1.0], &mut out).unwrap();
/// assert_eq!(out[1], [3.0, 4.0, 6.0]);
/// ```
pub fn transform_points3d(
    points: &[[f64; 3]],
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    out: &mut [[f64; 3]],
) -> Result<(), GeometryError> {
    if points.len() != out.len() {
        return Err(GeometryError::MismatchedLengths {
            left_name: "points",
            left_len: points.len(),
            right_name: "output",
            right_len: out.len(),
        });
    }
    rigid_transform_into(points, rotation, translation, out);
    Ok(())
}

/// Apply a homogeneous 4x4 transform to a set of points, returning new points.
///
/// The last row of the transform is assumed to be `[0, 0, 0, 1]`.
pub fn transform_points44(points: &[[f64; 3]], transform: &[[f64; 4]; 4]) -> Vec<[f64; 3]> {
    let (rotation, translation) = split_transform44(transform);
    let mut out = vec![[0.0; 3]; points.len()];
    rigid_transform_into(points, &rotation, &translation, &mut out);
    out
}

// out = R * P^T + t with P viewed as a Nx3 row-major matrix and out as 3xN column-major
fn rigid_transform_into(
    points: &[[f64; 3]],
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    out: &mut [[f64; 3]],
) {
    let n = points.len();
    if n == 0 {
        return;
    }

    let rot = faer::mat::from_row_major_slice(rotation.as_flattened(), 3, 3);
    let lhs = faer::mat::from_row_major_slice(points.as_flattened(), n, 3);
    let mut dst = faer::mat::from_column_major_slice_mut(out.as_flattened_mut(), 3, n);

    faer::linalg::matmul::matmul(
        &mut dst,
        rot,
        lhs.transpose(),
        None,
        1.0,
        faer::Parallelism::None,
    );

    for j in 0..n {
        for (i, t) in translation.iter().enumerate() {
            dst.write(i, j, dst.read(i, j) + t);
        }
    }
}

/// Rotate directions (no translation) by a 3x3 matrix, returning new vectors.
pub fn rotate_vectors(vectors: &[[f64; 3]], rotation: &[[f64; 3]; 3]) -> Vec<[f64; 3]> {
    vectors.iter().map(|v| mat33_mul_vec3(rotation, v)).collect()
}

/// Check whether a 4x4 matrix is the identity within `tol` per element.
pub fn is_identity44(m: &[[f64; 4]; 4], tol: f64) -> bool {
    m.iter()
        .zip(IDENTITY44.iter())
        .all(|(row, id_row)| row.iter().zip(id_row.iter()).all(|(a, b)| (a - b).abs() <= tol))
}

/// Arithmetic mean of a set of points.
///
/// Returns `None` for an empty set.
pub fn centroid3(points: &[[f64; 3]]) -> Option<[f64; 3]> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold([0.0; 3], |acc, p| add3(&acc, p));
    Some(scale3(&sum, 1.0 / points.len() as f64))
}

/// Scatter matrix `sum((p - c)(p - c)^T)` of a set of points around `center`.
pub fn scatter_matrix3(points: &[[f64; 3]], center: &[f64; 3]) -> [[f64; 3]; 3] {
    let mut m = [[0.0; 3]; 3];
    for p in points {
        let d = sub3(p, center);
        for (i, row) in m.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val += d[i] * d[j];
            }
        }
    }
    m
}

/// Singular value decomposition of a 3x3 matrix.
#[derive(Debug, Clone)]
pub struct Svd33 {
    /// Singular values in non-increasing order.
    pub singular_values: [f64; 3],
    /// Right singular vectors, `v[k]` pairs with `singular_values[k]`.
    pub v: [[f64; 3]; 3],
}

/// Compute the SVD of a 3x3 matrix with faer.
///
/// Fails with [`GeometryError::DegenerateGeometry`] when the input or the decomposition
/// contains non-finite values.
pub fn svd33(m: &[[f64; 3]; 3]) -> Result<Svd33, GeometryError> {
    if m.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GeometryError::DegenerateGeometry(
            "matrix has non-finite entries".to_string(),
        ));
    }

    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| m[i][j]);
    let svd = mat.svd();
    let s = svd.s_diagonal();
    let v = svd.v();

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| s.read(b).total_cmp(&s.read(a)));

    let mut out = Svd33 {
        singular_values: [0.0; 3],
        v: [[0.0; 3]; 3],
    };
    for (k, &idx) in order.iter().enumerate() {
        out.singular_values[k] = s.read(idx);
        out.v[k] = [v.read(0, idx), v.read(1, idx), v.read(2, idx)];
    }

    if out.v.iter().flatten().any(|v| !v.is_finite())
        || out.singular_values.iter().any(|v| !v.is_finite())
    {
        return Err(GeometryError::DegenerateGeometry(
            "singular value decomposition did not converge".to_string(),
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cross_and_dot() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(cross_vec3(&x, &y), [0.0, 0.0, 1.0]);
        assert_eq!(dot_product3(&x, &y), 0.0);
        assert_relative_eq!(angle_between_deg(&x, &y), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert!(normalize3(&[0.0, 0.0, 0.0]).is_none());
        assert!(normalize3(&[f64::NAN, 0.0, 0.0]).is_none());
        let n = normalize3(&[3.0, 0.0, 4.0]).unwrap();
        assert_relative_eq!(norm3(&n), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_points_identity() -> Result<(), Box<dyn std::error::Error>> {
        let points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let mut out = vec![[0.0; 3]; points.len()];
        transform_points3d(&points, &IDENTITY33, &[0.0; 3], &mut out)?;
        assert_eq!(out, points);
        Ok(())
    }

    #[test]
    fn test_transform_points_mismatched() {
        let points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let mut out = vec![[0.0; 3]; 1];
        let res = transform_points3d(&points, &IDENTITY33, &[0.0; 3], &mut out);
        assert!(matches!(res, Err(GeometryError::MismatchedLengths { .. })));
    }

    #[test]
    fn test_transform_points44_roundtrip() {
        let points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let rotation = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        let translation = [1.0, 2.0, 3.0];
        let forward = compose_transform44(&rotation, &translation);

        // R' = R^T, t' = -R^T * t
        let rotation_inv = transpose33(&rotation);
        let translation_inv = scale3(&mat33_mul_vec3(&rotation_inv, &translation), -1.0);
        let backward = compose_transform44(&rotation_inv, &translation_inv);

        let dst = transform_points44(&points, &forward);
        assert_eq!(dst[0], [3.0, 0.0, 5.0]);

        let back = transform_points44(&dst, &backward);
        for (a, b) in back.iter().zip(points.iter()) {
            for i in 0..3 {
                assert_relative_eq!(a[i], b[i], epsilon = 1e-12);
            }
        }
        assert!(is_identity44(&matmul44(&forward, &backward), 1e-12));
    }

    #[test]
    fn test_svd33_plane_normal() -> Result<(), Box<dyn std::error::Error>> {
        // points on the z = 0 plane
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [1.0, 2.0, 0.0],
        ];
        let c = centroid3(&points).unwrap();
        let svd = svd33(&scatter_matrix3(&points, &c))?;
        assert!(svd.singular_values[0] >= svd.singular_values[1]);
        assert!(svd.singular_values[1] >= svd.singular_values[2]);
        assert_relative_eq!(svd.singular_values[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(svd.v[2][2].abs(), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_svd33_rejects_nan() {
        let m = [[f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(
            svd33(&m),
            Err(GeometryError::DegenerateGeometry(_))
        ));
    }
}
