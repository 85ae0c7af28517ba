use crate::error::GeometryError;
use crate::linalg;

/// A point cloud with positions and optional per-point RGBA colors.
///
/// Colors, when present, are index-aligned with the points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The RGBA colors of the points.
    colors: Option<Vec<[u8; 4]>>,
}

impl PointCloud {
    /// Create a new point cloud from points and optional RGBA colors.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MismatchedLengths`] if the colors are not index-aligned
    /// with the points.
    pub fn new(points: Vec<[f64; 3]>, colors: Option<Vec<[u8; 4]>>) -> Result<Self, GeometryError> {
        if let Some(colors) = &colors {
            if colors.len() != points.len() {
                return Err(GeometryError::MismatchedLengths {
                    left_name: "points",
                    left_len: points.len(),
                    right_name: "colors",
                    right_len: colors.len(),
                });
            }
        }
        Ok(Self { points, colors })
    }

    /// Create a point cloud without colors.
    pub fn from_points(points: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            colors: None,
        }
    }

    /// Create a point cloud from RGB colors, using an opaque alpha channel.
    pub fn from_rgb(points: Vec<[f64; 3]>, colors: Vec<[u8; 3]>) -> Result<Self, GeometryError> {
        let rgba = colors.into_iter().map(|[r, g, b]| [r, g, b, 255]).collect();
        Self::new(points, Some(rgba))
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[u8; 4]]> {
        self.colors.as_deref()
    }

    /// Consume the point cloud and return its points and colors.
    pub fn into_parts(self) -> (Vec<[f64; 3]>, Option<Vec<[u8; 4]>>) {
        (self.points, self.colors)
    }

    /// Keep the points whose mask entry is `true`, applying the same mask to the colors.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MismatchedLengths`] if the mask length differs from the
    /// number of points.
    pub fn select(&self, mask: &[bool]) -> Result<Self, GeometryError> {
        if mask.len() != self.points.len() {
            return Err(GeometryError::MismatchedLengths {
                left_name: "points",
                left_len: self.points.len(),
                right_name: "mask",
                right_len: mask.len(),
            });
        }

        let points = self
            .points
            .iter()
            .zip(mask)
            .filter_map(|(p, &keep)| keep.then_some(*p))
            .collect();

        let colors = self.colors.as_ref().map(|colors| {
            colors
                .iter()
                .zip(mask)
                .filter_map(|(c, &keep)| keep.then_some(*c))
                .collect()
        });

        Ok(Self { points, colors })
    }

    /// Return a new point cloud with a homogeneous 4x4 transform applied to the points.
    ///
    /// Colors are carried unchanged.
    pub fn transformed(&self, transform: &[[f64; 4]; 4]) -> Self {
        Self {
            points: linalg::transform_points44(&self.points, transform),
            colors: self.colors.clone(),
        }
    }

    /// Get the minimum bound of the point cloud, `None` if empty.
    pub fn min_bound(&self) -> Option<[f64; 3]> {
        min_bound(&self.points)
    }

    /// Get the maximum bound of the point cloud, `None` if empty.
    pub fn max_bound(&self) -> Option<[f64; 3]> {
        max_bound(&self.points)
    }
}

/// Per-axis minimum of a set of points, `None` if empty.
pub fn min_bound(points: &[[f64; 3]]) -> Option<[f64; 3]> {
    let first = *points.first()?;
    Some(points.iter().fold(first, |a, b| {
        [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])]
    }))
}

/// Per-axis maximum of a set of points, `None` if empty.
pub fn max_bound(points: &[[f64; 3]]) -> Option<[f64; 3]> {
    let first = *points.first()?;
    Some(points.iter().fold(first, |a, b| {
        [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])]
    }))
}

/// Length of the diagonal of the axis-aligned bounding box, `0.0` if empty.
pub fn bounding_diagonal(points: &[[f64; 3]]) -> f64 {
    match (min_bound(points), max_bound(points)) {
        (Some(min), Some(max)) => linalg::norm3(&linalg::sub3(&max, &min)),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointcloud() -> Result<(), GeometryError> {
        let pointcloud = PointCloud::from_rgb(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![[255, 0, 0], [0, 255, 0]],
        )?;

        assert_eq!(pointcloud.len(), 2);
        assert_eq!(pointcloud.points().len(), 2);
        assert_eq!(pointcloud.colors(), Some(&[[255, 0, 0, 255], [0, 255, 0, 255]][..]));

        if let Some(p1) = pointcloud.points().last() {
            assert_eq!(p1, &[1.0, 0.0, 0.0]);
        }
        Ok(())
    }

    #[test]
    fn test_pointcloud_mismatched_colors() {
        let res = PointCloud::new(vec![[0.0; 3]; 3], Some(vec![[0, 0, 0, 255]; 2]));
        assert!(matches!(res, Err(GeometryError::MismatchedLengths { .. })));
    }

    #[test]
    fn test_select_keeps_colors_aligned() -> Result<(), GeometryError> {
        let cloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            Some(vec![[10, 0, 0, 255], [20, 0, 0, 255], [30, 0, 0, 255]]),
        )?;
        let selected = cloud.select(&[true, false, true])?;
        assert_eq!(selected.points(), &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(
            selected.colors(),
            Some(&[[10, 0, 0, 255], [30, 0, 0, 255]][..])
        );
        // the source is untouched
        assert_eq!(cloud.len(), 3);

        assert!(cloud.select(&[true]).is_err());
        Ok(())
    }

    #[test]
    fn test_bounds() {
        let cloud = PointCloud::from_points(vec![[0.0, 5.0, -1.0], [3.0, -2.0, 4.0]]);
        assert_eq!(cloud.min_bound(), Some([0.0, -2.0, -1.0]));
        assert_eq!(cloud.max_bound(), Some([3.0, 5.0, 4.0]));
        assert!(PointCloud::from_points(vec![]).min_bound().is_none());
        assert_eq!(bounding_diagonal(&[[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]]), 5.0);
    }
}
