//! Point-sampled preview geometry that can be embedded next to an asset.

use crate::bounds::BoundingVolume;
use crate::linalg;
use crate::plane::Plane;
use crate::pointcloud::PointCloud;

/// Opaque red.
pub const RED: [u8; 4] = [255, 0, 0, 255];
/// Opaque green.
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
/// Opaque blue.
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
/// Color used for ground plane patches.
pub const GROUND_COLOR: [u8; 4] = [255, 200, 0, 255];

// corner index pairs, bottom face, top face, then the vertical edges
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

fn sample_segment(start: &[f64; 3], end: &[f64; 3], density: usize, out: &mut Vec<[f64; 3]>) {
    let delta = linalg::sub3(end, start);
    for i in 0..density {
        let t = if density > 1 {
            i as f64 / (density - 1) as f64
        } else {
            0.0
        };
        out.push(linalg::add3(start, &linalg::scale3(&delta, t)));
    }
}

fn solid(points: Vec<[f64; 3]>, color: [u8; 4]) -> PointCloud {
    let colors = vec![color; points.len()];
    PointCloud::new(points, Some(colors)).unwrap_or_else(|_| PointCloud::from_points(Vec::new()))
}

/// Red points sampled along the twelve edges of a bounding volume.
///
/// Each edge gets `density` evenly spaced points including both ends.
pub fn bounding_box_wireframe(volume: &BoundingVolume, density: usize) -> PointCloud {
    let corners = volume.corners();
    let mut points = Vec::with_capacity(BOX_EDGES.len() * density);
    for (a, b) in BOX_EDGES {
        sample_segment(&corners[a], &corners[b], density, &mut points);
    }
    solid(points, RED)
}

/// Red, green and blue point lines along +X, +Y and +Z starting at `origin`.
pub fn coordinate_axes(origin: &[f64; 3], length: f64, density: usize) -> PointCloud {
    let mut points = Vec::with_capacity(3 * density);
    let mut colors = Vec::with_capacity(3 * density);
    for (k, color) in [RED, GREEN, BLUE].into_iter().enumerate() {
        let mut end = *origin;
        end[k] += length;
        let before = points.len();
        sample_segment(origin, &end, density, &mut points);
        colors.resize(colors.len() + points.len() - before, color);
    }
    PointCloud::new(points, Some(colors)).unwrap_or_else(|_| PointCloud::from_points(Vec::new()))
}

/// Square grid of `density x density` points on a plane, centered at its reference point.
///
/// `size` is the side length of the square.
pub fn ground_plane_patch(plane: &Plane, size: f64, density: usize) -> PointCloud {
    let n = plane.normal;
    let least = (0..3)
        .min_by(|&a, &b| n[a].abs().total_cmp(&n[b].abs()))
        .unwrap_or(0);
    let mut e = [0.0; 3];
    e[least] = 1.0;
    let Some(u) = linalg::normalize3(&linalg::cross_vec3(&n, &e)) else {
        return PointCloud::from_points(Vec::new());
    };
    let w = linalg::cross_vec3(&n, &u);

    let half = size * 0.5;
    let step = if density > 1 {
        size / (density - 1) as f64
    } else {
        0.0
    };

    let mut points = Vec::with_capacity(density * density);
    for i in 0..density {
        for j in 0..density {
            let a = if density > 1 { i as f64 * step - half } else { 0.0 };
            let b = if density > 1 { j as f64 * step - half } else { 0.0 };
            let offset = linalg::add3(&linalg::scale3(&u, a), &linalg::scale3(&w, b));
            points.push(linalg::add3(&plane.point, &offset));
        }
    }
    solid(points, GROUND_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Aabb;
    use crate::error::GeometryError;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box_wireframe() {
        let volume = BoundingVolume::AxisAligned(Aabb::from_min_max([0.0; 3], [2.0, 2.0, 2.0]));
        let wireframe = bounding_box_wireframe(&volume, 5);
        assert_eq!(wireframe.len(), 60);
        assert!(wireframe
            .colors()
            .is_some_and(|c| c.iter().all(|c| *c == RED)));
        // every sample lies on the box surface
        for p in wireframe.points() {
            assert!(p.iter().all(|v| (0.0..=2.0).contains(v)));
            let on_faces = p.iter().filter(|v| **v == 0.0 || **v == 2.0).count();
            assert!(on_faces >= 2);
        }
    }

    #[test]
    fn test_coordinate_axes() {
        let axes = coordinate_axes(&[1.0, 1.0, 1.0], 2.0, 3);
        assert_eq!(axes.len(), 9);
        assert_eq!(axes.points()[2], [3.0, 1.0, 1.0]);
        assert_eq!(axes.points()[8], [1.0, 1.0, 3.0]);
        assert_eq!(axes.colors().map(|c| c[4]), Some(GREEN));
    }

    #[test]
    fn test_ground_plane_patch() -> Result<(), GeometryError> {
        let plane = Plane::new([0.0, 1.0, 1.0], [0.0, 0.0, 5.0])?;
        let patch = ground_plane_patch(&plane, 4.0, 10);
        assert_eq!(patch.len(), 100);
        for p in patch.points() {
            assert_relative_eq!(plane.distance(p), 0.0, epsilon = 1e-12);
        }
        Ok(())
    }
}
