use std::collections::HashMap;

use crate::backend::{NeighborBackend, NeighborCounter};

/// Approximate neighbor counts from a uniform voxel grid with cell size `radius`.
///
/// A point's count is the population of its own voxel minus one. Points across a voxel
/// face are not counted, so the result under-estimates the exact count. Linear in the
/// number of points.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelCounter;

type VoxelKey = (i64, i64, i64);

fn voxel_key(p: &[f64; 3], min: &[f64; 3], inv_size: f64) -> VoxelKey {
    (
        ((p[0] - min[0]) * inv_size).floor() as i64,
        ((p[1] - min[1]) * inv_size).floor() as i64,
        ((p[2] - min[2]) * inv_size).floor() as i64,
    )
}

impl NeighborCounter for VoxelCounter {
    fn backend(&self) -> NeighborBackend {
        NeighborBackend::Voxel
    }

    fn count_neighbors(&self, points: &[[f64; 3]], radius: f64) -> Vec<usize> {
        let Some(min) = plumb_3d::pointcloud::min_bound(points) else {
            return Vec::new();
        };
        let inv_size = 1.0 / radius;

        let keys: Vec<VoxelKey> = points
            .iter()
            .map(|p| voxel_key(p, &min, inv_size))
            .collect();

        let mut grid: HashMap<VoxelKey, usize> = HashMap::new();
        for key in &keys {
            *grid.entry(*key).or_insert(0) += 1;
        }
        log::debug!("{} points in {} voxels", points.len(), grid.len());

        keys.iter()
            .map(|key| grid.get(key).copied().unwrap_or(1).saturating_sub(1))
            .collect()
    }
}
