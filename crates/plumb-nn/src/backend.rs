use serde::{Deserialize, Serialize};

use plumb_3d::GeometryError;

use crate::pairwise::PairwiseCounter;
use crate::voxel::VoxelCounter;

#[cfg(feature = "kdtree")]
use crate::kdtree::KdTreeCounter;

/// Strategy used to count neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborBackend {
    /// Exact counts from all pairwise distances.
    Pairwise,
    /// Exact counts from one range query per point on a kd-tree.
    KdTree,
    /// Approximate counts from the population of each point's voxel.
    Voxel,
}

impl std::fmt::Display for NeighborBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborBackend::Pairwise => f.write_str("pairwise"),
            NeighborBackend::KdTree => f.write_str("kdtree"),
            NeighborBackend::Voxel => f.write_str("voxel"),
        }
    }
}

/// Counts, for every point, the other points within a radius.
pub trait NeighborCounter {
    /// The strategy implemented by this counter.
    fn backend(&self) -> NeighborBackend;

    /// Number of other points within `radius` of each point, index-aligned with `points`.
    ///
    /// PRECONDITION: `radius` is finite and positive.
    fn count_neighbors(&self, points: &[[f64; 3]], radius: f64) -> Vec<usize>;
}

/// Size thresholds selecting the neighbor counting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborSearchParams {
    /// Inputs with fewer points use exact pairwise distances.
    pub pairwise_max_points: usize,
    /// Inputs with fewer points (and at least `pairwise_max_points`) use the kd-tree.
    pub tree_max_points: usize,
}

impl Default for NeighborSearchParams {
    fn default() -> Self {
        Self {
            pairwise_max_points: 20_000,
            tree_max_points: 200_000,
        }
    }
}

/// Whether the kd-tree backend was compiled in.
pub const fn tree_backend_available() -> bool {
    cfg!(feature = "kdtree")
}

/// Neighbor counting front-end that picks a strategy from the input size.
///
/// The availability of the kd-tree backend is checked once at construction. Without it,
/// every input at or above `pairwise_max_points` uses the voxel strategy.
#[derive(Debug, Clone)]
pub struct NeighborSearch {
    params: NeighborSearchParams,
    tree_available: bool,
}

impl NeighborSearch {
    /// Create the front-end, probing the available backends.
    pub fn new(params: NeighborSearchParams) -> Self {
        let tree_available = tree_backend_available();
        if !tree_available {
            log::debug!("kd-tree backend unavailable, using voxel counts for large inputs");
        }
        Self {
            params,
            tree_available,
        }
    }

    /// The thresholds in use.
    pub fn params(&self) -> &NeighborSearchParams {
        &self.params
    }

    /// The strategy used for an input of `num_points` points.
    pub fn backend_for(&self, num_points: usize) -> NeighborBackend {
        if num_points < self.params.pairwise_max_points {
            NeighborBackend::Pairwise
        } else if self.tree_available && num_points < self.params.tree_max_points {
            NeighborBackend::KdTree
        } else {
            NeighborBackend::Voxel
        }
    }

    /// The counter used for an input of `num_points` points.
    pub fn counter_for(&self, num_points: usize) -> Box<dyn NeighborCounter> {
        match self.backend_for(num_points) {
            NeighborBackend::Pairwise => Box::new(PairwiseCounter),
            #[cfg(feature = "kdtree")]
            NeighborBackend::KdTree => Box::new(KdTreeCounter),
            #[cfg(not(feature = "kdtree"))]
            NeighborBackend::KdTree => Box::new(VoxelCounter),
            NeighborBackend::Voxel => Box::new(VoxelCounter),
        }
    }

    /// Count, for every point, the other points within `radius`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedConfiguration`] if `radius` is not a finite
    /// positive number.
    pub fn count(&self, points: &[[f64; 3]], radius: f64) -> Result<NeighborCounts, GeometryError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeometryError::UnsupportedConfiguration(format!(
                "neighbor radius must be positive and finite, got {radius}"
            )));
        }

        let counter = self.counter_for(points.len());
        let backend = counter.backend();

        let now = std::time::Instant::now();
        let counts = counter.count_neighbors(points, radius);
        log::debug!(
            "counted neighbors of {} points with {backend} backend (radius {radius}) in {:?}",
            points.len(),
            now.elapsed()
        );

        Ok(NeighborCounts { counts, backend })
    }
}

impl Default for NeighborSearch {
    fn default() -> Self {
        Self::new(NeighborSearchParams::default())
    }
}

/// Per-point neighbor counts and the strategy that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborCounts {
    /// Number of other points within the radius, index-aligned with the input.
    pub counts: Vec<usize>,
    /// The strategy used.
    pub backend: NeighborBackend,
}

/// Count neighbors with the strategy selected by `params`.
///
/// Shorthand for `NeighborSearch::new(params).count(points, radius)`.
pub fn count_neighbors(
    points: &[[f64; 3]],
    radius: f64,
    params: NeighborSearchParams,
) -> Result<NeighborCounts, GeometryError> {
    NeighborSearch::new(params).count(points, radius)
}
