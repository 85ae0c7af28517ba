//! Local density outlier filter.
//!
//! Every point is scored by the number of other points within a radius, counted once on
//! the unfiltered input. Three stages then decide what to keep:
//!
//! 1. Points with fewer than `min_neighbors` neighbors are dropped.
//! 2. Survivors whose count falls below the `1 - density_keep_fraction` percentile of the
//!    survivor counts are dropped.
//! 3. If fewer than `ceil(core_keep_fraction * N)` points remain, the densest dropped
//!    points are restored until the target is met.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use plumb_3d::pointcloud;
use plumb_3d::stats::{self, Summary};
use plumb_3d::GeometryError;
use plumb_nn::{NeighborBackend, NeighborSearch, NeighborSearchParams};

/// Divisor applied to the bounding diagonal when the radius is adaptive.
pub const ADAPTIVE_RADIUS_DIVISOR: f64 = 10.0;

/// Parameters for [`filter_by_density`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityFilterParams {
    /// Neighborhood radius, or a multiple of a tenth of the bounding diagonal when
    /// `adaptive` is set.
    pub radius: f64,
    /// Minimum neighbor count a point needs to survive the first stage.
    pub min_neighbors: usize,
    /// Fraction of the densest first-stage survivors kept by the percentile stage.
    pub density_keep_fraction: f64,
    /// Fraction of the input that is always retained, `0` disables the core stage.
    pub core_keep_fraction: f64,
    /// Scale the radius with the size of the cloud.
    pub adaptive: bool,
    /// Thresholds selecting the neighbor counting strategy.
    pub neighbor_search: NeighborSearchParams,
}

impl Default for DensityFilterParams {
    fn default() -> Self {
        Self {
            radius: 0.3,
            min_neighbors: 5,
            density_keep_fraction: 0.99,
            core_keep_fraction: 0.8,
            adaptive: true,
            neighbor_search: NeighborSearchParams::default(),
        }
    }
}

impl DensityFilterParams {
    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedConfiguration`] if the radius is not a finite
    /// positive number, `density_keep_fraction` is outside `(0, 1]` or
    /// `core_keep_fraction` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GeometryError::UnsupportedConfiguration(format!(
                "density radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if !(self.density_keep_fraction > 0.0 && self.density_keep_fraction <= 1.0) {
            return Err(GeometryError::UnsupportedConfiguration(format!(
                "density keep fraction must be in (0, 1], got {}",
                self.density_keep_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.core_keep_fraction) {
            return Err(GeometryError::UnsupportedConfiguration(format!(
                "core keep fraction must be in [0, 1], got {}",
                self.core_keep_fraction
            )));
        }
        Ok(())
    }
}

/// Statistics of a density filter run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityStats {
    /// Summary of the neighbor counts, `None` for an empty input.
    pub counts: Option<Summary>,
    /// Points dropped by the minimum neighbor stage.
    pub removed_by_min_neighbors: usize,
    /// Points dropped by the percentile stage.
    pub removed_by_percentile: usize,
    /// Neighbor count threshold of the percentile stage, if it ran.
    pub percentile_threshold: Option<f64>,
    /// Points restored by the core stage.
    pub restored_by_core: usize,
    /// Number of points in the input.
    pub input_points: usize,
    /// Number of points kept.
    pub retained_points: usize,
    /// `retained_points / input_points`, `0` for an empty input.
    pub retention_rate: f64,
    /// Radius used for the neighbor counts.
    pub effective_radius: f64,
    /// Strategy used for the neighbor counts.
    pub backend: NeighborBackend,
}

/// Keep mask produced by [`filter_by_density`].
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMask {
    /// `true` for every retained point, index-aligned with the input.
    pub mask: Vec<bool>,
    /// Neighbor count of every input point.
    pub counts: Vec<usize>,
    /// Run statistics.
    pub stats: DensityStats,
}

impl DensityMask {
    /// Number of retained points.
    pub fn retained(&self) -> usize {
        self.stats.retained_points
    }
}

/// Radius actually used for the neighbor counts.
///
/// With `adaptive`, the radius is multiplied by a tenth of the bounding diagonal. A
/// cloud without extent keeps the configured radius.
pub fn effective_radius(points: &[[f64; 3]], radius: f64, adaptive: bool) -> f64 {
    if !adaptive {
        return radius;
    }
    let diagonal = pointcloud::bounding_diagonal(points);
    if diagonal > 0.0 {
        let scaled = radius * diagonal / ADAPTIVE_RADIUS_DIVISOR;
        log::debug!("adaptive radius {radius} -> {scaled} (bounding diagonal {diagonal})");
        scaled
    } else {
        log::debug!("cloud has no extent, keeping radius {radius}");
        radius
    }
}

/// Tolerance absorbing float error in `core_keep_fraction * N` before rounding up.
const CORE_TARGET_TOL: f64 = 1e-9;

/// Number of points the core stage guarantees, `ceil(fraction * n)`.
fn core_target(fraction: f64, n: usize) -> usize {
    (fraction * n as f64 - CORE_TARGET_TOL).ceil().max(0.0) as usize
}

/// Compute a keep mask for a point cloud from local neighbor counts.
///
/// # Arguments
///
/// * `points` - The input points.
/// * `params` - Radius, stage thresholds and neighbor search parameters.
///
/// # Returns
///
/// The keep mask, the neighbor counts and the run statistics. The input is not modified;
/// apply the mask with [`plumb_3d::pointcloud::PointCloud::select`].
///
/// # Errors
///
/// Returns [`GeometryError::UnsupportedConfiguration`] for invalid parameters.
pub fn filter_by_density(
    points: &[[f64; 3]],
    params: &DensityFilterParams,
) -> Result<DensityMask, GeometryError> {
    params.validate()?;

    let n = points.len();
    let radius = effective_radius(points, params.radius, params.adaptive);
    let search = NeighborSearch::new(params.neighbor_search);
    let neighbor_counts = search.count(points, radius)?;
    let counts = neighbor_counts.counts;

    // stage A: minimum neighbors
    let mut mask: Vec<bool> = counts.iter().map(|&c| c >= params.min_neighbors).collect();
    let removed_by_min_neighbors = mask.iter().filter(|keep| !**keep).count();
    log::debug!("minimum neighbor stage removed {removed_by_min_neighbors} points");

    // stage B: percentile of the survivors
    let survivors: Vec<f64> = counts
        .iter()
        .zip(&mask)
        .filter_map(|(&c, &keep)| keep.then_some(c as f64))
        .collect();
    let percentile_threshold = stats::percentile(&survivors, 1.0 - params.density_keep_fraction);
    let mut removed_by_percentile = 0;
    if let Some(threshold) = percentile_threshold {
        for (keep, &c) in mask.iter_mut().zip(&counts) {
            if *keep && (c as f64) < threshold {
                *keep = false;
                removed_by_percentile += 1;
            }
        }
        log::debug!(
            "percentile stage removed {removed_by_percentile} points (threshold {threshold:.1})"
        );
    }

    // stage C: core protection
    let target = core_target(params.core_keep_fraction, n);
    let kept = mask.iter().filter(|keep| **keep).count();
    let mut restored_by_core = 0;
    if kept < target {
        let mut dropped: Vec<usize> = (0..n).filter(|&i| !mask[i]).collect();
        dropped.sort_by_key(|&i| Reverse(counts[i]));
        for &i in dropped.iter().take(target - kept) {
            mask[i] = true;
            restored_by_core += 1;
        }
        log::debug!("core stage restored {restored_by_core} points (target {target})");
    }

    let retained_points = kept + restored_by_core;
    let retention_rate = if n == 0 {
        0.0
    } else {
        retained_points as f64 / n as f64
    };

    let stats = DensityStats {
        counts: Summary::from_values(counts.iter().map(|&c| c as f64)),
        removed_by_min_neighbors,
        removed_by_percentile,
        percentile_threshold,
        restored_by_core,
        input_points: n,
        retained_points,
        retention_rate,
        effective_radius: radius,
        backend: neighbor_counts.backend,
    };

    log::debug!(
        "density filter kept {retained_points} of {n} points ({:.1}%)",
        100.0 * retention_rate
    );

    Ok(DensityMask {
        mask,
        counts,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // 10 x 10 grid with spacing 1 and a far away point
    fn grid_with_outlier() -> Vec<[f64; 3]> {
        let mut points: Vec<[f64; 3]> = (0..10)
            .flat_map(|i| (0..10).map(move |j| [i as f64, j as f64, 0.0]))
            .collect();
        points.push([100.0, 100.0, 100.0]);
        points
    }

    fn fixed_radius(radius: f64) -> DensityFilterParams {
        DensityFilterParams {
            radius,
            adaptive: false,
            density_keep_fraction: 1.0,
            core_keep_fraction: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_minimum_neighbor_stage() -> Result<(), GeometryError> {
        let points = grid_with_outlier();
        let params = DensityFilterParams {
            min_neighbors: 2,
            ..fixed_radius(1.0)
        };
        let result = filter_by_density(&points, &params)?;

        // grid corners have 2 neighbors at distance 1, the outlier none
        assert_eq!(result.counts[0], 2);
        assert_eq!(result.counts[100], 0);
        assert!(!result.mask[100]);
        assert_eq!(result.retained(), 100);
        assert_eq!(result.stats.removed_by_min_neighbors, 1);
        assert_eq!(result.stats.removed_by_percentile, 0);
        assert_eq!(result.stats.backend, NeighborBackend::Pairwise);
        Ok(())
    }

    #[test]
    fn test_percentile_stage() -> Result<(), GeometryError> {
        let points = grid_with_outlier();
        let params = DensityFilterParams {
            min_neighbors: 0,
            density_keep_fraction: 0.5,
            ..fixed_radius(1.0)
        };
        let result = filter_by_density(&points, &params)?;

        // interior points have 4 neighbors and make up the median
        assert_eq!(result.stats.percentile_threshold, Some(4.0));
        assert_eq!(result.retained(), 64);
        assert!(result.mask.iter().zip(&result.counts).all(|(&k, &c)| k == (c == 4)));
        Ok(())
    }

    #[test]
    fn test_core_stage_restores_densest() -> Result<(), GeometryError> {
        let points = grid_with_outlier();
        let params = DensityFilterParams {
            min_neighbors: 4,
            core_keep_fraction: 0.9,
            ..fixed_radius(1.0)
        };
        let result = filter_by_density(&points, &params)?;

        // 64 interior points survive, the target is ceil(0.9 * 101) = 91
        assert_eq!(result.stats.restored_by_core, 27);
        assert_eq!(result.retained(), 91);
        // edge points (3 neighbors) come back before corners and the outlier
        assert!(!result.mask[100]);
        assert!(!result.mask[0]);
        Ok(())
    }

    #[test]
    fn test_full_core_keeps_everything() -> Result<(), GeometryError> {
        let points = grid_with_outlier();
        let params = DensityFilterParams {
            min_neighbors: 50,
            core_keep_fraction: 1.0,
            ..fixed_radius(1.0)
        };
        let result = filter_by_density(&points, &params)?;
        assert_eq!(result.retained(), points.len());
        assert!(result.mask.iter().all(|k| *k));
        Ok(())
    }

    #[test]
    fn test_core_target_rounding() -> Result<(), GeometryError> {
        // 0.56 * 100 is slightly above 56 in floating point
        assert_eq!(core_target(0.56, 100), 56);
        assert_eq!(core_target(0.905, 100), 91);
        assert_eq!(core_target(0.9, 101), 91);
        assert_eq!(core_target(1.0, 7), 7);
        assert_eq!(core_target(0.0, 7), 0);

        // isolated points are all dropped, then the core stage restores exactly 56
        let points: Vec<[f64; 3]> = (0..100).map(|i| [10.0 * i as f64, 0.0, 0.0]).collect();
        let params = DensityFilterParams {
            min_neighbors: 1,
            core_keep_fraction: 0.56,
            ..fixed_radius(1.0)
        };
        let result = filter_by_density(&points, &params)?;
        assert_eq!(result.stats.removed_by_min_neighbors, 100);
        assert_eq!(result.retained(), 56);
        Ok(())
    }

    #[test]
    fn test_adaptive_radius() {
        let points = vec![[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]];
        assert_relative_eq!(effective_radius(&points, 0.3, true), 0.15);
        assert_relative_eq!(effective_radius(&points, 0.3, false), 0.3);
        assert_relative_eq!(effective_radius(&[[1.0; 3]; 4], 0.3, true), 0.3);
    }

    #[test]
    fn test_empty_input() -> Result<(), GeometryError> {
        let result = filter_by_density(&[], &DensityFilterParams::default())?;
        assert!(result.mask.is_empty());
        assert_eq!(result.stats.counts, None);
        assert_eq!(result.stats.retention_rate, 0.0);
        Ok(())
    }

    #[test]
    fn test_invalid_params() {
        for params in [
            DensityFilterParams {
                radius: 0.0,
                ..Default::default()
            },
            DensityFilterParams {
                density_keep_fraction: 0.0,
                ..Default::default()
            },
            DensityFilterParams {
                core_keep_fraction: 1.5,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                filter_by_density(&[[0.0; 3]], &params),
                Err(GeometryError::UnsupportedConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_params_from_json() -> Result<(), Box<dyn std::error::Error>> {
        let params: DensityFilterParams =
            serde_json::from_str(r#"{"min_neighbors": 8, "adaptive": false}"#)?;
        assert_eq!(params.min_neighbors, 8);
        assert!(!params.adaptive);
        assert_eq!(params.core_keep_fraction, 0.8);
        assert_eq!(params.neighbor_search.pairwise_max_points, 20_000);
        Ok(())
    }
}
