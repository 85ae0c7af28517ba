//! RANSAC plane fitting with a least-squares refinement on the inliers.

use std::borrow::Cow;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use plumb_3d::linalg;
use plumb_3d::plane::{self, Plane};
use plumb_3d::{GeometryError, GeometryWarning};

/// Parameters for RANSAC plane fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Number of random three-point samples to evaluate.
    pub max_iterations: usize,
    /// Maximum point-to-plane distance for a point to count as an inlier.
    pub distance_threshold: f64,
    /// Minimum number of inliers for a plane to be accepted.
    pub min_inliers: usize,
    /// Optional fixed seed for reproducible sampling, fresh entropy when `None`.
    pub random_seed: Option<u64>,
    /// Inputs larger than this are subsampled for the iterative search.
    pub sample_cap: usize,
    /// Maximum number of inliers used for the refinement.
    pub refine_cap: usize,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            distance_threshold: 0.05,
            min_inliers: 3,
            random_seed: Some(42),
            sample_cap: 50_000,
            refine_cap: 10_000,
        }
    }
}

impl RansacParams {
    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedConfiguration`] for zero iterations, a negative
    /// or non-finite distance threshold, or a sample or refine cap below 3.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(GeometryError::UnsupportedConfiguration(format!(
                "distance threshold must be finite and non-negative, got {}",
                self.distance_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(GeometryError::UnsupportedConfiguration(
                "max iterations must be at least 1".to_string(),
            ));
        }
        if self.sample_cap < 3 || self.refine_cap < 3 {
            return Err(GeometryError::UnsupportedConfiguration(format!(
                "sample cap ({}) and refine cap ({}) must be at least 3",
                self.sample_cap, self.refine_cap
            )));
        }
        Ok(())
    }

    /// Minimum number of points accepted as input.
    pub fn required_points(&self) -> usize {
        self.min_inliers.max(3)
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Statistics of a RANSAC run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RansacStats {
    /// Number of samples evaluated.
    pub iterations: usize,
    /// Number of samples skipped because the three points were collinear.
    pub degenerate_samples: usize,
    /// Inliers of the best sampled plane within the search set.
    pub search_inliers: usize,
    /// Number of points in the search set.
    pub search_points: usize,
    /// Whether the search ran on a random subsample.
    pub used_sampling: bool,
    /// Number of points the refinement was computed from, zero if it was skipped.
    pub refine_points: usize,
}

/// Result of a plane fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneFit {
    /// The fitted plane.
    pub plane: Plane,
    /// Indices of the input points within the distance threshold of the best sampled
    /// plane, re-evaluated on the full input.
    pub inliers: Vec<usize>,
    /// Statistics of the search.
    pub stats: RansacStats,
    /// Non-fatal issues, such as a failed refinement.
    pub warnings: Vec<GeometryWarning>,
}

impl PlaneFit {
    /// Fraction of the input points that are inliers.
    pub fn inlier_ratio(&self, num_points: usize) -> f64 {
        if num_points == 0 {
            0.0
        } else {
            self.inliers.len() as f64 / num_points as f64
        }
    }
}

fn subsample<'a>(points: &'a [[f64; 3]], cap: usize, rng: &mut StdRng) -> Cow<'a, [[f64; 3]]> {
    if points.len() <= cap {
        return Cow::Borrowed(points);
    }
    let indices = rand::seq::index::sample(rng, points.len(), cap);
    Cow::Owned(indices.iter().map(|i| points[i]).collect())
}

/// Fit a plane to a point set with RANSAC followed by an SVD refinement.
///
/// Inputs larger than `sample_cap` are searched on a uniform random subsample; the
/// inliers of the best sampled plane are then recomputed on the full input, and the
/// plane is refined to the least-squares plane of those inliers (at most `refine_cap` of
/// them). If the refinement fails the sampled plane is kept and a
/// [`GeometryWarning::RefinementFallback`] is attached.
///
/// # Arguments
///
/// * `points` - The input points.
/// * `params` - The RANSAC parameters.
///
/// # Errors
///
/// * [`GeometryError::InsufficientPoints`] with fewer than `max(min_inliers, 3)` points.
/// * [`GeometryError::DegenerateGeometry`] if every sample was collinear.
/// * [`GeometryError::FitFailed`] if the best sample has fewer than `min_inliers`
///   inliers in the search set.
/// * [`GeometryError::UnsupportedConfiguration`] for invalid parameters.
pub fn fit_plane(points: &[[f64; 3]], params: &RansacParams) -> Result<PlaneFit, GeometryError> {
    params.validate()?;

    let required = params.required_points();
    if points.len() < required {
        return Err(GeometryError::InsufficientPoints {
            required,
            actual: points.len(),
        });
    }

    let mut rng = params.rng();
    let search = subsample(points, params.sample_cap, &mut rng);
    let used_sampling = search.len() < points.len();
    if used_sampling {
        log::debug!(
            "ransac search on {} of {} points",
            search.len(),
            points.len()
        );
    }

    let now = std::time::Instant::now();

    let mut best: Option<(Plane, usize)> = None;
    let mut degenerate_samples = 0;
    for _ in 0..params.max_iterations {
        let sample = rand::seq::index::sample(&mut rng, search.len(), 3);
        let (a, b, c) = (
            &search[sample.index(0)],
            &search[sample.index(1)],
            &search[sample.index(2)],
        );

        let Some(candidate) = Plane::from_three_points(a, b, c) else {
            degenerate_samples += 1;
            continue;
        };

        let count = candidate.count_inliers(&search, params.distance_threshold);
        // strict comparison keeps the first best on ties
        if best.as_ref().map_or(true, |(_, best_count)| count > *best_count) {
            best = Some((candidate, count));
        }
    }

    let (best_plane, search_inliers) = best.ok_or_else(|| {
        GeometryError::DegenerateGeometry(format!(
            "all {} samples were collinear",
            params.max_iterations
        ))
    })?;

    log::debug!(
        "ransac best plane {:?} with {search_inliers} inliers after {} iterations in {:?}",
        best_plane.normal,
        params.max_iterations,
        now.elapsed()
    );

    if search_inliers < params.min_inliers {
        return Err(GeometryError::FitFailed {
            required: params.min_inliers,
            actual: search_inliers,
        });
    }

    let inliers = best_plane.inlier_indices(points, params.distance_threshold);

    let refined = refine(points, &inliers, params.refine_cap, &mut rng);
    let (plane, refine_points, warnings) = refined_or_sampled(best_plane, refined);

    Ok(PlaneFit {
        plane,
        inliers,
        stats: RansacStats {
            iterations: params.max_iterations,
            degenerate_samples,
            search_inliers,
            search_points: search.len(),
            used_sampling,
            refine_points,
        },
        warnings,
    })
}

/// The refined plane oriented like the sampled one, or the sampled plane with a
/// [`GeometryWarning::RefinementFallback`] if the refinement failed.
fn refined_or_sampled(
    sampled: Plane,
    refined: Result<(Plane, usize), GeometryError>,
) -> (Plane, usize, Vec<GeometryWarning>) {
    match refined {
        Ok((plane, used)) => (plane.oriented_toward(&sampled.normal), used, Vec::new()),
        Err(err) => {
            let warning = GeometryWarning::RefinementFallback {
                reason: err.to_string(),
            };
            log::warn!("{warning}");
            (sampled, 0, vec![warning])
        }
    }
}

/// Least-squares plane through the inliers.
///
/// The reference point is the centroid of all inliers, the normal comes from at most
/// `cap` of them.
fn refine(
    points: &[[f64; 3]],
    inliers: &[usize],
    cap: usize,
    rng: &mut StdRng,
) -> Result<(Plane, usize), GeometryError> {
    let inlier_points: Vec<[f64; 3]> = inliers.iter().map(|&i| points[i]).collect();
    if inlier_points.len() < 3 {
        return Err(GeometryError::InsufficientPoints {
            required: 3,
            actual: inlier_points.len(),
        });
    }

    let centroid = linalg::centroid3(&inlier_points).ok_or(GeometryError::InsufficientPoints {
        required: 3,
        actual: 0,
    })?;
    let sampled = subsample(&inlier_points, cap, rng);

    let fitted = plane::fit_plane_pca(&sampled)?;
    Ok((Plane::new(fitted.normal, centroid)?, sampled.len()))
}
