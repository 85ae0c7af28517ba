//! Ground plane detection.
//!
//! Every strategy narrows the cloud to a set of ground candidates and fits a plane to
//! them. The fitted normal is then flipped to point up and its tilt from the up-axis is
//! reported.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use plumb_3d::axis::{Axis, UpAxis};
use plumb_3d::linalg;
use plumb_3d::plane::{self, Plane};
use plumb_3d::stats;
use plumb_3d::{GeometryError, GeometryWarning};

use crate::ransac::{self, RansacParams, RansacStats};

/// How ground candidates are selected and fitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundStrategy {
    /// RANSAC on the points within a band above the lowest point along the up-axis.
    #[default]
    LowestBand,
    /// RANSAC on the lowest fraction of the points along the up-axis.
    HeightPercentile,
    /// RANSAC on the whole cloud.
    FullRansac,
    /// Lowest band on each of X, Y and Z, keeping the fit with the most inliers.
    #[serde(rename = "multi_axis_probe", alias = "multi_axis_fit")]
    MultiAxisFit,
    /// Least-squares plane of the lowest band, no RANSAC.
    PcaFallback,
}

impl std::fmt::Display for GroundStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroundStrategy::LowestBand => "lowest_band",
            GroundStrategy::HeightPercentile => "height_percentile",
            GroundStrategy::FullRansac => "full_ransac",
            GroundStrategy::MultiAxisFit => "multi_axis_probe",
            GroundStrategy::PcaFallback => "pca_fallback",
        };
        f.write_str(name)
    }
}

impl FromStr for GroundStrategy {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lowest_band" | "lowest_plane" => Ok(GroundStrategy::LowestBand),
            "height_percentile" | "height_based" => Ok(GroundStrategy::HeightPercentile),
            "full_ransac" | "ransac_full" => Ok(GroundStrategy::FullRansac),
            "multi_axis_probe" | "multi_axis_fit" | "debug_mode" => {
                Ok(GroundStrategy::MultiAxisFit)
            }
            "pca_fallback" | "simple_test" => Ok(GroundStrategy::PcaFallback),
            other => Err(GeometryError::UnsupportedConfiguration(format!(
                "unknown ground detection strategy '{other}'"
            ))),
        }
    }
}

/// Parameters for ground detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundParams {
    /// The direction considered up.
    pub up_axis: UpAxis,
    /// Candidate selection strategy.
    pub strategy: GroundStrategy,
    /// Height of the lowest band as a fraction of the height range.
    pub band_fraction: f64,
    /// Fraction of the lowest points used by [`GroundStrategy::HeightPercentile`].
    pub height_percentile: f64,
    /// Tilt in degrees above which a [`GeometryWarning::GroundTilt`] is attached.
    pub tilt_warning_degrees: f64,
    /// Parameters of the plane fit.
    pub ransac: RansacParams,
}

impl Default for GroundParams {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Z,
            strategy: GroundStrategy::LowestBand,
            band_fraction: 0.05,
            height_percentile: 0.1,
            tilt_warning_degrees: 60.0,
            ransac: RansacParams::default(),
        }
    }
}

impl GroundParams {
    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedConfiguration`] if a fraction is outside
    /// `(0, 1]` or the RANSAC parameters are invalid.
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (name, value) in [
            ("band fraction", self.band_fraction),
            ("height percentile", self.height_percentile),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(GeometryError::UnsupportedConfiguration(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        self.ransac.validate()
    }
}

/// Outcome of fitting the lowest band along one coordinate axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisFit {
    /// The axis treated as up for this fit.
    pub axis: Axis,
    /// Number of ground candidates in the band.
    pub candidates: usize,
    /// The fitted plane, oriented toward the fitted axis, if the fit succeeded.
    pub plane: Option<Plane>,
    /// Inliers of the fit, zero if it failed.
    pub inliers: usize,
    /// The failure, if any.
    pub error: Option<String>,
}

/// A detected ground plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundDetection {
    /// The ground plane, its normal pointing toward the up direction.
    pub plane: Plane,
    /// Indices of the input points supporting the plane.
    pub inliers: Vec<usize>,
    /// Number of ground candidates the plane was fitted to.
    pub candidates: usize,
    /// Angle in degrees between the plane normal and the up direction.
    pub tilt_degrees: f64,
    /// The strategy used.
    pub strategy: GroundStrategy,
    /// The coordinate axis whose band produced the plane, for the multi-axis strategy.
    pub best_axis: Option<Axis>,
    /// Every per-axis attempt, for the multi-axis strategy.
    pub axis_fits: Vec<AxisFit>,
    /// Statistics of the RANSAC search, `None` for the least-squares strategy.
    pub ransac: Option<RansacStats>,
    /// Non-fatal issues found during detection.
    pub warnings: Vec<GeometryWarning>,
}

/// Indices of the points within `fraction` of the height range from the ground extreme.
///
/// Heights are measured along `up_axis`, so for negative axes the band sits at the
/// maximum coordinate.
pub fn lowest_band_indices(points: &[[f64; 3]], up_axis: UpAxis, fraction: f64) -> Vec<usize> {
    let (lo, hi) = points
        .iter()
        .map(|p| up_axis.height(p))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| {
            (lo.min(h), hi.max(h))
        });
    if lo > hi {
        return Vec::new();
    }

    let limit = lo + (hi - lo) * fraction;
    points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| (up_axis.height(p) <= limit).then_some(i))
        .collect()
}

/// Indices of the lowest `fraction` of the points along `up_axis`.
pub fn height_percentile_indices(
    points: &[[f64; 3]],
    up_axis: UpAxis,
    fraction: f64,
) -> Vec<usize> {
    let heights: Vec<f64> = points.iter().map(|p| up_axis.height(p)).collect();
    let Some(limit) = stats::percentile(&heights, fraction) else {
        return Vec::new();
    };
    heights
        .iter()
        .enumerate()
        .filter_map(|(i, h)| (*h <= limit).then_some(i))
        .collect()
}

/// Lowest band with a single retry at twice the fraction when too few points fall in it.
fn band_candidates(
    points: &[[f64; 3]],
    up_axis: UpAxis,
    fraction: f64,
    required: usize,
) -> Result<Vec<usize>, GeometryError> {
    let band = lowest_band_indices(points, up_axis, fraction);
    if band.len() >= required {
        return Ok(band);
    }

    log::debug!(
        "{} ground candidates along {up_axis}, retrying with a band of {}",
        band.len(),
        2.0 * fraction
    );
    let band = lowest_band_indices(points, up_axis, (2.0 * fraction).min(1.0));
    if band.len() >= required {
        Ok(band)
    } else {
        Err(GeometryError::InsufficientPoints {
            required,
            actual: band.len(),
        })
    }
}

fn gather(points: &[[f64; 3]], indices: &[usize]) -> Vec<[f64; 3]> {
    indices.iter().map(|&i| points[i]).collect()
}

struct CandidateFit {
    plane: Plane,
    inliers: Vec<usize>,
    candidates: usize,
    ransac: Option<RansacStats>,
    warnings: Vec<GeometryWarning>,
}

/// RANSAC on a subset, with the inliers mapped back to indices of the full input.
fn fit_subset(
    points: &[[f64; 3]],
    subset: &[usize],
    params: &RansacParams,
) -> Result<CandidateFit, GeometryError> {
    let fit = ransac::fit_plane(&gather(points, subset), params)?;
    Ok(CandidateFit {
        plane: fit.plane,
        inliers: fit.inliers.iter().map(|&i| subset[i]).collect(),
        candidates: subset.len(),
        ransac: Some(fit.stats),
        warnings: fit.warnings,
    })
}

/// Detect the ground plane of a point cloud.
///
/// # Arguments
///
/// * `points` - The input points.
/// * `params` - Strategy, up-axis and fit parameters.
///
/// # Errors
///
/// * [`GeometryError::InsufficientPoints`] if too few ground candidates are found.
/// * [`GeometryError::UnsupportedConfiguration`] for invalid parameters.
/// * Any error of [`ransac::fit_plane`] on the candidates.
pub fn detect_ground(
    points: &[[f64; 3]],
    params: &GroundParams,
) -> Result<GroundDetection, GeometryError> {
    params.validate()?;

    let required = params.ransac.required_points();
    if points.len() < required {
        return Err(GeometryError::InsufficientPoints {
            required,
            actual: points.len(),
        });
    }

    let up = params.up_axis;
    let mut axis_fits = Vec::new();
    let mut best_axis = None;

    let fit = match params.strategy {
        GroundStrategy::LowestBand => {
            let band = band_candidates(points, up, params.band_fraction, required)?;
            fit_subset(points, &band, &params.ransac)?
        }
        GroundStrategy::HeightPercentile => {
            let lowest = height_percentile_indices(points, up, params.height_percentile);
            if lowest.len() < required {
                return Err(GeometryError::InsufficientPoints {
                    required,
                    actual: lowest.len(),
                });
            }
            fit_subset(points, &lowest, &params.ransac)?
        }
        GroundStrategy::FullRansac => {
            let fit = ransac::fit_plane(points, &params.ransac)?;
            CandidateFit {
                plane: fit.plane,
                inliers: fit.inliers,
                candidates: points.len(),
                ransac: Some(fit.stats),
                warnings: fit.warnings,
            }
        }
        GroundStrategy::MultiAxisFit => {
            let (best, axis, all) = fit_each_axis(points, params, required)?;
            best_axis = Some(axis);
            axis_fits = all;
            best
        }
        GroundStrategy::PcaFallback => {
            let band = band_candidates(points, up, params.band_fraction, required.max(3))?;
            let plane = plane::fit_plane_pca(&gather(points, &band))?;
            CandidateFit {
                plane,
                candidates: band.len(),
                inliers: band,
                ransac: None,
                warnings: Vec::new(),
            }
        }
    };

    let up_direction = up.direction();
    let plane = fit.plane.oriented_toward(&up_direction);
    let tilt_degrees = linalg::angle_between_deg(&plane.normal, &up_direction);

    let mut warnings = fit.warnings;
    if tilt_degrees > params.tilt_warning_degrees {
        let warning = GeometryWarning::GroundTilt {
            degrees: tilt_degrees,
        };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    log::debug!(
        "ground ({}) normal {:?} tilt {tilt_degrees:.2} deg, {} inliers of {} candidates",
        params.strategy,
        plane.normal,
        fit.inliers.len(),
        fit.candidates
    );

    Ok(GroundDetection {
        plane,
        inliers: fit.inliers,
        candidates: fit.candidates,
        tilt_degrees,
        strategy: params.strategy,
        best_axis,
        axis_fits,
        ransac: fit.ransac,
        warnings,
    })
}

/// Fit the lowest band of each coordinate axis with a third of the iterations.
///
/// Returns the fit with the most inliers (first axis on ties), its axis, and all axis_fits.
fn fit_each_axis(
    points: &[[f64; 3]],
    params: &GroundParams,
    required: usize,
) -> Result<(CandidateFit, Axis, Vec<AxisFit>), GeometryError> {
    let axis_params = RansacParams {
        max_iterations: (params.ransac.max_iterations / 3).max(1),
        ..params.ransac.clone()
    };

    let mut axis_fits = Vec::with_capacity(Axis::ALL.len());
    let mut best: Option<(CandidateFit, Axis)> = None;
    let mut last_error = None;

    for axis in Axis::ALL {
        let band = lowest_band_indices(points, UpAxis::from(axis), params.band_fraction);
        let result = if band.len() >= required {
            fit_subset(points, &band, &axis_params)
        } else {
            Err(GeometryError::InsufficientPoints {
                required,
                actual: band.len(),
            })
        };

        match result {
            Ok(fit) => {
                log::debug!("axis {axis}: {} inliers", fit.inliers.len());
                axis_fits.push(AxisFit {
                    axis,
                    candidates: band.len(),
                    plane: Some(fit.plane.oriented_toward(&axis.unit())),
                    inliers: fit.inliers.len(),
                    error: None,
                });
                let better = best
                    .as_ref()
                    .map_or(true, |(b, _)| fit.inliers.len() > b.inliers.len());
                if better {
                    best = Some((fit, axis));
                }
            }
            Err(err) => {
                log::debug!("axis {axis} failed: {err}");
                axis_fits.push(AxisFit {
                    axis,
                    candidates: band.len(),
                    plane: None,
                    inliers: 0,
                    error: Some(err.to_string()),
                });
                last_error = Some(err);
            }
        }
    }

    match best {
        Some((fit, axis)) => Ok((fit, axis, axis_fits)),
        None => Err(last_error.unwrap_or(GeometryError::InsufficientPoints {
            required,
            actual: 0,
        })),
    }
}
