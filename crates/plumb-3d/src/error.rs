use serde::Serialize;
use thiserror::Error;

/// Error types for the geometric analysis operations.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The input holds fewer points than the operation needs.
    #[error("Operation requires at least {required} points, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Actual number of points provided.
        actual: usize,
    },

    /// The input is geometrically degenerate (collinear, zero-norm, singular).
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The robust search could not reach the required support.
    #[error("Plane fit failed: best candidate has {actual} inliers, {required} required")]
    FitFailed {
        /// Minimum number of inliers required.
        required: usize,
        /// Inliers of the best candidate found.
        actual: usize,
    },

    /// An option or parameter value is not supported.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Two index-aligned arrays differ in length.
    #[error("Mismatched array lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedLengths {
        /// Label for the left-hand array.
        left_name: &'static str,
        /// Length of the left-hand array.
        left_len: usize,
        /// Label for the right-hand array.
        right_name: &'static str,
        /// Length of the right-hand array.
        right_len: usize,
    },
}

/// Non-fatal annotations attached to successful results.
///
/// Every warning is also emitted through `log::warn!` by the operation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryWarning {
    /// The SVD refinement of a plane failed and the unrefined plane was kept.
    RefinementFallback {
        /// Why the refinement was rejected.
        reason: String,
    },
    /// The detected ground normal is tilted far from the ideal up-axis.
    GroundTilt {
        /// Angle between the normal and the up-axis in degrees.
        degrees: f64,
    },
    /// The rotated normal is not aligned with the target up-axis.
    ResidualMisalignment {
        /// Remaining angle between the rotated normal and the up-axis in degrees.
        degrees: f64,
    },
    /// The oriented box fit failed and an axis-aligned box was returned instead.
    OrientedBoundsFallback {
        /// Why the oriented fit was rejected.
        reason: String,
    },
}

impl std::fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RefinementFallback { reason } => {
                write!(f, "plane refinement skipped, keeping sampled plane: {reason}")
            }
            Self::GroundTilt { degrees } => write!(
                f,
                "ground normal is {degrees:.2} degrees from the up-axis, probable misdetection"
            ),
            Self::ResidualMisalignment { degrees } => write!(
                f,
                "rotated normal is still {degrees:.2} degrees from the up-axis"
            ),
            Self::OrientedBoundsFallback { reason } => {
                write!(f, "oriented bounds unavailable, using axis-aligned box: {reason}")
            }
        }
    }
}
