#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Up-axis alignment of a detected ground plane.
pub mod align;

/// Ground plane detection strategies.
pub mod ground;

/// RANSAC plane fitting.
pub mod ransac;

pub use align::{align_to_up, verify_alignment, AlignmentCheck, RotationResult};
pub use ground::{detect_ground, GroundDetection, GroundParams, GroundStrategy};
pub use ransac::{fit_plane, PlaneFit, RansacParams};
