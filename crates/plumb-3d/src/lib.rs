#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Coordinate axes and the configurable up-axis.
pub mod axis;

/// Axis-aligned and oriented bounding volumes.
pub mod bounds;

/// Error and warning types shared by the geometric operations.
pub mod error;

/// Linear algebra utilities.
pub mod linalg;

/// Preview overlays sampled as colored points.
pub mod overlay;

/// Planes and least-squares plane fitting.
pub mod plane;

/// Point cloud container.
pub mod pointcloud;

/// Multi-node scenes and origin adjustment.
pub mod scene;

/// Percentiles and summary statistics.
pub mod stats;

/// 3D transforms algorithms.
pub mod transforms;

pub use error::{GeometryError, GeometryWarning};
