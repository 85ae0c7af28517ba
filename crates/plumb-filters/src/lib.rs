#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Color based point removal.
pub mod color;

/// Local density outlier filter.
pub mod density;

pub use color::{filter_dark_points, DarkPointParams};
pub use density::{filter_by_density, DensityFilterParams, DensityMask, DensityStats};
