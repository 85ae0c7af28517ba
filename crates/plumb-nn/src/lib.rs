#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Three strategies count, for every point, the other points within a radius:
//!
//! - [`PairwiseCounter`]: exact, quadratic, for small clouds.
//! - [`KdTreeCounter`]: exact, one parallel range query per point on a kd-tree. Needs the
//!   `kdtree` feature (enabled by default).
//! - [`VoxelCounter`]: approximate, linear, for very large clouds.
//!
//! [`NeighborSearch`] picks one by input size.

mod backend;
pub use backend::*;

/// Exact pairwise neighbor counting.
pub mod pairwise;
pub use pairwise::PairwiseCounter;

/// Kd-tree neighbor counting.
#[cfg(feature = "kdtree")]
pub mod kdtree;
#[cfg(feature = "kdtree")]
pub use kdtree::KdTreeCounter;

/// Voxel hashing neighbor counting.
pub mod voxel;
pub use voxel::VoxelCounter;
