#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use plumb_3d as geometry;

#[doc(inline)]
pub use plumb_filters as filters;

#[doc(inline)]
pub use plumb_ground as ground;

#[doc(inline)]
pub use plumb_nn as nn;
