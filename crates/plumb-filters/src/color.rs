use serde::{Deserialize, Serialize};

use plumb_3d::pointcloud::PointCloud;
use plumb_3d::GeometryError;

/// Parameters for dark point removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkPointParams {
    /// Minimum `R + G + B` sum of a kept point, `0` disables the filter.
    pub threshold: u32,
}

impl Default for DarkPointParams {
    fn default() -> Self {
        Self { threshold: 30 }
    }
}

impl DarkPointParams {
    /// Remove the dark points of a colored cloud.
    ///
    /// A cloud without colors is returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`PointCloud::select`].
    pub fn apply(&self, cloud: &PointCloud) -> Result<PointCloud, GeometryError> {
        match cloud.colors() {
            Some(colors) => {
                let mask = filter_dark_points(colors, self.threshold);
                cloud.select(&mask)
            }
            None => {
                log::debug!("cloud has no colors, skipping dark point removal");
                Ok(cloud.clone())
            }
        }
    }
}

/// Keep mask of the points whose `R + G + B` is at least `threshold`.
///
/// The alpha channel is ignored. A threshold of `0` keeps every point.
///
/// Example:
///
/// ```
/// use plumb_filters::filter_dark_points;
///
/// let colors = [[0, 0, 0, 255], [10, 10, 10, 255], [200, 180, 90, 255]];
/// assert_eq!(filter_dark_points(&colors, 30), vec![false, true, true]);
/// ```
pub fn filter_dark_points(colors: &[[u8; 4]], threshold: u32) -> Vec<bool> {
    let mask: Vec<bool> = colors
        .iter()
        .map(|c| c[0] as u32 + c[1] as u32 + c[2] as u32 >= threshold)
        .collect();

    if threshold > 0 {
        let removed = mask.iter().filter(|keep| !**keep).count();
        log::debug!("removed {removed} points darker than rgb sum {threshold}");
    }
    mask
}
