use serde::{Deserialize, Serialize};

use crate::axis::UpAxis;
use crate::bounds::{Aabb, Units};
use crate::error::GeometryError;
use crate::linalg::{self, IDENTITY44};
use crate::pointcloud::PointCloud;
use crate::transforms;

/// Per-element tolerance under which a node transform is treated as the identity.
const IDENTITY_TOL: f64 = 1e-12;

/// A named point cloud with an optional node transform from local to world space.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name, unique within a scene.
    pub name: String,
    /// Vertices in the node's local coordinates.
    pub cloud: PointCloud,
    /// Local-to-world transform, the identity when `None`.
    pub transform: Option<[[f64; 4]; 4]>,
}

impl SceneNode {
    /// Create a node without a transform.
    pub fn new(name: impl Into<String>, cloud: PointCloud) -> Self {
        Self {
            name: name.into(),
            cloud,
            transform: None,
        }
    }

    /// Set the local-to-world transform.
    pub fn with_transform(mut self, transform: [[f64; 4]; 4]) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the local-to-world transform from a 3x4 affine matrix.
    pub fn with_affine_transform(self, transform: [[f64; 4]; 3]) -> Self {
        self.with_transform(transforms::affine34_to_44(&transform))
    }

    /// The effective local-to-world transform.
    pub fn world_transform(&self) -> [[f64; 4]; 4] {
        self.transform.unwrap_or(IDENTITY44)
    }

    /// Vertices mapped into world space.
    ///
    /// The local vertices are copied unchanged when the transform is absent or the
    /// identity.
    pub fn world_points(&self) -> Vec<[f64; 3]> {
        match &self.transform {
            Some(t) if !linalg::is_identity44(t, IDENTITY_TOL) => {
                linalg::transform_points44(self.cloud.points(), t)
            }
            _ => self.cloud.points().to_vec(),
        }
    }
}

/// Concatenate the world-space vertices of all nodes.
pub fn aggregate_world_points(nodes: &[SceneNode]) -> Vec<[f64; 3]> {
    let total = nodes.iter().map(|n| n.cloud.len()).sum();
    let mut points = Vec::with_capacity(total);
    for node in nodes {
        points.extend(node.world_points());
    }
    log::debug!(
        "aggregated {} points from {} nodes",
        points.len(),
        nodes.len()
    );
    points
}

/// Apply `transform` on top of every node's world transform.
///
/// Returns new nodes with vertices `transform * node_transform * local` and an identity
/// transform. Colors are carried unchanged and the input nodes are not modified.
pub fn apply_transform_to_scene(nodes: &[SceneNode], transform: &[[f64; 4]; 4]) -> Vec<SceneNode> {
    nodes
        .iter()
        .map(|node| {
            let full = linalg::matmul44(transform, &node.world_transform());
            SceneNode {
                name: node.name.clone(),
                cloud: node.cloud.transformed(&full),
                transform: None,
            }
        })
        .collect()
}

/// Which point of the bounds becomes the new origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginMode {
    /// The center of the axis-aligned bounds.
    Center,
    /// The center of the bottom face of the axis-aligned bounds along the up-axis.
    #[default]
    BottomCenter,
}

impl std::str::FromStr for OriginMode {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "center" => Ok(OriginMode::Center),
            "bottom_center" => Ok(OriginMode::BottomCenter),
            other => Err(GeometryError::UnsupportedConfiguration(format!(
                "unknown origin mode '{other}'"
            ))),
        }
    }
}

/// Result of an origin adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OriginAdjustment {
    /// The chosen origin in the input coordinates.
    pub origin: [f64; 3],
    /// Translation moving `origin` to zero, as a homogeneous transform.
    pub transform: [[f64; 4]; 4],
    /// `origin` expressed in the requested units, for placing the asset back.
    pub position: [f64; 3],
}

/// Compute the translation that moves the chosen origin of a point set to zero.
///
/// For [`OriginMode::BottomCenter`] the up coordinate of the origin is the bottom of the
/// bounds, which is the maximum coordinate for negative up-axes.
///
/// # Errors
///
/// Returns [`GeometryError::InsufficientPoints`] if `points` is empty.
pub fn origin_adjustment(
    points: &[[f64; 3]],
    mode: OriginMode,
    up_axis: UpAxis,
    units: Units,
) -> Result<OriginAdjustment, GeometryError> {
    let aabb = Aabb::from_points(points)?;

    let mut origin = aabb.center;
    if mode == OriginMode::BottomCenter {
        let h = up_axis.index();
        origin[h] = if up_axis.sign() > 0.0 {
            aabb.min[h]
        } else {
            aabb.max[h]
        };
    }

    log::debug!("origin ({mode:?}) at {origin:?}");

    Ok(OriginAdjustment {
        origin,
        transform: transforms::translation44(&linalg::scale3(&origin, -1.0)),
        position: linalg::scale3(&origin, units.factor()),
    })
}
