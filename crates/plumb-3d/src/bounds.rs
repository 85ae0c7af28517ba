//! Axis-aligned and oriented bounding volumes.
//!
//! The oriented box is the minimum-volume box over a small set of candidate frames:
//! each principal axis of the point set and each coordinate axis is tried as the box
//! "height" axis, and the two remaining axes are fitted with a minimum-area rectangle
//! around the convex hull of the projected points.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, GeometryWarning};
use crate::linalg::{self, IDENTITY33};
use crate::plane::COLLINEAR_RATIO;
use crate::pointcloud;

/// Kind of bounding volume to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsKind {
    /// Box aligned with the coordinate axes.
    #[default]
    AxisAligned,
    /// Minimum-volume box with free orientation.
    Oriented,
}

impl std::fmt::Display for BoundsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsKind::AxisAligned => f.write_str("axis_aligned"),
            BoundsKind::Oriented => f.write_str("oriented"),
        }
    }
}

impl FromStr for BoundsKind {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "axis_aligned" => Ok(BoundsKind::AxisAligned),
            "oriented" => Ok(BoundsKind::Oriented),
            other => Err(GeometryError::UnsupportedConfiguration(format!(
                "unknown bounding box type '{other}'"
            ))),
        }
    }
}

/// Output length units, expressed as a factor over meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Factor 1.
    #[default]
    Meters,
    /// Factor 100.
    Centimeters,
    /// Factor 1000.
    Millimeters,
}

impl Units {
    /// Multiplier applied to lengths given in meters.
    pub fn factor(self) -> f64 {
        match self {
            Units::Meters => 1.0,
            Units::Centimeters => 100.0,
            Units::Millimeters => 1000.0,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Units::Meters => f.write_str("meters"),
            Units::Centimeters => f.write_str("centimeters"),
            Units::Millimeters => f.write_str("millimeters"),
        }
    }
}

impl FromStr for Units {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "meters" | "m" => Ok(Units::Meters),
            "centimeters" | "cm" => Ok(Units::Centimeters),
            "millimeters" | "mm" => Ok(Units::Millimeters),
            other => Err(GeometryError::UnsupportedConfiguration(format!(
                "unknown units '{other}'"
            ))),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    /// Per-axis minimum.
    pub min: [f64; 3],
    /// Per-axis maximum.
    pub max: [f64; 3],
    /// `(min + max) / 2`.
    pub center: [f64; 3],
    /// `max - min`.
    pub extents: [f64; 3],
}

impl Aabb {
    /// Compute the axis-aligned box of a point set.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InsufficientPoints`] if `points` is empty.
    pub fn from_points(points: &[[f64; 3]]) -> Result<Self, GeometryError> {
        let (min, max) = pointcloud::min_bound(points)
            .zip(pointcloud::max_bound(points))
            .ok_or(GeometryError::InsufficientPoints {
                required: 1,
                actual: 0,
            })?;
        Ok(Self::from_min_max(min, max))
    }

    /// Build the box from its two extreme corners.
    pub fn from_min_max(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min,
            max,
            center: linalg::scale3(&linalg::add3(&min, &max), 0.5),
            extents: linalg::sub3(&max, &min),
        }
    }
}

/// Oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obb {
    /// Center of the box in world coordinates.
    pub center: [f64; 3],
    /// Full side lengths along each local axis.
    pub extents: [f64; 3],
    /// Unit local axes, `axes[k]` pairs with `extents[k]`. Right-handed.
    pub axes: [[f64; 3]; 3],
}

impl Obb {
    /// Volume of the box.
    pub fn volume(&self) -> f64 {
        self.extents.iter().product()
    }
}

/// A bounding volume of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundingVolume {
    /// An axis-aligned box.
    AxisAligned(Aabb),
    /// An oriented box.
    Oriented(Obb),
}

impl BoundingVolume {
    /// Kind of the box.
    pub fn kind(&self) -> BoundsKind {
        match self {
            BoundingVolume::AxisAligned(_) => BoundsKind::AxisAligned,
            BoundingVolume::Oriented(_) => BoundsKind::Oriented,
        }
    }

    /// Center of the box.
    pub fn center(&self) -> [f64; 3] {
        match self {
            BoundingVolume::AxisAligned(b) => b.center,
            BoundingVolume::Oriented(b) => b.center,
        }
    }

    /// Full side lengths of the box.
    pub fn extents(&self) -> [f64; 3] {
        match self {
            BoundingVolume::AxisAligned(b) => b.extents,
            BoundingVolume::Oriented(b) => b.extents,
        }
    }

    /// Local axes of the box, the identity for axis-aligned boxes.
    pub fn axes(&self) -> [[f64; 3]; 3] {
        match self {
            BoundingVolume::AxisAligned(_) => IDENTITY33,
            BoundingVolume::Oriented(b) => b.axes,
        }
    }

    /// The eight corners of the box.
    ///
    /// Corners `0..4` lie on the low side of the third axis and `4..8` on the high side,
    /// each group ordered counter-clockwise.
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let center = self.center();
        let half = linalg::scale3(&self.extents(), 0.5);
        let axes = self.axes();
        const SIGNS: [[f64; 3]; 8] = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        SIGNS.map(|s| {
            (0..3).fold(center, |acc, k| {
                linalg::add3(&acc, &linalg::scale3(&axes[k], s[k] * half[k]))
            })
        })
    }

    /// Return a copy with the center and extents multiplied by `factor`.
    ///
    /// The orientation is left unchanged.
    pub fn scaled(&self, factor: f64) -> Self {
        match *self {
            BoundingVolume::AxisAligned(b) => BoundingVolume::AxisAligned(Aabb::from_min_max(
                linalg::scale3(&b.min, factor),
                linalg::scale3(&b.max, factor),
            )),
            BoundingVolume::Oriented(b) => BoundingVolume::Oriented(Obb {
                center: linalg::scale3(&b.center, factor),
                extents: linalg::scale3(&b.extents, factor),
                axes: b.axes,
            }),
        }
    }

    /// Return a copy expressed in `units`, assuming the box is in meters.
    pub fn in_units(&self, units: Units) -> Self {
        self.scaled(units.factor())
    }

    /// Extents as `[x, y, z]` for engine scale placement.
    pub fn scale_array(&self) -> [f64; 3] {
        self.extents()
    }
}

/// A computed bounding volume with any warnings raised during the fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsResult {
    /// The bounding volume.
    pub volume: BoundingVolume,
    /// Non-fatal issues, such as the oriented fit falling back to an axis-aligned box.
    pub warnings: Vec<GeometryWarning>,
}

/// Compute the bounding volume of a point set.
///
/// An oriented request on degenerate input (fewer than three points, collinear points,
/// or a failed decomposition) returns the axis-aligned box with an
/// [`GeometryWarning::OrientedBoundsFallback`] warning.
///
/// # Errors
///
/// Returns [`GeometryError::InsufficientPoints`] if `points` is empty.
pub fn compute_bounds(
    points: &[[f64; 3]],
    kind: BoundsKind,
) -> Result<BoundsResult, GeometryError> {
    let aabb = Aabb::from_points(points)?;

    match kind {
        BoundsKind::AxisAligned => Ok(BoundsResult {
            volume: BoundingVolume::AxisAligned(aabb),
            warnings: Vec::new(),
        }),
        BoundsKind::Oriented => match oriented_bounds(points) {
            Ok(obb) => Ok(BoundsResult {
                volume: BoundingVolume::Oriented(obb),
                warnings: Vec::new(),
            }),
            Err(err) => {
                let warning = GeometryWarning::OrientedBoundsFallback {
                    reason: err.to_string(),
                };
                log::warn!("{warning}");
                Ok(BoundsResult {
                    volume: BoundingVolume::AxisAligned(aabb),
                    warnings: vec![warning],
                })
            }
        },
    }
}

/// Minimum-volume oriented bounding box over principal and coordinate frames.
///
/// # Errors
///
/// * [`GeometryError::InsufficientPoints`] with fewer than three points.
/// * [`GeometryError::DegenerateGeometry`] for collinear input or a failed decomposition.
pub fn oriented_bounds(points: &[[f64; 3]]) -> Result<Obb, GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::InsufficientPoints {
            required: 3,
            actual: points.len(),
        });
    }

    let centroid = linalg::centroid3(points).ok_or(GeometryError::InsufficientPoints {
        required: 3,
        actual: 0,
    })?;
    let svd = linalg::svd33(&linalg::scatter_matrix3(points, &centroid))?;

    let [s0, s1, _] = svd.singular_values;
    if s0 <= 0.0 || s1 <= COLLINEAR_RATIO * s0 {
        return Err(GeometryError::DegenerateGeometry(
            "points are coincident or collinear".to_string(),
        ));
    }

    let candidates = svd.v.iter().chain(IDENTITY33.iter());

    let mut best: Option<(Obb, f64)> = None;
    for normal in candidates {
        let Some(obb) = box_around_normal(points, normal) else {
            continue;
        };
        let area = surface_area(&obb.extents);
        let better = match &best {
            None => true,
            Some((current, current_area)) => {
                let (v, cv) = (obb.volume(), current.volume());
                let tol = 1e-12 * v.max(cv).max(f64::MIN_POSITIVE);
                v < cv - tol || ((v - cv).abs() <= tol && area < *current_area)
            }
        };
        if better {
            best = Some((obb, area));
        }
    }

    best.map(|(obb, _)| obb).ok_or_else(|| {
        GeometryError::DegenerateGeometry("no valid oriented box candidate".to_string())
    })
}

fn surface_area(e: &[f64; 3]) -> f64 {
    2.0 * (e[0] * e[1] + e[1] * e[2] + e[0] * e[2])
}

/// Tightest box with one axis fixed to `normal`, the other two from the minimum-area
/// rectangle of the projected points.
fn box_around_normal(points: &[[f64; 3]], normal: &[f64; 3]) -> Option<Obb> {
    let n = linalg::normalize3(normal)?;
    let (u, w) = plane_basis(&n)?;

    let projected: Vec<[f64; 2]> = points
        .iter()
        .map(|p| [linalg::dot_product3(p, &u), linalg::dot_product3(p, &w)])
        .collect();
    let hull = convex_hull(&projected);
    let (dir, [lo_a, hi_a], [lo_b, hi_b]) = min_area_rectangle(&hull)?;

    // in-plane axes back in 3d, a x b == n since u x w == n
    let a = linalg::add3(&linalg::scale3(&u, dir[0]), &linalg::scale3(&w, dir[1]));
    let b = linalg::add3(&linalg::scale3(&u, -dir[1]), &linalg::scale3(&w, dir[0]));

    let (lo_n, hi_n) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = linalg::dot_product3(p, &n);
        (lo.min(d), hi.max(d))
    });

    let mid = [(lo_a + hi_a) * 0.5, (lo_b + hi_b) * 0.5, (lo_n + hi_n) * 0.5];
    let axes = [a, b, n];
    let center = (0..3).fold([0.0; 3], |acc, k| {
        linalg::add3(&acc, &linalg::scale3(&axes[k], mid[k]))
    });

    Some(Obb {
        center,
        extents: [hi_a - lo_a, hi_b - lo_b, hi_n - lo_n],
        axes,
    })
}

/// Orthonormal `(u, w)` spanning the plane perpendicular to the unit vector `n`, with
/// `u x w == n`.
fn plane_basis(n: &[f64; 3]) -> Option<([f64; 3], [f64; 3])> {
    let least = (0..3).min_by(|&a, &b| n[a].abs().total_cmp(&n[b].abs()))?;
    let mut e = [0.0; 3];
    e[least] = 1.0;
    let u = linalg::normalize3(&linalg::cross_vec3(n, &e))?;
    let w = linalg::cross_vec3(n, &u);
    Some((u, w))
}

fn cross2(o: &[f64; 2], a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Convex hull of 2d points with the monotone chain algorithm, counter-clockwise.
fn convex_hull(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<[f64; 2]> = Vec::with_capacity(2 * sorted.len());
    for p in sorted.iter() {
        while hull.len() >= 2 && cross2(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross2(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

type Rectangle = ([f64; 2], [f64; 2], [f64; 2]);

/// Minimum-area enclosing rectangle of a convex polygon.
///
/// Returns the unit direction of the first rectangle side and the `[lo, hi]` ranges of
/// the polygon along that direction and its left perpendicular.
fn min_area_rectangle(hull: &[[f64; 2]]) -> Option<Rectangle> {
    let first = hull.first()?;

    let mut directions: Vec<[f64; 2]> = hull
        .iter()
        .zip(hull.iter().cycle().skip(1))
        .filter_map(|(p, q)| {
            let d = [q[0] - p[0], q[1] - p[1]];
            let len = (d[0] * d[0] + d[1] * d[1]).sqrt();
            (len > linalg::ZERO_NORM_EPS).then(|| [d[0] / len, d[1] / len])
        })
        .collect();
    if directions.is_empty() {
        directions.push([1.0, 0.0]);
    }

    let mut best: Option<(f64, Rectangle)> = None;
    for dir in directions {
        let perp = [-dir[1], dir[0]];
        let init = dir[0] * first[0] + dir[1] * first[1];
        let init_p = perp[0] * first[0] + perp[1] * first[1];
        let (mut ra, mut rb) = ([init, init], [init_p, init_p]);
        for p in hull {
            let a = dir[0] * p[0] + dir[1] * p[1];
            let b = perp[0] * p[0] + perp[1] * p[1];
            ra = [ra[0].min(a), ra[1].max(a)];
            rb = [rb[0].min(b), rb[1].max(b)];
        }
        let area = (ra[1] - ra[0]) * (rb[1] - rb[0]);
        if best.as_ref().map_or(true, |(a, _)| area < *a) {
            best = Some((area, (dir, ra, rb)));
        }
    }
    best.map(|(_, rect)| rect)
}
