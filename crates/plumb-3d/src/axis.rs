use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// All three axes in coordinate order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Coordinate index of the axis.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along the axis.
    pub fn unit(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            other => Err(GeometryError::UnsupportedConfiguration(format!(
                "unknown axis '{other}'"
            ))),
        }
    }
}

/// The signed coordinate axis treated as vertical.
///
/// A negative up-axis means the scene's "up" points along the negative coordinate,
/// so the ground sits at the maximum of that coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpAxis {
    /// `+X` is up.
    #[serde(rename = "X")]
    X,
    /// `+Y` is up.
    #[serde(rename = "Y")]
    Y,
    /// `+Z` is up.
    #[default]
    #[serde(rename = "Z")]
    Z,
    /// `-X` is up.
    #[serde(rename = "-X")]
    NegX,
    /// `-Y` is up.
    #[serde(rename = "-Y")]
    NegY,
    /// `-Z` is up.
    #[serde(rename = "-Z")]
    NegZ,
}

impl UpAxis {
    /// The unsigned coordinate axis.
    pub fn axis(self) -> Axis {
        match self {
            UpAxis::X | UpAxis::NegX => Axis::X,
            UpAxis::Y | UpAxis::NegY => Axis::Y,
            UpAxis::Z | UpAxis::NegZ => Axis::Z,
        }
    }

    /// Coordinate index of the height axis.
    #[inline]
    pub fn index(self) -> usize {
        self.axis().index()
    }

    /// `1.0` for positive axes, `-1.0` for negative ones.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            UpAxis::X | UpAxis::Y | UpAxis::Z => 1.0,
            UpAxis::NegX | UpAxis::NegY | UpAxis::NegZ => -1.0,
        }
    }

    /// Unit direction of "up".
    pub fn direction(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.index()] = self.sign();
        v
    }

    /// Signed height of a point, larger means further up.
    #[inline]
    pub fn height(self, point: &[f64; 3]) -> f64 {
        self.sign() * point[self.index()]
    }
}

impl From<Axis> for UpAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => UpAxis::X,
            Axis::Y => UpAxis::Y,
            Axis::Z => UpAxis::Z,
        }
    }
}

impl std::fmt::Display for UpAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sign() < 0.0 {
            write!(f, "-{}", self.axis())
        } else {
            write!(f, "{}", self.axis())
        }
    }
}

impl FromStr for UpAxis {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let axis = name.parse::<Axis>().map_err(|_| {
            GeometryError::UnsupportedConfiguration(format!("unknown up-axis '{s}'"))
        })?;
        Ok(match (axis, negative) {
            (Axis::X, false) => UpAxis::X,
            (Axis::Y, false) => UpAxis::Y,
            (Axis::Z, false) => UpAxis::Z,
            (Axis::X, true) => UpAxis::NegX,
            (Axis::Y, true) => UpAxis::NegY,
            (Axis::Z, true) => UpAxis::NegZ,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_up_axis() -> Result<(), GeometryError> {
        assert_eq!("Z".parse::<UpAxis>()?, UpAxis::Z);
        assert_eq!("-y".parse::<UpAxis>()?, UpAxis::NegY);
        assert_eq!("+X".parse::<UpAxis>()?, UpAxis::X);
        assert!(matches!(
            "W".parse::<UpAxis>(),
            Err(GeometryError::UnsupportedConfiguration(_))
        ));
        assert_eq!(UpAxis::NegY.to_string(), "-Y");
        Ok(())
    }

    #[test]
    fn test_up_axis_height() {
        let p = [1.0, 2.0, 3.0];
        assert_eq!(UpAxis::Z.height(&p), 3.0);
        assert_eq!(UpAxis::NegY.height(&p), -2.0);
        assert_eq!(UpAxis::NegY.direction(), [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_up_axis_serde_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&UpAxis::NegY)?, "\"-Y\"");
        let axis: UpAxis = serde_json::from_str("\"Z\"")?;
        assert_eq!(axis, UpAxis::Z);
        Ok(())
    }
}
