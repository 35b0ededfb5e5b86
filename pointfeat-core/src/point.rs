//! Point types and related functionality

use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Number of attributes carried by every tile row: `x,y,z,r,g,b,class`
pub const POINT_ATTRIBUTES: usize = 7;

/// One point of a tile with its color and class label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePoint {
    pub position: Point3d,
    /// `r,g,b`, widened to f64 whether the source stored integers or floats
    pub color: [f64; 3],
    pub class: i64,
}

impl TilePoint {
    pub fn new(position: Point3d, color: [f64; 3], class: i64) -> Self {
        Self { position, color, class }
    }

    /// Build a point from a `x,y,z,r,g,b,class` row.
    ///
    /// Fails with `InvalidData` when the row does not have exactly
    /// [`POINT_ATTRIBUTES`] values, when a value is not finite, or when the
    /// class is not an integer.
    pub fn from_row(row: &[f64]) -> Result<Self> {
        let [x, y, z, r, g, b, class] = *row else {
            return Err(Error::InvalidData(format!(
                "row has {} attributes, expected {}",
                row.len(),
                POINT_ATTRIBUTES
            )));
        };
        if let Some(value) = row.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidData(format!(
                "non-finite attribute value {}",
                value
            )));
        }
        if class.fract() != 0.0 || class < i64::MIN as f64 || class >= i64::MAX as f64 {
            return Err(Error::InvalidData(format!(
                "class {} is not an integer label",
                class
            )));
        }

        Ok(Self {
            position: Point3d::new(x, y, z),
            color: [r, g, b],
            class: class as i64,
        })
    }

    /// The point as a `x,y,z,r,g,b` row, class excluded
    pub fn raw_attributes(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.color[0],
            self.color[1],
            self.color[2],
        ]
    }
}

impl Default for TilePoint {
    fn default() -> Self {
        Self {
            position: Point3d::origin(),
            color: [0.0; 3],
            class: 0,
        }
    }
}

impl From<TilePoint> for Point3d {
    fn from(point: TilePoint) -> Self {
        point.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row() {
        let point = TilePoint::from_row(&[1.0, 2.0, 3.0, 10.0, 20.0, 30.0, 6.0]).unwrap();
        assert_eq!(point.position, Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(point.color, [10.0, 20.0, 30.0]);
        assert_eq!(point.class, 6);
        assert_eq!(point.raw_attributes(), [1.0, 2.0, 3.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_from_row_wrong_width() {
        assert!(TilePoint::from_row(&[1.0, 2.0, 3.0]).is_err());
        assert!(TilePoint::from_row(&[0.0; 8]).is_err());
    }

    #[test]
    fn test_from_row_rejects_bad_class() {
        for class in [2.7, -0.5, f64::NAN, f64::INFINITY, 1e300] {
            let row = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0, class];
            assert!(
                matches!(TilePoint::from_row(&row), Err(Error::InvalidData(_))),
                "class {} accepted",
                class
            );
        }
        assert_eq!(
            TilePoint::from_row(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, -4.0]).unwrap().class,
            -4
        );
    }

    #[test]
    fn test_from_row_rejects_non_finite_attributes() {
        assert!(TilePoint::from_row(&[0.0, 0.0, f64::NAN, 1.0, 2.0, 3.0, 1.0]).is_err());
        assert!(TilePoint::from_row(&[f64::NEG_INFINITY, 0.0, 0.0, 1.0, 2.0, 3.0, 1.0]).is_err());
    }
}
