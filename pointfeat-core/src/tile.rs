//! Tile data structure and functionality

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A fixed-size batch of points processed as one unit.
///
/// Points are identified by their row position and never change once the
/// tile is built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tile {
    points: Vec<TilePoint>,
}

impl Tile {
    /// Create a tile from a vector of points
    pub fn from_points(points: Vec<TilePoint>) -> Self {
        Self { points }
    }

    /// Create a tile from a `N×7` numeric table of `x,y,z,r,g,b,class` rows
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let points = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                TilePoint::from_row(row.as_ref()).map_err(|e| match e {
                    Error::InvalidData(message) => {
                        Error::InvalidData(format!("row {}: {}", i, message))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }

    /// Get the number of points in the tile
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the tile is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, TilePoint> {
        self.points.iter()
    }

    pub fn points(&self) -> &[TilePoint] {
        &self.points
    }

    /// Coordinates of every point, in tile order
    pub fn positions(&self) -> Vec<Point3d> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Value of one channel for the point at `index`
    pub fn channel_value(&self, index: usize, channel: Channel) -> f64 {
        channel.value(&self.points[index])
    }

    /// Ensure every point can be given `k` neighbors other than itself
    pub fn require_neighbors(&self, k: usize) -> Result<()> {
        let required = k + 1;
        if self.len() < required {
            return Err(Error::InsufficientPoints {
                points: self.len(),
                required,
            });
        }
        Ok(())
    }
}

impl Index<usize> for Tile {
    type Output = TilePoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IntoIterator for Tile {
    type Item = TilePoint;
    type IntoIter = std::vec::IntoIter<TilePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tile {
    type Item = &'a TilePoint;
    type IntoIter = std::slice::Iter<'a, TilePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<TilePoint> for Tile {
    fn from_iter<I: IntoIterator<Item = TilePoint>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}
