//! Surface normal and curvature estimation
//!
//! Two interchangeable strategies estimate a [`Descriptor`] from a point and
//! the coordinates of its neighbors:
//!
//! - [`CovarianceEigenEstimator`]: principal component analysis of the
//!   neighborhood. The normal is the least-variance direction and the
//!   curvature is the surface variation `λ1 / (λ1 + λ2 + λ3)`, in `[0, 1/3]`.
//! - [`QuadraticFitEstimator`]: least-squares height field
//!   `z = a·x² + b·y² + c·xy + d·x + e·y + f`. The normal and the signed
//!   Gaussian curvature are derived analytically at the query point.
//!
//! Degenerate neighborhoods (coplanar, collinear, coincident) are not errors.
//! Both strategies fall back on decompositions that stay defined and return a
//! best-effort descriptor.

use crate::nearest_neighbor::NeighborGraph;
use nalgebra::{DMatrix, DVector, Matrix3, SymmetricEigen};
use pointfeat_core::{
    Descriptor, Error, Point3d, Result, SurfaceEstimator, SurfaceStrategy, Tile, Vector3d,
};
use rayon::prelude::*;

fn require_neighbors(neighbors: &[Point3d]) -> Result<()> {
    if neighbors.is_empty() {
        return Err(Error::InvalidData(
            "surface estimation needs at least one neighbor".to_string(),
        ));
    }
    Ok(())
}

/// Covariance-eigen surface estimator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CovarianceEigenEstimator;

impl CovarianceEigenEstimator {
    /// Covariance of the neighbor coordinates about their centroid, divided by k
    pub fn covariance(neighbors: &[Point3d]) -> Matrix3<f64> {
        let k = neighbors.len() as f64;
        let centroid = neighbors
            .iter()
            .fold(Vector3d::zeros(), |acc, p| acc + p.coords)
            / k;

        let mut covariance = Matrix3::zeros();
        for p in neighbors {
            let centered = p.coords - centroid;
            covariance += centered * centered.transpose();
        }
        covariance / k
    }
}

impl SurfaceEstimator for CovarianceEigenEstimator {
    fn estimate(&self, _query: &Point3d, neighbors: &[Point3d]) -> Result<Descriptor> {
        require_neighbors(neighbors)?;

        let eigen = SymmetricEigen::new(Self::covariance(neighbors));

        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        // Round-off can push the smallest eigenvalue of a PSD matrix below zero.
        let lambda = order.map(|i| eigen.eigenvalues[i].max(0.0));

        let normal = eigen.eigenvectors.column(order[0]).normalize();
        let total: f64 = lambda.iter().sum();
        let curvature = if total > 0.0 { lambda[0] / total } else { 0.0 };

        Ok(Descriptor::new(normal, curvature))
    }
}

/// Coefficients of `z = a·x² + b·y² + c·xy + d·x + e·y + f` in a frame
/// centered on the query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticSurface {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl QuadraticSurface {
    /// `(∂z/∂x, ∂z/∂y)` at `(x, y)`
    pub fn gradient(&self, x: f64, y: f64) -> (f64, f64) {
        (
            2.0 * self.a * x + self.c * y + self.d,
            2.0 * self.b * y + self.c * x + self.e,
        )
    }

    /// Unit normal `(−∂z/∂x, −∂z/∂y, 1)` at `(x, y)`
    pub fn normal(&self, x: f64, y: f64) -> Vector3d {
        let (dz_dx, dz_dy) = self.gradient(x, y);
        Vector3d::new(-dz_dx, -dz_dy, 1.0).normalize()
    }

    /// Gaussian curvature `(z_xx·z_yy − z_xy²) / (1 + z_x² + z_y²)^1.5` at `(x, y)`
    pub fn gaussian_curvature(&self, x: f64, y: f64) -> f64 {
        let (dz_dx, dz_dy) = self.gradient(x, y);
        let d2z_dx2 = 2.0 * self.a;
        let d2z_dy2 = 2.0 * self.b;
        let d2z_dxdy = self.c;
        (d2z_dx2 * d2z_dy2 - d2z_dxdy * d2z_dxdy)
            / (1.0 + dz_dx * dz_dx + dz_dy * dz_dy).powf(1.5)
    }
}

/// Quadratic-fit surface estimator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadraticFitEstimator {
    /// Relative cutoff for small singular values. `None` uses
    /// `max(k, 6) · f64::EPSILON`.
    pub rcond: Option<f64>,
}

impl QuadraticFitEstimator {
    pub fn with_rcond(rcond: f64) -> Self {
        Self { rcond: Some(rcond) }
    }

    /// Fit the height field to the neighbors of `query` by minimum-norm least squares.
    ///
    /// The frame is translated so `query` sits at the origin; the fitted surface
    /// is the same one a fit in tile coordinates would produce, with better
    /// conditioning.
    pub fn fit(&self, query: &Point3d, neighbors: &[Point3d]) -> Result<QuadraticSurface> {
        require_neighbors(neighbors)?;

        let k = neighbors.len();
        let design = DMatrix::from_fn(k, 6, |row, col| {
            let dx = neighbors[row].x - query.x;
            let dy = neighbors[row].y - query.y;
            match col {
                0 => dx * dx,
                1 => dy * dy,
                2 => dx * dy,
                3 => dx,
                4 => dy,
                _ => 1.0,
            }
        });
        let heights = DVector::from_iterator(k, neighbors.iter().map(|p| p.z - query.z));

        let svd = design.svd(true, true);
        let rcond = self
            .rcond
            .unwrap_or(f64::EPSILON * k.max(6) as f64);
        let eps = rcond * svd.singular_values.max();
        let coeffs = svd
            .solve(&heights, eps)
            .map_err(|e| Error::Algorithm(format!("quadratic fit failed: {}", e)))?;

        Ok(QuadraticSurface {
            a: coeffs[0],
            b: coeffs[1],
            c: coeffs[2],
            d: coeffs[3],
            e: coeffs[4],
            f: coeffs[5],
        })
    }
}

impl SurfaceEstimator for QuadraticFitEstimator {
    fn estimate(&self, query: &Point3d, neighbors: &[Point3d]) -> Result<Descriptor> {
        let surface = self.fit(query, neighbors)?;
        Ok(Descriptor::new(
            surface.normal(0.0, 0.0),
            surface.gaussian_curvature(0.0, 0.0),
        ))
    }
}

/// A surface estimator selected by configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimator {
    CovarianceEigen(CovarianceEigenEstimator),
    QuadraticFit(QuadraticFitEstimator),
}

impl Estimator {
    pub fn strategy(&self) -> SurfaceStrategy {
        match self {
            Estimator::CovarianceEigen(_) => SurfaceStrategy::CovarianceEigen,
            Estimator::QuadraticFit(_) => SurfaceStrategy::QuadraticFit,
        }
    }
}

impl From<SurfaceStrategy> for Estimator {
    fn from(strategy: SurfaceStrategy) -> Self {
        match strategy {
            SurfaceStrategy::CovarianceEigen => Estimator::CovarianceEigen(CovarianceEigenEstimator),
            SurfaceStrategy::QuadraticFit => {
                Estimator::QuadraticFit(QuadraticFitEstimator::default())
            }
        }
    }
}

impl SurfaceEstimator for Estimator {
    fn estimate(&self, query: &Point3d, neighbors: &[Point3d]) -> Result<Descriptor> {
        match self {
            Estimator::CovarianceEigen(estimator) => estimator.estimate(query, neighbors),
            Estimator::QuadraticFit(estimator) => estimator.estimate(query, neighbors),
        }
    }
}

/// Estimate a descriptor for every point of a tile
///
/// # Arguments
/// * `tile` - Input tile
/// * `graph` - Neighbor graph built from `tile`
/// * `estimator` - Surface estimation strategy
///
/// # Returns
/// * `Result<Vec<Descriptor>>` - One descriptor per point, in tile order
pub fn estimate_descriptors<E>(
    tile: &Tile,
    graph: &NeighborGraph,
    estimator: &E,
) -> Result<Vec<Descriptor>>
where
    E: SurfaceEstimator + Sync,
{
    if graph.len() != tile.len() {
        return Err(Error::InvalidData(format!(
            "neighbor graph covers {} points but tile has {}",
            graph.len(),
            tile.len()
        )));
    }

    (0..tile.len())
        .into_par_iter()
        .map(|i| estimator.estimate(&tile[i].position, &graph.neighbor_positions(tile, i)))
        .collect()
}
