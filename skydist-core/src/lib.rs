//! Geodesic distance fields over pixelized sky grids.
//!
//! Computes, for every pixel of a declination × right-ascension grid, the
//! great-circle distance to the nearest member of a point set and the index
//! of that member (its "domain"). Provides an exact brute-force field
//! (Rayon-parallelized over rows for separable grids), a near-linear
//! wavefront ("tree-rings") approximation, boundary extraction over masks
//! and label maps, and a mask distance transform built on top of them.
//!
//! Coordinates are always ordered declination first, right ascension second,
//! in radians.

mod backend;
mod brute;
mod edges;
mod grid;
mod observe;
mod points;
mod sphere;
mod transform;
mod treerings;

pub use backend::{BruteForceBackend, DistanceResult, FieldBackend, TreeRingsBackend};
pub use brute::{distance_from_points, distance_from_points_separable};
pub use edges::{find_edges, find_edges_labeled};
pub use grid::{EdgeBehavior, Grid, PositionMap, SeparableGrid};
pub use observe::{FieldObserver, TracingObserver};
pub use points::{anchor_points, random_points, AnchoredPoint, SkyPoint};
pub use sphere::{angular_distance, TrigPoint};
pub use transform::{distance_transform, distance_transform_separable};
pub use treerings::{distance_from_points_treerings_separable, WavefrontOptions};

/// RGB color tuple
pub type Rgb = [u8; 3];

/// Distance value of a pixel no reference point has reached.
pub const UNVISITED: f64 = f64::INFINITY;

/// Domain label of a pixel no reference point has reached.
pub const UNASSIGNED: i32 = -1;

/// Error type for distance field operations
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    #[error("{what} has length {actual}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Stacked coordinate buffer has odd length {0}")]
    OddStackedLength(usize),

    #[error("Point {index} anchored at ({y}, {x}) lies outside the {ny}x{nx} grid")]
    AnchorOutOfGrid {
        index: usize,
        y: usize,
        x: usize,
        ny: usize,
        nx: usize,
    },

    #[error("No points provided")]
    NoPoints,

    #[cfg(feature = "parallel")]
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, DistanceError>;

/// Fail with [`DistanceError::LengthMismatch`] unless `actual == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DistanceError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}
