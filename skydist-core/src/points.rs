//! Reference point types.

use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{DistanceError, Result, SeparableGrid};

/// Sky position in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPoint {
    pub dec: f64,
    pub ra: f64,
}

impl SkyPoint {
    pub fn new(dec: f64, ra: f64) -> Self {
        Self { dec, ra }
    }

    /// Unpack a stacked buffer: all declinations, then all right ascensions.
    pub fn from_stacked(stacked: &[f64]) -> Result<Vec<SkyPoint>> {
        if stacked.len() % 2 != 0 {
            return Err(DistanceError::OddStackedLength(stacked.len()));
        }
        let (dec, ra) = stacked.split_at(stacked.len() / 2);
        Ok(dec
            .iter()
            .zip(ra)
            .map(|(&dec, &ra)| SkyPoint::new(dec, ra))
            .collect())
    }
}

/// A point pinned to the pixel the wavefront starts growing it from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredPoint {
    pub pos: SkyPoint,
    pub y: usize,
    pub x: usize,
}

impl AnchoredPoint {
    pub fn new(pos: SkyPoint, y: usize, x: usize) -> Self {
        Self { pos, y, x }
    }
}

/// Right-ascension difference folded into `[0, π]`.
fn ra_separation(a: f64, b: f64) -> f64 {
    ((a - b + PI).rem_euclid(TAU) - PI).abs()
}

fn nearest_index(axis: &[f64], mut dist: impl FnMut(f64) -> f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &v) in axis.iter().enumerate() {
        let d = dist(v);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Anchor each point to the row with the closest declination and the column
/// with the closest right ascension (modulo 2π).
///
/// The grid must be non-empty.
pub fn anchor_points(grid: &SeparableGrid, points: &[SkyPoint]) -> Vec<AnchoredPoint> {
    points
        .iter()
        .map(|&p| {
            let y = nearest_index(grid.ypos, |dec| (dec - p.dec).abs());
            let x = nearest_index(grid.xpos, |ra| ra_separation(ra, p.ra));
            AnchoredPoint::new(p, y, x)
        })
        .collect()
}

/// `count` points on randomly chosen pixel centres, reproducible from `seed`.
///
/// The grid must be non-empty.
pub fn random_points(grid: &SeparableGrid, count: usize, seed: u64) -> Vec<AnchoredPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let shape = grid.shape();
    (0..count)
        .map(|_| {
            let y = rng.gen_range(0..shape.ny);
            let x = rng.gen_range(0..shape.nx);
            AnchoredPoint::new(SkyPoint::new(grid.ypos[y], grid.xpos[x]), y, x)
        })
        .collect()
}
