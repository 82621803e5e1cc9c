//! Pixel grid shapes and position maps.

use crate::{check_len, DistanceError, Result};

/// Shape of an `ny × nx` pixel lattice (row-major, `i = y*nx + x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub ny: usize,
    pub nx: usize,
}

impl Grid {
    pub fn new(ny: usize, nx: usize) -> Self {
        Self { ny, nx }
    }

    pub fn npix(&self) -> usize {
        self.ny * self.nx
    }

    #[inline]
    pub fn index(&self, y: usize, x: usize) -> usize {
        y * self.nx + x
    }

    /// Inverse of [`Grid::index`]: `(y, x)` of a flat pixel index.
    #[inline]
    pub fn coords(&self, i: usize) -> (usize, usize) {
        (i / self.nx, i % self.nx)
    }
}

/// How a neighbor step past the edge of one grid axis is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeBehavior {
    /// Steps off the grid go nowhere.
    #[default]
    Absorb,
    /// Steps off one edge re-enter from the opposite edge.
    Wrap,
}

impl EdgeBehavior {
    /// Resolve `val` on an axis of length `len`. `None` for absorbed steps.
    #[inline]
    pub(crate) fn resolve(self, val: isize, len: usize) -> Option<usize> {
        let len = len as isize;
        if (0..len).contains(&val) {
            return Some(val as usize);
        }
        match self {
            EdgeBehavior::Absorb => None,
            EdgeBehavior::Wrap => Some(val.rem_euclid(len) as usize),
        }
    }
}

/// Dense per-pixel position map: one declination and one right-ascension
/// value per pixel.
#[derive(Debug, Clone, Copy)]
pub struct PositionMap<'a> {
    pub dec: &'a [f64],
    pub ra: &'a [f64],
}

impl<'a> PositionMap<'a> {
    pub fn new(dec: &'a [f64], ra: &'a [f64]) -> Result<Self> {
        check_len("right-ascension plane", dec.len(), ra.len())?;
        Ok(Self { dec, ra })
    }

    /// Split a stacked buffer holding the declination plane followed by the
    /// right-ascension plane.
    pub fn from_stacked(stacked: &'a [f64]) -> Result<Self> {
        if stacked.len() % 2 != 0 {
            return Err(DistanceError::OddStackedLength(stacked.len()));
        }
        let (dec, ra) = stacked.split_at(stacked.len() / 2);
        Ok(Self { dec, ra })
    }

    pub fn npix(&self) -> usize {
        self.dec.len()
    }
}

/// Axis-aligned grid: one declination per row, one right ascension per column.
#[derive(Debug, Clone, Copy)]
pub struct SeparableGrid<'a> {
    pub ypos: &'a [f64],
    pub xpos: &'a [f64],
}

impl<'a> SeparableGrid<'a> {
    pub fn new(ypos: &'a [f64], xpos: &'a [f64]) -> Self {
        Self { ypos, xpos }
    }

    pub fn shape(&self) -> Grid {
        Grid::new(self.ypos.len(), self.xpos.len())
    }

    /// Materialize the dense stacked position map (declination plane, then
    /// right-ascension plane).
    pub fn to_stacked(&self) -> Vec<f64> {
        let npix = self.shape().npix();
        let mut stacked = Vec::with_capacity(2 * npix);
        for &dec in self.ypos {
            stacked.extend(std::iter::repeat(dec).take(self.xpos.len()));
        }
        for _ in self.ypos {
            stacked.extend_from_slice(self.xpos);
        }
        stacked
    }
}
