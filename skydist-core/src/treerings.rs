//! Wavefront ("tree-rings") nearest-point fields.
//!
//! Grows every point's domain outward from its anchor pixel in passes. Each
//! pass offers the neighbors of the pixels improved by the previous pass the
//! distance to their current domain point; pixels that get strictly closer
//! form the next frontier. The process stops once a pass improves nothing.
//!
//! There is no priority queue, so pixels may improve more than once. A domain
//! narrower than a pixel can be cut off from its anchor, which leaves the
//! pixels beyond it with a slightly too large distance; everywhere else the
//! result equals the exhaustive scan.

use crate::observe::Stopwatch;
use crate::sphere::{angular_distance, TrigPoint};
use crate::{
    check_len, AnchoredPoint, DistanceError, EdgeBehavior, FieldObserver, Result,
    SeparableGrid, UNASSIGNED, UNVISITED,
};

/// Initial capacity of each frontier buffer.
const FRONTIER_CAPACITY: usize = 1024;

/// Neighbor steps as `(dy, dx)`: left, right, up, down.
const NEIGHBORS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Per-axis edge handling for the wavefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavefrontOptions {
    /// Declination axis (rows).
    pub edge_y: EdgeBehavior,
    /// Right-ascension axis (columns).
    pub edge_x: EdgeBehavior,
}

impl Default for WavefrontOptions {
    fn default() -> Self {
        Self {
            edge_y: EdgeBehavior::Absorb,
            edge_x: EdgeBehavior::Wrap,
        }
    }
}

struct Wavefront<'a> {
    xpos: &'a [f64],
    ny: usize,
    nx: usize,
    options: WavefrontOptions,
    points: Vec<TrigPoint>,
    /// Declination trig per grid row (right ascension unset).
    rows: Vec<TrigPoint>,
    dists: &'a mut [f64],
    domains: &'a mut [i32],
    current: Vec<(usize, usize)>,
    next: Vec<(usize, usize)>,
}

impl<'a> Wavefront<'a> {
    #[inline]
    fn candidate(&self, ipoint: usize, y: usize, x: usize) -> f64 {
        angular_distance(&self.points[ipoint], &self.rows[y].with_ra(self.xpos[x]))
    }

    /// Claim `(y, x)` for `ipoint` if `dist` beats what it has, queueing it
    /// for the next pass.
    #[inline]
    fn offer(&mut self, y: usize, x: usize, dist: f64, ipoint: usize) {
        let i = y * self.nx + x;
        if dist < self.dists[i] {
            self.dists[i] = dist;
            self.domains[i] = ipoint as i32;
            self.next.push((y, x));
        }
    }

    fn swap_frontiers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.next.clear();
    }

    fn seed(&mut self, anchors: &[AnchoredPoint]) {
        for (ipoint, p) in anchors.iter().enumerate() {
            let dist = self.candidate(ipoint, p.y, p.x);
            self.offer(p.y, p.x, dist, ipoint);
        }
        self.swap_frontiers();
    }

    fn neighbor(&self, y: usize, x: usize, (dy, dx): (isize, isize)) -> Option<(usize, usize)> {
        let y2 = self.options.edge_y.resolve(y as isize + dy, self.ny)?;
        let x2 = self.options.edge_x.resolve(x as isize + dx, self.nx)?;
        Some((y2, x2))
    }

    /// Relax the neighbors of every pixel in the current frontier.
    fn relax_pass(&mut self) {
        let current = std::mem::take(&mut self.current);
        for &(y, x) in &current {
            let ipoint = self.domains[y * self.nx + x] as usize;
            for step in NEIGHBORS {
                if let Some((y2, x2)) = self.neighbor(y, x, step) {
                    let dist = self.candidate(ipoint, y2, x2);
                    self.offer(y2, x2, dist, ipoint);
                }
            }
        }
        self.current = current;
        self.swap_frontiers();
    }
}

/// Approximate nearest-point field over a separable grid, grown from each
/// point's anchor pixel.
///
/// Both output fields are reset to [`UNVISITED`] / [`UNASSIGNED`] first.
/// Returns the number of relaxation passes run.
pub fn distance_from_points_treerings_separable(
    grid: &SeparableGrid,
    points: &[AnchoredPoint],
    dists: &mut [f64],
    domains: &mut [i32],
    options: &WavefrontOptions,
    observer: Option<&dyn FieldObserver>,
) -> Result<usize> {
    let shape = grid.shape();
    check_len("distance field", shape.npix(), dists.len())?;
    check_len("domain field", shape.npix(), domains.len())?;
    if let Some((index, p)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| p.y >= shape.ny || p.x >= shape.nx)
    {
        return Err(DistanceError::AnchorOutOfGrid {
            index,
            y: p.y,
            x: p.x,
            ny: shape.ny,
            nx: shape.nx,
        });
    }

    dists.fill(UNVISITED);
    domains.fill(UNASSIGNED);

    let mut sw = Stopwatch::new(observer);
    let mut wave = Wavefront {
        xpos: grid.xpos,
        ny: shape.ny,
        nx: shape.nx,
        options: *options,
        points: points.iter().map(|p| TrigPoint::from(p.pos)).collect(),
        rows: grid.ypos.iter().map(|&dec| TrigPoint::new(dec, 0.0)).collect(),
        dists,
        domains,
        current: Vec::with_capacity(FRONTIER_CAPACITY),
        next: Vec::with_capacity(FRONTIER_CAPACITY),
    };
    sw.lap("trig");

    wave.seed(points);
    let mut passes = 0;
    while !wave.current.is_empty() {
        if let Some(obs) = observer {
            obs.wavefront_pass(passes, wave.current.len());
        }
        wave.relax_pass();
        passes += 1;
    }
    sw.lap("passes");
    Ok(passes)
}
