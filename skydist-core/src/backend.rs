//! Field computation backends and their owned result type.

use std::sync::Arc;

use crate::{
    distance_from_points_separable, distance_from_points_treerings_separable, AnchoredPoint,
    DistanceError, EdgeBehavior, FieldObserver, Result, SeparableGrid, SkyPoint,
    WavefrontOptions, UNASSIGNED,
};

/// Result of a nearest-point field computation
#[derive(Debug, Clone)]
pub struct DistanceResult {
    /// Angular distance to the nearest point for each pixel (row-major)
    pub dists: Vec<f64>,
    /// Index of the nearest point for each pixel (row-major)
    pub domains: Vec<i32>,
    pub ny: usize,
    pub nx: usize,
}

impl DistanceResult {
    /// Pixel count per domain. Unassigned pixels are not counted.
    pub fn domain_areas(&self, npoints: usize) -> Vec<u32> {
        let mut areas = vec![0u32; npoints];
        for &d in &self.domains {
            if d >= 0 && (d as usize) < npoints {
                areas[d as usize] += 1;
            }
        }
        areas
    }

    /// Largest finite distance, or 0 if there is none.
    pub fn max_finite_distance(&self) -> f64 {
        self.dists
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }

    /// Render distances as grayscale, scaled so the largest finite distance
    /// is white. Unreached pixels are white too.
    pub fn render_distance(&self) -> image::GrayImage {
        let max = self.max_finite_distance();
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
        image::GrayImage::from_fn(self.nx as u32, self.ny as u32, |x, y| {
            let d = self.dists[y as usize * self.nx + x as usize];
            let v = if d.is_finite() { (d * scale).round().min(255.0) } else { 255.0 };
            image::Luma([v as u8])
        })
    }

    /// Render domains with one stable color per point; unassigned pixels are black.
    pub fn render_domains(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.nx as u32, self.ny as u32, |x, y| {
            let d = self.domains[y as usize * self.nx + x as usize];
            image::Rgb(domain_color(d))
        })
    }
}

/// Pseudo-random but fixed color for a domain index.
fn domain_color(domain: i32) -> crate::Rgb {
    if domain == UNASSIGNED {
        return [0, 0, 0];
    }
    // splitmix64 finalizer
    let mut z = (domain as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    let [r, g, b, ..] = z.to_le_bytes();
    // Keep colors away from black so they never read as unassigned.
    [r | 0x40, g | 0x40, b | 0x40]
}

/// Trait for nearest-point field backends
pub trait FieldBackend {
    /// Compute distances and domains for `points` over a separable grid.
    fn compute(&mut self, grid: &SeparableGrid, points: &[AnchoredPoint])
        -> Result<DistanceResult>;

    /// Short human-readable name, for logs and reports.
    fn name(&self) -> &'static str;
}

fn empty_result(grid: &SeparableGrid) -> DistanceResult {
    let shape = grid.shape();
    DistanceResult {
        dists: vec![0.0; shape.npix()],
        domains: vec![0; shape.npix()],
        ny: shape.ny,
        nx: shape.nx,
    }
}

/// Exact backend: scans every point for every pixel, rows in parallel
#[derive(Clone, Default)]
pub struct BruteForceBackend {
    /// Number of threads to use (0 = Rayon default)
    pub num_threads: usize,
    pub observer: Option<Arc<dyn FieldObserver + Send>>,
}

impl BruteForceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FieldObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn fill(&self, grid: &SeparableGrid, points: &[SkyPoint], out: &mut DistanceResult) -> Result<()> {
        let observer = self.observer.as_deref().map(|o| o as &dyn FieldObserver);
        distance_from_points_separable(grid, points, &mut out.dists, Some(&mut out.domains), observer)
    }

    /// Run on a dedicated pool when a thread count is set.
    #[cfg(feature = "parallel")]
    fn run(&self, grid: &SeparableGrid, points: &[SkyPoint], out: &mut DistanceResult) -> Result<()> {
        if self.num_threads == 0 {
            return self.fill(grid, points, out);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()?;
        pool.install(|| self.fill(grid, points, out))
    }

    #[cfg(not(feature = "parallel"))]
    fn run(&self, grid: &SeparableGrid, points: &[SkyPoint], out: &mut DistanceResult) -> Result<()> {
        self.fill(grid, points, out)
    }
}

impl FieldBackend for BruteForceBackend {
    fn compute(
        &mut self,
        grid: &SeparableGrid,
        points: &[AnchoredPoint],
    ) -> Result<DistanceResult> {
        if points.is_empty() {
            return Err(DistanceError::NoPoints);
        }
        let sky: Vec<SkyPoint> = points.iter().map(|p| p.pos).collect();
        let mut out = empty_result(grid);

        self.run(grid, &sky, &mut out)?;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "brute-force"
    }
}

/// Wavefront backend: near-linear, grows domains from anchor pixels
#[derive(Clone, Default)]
pub struct TreeRingsBackend {
    pub options: WavefrontOptions,
    pub observer: Option<Arc<dyn FieldObserver + Send>>,
    /// Relaxation passes used by the most recent computation
    pub last_passes: usize,
}

impl TreeRingsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edges(edge_y: EdgeBehavior, edge_x: EdgeBehavior) -> Self {
        Self {
            options: WavefrontOptions { edge_y, edge_x },
            ..Self::default()
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FieldObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl FieldBackend for TreeRingsBackend {
    fn compute(
        &mut self,
        grid: &SeparableGrid,
        points: &[AnchoredPoint],
    ) -> Result<DistanceResult> {
        if points.is_empty() {
            return Err(DistanceError::NoPoints);
        }
        let mut out = empty_result(grid);
        let observer = self.observer.as_deref().map(|o| o as &dyn FieldObserver);
        self.last_passes = distance_from_points_treerings_separable(
            grid,
            points,
            &mut out.dists,
            &mut out.domains,
            &self.options,
            observer,
        )?;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "tree-rings"
    }
}
