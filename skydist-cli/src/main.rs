//! Sky distance field CLI
//!
//! Computes geodesic distance fields and nearest-point domains over
//! declination × right-ascension pixel grids.
//!
//! ## YAML grid file
//!
//! ```yaml
//! ny: 180
//! nx: 360
//! dec0: -45.0    # declination of row 0 (degrees)
//! ra0: 0.0       # right ascension of column 0 (degrees)
//! ddec: 0.5      # row spacing (degrees)
//! dra: 0.5       # column spacing (degrees)
//! wrap_x: true
//! wrap_y: false
//! threads: 0
//! points:
//!   - { dec: 10.0, ra: 30.0 }
//!   - { dec: -20.0, ra: 120.0 }
//! ```
//!
//! Examples:
//!
//!   skydist transform --mask holes.png --grid grid.yaml -o dist.png
//!   skydist points --grid grid.yaml --random 200 --method tree-rings \
//!     -o dist.png --domains domains.png
//!   skydist edges --mask labels.png --labeled
//!   skydist bench --grid grid.yaml --random 500
//!
//! Mask images are read as 8-bit grayscale: black (0) marks the zero region.
//! Label maps use the gray value as the label. Raw outputs are little-endian
//! f64, row-major.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use skydist_core::{
    anchor_points, distance_transform_separable, find_edges, find_edges_labeled, random_points,
    AnchoredPoint, BruteForceBackend, DistanceResult, EdgeBehavior, FieldBackend, FieldObserver,
    Grid, SeparableGrid, SkyPoint, TracingObserver, TreeRingsBackend,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    /// Exact, row-parallel scan over all points
    Brute,
    /// Wavefront growth from anchor pixels
    TreeRings,
}

/// YAML grid file format (angles in degrees)
#[derive(Debug, Deserialize)]
struct GridConfig {
    #[serde(default)]
    ny: Option<usize>,
    #[serde(default)]
    nx: Option<usize>,
    #[serde(default)]
    dec0: f64,
    #[serde(default)]
    ra0: f64,
    #[serde(default = "default_step")]
    ddec: f64,
    #[serde(default = "default_step")]
    dra: f64,
    #[serde(default = "default_wrap_x")]
    wrap_x: bool,
    #[serde(default)]
    wrap_y: bool,
    #[serde(default)]
    threads: usize,
    #[serde(default)]
    points: Vec<PointConfig>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            ny: None,
            nx: None,
            dec0: 0.0,
            ra0: 0.0,
            ddec: default_step(),
            dra: default_step(),
            wrap_x: default_wrap_x(),
            wrap_y: false,
            threads: 0,
            points: Vec::new(),
        }
    }
}

/// One arcminute
fn default_step() -> f64 { 1.0 / 60.0 }
fn default_wrap_x() -> bool { true }

#[derive(Debug, Clone, Copy, Deserialize)]
struct PointConfig {
    dec: f64,
    ra: f64,
}

impl GridConfig {
    /// Row declinations and column right ascensions, in radians.
    fn axes(&self, ny: usize, nx: usize) -> (Vec<f64>, Vec<f64>) {
        let ypos = (0..ny)
            .map(|y| (self.dec0 + self.ddec * y as f64).to_radians())
            .collect();
        let xpos = (0..nx)
            .map(|x| (self.ra0 + self.dra * x as f64).to_radians())
            .collect();
        (ypos, xpos)
    }

    fn sky_points(&self) -> Vec<SkyPoint> {
        self.points
            .iter()
            .map(|p| SkyPoint::new(p.dec.to_radians(), p.ra.to_radians()))
            .collect()
    }

    fn edges(&self) -> (EdgeBehavior, EdgeBehavior) {
        let edge = |wrap| if wrap { EdgeBehavior::Wrap } else { EdgeBehavior::Absorb };
        (edge(self.wrap_y), edge(self.wrap_x))
    }
}

fn load_config(path: &Path) -> anyhow::Result<GridConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grid file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse grid file: {:?}", path))
}

/// Resolve the grid shape. CLI args take precedence over the grid file,
/// which takes precedence over the image the grid is laid over.
fn resolve_shape(
    config: &GridConfig,
    cli_ny: Option<usize>,
    cli_nx: Option<usize>,
    image: Option<(usize, usize)>,
) -> anyhow::Result<(usize, usize)> {
    let ny = cli_ny.or(config.ny).or(image.map(|(ny, _)| ny));
    let nx = cli_nx.or(config.nx).or(image.map(|(_, nx)| nx));
    match (ny, nx) {
        (Some(ny), Some(nx)) if ny > 0 && nx > 0 => Ok((ny, nx)),
        (Some(_), Some(_)) => anyhow::bail!("grid must have at least one row and column"),
        _ => anyhow::bail!("grid shape unknown: set ny/nx in the grid file or pass --ny/--nx"),
    }
}

#[derive(Parser, Debug)]
#[command(name = "skydist")]
#[command(about = "Geodesic distance fields on sky grids", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List boundary pixels of a mask or label map
    Edges {
        /// Mask (or label map) image
        #[arg(short, long)]
        mask: PathBuf,

        /// Treat gray values as region labels
        #[arg(long)]
        labeled: bool,

        /// Write indices here, one per line (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Distance from every pixel to the boundary of the mask's zero region
    Transform {
        /// Mask image
        #[arg(short, long)]
        mask: PathBuf,

        /// YAML grid file (shape defaults to the mask size)
        #[arg(long)]
        grid: Option<PathBuf>,

        /// Rendered distance image
        #[arg(short, long)]
        output: PathBuf,

        /// Raw f64 distances
        #[arg(long)]
        raw: Option<PathBuf>,
    },

    /// Distance and domain of the nearest point for every pixel
    Points {
        /// YAML grid file
        #[arg(long)]
        grid: PathBuf,

        /// Override grid rows
        #[arg(long)]
        ny: Option<usize>,

        /// Override grid columns
        #[arg(long)]
        nx: Option<usize>,

        /// Use this many random points instead of the grid file's list
        #[arg(long)]
        random: Option<usize>,

        /// Random seed for reproducibility
        #[arg(long, default_value = "0")]
        seed: u64,

        #[arg(long, value_enum, default_value = "brute")]
        method: Method,

        /// Threads for the brute-force scan (overrides the grid file)
        #[arg(long)]
        threads: Option<usize>,

        /// Rendered distance image
        #[arg(short, long)]
        output: PathBuf,

        /// Rendered domain image
        #[arg(long)]
        domains: Option<PathBuf>,

        /// Raw f64 distances
        #[arg(long)]
        raw: Option<PathBuf>,
    },

    /// Compare brute force and tree-rings on random points
    Bench {
        /// YAML grid file
        #[arg(long)]
        grid: PathBuf,

        /// Number of random points
        #[arg(long, default_value = "500")]
        random: usize,

        #[arg(long, default_value = "0")]
        seed: u64,

        /// Timed repetitions per backend
        #[arg(long, default_value = "3")]
        repeats: usize,
    },
}

fn setup_logging(verbose: u8) {
    let base_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    match args.command {
        Command::Edges { mask, labeled, output } => run_edges(&mask, labeled, output.as_deref()),
        Command::Transform { mask, grid, output, raw } => {
            run_transform(&mask, grid.as_deref(), &output, raw.as_deref())
        }
        Command::Points {
            grid,
            ny,
            nx,
            random,
            seed,
            method,
            threads,
            output,
            domains,
            raw,
        } => {
            let config = load_config(&grid)?;
            let (ny, nx) = resolve_shape(&config, ny, nx, None)?;
            let (ypos, xpos) = config.axes(ny, nx);
            let grid = SeparableGrid::new(&ypos, &xpos);
            let points = match random {
                Some(count) => random_points(&grid, count, seed),
                None => anchor_points(&grid, &config.sky_points()),
            };
            if points.is_empty() {
                anyhow::bail!("no points: list them in the grid file or pass --random");
            }

            let mut backend = make_backend(method, &config, threads);
            let start = Instant::now();
            let result = backend.compute(&grid, &points)?;
            tracing::info!(
                backend = backend.name(),
                points = points.len(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "field computed"
            );
            write_result(&result, &output, domains.as_deref(), raw.as_deref())
        }
        Command::Bench { grid, random, seed, repeats } => {
            let config = load_config(&grid)?;
            run_benchmark(&config, random, seed, repeats)
        }
    }
}

/// Read an image as 8-bit gray, returning `(pixels, ny, nx)`.
fn load_gray(path: &Path) -> anyhow::Result<(Vec<u8>, usize, usize)> {
    let img = image::open(path)
        .with_context(|| format!("failed to load image: {:?}", path))?
        .to_luma8();
    let (w, h) = img.dimensions();
    Ok((img.into_raw(), h as usize, w as usize))
}

fn run_edges(mask: &Path, labeled: bool, output: Option<&Path>) -> anyhow::Result<()> {
    let (pixels, ny, nx) = load_gray(mask)?;
    let grid = Grid::new(ny, nx);
    let edges = if labeled {
        let labels: Vec<i32> = pixels.iter().map(|&v| v as i32).collect();
        find_edges_labeled(grid, &labels)?
    } else {
        find_edges(grid, &pixels)?
    };
    tracing::info!(count = edges.len(), ny, nx, "edges found");

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {:?}", path))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    for i in edges {
        writeln!(out, "{}", i)?;
    }
    out.flush()?;
    Ok(())
}

fn run_transform(
    mask: &Path,
    grid: Option<&Path>,
    output: &Path,
    raw: Option<&Path>,
) -> anyhow::Result<()> {
    let (pixels, img_ny, img_nx) = load_gray(mask)?;
    let config = grid.map(load_config).transpose()?.unwrap_or_default();
    let (ny, nx) = resolve_shape(&config, None, None, Some((img_ny, img_nx)))?;
    if (ny, nx) != (img_ny, img_nx) {
        anyhow::bail!("grid is {}x{} but the mask is {}x{}", ny, nx, img_ny, img_nx);
    }

    let (ypos, xpos) = config.axes(ny, nx);
    let grid = SeparableGrid::new(&ypos, &xpos);
    let mut dists = vec![0.0; ny * nx];
    let start = Instant::now();
    distance_transform_separable(&grid, &pixels, &mut dists, Some(&TracingObserver))?;
    tracing::info!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "transform done");

    let result = DistanceResult {
        dists,
        domains: Vec::new(),
        ny,
        nx,
    };
    write_result(&result, output, None, raw)
}

fn make_backend(method: Method, config: &GridConfig, threads: Option<usize>) -> Box<dyn FieldBackend> {
    match method {
        Method::Brute => {
            let threads = threads.unwrap_or(config.threads);
            tracing::info!(threads, "using brute-force backend");
            Box::new(BruteForceBackend::with_threads(threads).with_observer(Arc::new(TracingObserver)))
        }
        Method::TreeRings => {
            let (edge_y, edge_x) = config.edges();
            tracing::info!(?edge_y, ?edge_x, "using tree-rings backend");
            Box::new(
                TreeRingsBackend::with_edges(edge_y, edge_x)
                    .with_observer(Arc::new(SpinnerObserver::new())),
            )
        }
    }
}

/// Shows wavefront progress on a spinner.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl FieldObserver for SpinnerObserver {
    fn phase(&self, name: &'static str, elapsed: Duration) {
        TracingObserver.phase(name, elapsed);
        if name == "passes" {
            self.bar.finish_and_clear();
        }
    }

    fn wavefront_pass(&self, pass: usize, frontier_len: usize) {
        self.bar
            .set_message(format!("pass {:>5}  frontier {:>10}", pass, frontier_len));
        self.bar.tick();
    }
}

fn write_raw(path: &Path, values: &[f64]) -> anyhow::Result<()> {
    let mut out = std::io::BufWriter::new(
        std::fs::File::create(path).with_context(|| format!("failed to create {:?}", path))?,
    );
    for v in values {
        out.write_all(&v.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn write_result(
    result: &DistanceResult,
    output: &Path,
    domains: Option<&Path>,
    raw: Option<&Path>,
) -> anyhow::Result<()> {
    result
        .render_distance()
        .save(output)
        .with_context(|| format!("failed to save {:?}", output))?;
    println!(
        "Distance map saved to: {:?} (max {:.4} deg)",
        output,
        result.max_finite_distance().to_degrees()
    );
    if let Some(path) = domains {
        result
            .render_domains()
            .save(path)
            .with_context(|| format!("failed to save {:?}", path))?;
        println!("Domain map saved to: {:?}", path);
    }
    if let Some(path) = raw {
        write_raw(path, &result.dists)?;
        println!("Raw distances saved to: {:?}", path);
    }
    Ok(())
}

/// Benchmark brute force against tree-rings on the same points
fn run_benchmark(config: &GridConfig, count: usize, seed: u64, repeats: usize) -> anyhow::Result<()> {
    let (ny, nx) = resolve_shape(config, None, None, None)?;
    let (ypos, xpos) = config.axes(ny, nx);
    let grid = SeparableGrid::new(&ypos, &xpos);
    let points = random_points(&grid, count, seed);
    let (edge_y, edge_x) = config.edges();

    println!("\n=== Distance Field Benchmark ===");
    println!("Grid: {}x{}", ny, nx);
    println!("Points: {}", count);
    println!("Repeats: {}", repeats);
    println!();

    let mut brute = BruteForceBackend::with_threads(config.threads);
    let mut rings = TreeRingsBackend::with_edges(edge_y, edge_x);

    let (brute_time, exact) = benchmark_backend(&mut brute, &grid, &points, repeats)?;
    report(brute.name(), brute_time, repeats);
    let (rings_time, approx) = benchmark_backend(&mut rings, &grid, &points, repeats)?;
    report(rings.name(), rings_time, repeats);
    println!("  tree-rings passes: {}", rings.last_passes);

    let max_dev = exact
        .dists
        .iter()
        .zip(&approx.dists)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    let mislabeled = exact
        .domains
        .iter()
        .zip(&approx.domains)
        .filter(|(a, b)| a != b)
        .count();

    println!();
    println!("=== Summary ===");
    let speedup = brute_time.as_secs_f64() / rings_time.as_secs_f64();
    println!("tree-rings is {:.2}x the speed of brute force", speedup);
    println!(
        "max deviation {:.3e} rad, {} of {} pixels labeled differently",
        max_dev,
        mislabeled,
        ny * nx
    );
    Ok(())
}

fn report(name: &str, total: Duration, repeats: usize) {
    println!(
        "  {}: {:?} total, {:.2} ms/run",
        name,
        total,
        total.as_secs_f64() * 1000.0 / repeats.max(1) as f64
    );
}

/// Time `repeats` runs of one backend after a warmup, returning the last result.
fn benchmark_backend(
    backend: &mut dyn FieldBackend,
    grid: &SeparableGrid,
    points: &[AnchoredPoint],
    repeats: usize,
) -> anyhow::Result<(Duration, DistanceResult)> {
    println!("Benchmarking {}...", backend.name());
    let mut result = backend.compute(grid, points)?;

    let start = Instant::now();
    for _ in 0..repeats {
        result = backend.compute(grid, points)?;
    }
    Ok((start.elapsed(), result))
}
