//! End-to-end tests verifying deterministic distance fields.
//!
//! These tests ensure that the row-parallel scan gives bit-identical output
//! regardless of worker count, and that the wavefront agrees with the exact
//! scan when domains are wide.

use skydist_core::{
    distance_from_points, distance_from_points_separable, distance_transform,
    distance_transform_separable, find_edges, random_points, AnchoredPoint, BruteForceBackend,
    DistanceResult, EdgeBehavior, FieldBackend, Grid, PositionMap, SeparableGrid, SkyPoint,
    TreeRingsBackend,
};

/// Equally spaced axis of `n` values (radians).
fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

fn sky_axes() -> (Vec<f64>, Vec<f64>) {
    (axis(-0.35, 0.004, 120), axis(0.8, 0.004, 160))
}

fn on_pixel(grid: &SeparableGrid, y: usize, x: usize) -> AnchoredPoint {
    AnchoredPoint::new(SkyPoint::new(grid.ypos[y], grid.xpos[x]), y, x)
}

fn compute(backend: &mut dyn FieldBackend, grid: &SeparableGrid, points: &[AnchoredPoint]) -> DistanceResult {
    backend.compute(grid, points).expect("Compute failed")
}

fn assert_fields_close(expected: &DistanceResult, actual: &DistanceResult, tol: f64, name: &str) {
    assert_eq!((expected.ny, expected.nx), (actual.ny, actual.nx), "{}: shape mismatch", name);
    for (i, (e, a)) in expected.dists.iter().zip(&actual.dists).enumerate() {
        assert!(
            (e - a).abs() <= tol,
            "{}: pixel {} distance {} vs {}",
            name, i, e, a
        );
    }
    assert_eq!(expected.domains, actual.domains, "{}: domain mismatch", name);
}

mod brute_force {
    use super::*;

    #[test]
    fn test_thread_counts_are_bit_identical() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let points = random_points(&grid, 64, 0);

        let reference = compute(&mut BruteForceBackend::with_threads(1), &grid, &points);
        for threads in [2, 3, 8] {
            let actual = compute(&mut BruteForceBackend::with_threads(threads), &grid, &points);
            assert_eq!(reference.dists, actual.dists, "{} threads: distances", threads);
            assert_eq!(reference.domains, actual.domains, "{} threads: domains", threads);
        }
    }

    #[test]
    fn test_reproducibility() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let mut backend = BruteForceBackend::new();

        let r1 = compute(&mut backend, &grid, &random_points(&grid, 40, 12345));
        let r2 = compute(&mut backend, &grid, &random_points(&grid, 40, 12345));
        assert_eq!(r1.dists, r2.dists);
        assert_eq!(r1.domains, r2.domains);
    }

    #[test]
    fn test_different_seeds_produce_different_output() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let mut backend = BruteForceBackend::new();

        let r1 = compute(&mut backend, &grid, &random_points(&grid, 40, 0));
        let r2 = compute(&mut backend, &grid, &random_points(&grid, 40, 1));
        assert_ne!(r1.dists, r2.dists, "Different seeds should produce different output");
    }

    #[test]
    fn test_dense_matches_separable() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let stacked = grid.to_stacked();
        let posmap = PositionMap::from_stacked(&stacked).unwrap();
        let points: Vec<SkyPoint> = random_points(&grid, 25, 5).iter().map(|p| p.pos).collect();

        let npix = grid.shape().npix();
        let (mut d1, mut a1) = (vec![0.0; npix], vec![0; npix]);
        let (mut d2, mut a2) = (vec![0.0; npix], vec![0; npix]);
        distance_from_points(&posmap, &points, &mut d1, Some(&mut a1), None).unwrap();
        distance_from_points_separable(&grid, &points, &mut d2, Some(&mut a2), None).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(a1, a2);
    }

    #[test]
    fn test_distances_are_nearest_and_bounded() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let points = random_points(&grid, 10, 77);
        let result = compute(&mut BruteForceBackend::new(), &grid, &points);

        let shape = grid.shape();
        for i in (0..shape.npix()).step_by(97) {
            let (y, x) = shape.coords(i);
            let pix = skydist_core::TrigPoint::new(ypos[y], xpos[x]);
            let best = points
                .iter()
                .map(|p| skydist_core::angular_distance(&p.pos.into(), &pix))
                .fold(f64::INFINITY, f64::min);
            assert_eq!(result.dists[i], best);
            assert!((0.0..=std::f64::consts::PI).contains(&result.dists[i]));
        }
    }
}

mod tree_rings {
    use super::*;

    #[test]
    fn test_two_wide_domains_match_brute_force() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let points = [on_pixel(&grid, 20, 30), on_pixel(&grid, 95, 120)];

        let exact = compute(&mut BruteForceBackend::new(), &grid, &points);
        let approx = compute(&mut TreeRingsBackend::new(), &grid, &points);
        assert_fields_close(&exact, &approx, 1e-9, "two points");
    }

    #[test]
    fn test_three_wide_domains_match_brute_force() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let points = [
            on_pixel(&grid, 15, 25),
            on_pixel(&grid, 30, 135),
            on_pixel(&grid, 105, 75),
        ];

        let exact = compute(&mut BruteForceBackend::new(), &grid, &points);
        let mut backend = TreeRingsBackend::with_edges(EdgeBehavior::Absorb, EdgeBehavior::Absorb);
        let approx = compute(&mut backend, &grid, &points);
        assert_fields_close(&exact, &approx, 1e-9, "three points");
        assert_eq!(exact.domain_areas(3).iter().sum::<u32>(), 120 * 160);
    }

    #[test]
    fn test_reproducibility() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let points = random_points(&grid, 200, 4);
        let mut backend = TreeRingsBackend::new();

        let r1 = compute(&mut backend, &grid, &points);
        let passes = backend.last_passes;
        let r2 = compute(&mut backend, &grid, &points);
        assert_eq!(r1.dists, r2.dists);
        assert_eq!(r1.domains, r2.domains);
        assert_eq!(passes, backend.last_passes);
    }

    #[test]
    fn test_many_points_stay_close_to_brute_force() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let points = random_points(&grid, 150, 9);

        let exact = compute(&mut BruteForceBackend::new(), &grid, &points);
        let approx = compute(&mut TreeRingsBackend::new(), &grid, &points);
        // Narrow domains may be cut off, but never by more than a few pixels.
        for (e, a) in exact.dists.iter().zip(&approx.dists) {
            assert!(*a >= *e);
            assert!(a - e < 0.05, "deviation {} too large", a - e);
        }
    }
}

mod transform {
    use super::*;

    #[test]
    fn test_dense_matches_separable() {
        let (ypos, xpos) = sky_axes();
        let grid = SeparableGrid::new(&ypos, &xpos);
        let shape = grid.shape();
        let mut mask = vec![1u8; shape.npix()];
        for y in 40..70 {
            for x in 50..90 {
                mask[shape.index(y, x)] = 0;
            }
        }

        let stacked = grid.to_stacked();
        let posmap = PositionMap::from_stacked(&stacked).unwrap();
        let mut dense = vec![0.0; shape.npix()];
        let mut separable = vec![0.0; shape.npix()];
        distance_transform(Grid::new(shape.ny, shape.nx), &mask, &posmap, &mut dense, None).unwrap();
        distance_transform_separable(&grid, &mask, &mut separable, None).unwrap();
        assert_eq!(dense, separable);

        let edges = find_edges(shape, &mask).unwrap();
        assert_eq!(edges.len(), 2 * 30 + 2 * 38);
        for i in 0..shape.npix() {
            if mask[i] == 0 {
                assert_eq!(dense[i], 0.0);
            } else {
                assert!(dense[i] > 0.0);
            }
        }
    }
}
