//! Exact nearest-point fields by exhaustive scan.
//!
//! Every pixel is compared against every point: O(npix·npoint). A candidate
//! only replaces the current best when strictly closer, so the lowest point
//! index wins ties.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::observe::Stopwatch;
use crate::sphere::{angular_distance, TrigPoint};
use crate::{
    check_len, FieldObserver, PositionMap, Result, SeparableGrid, SkyPoint, UNASSIGNED,
    UNVISITED,
};

/// Nearest point to `pix`, as `(distance, point index)`.
/// Returns the sentinels when `points` is empty.
#[inline]
fn nearest_point(pix: &TrigPoint, points: &[TrigPoint]) -> (f64, i32) {
    let mut best = (UNVISITED, UNASSIGNED);
    for (j, p) in points.iter().enumerate() {
        let d = angular_distance(p, pix);
        if d < best.0 {
            best = (d, j as i32);
        }
    }
    best
}

fn precompute_trig(points: &[SkyPoint]) -> Vec<TrigPoint> {
    points.iter().map(|&p| TrigPoint::from(p)).collect()
}

/// Distance from each pixel of a dense position map to its nearest point.
///
/// `dists` (and `domains`, when given) must hold one entry per pixel.
/// With no points, every pixel is left at [`UNVISITED`] / [`UNASSIGNED`].
pub fn distance_from_points(
    posmap: &PositionMap,
    points: &[SkyPoint],
    dists: &mut [f64],
    mut domains: Option<&mut [i32]>,
    observer: Option<&dyn FieldObserver>,
) -> Result<()> {
    let npix = posmap.npix();
    check_len("right-ascension plane", npix, posmap.ra.len())?;
    check_len("distance field", npix, dists.len())?;
    if let Some(domains) = domains.as_deref() {
        check_len("domain field", npix, domains.len())?;
    }

    let mut sw = Stopwatch::new(observer);
    let trig = precompute_trig(points);
    sw.lap("point trig");

    for i in 0..npix {
        let pix = TrigPoint::new(posmap.dec[i], posmap.ra[i]);
        let (d, j) = nearest_point(&pix, &trig);
        dists[i] = d;
        if let Some(domains) = domains.as_deref_mut() {
            domains[i] = j;
        }
    }
    sw.lap("pixels");
    Ok(())
}

/// Fill one grid row. `row` carries the row's declination trig.
fn fill_row(
    row: TrigPoint,
    xpos: &[f64],
    points: &[TrigPoint],
    dists: &mut [f64],
    mut domains: Option<&mut [i32]>,
) {
    for (x, &ra) in xpos.iter().enumerate() {
        let (d, j) = nearest_point(&row.with_ra(ra), points);
        dists[x] = d;
        if let Some(domains) = domains.as_deref_mut() {
            domains[x] = j;
        }
    }
}

/// Fill every row of a separable grid.
#[cfg(feature = "parallel")]
fn fill_rows(
    grid: &SeparableGrid,
    trig: &[TrigPoint],
    dists: &mut [f64],
    domains: Option<&mut [i32]>,
) {
    let nx = grid.xpos.len();
    let row_trig = |y: usize| TrigPoint::new(grid.ypos[y], 0.0);
    match domains {
        Some(domains) => dists
            .par_chunks_mut(nx)
            .zip(domains.par_chunks_mut(nx))
            .enumerate()
            .for_each(|(y, (drow, arow))| {
                fill_row(row_trig(y), grid.xpos, trig, drow, Some(arow))
            }),
        None => dists
            .par_chunks_mut(nx)
            .enumerate()
            .for_each(|(y, drow)| fill_row(row_trig(y), grid.xpos, trig, drow, None)),
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_rows(
    grid: &SeparableGrid,
    trig: &[TrigPoint],
    dists: &mut [f64],
    domains: Option<&mut [i32]>,
) {
    let nx = grid.xpos.len();
    let row_trig = |y: usize| TrigPoint::new(grid.ypos[y], 0.0);
    match domains {
        Some(domains) => dists
            .chunks_mut(nx)
            .zip(domains.chunks_mut(nx))
            .enumerate()
            .for_each(|(y, (drow, arow))| {
                fill_row(row_trig(y), grid.xpos, trig, drow, Some(arow))
            }),
        None => dists
            .chunks_mut(nx)
            .enumerate()
            .for_each(|(y, drow)| fill_row(row_trig(y), grid.xpos, trig, drow, None)),
    }
}

/// Separable-grid variant of [`distance_from_points`].
///
/// Rows are independent and each writes only its own slice of the outputs,
/// so with the `parallel` feature they are spread over the current Rayon
/// pool. Results do not depend on the number of workers.
pub fn distance_from_points_separable(
    grid: &SeparableGrid,
    points: &[SkyPoint],
    dists: &mut [f64],
    domains: Option<&mut [i32]>,
    observer: Option<&dyn FieldObserver>,
) -> Result<()> {
    let shape = grid.shape();
    check_len("distance field", shape.npix(), dists.len())?;
    if let Some(domains) = domains.as_deref() {
        check_len("domain field", shape.npix(), domains.len())?;
    }
    if shape.npix() == 0 {
        return Ok(());
    }

    let mut sw = Stopwatch::new(observer);
    let trig = precompute_trig(points);
    sw.lap("point trig");

    fill_rows(grid, &trig, dists, domains);
    sw.lap("rows");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::tests::Recorder;

    fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn single_point_reproduces_kernel() {
        let ypos = axis(-0.2, 0.03, 9);
        let xpos = axis(1.0, 0.04, 11);
        let grid = SeparableGrid::new(&ypos, &xpos);
        let stacked = grid.to_stacked();
        let posmap = PositionMap::from_stacked(&stacked).unwrap();
        let p = SkyPoint::new(0.05, 1.17);

        let npix = grid.shape().npix();
        let mut dists = vec![0.0; npix];
        let mut domains = vec![9; npix];
        distance_from_points(&posmap, &[p], &mut dists, Some(&mut domains), None).unwrap();

        let pt = TrigPoint::from(p);
        for i in 0..npix {
            let pix = TrigPoint::new(posmap.dec[i], posmap.ra[i]);
            assert_eq!(dists[i], angular_distance(&pt, &pix));
        }
        assert!(domains.iter().all(|&d| d == 0));
    }

    #[test]
    fn dense_and_separable_agree_exactly() {
        let ypos = axis(0.3, 0.02, 17);
        let xpos = axis(-0.5, 0.025, 23);
        let grid = SeparableGrid::new(&ypos, &xpos);
        let stacked = grid.to_stacked();
        let posmap = PositionMap::from_stacked(&stacked).unwrap();
        let points = vec![
            SkyPoint::new(0.35, -0.45),
            SkyPoint::new(0.55, -0.1),
            SkyPoint::new(0.4, -0.3),
        ];

        let npix = grid.shape().npix();
        let (mut d1, mut a1) = (vec![0.0; npix], vec![0; npix]);
        let (mut d2, mut a2) = (vec![0.0; npix], vec![0; npix]);
        distance_from_points(&posmap, &points, &mut d1, Some(&mut a1), None).unwrap();
        distance_from_points_separable(&grid, &points, &mut d2, Some(&mut a2), None).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(a1, a2);
        assert!(a1.iter().all(|&a| (0..3).contains(&a)));
    }

    #[test]
    fn ties_go_to_the_first_point() {
        let ypos = [0.0, 0.01];
        let xpos = [0.0, 0.01];
        let grid = SeparableGrid::new(&ypos, &xpos);
        let p = SkyPoint::new(0.01, 0.01);
        let mut dists = vec![0.0; 4];
        let mut domains = vec![0; 4];
        distance_from_points_separable(&grid, &[p, p, p], &mut dists, Some(&mut domains), None)
            .unwrap();
        assert_eq!(domains, vec![0; 4]);
        assert_eq!(dists[3], 0.0);
    }

    #[test]
    fn distances_without_domains() {
        let ypos = axis(0.0, 0.1, 3);
        let xpos = axis(0.0, 0.1, 4);
        let grid = SeparableGrid::new(&ypos, &xpos);
        let mut dists = vec![-1.0; 12];
        distance_from_points_separable(&grid, &[SkyPoint::new(0.1, 0.2)], &mut dists, None, None)
            .unwrap();
        assert_eq!(dists[grid.shape().index(1, 2)], 0.0);
        assert!(dists.iter().all(|&d| (0.0..=std::f64::consts::PI).contains(&d)));
    }

    #[test]
    fn empty_point_set_leaves_sentinels() {
        let ypos = [0.0, 0.1];
        let xpos = [0.0];
        let grid = SeparableGrid::new(&ypos, &xpos);
        let mut dists = vec![0.0; 2];
        let mut domains = vec![0; 2];
        distance_from_points_separable(&grid, &[], &mut dists, Some(&mut domains), None).unwrap();
        assert_eq!(dists, vec![UNVISITED; 2]);
        assert_eq!(domains, vec![UNASSIGNED; 2]);
    }

    #[test]
    fn buffer_lengths_are_checked() {
        let ypos = [0.0, 0.1];
        let xpos = [0.0, 0.1];
        let grid = SeparableGrid::new(&ypos, &xpos);
        let mut dists = vec![0.0; 3];
        assert!(distance_from_points_separable(&grid, &[], &mut dists, None, None).is_err());
        let mut dists = vec![0.0; 4];
        let mut domains = vec![0; 5];
        assert!(
            distance_from_points_separable(&grid, &[], &mut dists, Some(&mut domains), None)
                .is_err()
        );
    }

    #[test]
    fn observer_sees_both_stages() {
        let ypos = [0.0];
        let xpos = [0.0, 0.1];
        let grid = SeparableGrid::new(&ypos, &xpos);
        let rec = Recorder::default();
        let mut dists = vec![0.0; 2];
        distance_from_points_separable(
            &grid,
            &[SkyPoint::new(0.0, 0.0)],
            &mut dists,
            None,
            Some(&rec),
        )
        .unwrap();
        assert_eq!(*rec.phases.lock().unwrap(), vec!["point trig", "rows"]);
    }
}
