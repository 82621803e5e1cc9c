//! Geodesic distance transform of a mask.
//!
//! The boundary pixels of the zero region become the reference points; every
//! pixel gets its distance to the nearest of them, and the zero region itself
//! is reported at distance 0.

use crate::{
    check_len, distance_from_points, distance_from_points_separable, find_edges, FieldObserver,
    Grid, PositionMap, Result, SeparableGrid, SkyPoint,
};

fn zero_masked(mask: &[u8], dists: &mut [f64]) {
    for (d, &m) in dists.iter_mut().zip(mask) {
        if m == 0 {
            *d = 0.0;
        }
    }
}

/// Distance from every pixel to the boundary of the zero region of `mask`,
/// using a dense position map.
///
/// A mask without zero pixels has no boundary, so every distance is left at
/// [`UNVISITED`](crate::UNVISITED).
pub fn distance_transform(
    grid: Grid,
    mask: &[u8],
    posmap: &PositionMap,
    dists: &mut [f64],
    observer: Option<&dyn FieldObserver>,
) -> Result<()> {
    check_len("position map", grid.npix(), posmap.npix())?;
    check_len("right-ascension plane", grid.npix(), posmap.ra.len())?;
    let edges = find_edges(grid, mask)?;
    let points: Vec<SkyPoint> = edges
        .iter()
        .map(|&i| SkyPoint::new(posmap.dec[i], posmap.ra[i]))
        .collect();
    distance_from_points(posmap, &points, dists, None, observer)?;
    zero_masked(mask, dists);
    Ok(())
}

/// [`distance_transform`] over a separable grid, computed row-parallel.
pub fn distance_transform_separable(
    grid: &SeparableGrid,
    mask: &[u8],
    dists: &mut [f64],
    observer: Option<&dyn FieldObserver>,
) -> Result<()> {
    let shape = grid.shape();
    let edges = find_edges(shape, mask)?;
    let points: Vec<SkyPoint> = edges
        .iter()
        .map(|&i| {
            let (y, x) = shape.coords(i);
            SkyPoint::new(grid.ypos[y], grid.xpos[x])
        })
        .collect();
    distance_from_points_separable(grid, &points, dists, None, observer)?;
    zero_masked(mask, dists);
    Ok(())
}
