//! Boundary pixel extraction over masks and label maps.
//!
//! Both scans treat the area beyond the grid as a distinct region, since
//! nothing is assumed about how the pixelization wraps. Output order is the
//! grid border (top row, bottom row, left column, right column) followed by
//! the interior in raster order.

use crate::{check_len, Grid, Result};

/// Initial capacity of the index buffer; it doubles as needed.
const INITIAL_CAPACITY: usize = 0x100;

/// Collect the pixels for which `is_edge(i, neighbors)` holds, visiting
/// border pixels first. Border pixels always see the outside, so they only
/// need `on_border(i)`.
fn scan_edges(
    grid: Grid,
    on_border: impl Fn(usize) -> bool,
    in_interior: impl Fn(usize, [usize; 4]) -> bool,
) -> Vec<usize> {
    let Grid { ny, nx } = grid;
    let mut edges = Vec::with_capacity(INITIAL_CAPACITY);
    if ny == 0 || nx == 0 {
        return edges;
    }

    let border = (0..nx)
        .chain(if ny > 1 { (ny - 1) * nx..ny * nx } else { 0..0 })
        .chain((1..ny.saturating_sub(1)).map(|y| y * nx))
        .chain(
            (1..ny.saturating_sub(1))
                .filter(|_| nx > 1)
                .map(|y| y * nx + nx - 1),
        );
    edges.extend(border.filter(|&i| on_border(i)));

    for y in 1..ny.saturating_sub(1) {
        for x in 1..nx - 1 {
            let i = grid.index(y, x);
            if in_interior(i, [i - 1, i + 1, i - nx, i + nx]) {
                edges.push(i);
            }
        }
    }

    edges.shrink_to_fit();
    edges
}

/// Indices of zero pixels in `mask` that touch a nonzero pixel (4-connected).
pub fn find_edges(grid: Grid, mask: &[u8]) -> Result<Vec<usize>> {
    check_len("mask", grid.npix(), mask.len())?;
    Ok(scan_edges(
        grid,
        |i| mask[i] == 0,
        |i, neighbors| mask[i] == 0 && neighbors.iter().any(|&j| mask[j] != 0),
    ))
}

/// Indices of labeled (nonzero) pixels in `labels` that touch a pixel with a
/// different label (4-connected).
pub fn find_edges_labeled(grid: Grid, labels: &[i32]) -> Result<Vec<usize>> {
    check_len("label map", grid.npix(), labels.len())?;
    Ok(scan_edges(
        grid,
        |i| labels[i] != 0,
        |i, neighbors| labels[i] != 0 && neighbors.iter().any(|&j| labels[j] != labels[i]),
    ))
}
