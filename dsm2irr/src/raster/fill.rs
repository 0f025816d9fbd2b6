//! Scan-conversion of pixel-space polygon rings into raster grids.
//!
//! Fill rule: even-odd, evaluated per integer scanline, applied to exterior
//! rings only. The rule is winding-insensitive, and every ring of a
//! MultiPolygon is treated identically. Interior rings (holes) never reach
//! this module.

use ndarray::Array2;

/// Scan-convert one closed ring, writing `value` into every interior cell.
///
/// Spans cover `[ceil(x0), ceil(x1))` between successive edge crossings and
/// are clamped to the grid, so partially out-of-range rings fill only their
/// in-range cells. Rings with fewer than three vertices fill nothing.
pub fn fill_ring<T: Copy>(grid: &mut Array2<T>, ring: &[(i64, i64)], value: T) {
    if ring.len() < 3 {
        return;
    }
    let (rows, cols) = grid.dim();

    let y_min = ring.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let y_max = ring
        .iter()
        .map(|p| p.1)
        .max()
        .unwrap_or(-1)
        .min(rows as i64 - 1);

    let mut crossings: Vec<f64> = Vec::new();
    for y in y_min..=y_max {
        crossings.clear();
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            if (a.1 > y) != (b.1 > y) {
                let t = (y - a.1) as f64 / (b.1 - a.1) as f64;
                crossings.push(a.0 as f64 + t * (b.0 - a.0) as f64);
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let x0 = (pair[0].ceil() as i64).max(0);
            let x1 = (pair[1].ceil() as i64).min(cols as i64);
            for x in x0..x1 {
                grid[[y as usize, x as usize]] = value;
            }
        }
    }
}

/// Fill every ring of a ring set with the same value.
pub fn fill_footprint<T: Copy>(grid: &mut Array2<T>, rings: &[Vec<(i64, i64)>], value: T) {
    for ring in rings {
        fill_ring(grid, ring, value);
    }
}

/// True when every vertex of the ring set lies on the same out-of-bounds
/// side of the canvas. Such a footprint cannot cover any cell and is
/// skipped wholesale; anything else goes through the fill primitive as-is.
pub fn entirely_outside(rings: &[Vec<(i64, i64)>], canvas_size: usize) -> bool {
    let size = canvas_size as i64;
    let all = |check: &dyn Fn(&(i64, i64)) -> bool| rings.iter().flatten().all(check);
    all(&|p| p.0 < 0) || all(&|p| p.0 >= size) || all(&|p| p.1 < 0) || all(&|p| p.1 >= size)
}
