//! Orientation similarity: neighborhood agreement confidence per pixel.
//!
//! For each pixel the top-`n_best` simulation indices form a set; the score
//! is the intersection size with each existing grid neighbor's set, averaged
//! over the neighbors that exist. Edge and corner pixels average over fewer
//! neighbors; there is no wraparound or padding.

use crate::stack::NavShape;
use crate::util::{DictIndexError, DictIndexResult};
use crate::xmap::ResultMap;

/// Orientation similarity configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsmConfig {
    /// Number of best-ranked candidates per pixel to compare, defaulting to
    /// the map's `keep_n`.
    pub n_best: Option<usize>,
    /// Divide by `n_best`, reporting a fraction in [0, 1] instead of a
    /// plain average intersection size.
    pub normalize: bool,
}

fn neighbors(nav: NavShape, idx: usize, out: &mut Vec<usize>) {
    out.clear();
    match nav {
        NavShape::Point => {}
        NavShape::Line(n) => {
            if idx > 0 {
                out.push(idx - 1);
            }
            if idx + 1 < n {
                out.push(idx + 1);
            }
        }
        NavShape::Grid { rows, cols } => {
            let (r, c) = (idx / cols, idx % cols);
            if r > 0 {
                out.push(idx - cols);
            }
            if r + 1 < rows {
                out.push(idx + cols);
            }
            if c > 0 {
                out.push(idx - 1);
            }
            if c + 1 < cols {
                out.push(idx + 1);
            }
        }
    }
}

fn intersection_size(a: &[usize], b: &[usize]) -> usize {
    // Candidate rows are short and hold distinct indices.
    a.iter().filter(|v| b.contains(v)).count()
}

/// Computes the per-pixel orientation similarity array for a result map.
///
/// Values lie in `[0, n_best]` (`[0, 1]` when normalized); an interior pixel
/// whose neighbors all share its candidate set scores exactly `n_best`.
pub fn orientation_similarity_map(
    map: &ResultMap,
    config: &OsmConfig,
) -> DictIndexResult<Vec<f32>> {
    let keep_n = map.keep_n();
    let n_best = config.n_best.unwrap_or(keep_n);
    if n_best == 0 || n_best > keep_n {
        return Err(DictIndexError::InvalidInput(
            "n_best must be between 1 and the map's keep_n",
        ));
    }

    let nav = map.nav();
    let nav_len = nav.len();
    let mut osm = Vec::with_capacity(nav_len);
    let mut nbrs = Vec::with_capacity(4);

    for idx in 0..nav_len {
        let own = &map.indices_at(idx)[..n_best];
        neighbors(nav, idx, &mut nbrs);
        if nbrs.is_empty() {
            osm.push(0.0);
            continue;
        }
        let total: usize = nbrs
            .iter()
            .map(|&nb| intersection_size(own, &map.indices_at(nb)[..n_best]))
            .sum();
        let mut value = total as f32 / nbrs.len() as f32;
        if config.normalize {
            value /= n_best as f32;
        }
        osm.push(value);
    }
    Ok(osm)
}
