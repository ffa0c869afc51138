//! Per-row best-N selection and cross-slice merging.
//!
//! The ranking comparator is total: score order per the metric's convention,
//! ties broken by ascending template index. Because every candidate is ranked
//! under the same comparator regardless of which slice produced it, merging
//! slice results is associative and commutative in slice order, which is what
//! makes the matcher's output invariant to `n_slices`.

use std::cmp::Ordering;
use std::ops::Range;

/// Partitions `n` items into `n_slices` contiguous, roughly equal blocks.
/// The last block absorbs any remainder.
pub(crate) fn slice_ranges(n: usize, n_slices: usize) -> Vec<Range<usize>> {
    let n_slices = n_slices.clamp(1, n.max(1));
    let base = n / n_slices;
    let mut ranges = Vec::with_capacity(n_slices);
    for i in 0..n_slices {
        let start = i * base;
        let end = if i + 1 == n_slices { n } else { start + base };
        ranges.push(start..end);
    }
    ranges
}

/// Total best-first ordering over (template index, score) candidates.
pub(crate) fn rank_cmp(
    greater_is_better: bool,
) -> impl Fn(&(usize, f32), &(usize, f32)) -> Ordering + Copy {
    move |a: &(usize, f32), b: &(usize, f32)| {
        let by_score = if greater_is_better {
            b.1.total_cmp(&a.1)
        } else {
            a.1.total_cmp(&b.1)
        };
        by_score.then_with(|| a.0.cmp(&b.0))
    }
}

/// Merges one slice's scores for a single navigation row into the running
/// best-`keep_n` set, keeping it sorted best-first.
///
/// `row_scores` holds one score per template in the slice; `offset` is the
/// slice's first global template index.
pub(crate) fn merge_row(
    kept: &mut Vec<(usize, f32)>,
    row_scores: &[f32],
    offset: usize,
    keep_n: usize,
    greater_is_better: bool,
) {
    if keep_n == 0 {
        return;
    }
    let cmp = rank_cmp(greater_is_better);

    let mut local: Vec<(usize, f32)> = row_scores
        .iter()
        .enumerate()
        .map(|(j, &s)| (offset + j, s))
        .collect();
    if local.len() > keep_n {
        local.select_nth_unstable_by(keep_n - 1, cmp);
        local.truncate(keep_n);
    }

    kept.extend_from_slice(&local);
    kept.sort_by(cmp);
    kept.truncate(keep_n);
}
