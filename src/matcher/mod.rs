//! Chunked best-N pattern matching against a template source.
//!
//! The matcher scores every navigation position of an experimental image
//! stack against every template in a dictionary, keeping the best `keep_n`
//! matches per position. Peak memory is bounded by scoring the templates in
//! `n_slices` contiguous blocks; the final result is identical for any slice
//! count. Evaluation is two-phase: [`MatchPlan::new`] validates and captures
//! the inputs, [`MatchPlan::evaluate`] materializes the [`MatchResult`].

mod topn;

use crate::dictionary::TemplateSource;
use crate::metric::{MetricKernel, MetricRef, SimilarityMetric};
use crate::stack::{ImageStack, NavShape};
use crate::trace::{trace_event, trace_span};
use crate::util::{DictIndexError, DictIndexResult};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Matching configuration.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Number of best matches to keep per navigation position, clamped to
    /// the number of templates.
    pub keep_n: usize,
    /// Number of template slices processed sequentially to bound memory.
    pub n_slices: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            keep_n: 50,
            n_slices: 1,
        }
    }
}

/// Ranked match output: per navigation position, `keep_n` template indices
/// and scores, best first.
#[derive(Clone, Debug)]
pub struct MatchResult {
    nav: NavShape,
    keep_n: usize,
    simulation_indices: Vec<usize>,
    scores: Vec<f32>,
}

impl MatchResult {
    /// Returns the navigation shape of the pattern batch.
    pub fn nav(&self) -> NavShape {
        self.nav
    }

    /// Returns the number of kept matches per position.
    pub fn keep_n(&self) -> usize {
        self.keep_n
    }

    /// Returns all template indices, row-major `nav_len x keep_n`.
    pub fn simulation_indices(&self) -> &[usize] {
        &self.simulation_indices
    }

    /// Returns all scores, row-major `nav_len x keep_n`.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Returns the ranked template indices for one navigation position.
    pub fn indices_at(&self, nav_idx: usize) -> &[usize] {
        &self.simulation_indices[nav_idx * self.keep_n..(nav_idx + 1) * self.keep_n]
    }

    /// Returns the ranked scores for one navigation position.
    pub fn scores_at(&self, nav_idx: usize) -> &[f32] {
        &self.scores[nav_idx * self.keep_n..(nav_idx + 1) * self.keep_n]
    }

    /// Returns the rank-0 match for one navigation position.
    pub fn best(&self, nav_idx: usize) -> (usize, f32) {
        (
            self.simulation_indices[nav_idx * self.keep_n],
            self.scores[nav_idx * self.keep_n],
        )
    }
}

/// A validated, not yet evaluated matching computation.
///
/// Building the plan performs all shape and scope checks; evaluation only
/// scores and ranks. This keeps the core agnostic of when (and on which
/// executor) the heavy work runs.
pub struct MatchPlan<'a, S> {
    patterns: &'a ImageStack<'a>,
    templates: &'a S,
    metric: SimilarityMetric,
    keep_n: usize,
    n_slices: usize,
}

impl<'a, S: TemplateSource> MatchPlan<'a, S> {
    /// Validates inputs against the metric and captures them for evaluation.
    pub fn new(
        patterns: &'a ImageStack<'a>,
        templates: &'a S,
        metric: SimilarityMetric,
        config: &MatchConfig,
    ) -> DictIndexResult<Self> {
        let n_templates = templates.n_templates();
        if n_templates == 0 {
            return Err(DictIndexError::InvalidInput("template source is empty"));
        }

        let (pattern_rows, pattern_cols) = patterns.image_shape();
        let (template_rows, template_cols) = templates.image_shape();
        if (pattern_rows, pattern_cols) != (template_rows, template_cols) {
            return Err(DictIndexError::ShapeMismatch {
                pattern_rows,
                pattern_cols,
                template_rows,
                template_cols,
            });
        }

        let pattern_extra = patterns.nav().extra_ndim();
        let template_extra = templates.extra_ndim();
        if !metric.is_compatible(pattern_extra, template_extra) {
            return Err(metric.incompatible_error(pattern_extra, template_extra));
        }

        let keep_n = config.keep_n.min(n_templates);
        let n_slices = config.n_slices.clamp(1, n_templates);
        Ok(Self {
            patterns,
            templates,
            metric,
            keep_n,
            n_slices,
        })
    }

    /// Returns the resolved (clamped) keep_n.
    pub fn keep_n(&self) -> usize {
        self.keep_n
    }

    /// Returns the resolved (clamped) slice count.
    pub fn n_slices(&self) -> usize {
        self.n_slices
    }

    /// Scores all slices and materializes the ranked result.
    pub fn evaluate(&self) -> DictIndexResult<MatchResult> {
        let nav_len = self.patterns.nav_len();
        let n_templates = self.templates.n_templates();
        let (rows, cols) = self.patterns.image_shape();
        let greater = self.metric.greater_is_better();

        let _span = trace_span!(
            "pattern_match",
            nav_len = nav_len,
            n_templates = n_templates,
            n_slices = self.n_slices,
        )
        .entered();

        let mut running: Vec<Vec<(usize, f32)>> = (0..nav_len)
            .map(|_| Vec::with_capacity(2 * self.keep_n))
            .collect();
        let mut block_buf = Vec::new();

        for range in topn::slice_ranges(n_templates, self.n_slices) {
            let block_len = range.len();
            self.templates.read_block(range.clone(), &mut block_buf)?;
            let block = ImageStack::new(&block_buf, NavShape::Line(block_len), rows, cols)?;

            let scores = match self.metric.kernel() {
                MetricKernel::Image(f) => f(self.patterns, &block),
                MetricKernel::Flat(f) => f(&self.patterns.as_matrix(), &block.as_matrix()),
            };
            if scores.len() != nav_len * block_len {
                return Err(DictIndexError::MetricOutputMismatch {
                    expected: nav_len * block_len,
                    got: scores.len(),
                });
            }
            trace_event!("slice_scored", start = range.start, len = block_len);

            merge_block(
                &mut running,
                &scores,
                block_len,
                range.start,
                self.keep_n,
                greater,
            );
        }

        let mut simulation_indices = Vec::with_capacity(nav_len * self.keep_n);
        let mut scores = Vec::with_capacity(nav_len * self.keep_n);
        for kept in &running {
            debug_assert_eq!(kept.len(), self.keep_n);
            for &(idx, score) in kept {
                simulation_indices.push(idx);
                scores.push(score);
            }
        }

        Ok(MatchResult {
            nav: self.patterns.nav(),
            keep_n: self.keep_n,
            simulation_indices,
            scores,
        })
    }
}

#[cfg(feature = "rayon")]
fn merge_block(
    running: &mut [Vec<(usize, f32)>],
    scores: &[f32],
    block_len: usize,
    offset: usize,
    keep_n: usize,
    greater_is_better: bool,
) {
    running.par_iter_mut().enumerate().for_each(|(row, kept)| {
        let row_scores = &scores[row * block_len..(row + 1) * block_len];
        topn::merge_row(kept, row_scores, offset, keep_n, greater_is_better);
    });
}

#[cfg(not(feature = "rayon"))]
fn merge_block(
    running: &mut [Vec<(usize, f32)>],
    scores: &[f32],
    block_len: usize,
    offset: usize,
    keep_n: usize,
    greater_is_better: bool,
) {
    for (row, kept) in running.iter_mut().enumerate() {
        let row_scores = &scores[row * block_len..(row + 1) * block_len];
        topn::merge_row(kept, row_scores, offset, keep_n, greater_is_better);
    }
}

/// Plans and evaluates in one call.
pub fn match_templates<S: TemplateSource>(
    patterns: &ImageStack<'_>,
    templates: &S,
    metric: &MetricRef,
    config: &MatchConfig,
) -> DictIndexResult<MatchResult> {
    MatchPlan::new(patterns, templates, metric.resolve()?, config)?.evaluate()
}
