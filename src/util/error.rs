//! Error types for dictindex.

use thiserror::Error;

use crate::stack::NavShape;

/// Result alias for dictindex operations.
pub type DictIndexResult<T> = std::result::Result<T, DictIndexError>;

/// Errors that can occur when running dictindex algorithms.
///
/// All failures are deterministic given identical inputs and are surfaced
/// before any partial result is produced.
#[derive(Debug, Error, PartialEq)]
pub enum DictIndexError {
    /// An image or template shape with a zero axis.
    #[error("invalid image dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    /// A backing buffer shorter than the declared geometry requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Experimental and simulated image shapes differ.
    #[error(
        "signal shape mismatch: patterns are {pattern_rows}x{pattern_cols}, \
         templates are {template_rows}x{template_cols}"
    )]
    ShapeMismatch {
        pattern_rows: usize,
        pattern_cols: usize,
        template_rows: usize,
        template_cols: usize,
    },
    /// Navigation/template dimensionality outside the metric's declared scope.
    #[error(
        "metric {name:?} with scope {scope} does not accept {pattern_extra} navigation \
         axis(es) and {template_extra} template axis(es)"
    )]
    IncompatibleScope {
        name: String,
        scope: &'static str,
        pattern_extra: usize,
        template_extra: usize,
    },
    /// Metric name not present in the registry.
    #[error("unknown similarity metric {name:?}, recognized metrics: {known:?}")]
    UnknownMetric {
        name: String,
        known: &'static [&'static str],
    },
    /// More navigation axes than the 0, 1 or 2 the engine supports.
    #[error("navigation dimension {ndim} not supported, must be 0, 1 or 2")]
    InvalidNavigationDimension { ndim: usize },
    /// Orientation sequence not parallel to the template sequence.
    #[error("dictionary holds {orientations} orientations for {templates} templates")]
    OrientationCountMismatch {
        orientations: usize,
        templates: usize,
    },
    /// Result maps with differing navigation grids cannot be fused.
    #[error("navigation shapes differ: {left:?} vs {right:?}")]
    NavShapeMismatch { left: NavShape, right: NavShape },
    /// A metric kernel returned a score matrix of the wrong size.
    #[error("metric produced {got} scores, expected {expected}")]
    MetricOutputMismatch { expected: usize, got: usize },
    /// The large-computation guard aborted the indexing call.
    #[error(
        "indexing refused: {templates_per_slice} templates per slice exceeds the \
         limit of {limit}, try n_slices >= {suggested_n_slices}"
    )]
    ComputationRefused {
        templates_per_slice: usize,
        limit: usize,
        suggested_n_slices: usize,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
