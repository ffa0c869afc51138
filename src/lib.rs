//! Dictindex matches experimental diffraction images against dictionaries of
//! pre-computed simulated images by similarity search, producing per-pixel
//! best-orientation maps.
//!
//! The engine is built around a typed similarity-metric framework (`zncc`
//! and `ndp` built in), a memory-bounded chunked top-N matcher whose output
//! is invariant to how the template dictionary is sliced, a multi-dictionary
//! indexer with result-map fusion, and a neighborhood-agreement confidence
//! score. Optional parallelism via the `rayon` feature; structured logging
//! via the `tracing` feature.

pub mod dictionary;
pub mod indexer;
pub mod matcher;
pub mod metric;
pub mod stack;
mod trace;
pub mod util;
pub mod xmap;

pub use dictionary::{Dictionary, Orientation, Phase, TemplateSource};
pub use indexer::{ComputeGuard, DictionaryIndexer, GuardPolicy, IndexingConfig};
pub use matcher::{match_templates, MatchConfig, MatchPlan, MatchResult};
pub use metric::{
    metric_by_name, ndp, zncc, FlatScoreFn, ImageScoreFn, MetricKernel, MetricRef, MetricScope,
    SimilarityMetric, METRIC_NAMES,
};
pub use stack::{ImageStack, MatrixView, NavCalibration, NavShape};
pub use util::{DictIndexError, DictIndexResult};
pub use xmap::{merge_maps, orientation_similarity_map, OsmConfig, ResultMap};
