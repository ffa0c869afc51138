//! Dictionary indexing orchestration.
//!
//! [`DictionaryIndexer`] runs the pattern matcher once per dictionary against
//! one experimental batch, assembles a [`ResultMap`] per dictionary, and
//! optionally fuses them and attaches orientation similarity. Dictionaries
//! are processed sequentially; the matcher bounds memory within each run via
//! `n_slices`. A large-computation guard can abort the whole call before any
//! work starts.

use std::fmt;
use std::sync::Arc;

use crate::dictionary::{Dictionary, TemplateSource};
use crate::matcher::{MatchConfig, MatchPlan};
use crate::metric::MetricRef;
use crate::stack::{ImageStack, NavCalibration};
use crate::trace::{trace_event, trace_span};
use crate::util::{DictIndexError, DictIndexResult};
use crate::xmap::{merge_maps, orientation_similarity_map, OsmConfig, ResultMap};

/// Decision taken when a run would exceed the guard's slice limit.
#[derive(Clone)]
pub enum GuardPolicy {
    /// Proceed regardless.
    Proceed,
    /// Abort with [`DictIndexError::ComputationRefused`].
    Abort,
    /// Ask the callback, passing the templates-per-slice count; `false`
    /// aborts.
    Confirm(Arc<dyn Fn(usize) -> bool + Send + Sync>),
}

impl fmt::Debug for GuardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => f.write_str("Proceed"),
            Self::Abort => f.write_str("Abort"),
            Self::Confirm(_) => f.write_str("Confirm(..)"),
        }
    }
}

/// Policy guard against unintentionally huge score matrices.
///
/// The default limit is the historical 13500 templates per slice; it is a
/// tunable policy value, not a derived constant.
#[derive(Clone, Debug)]
pub struct ComputeGuard {
    /// Maximum templates scored simultaneously per navigation batch.
    pub max_templates_per_slice: usize,
    /// What to do when the limit is exceeded.
    pub policy: GuardPolicy,
}

impl Default for ComputeGuard {
    fn default() -> Self {
        Self {
            max_templates_per_slice: 13_500,
            policy: GuardPolicy::Abort,
        }
    }
}

impl ComputeGuard {
    fn check(&self, max_dictionary_size: usize, n_slices: usize) -> DictIndexResult<()> {
        let templates_per_slice = max_dictionary_size / n_slices.max(1);
        if templates_per_slice <= self.max_templates_per_slice {
            return Ok(());
        }
        let allowed = match &self.policy {
            GuardPolicy::Proceed => true,
            GuardPolicy::Abort => false,
            GuardPolicy::Confirm(confirm) => confirm(templates_per_slice),
        };
        if allowed {
            Ok(())
        } else {
            Err(DictIndexError::ComputationRefused {
                templates_per_slice,
                limit: self.max_templates_per_slice,
                suggested_n_slices: max_dictionary_size.div_ceil(self.max_templates_per_slice),
            })
        }
    }
}

/// Indexing configuration.
#[derive(Clone, Debug)]
pub struct IndexingConfig {
    /// Similarity metric, by registry name or instance.
    pub metric: MetricRef,
    /// Best matches kept per pixel, clamped to every dictionary's size.
    pub keep_n: usize,
    /// Template slices per matcher run.
    pub n_slices: usize,
    /// Append a merged best-of-all map when indexing several dictionaries.
    pub return_merged: bool,
    /// Attach an `osm` property to every produced map.
    pub compute_similarity_map: bool,
    /// Orientation similarity settings.
    pub osm: OsmConfig,
    /// Large-computation guard.
    pub guard: ComputeGuard,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            metric: MetricRef::default(),
            keep_n: 50,
            n_slices: 1,
            return_merged: false,
            compute_similarity_map: false,
            osm: OsmConfig::default(),
            guard: ComputeGuard::default(),
        }
    }
}

/// Indexes one experimental batch against one or more dictionaries.
pub struct DictionaryIndexer<S> {
    dictionaries: Vec<Dictionary<S>>,
}

impl<S: TemplateSource> DictionaryIndexer<S> {
    /// Creates an indexer over an ordered dictionary list.
    pub fn new(dictionaries: Vec<Dictionary<S>>) -> DictIndexResult<Self> {
        if dictionaries.is_empty() {
            return Err(DictIndexError::InvalidInput(
                "at least one dictionary is required",
            ));
        }
        Ok(Self { dictionaries })
    }

    /// Creates an indexer over a single dictionary.
    pub fn single(dictionary: Dictionary<S>) -> Self {
        Self {
            dictionaries: vec![dictionary],
        }
    }

    /// Returns the dictionaries, in indexing order.
    pub fn dictionaries(&self) -> &[Dictionary<S>] {
        &self.dictionaries
    }

    /// Runs dictionary indexing and returns one result map per dictionary,
    /// in dictionary order, with the merged map (if requested and more than
    /// one dictionary was given) appended last.
    pub fn index(
        &self,
        patterns: &ImageStack<'_>,
        calibration: &NavCalibration,
        config: &IndexingConfig,
    ) -> DictIndexResult<Vec<ResultMap>> {
        let _span = trace_span!(
            "dictionary_indexing",
            dictionaries = self.dictionaries.len(),
            nav_len = patterns.nav_len(),
        )
        .entered();

        let metric = config.metric.resolve()?;
        let keep_n = self
            .dictionaries
            .iter()
            .map(Dictionary::len)
            .chain([config.keep_n])
            .min()
            .unwrap_or(config.keep_n);

        let max_size = self
            .dictionaries
            .iter()
            .map(Dictionary::len)
            .max()
            .unwrap_or(0);
        config.guard.check(max_size, config.n_slices)?;

        let match_config = MatchConfig {
            keep_n,
            n_slices: config.n_slices,
        };
        let (x, y) = calibration.spatial_arrays(patterns.nav());

        let mut maps = Vec::with_capacity(self.dictionaries.len() + 1);
        for dictionary in &self.dictionaries {
            let result = MatchPlan::new(
                patterns,
                dictionary.templates(),
                metric.clone(),
                &match_config,
            )?
            .evaluate()?;
            trace_event!("dictionary_indexed", templates = dictionary.len());

            let orientations = result
                .simulation_indices()
                .iter()
                .map(|&i| dictionary.orientations()[i])
                .collect();
            let map = ResultMap::new(
                result.nav(),
                result.keep_n(),
                orientations,
                dictionary.phase().clone(),
                result.scores().to_vec(),
                result.simulation_indices().to_vec(),
            )?
            .with_coordinates(x.clone(), y.clone(), calibration.scan_unit.clone());
            maps.push(map);
        }

        if config.return_merged && maps.len() > 1 {
            let merged = merge_maps(&maps, metric.greater_is_better())?;
            maps.push(merged);
        }

        if config.compute_similarity_map {
            for map in &mut maps {
                let osm = orientation_similarity_map(map, &config.osm)?;
                map.set_osm(osm)?;
            }
        }

        Ok(maps)
    }
}

#[cfg(test)]
mod tests {
    use super::{ComputeGuard, GuardPolicy};
    use crate::util::DictIndexError;
    use std::sync::Arc;

    #[test]
    fn guard_allows_runs_within_the_limit() {
        let guard = ComputeGuard {
            max_templates_per_slice: 100,
            policy: GuardPolicy::Abort,
        };
        assert!(guard.check(100, 1).is_ok());
        assert!(guard.check(1000, 10).is_ok());
    }

    #[test]
    fn guard_abort_reports_a_suggested_slice_count() {
        let guard = ComputeGuard {
            max_templates_per_slice: 100,
            policy: GuardPolicy::Abort,
        };
        let err = guard.check(1000, 2).err().unwrap();
        assert_eq!(
            err,
            DictIndexError::ComputationRefused {
                templates_per_slice: 500,
                limit: 100,
                suggested_n_slices: 10,
            }
        );
    }

    #[test]
    fn guard_consults_the_confirmation_callback() {
        let allow = ComputeGuard {
            max_templates_per_slice: 10,
            policy: GuardPolicy::Confirm(Arc::new(|_| true)),
        };
        assert!(allow.check(100, 1).is_ok());

        let refuse = ComputeGuard {
            max_templates_per_slice: 10,
            policy: GuardPolicy::Confirm(Arc::new(|per_slice| per_slice < 50)),
        };
        assert!(refuse.check(100, 1).is_err());
        assert!(refuse.check(100, 4).is_ok());
    }

    #[test]
    fn guard_proceed_never_refuses() {
        let guard = ComputeGuard {
            max_templates_per_slice: 1,
            policy: GuardPolicy::Proceed,
        };
        assert!(guard.check(1_000_000, 1).is_ok());
    }
}
