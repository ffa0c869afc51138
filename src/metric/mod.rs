//! Similarity metrics and their applicability scopes.
//!
//! A [`SimilarityMetric`] is an immutable record tying a scoring kernel to
//! its declared scope and ordering convention. Whether the kernel consumes
//! image-shaped stacks or pre-flattened row vectors is decided once at
//! construction through the closed [`MetricKernel`] variant, never inferred
//! from input shapes at call time.

mod builtin;

pub use builtin::{metric_by_name, ndp, zncc, METRIC_NAMES};

use std::fmt;
use std::sync::Arc;

use crate::stack::{ImageStack, MatrixView};
use crate::util::{DictIndexError, DictIndexResult};

/// Declared cardinality relationship a metric supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricScope {
    /// Single image vs single template.
    OneToOne,
    /// Single image vs a template batch.
    OneToMany,
    /// An image batch (navigation collapsed to one flat axis) vs a
    /// template batch.
    ManyToMany,
}

impl MetricScope {
    /// Expected (pattern, template) axes beyond the two image axes.
    pub(crate) fn expected_extra_axes(self) -> (usize, usize) {
        match self {
            Self::OneToOne => (0, 0),
            Self::OneToMany => (0, 1),
            Self::ManyToMany => (1, 1),
        }
    }

    /// Extra-axis pairs of the strictly lower scopes.
    fn reducible_extra_axes(self) -> &'static [(usize, usize)] {
        match self {
            Self::OneToOne => &[],
            Self::OneToMany => &[(0, 0)],
            Self::ManyToMany => &[(0, 1), (0, 0)],
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToMany => "many_to_many",
        }
    }
}

impl fmt::Display for MetricScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kernel over image-shaped stacks, returning a row-major
/// `n_patterns x n_templates` score matrix.
pub type ImageScoreFn =
    Arc<dyn Fn(&ImageStack<'_>, &ImageStack<'_>) -> Vec<f32> + Send + Sync>;

/// Kernel over pre-flattened row-vector matrices, same output contract.
pub type FlatScoreFn =
    Arc<dyn Fn(&MatrixView<'_>, &MatrixView<'_>) -> Vec<f32> + Send + Sync>;

/// Closed scoring-function variant, chosen once at metric construction.
#[derive(Clone)]
pub enum MetricKernel {
    /// Consumes native 2-D images.
    Image(ImageScoreFn),
    /// Consumes row vectors, one value per pixel.
    Flat(FlatScoreFn),
}

/// Typed, self-describing scoring function.
///
/// Instances are immutable; registry entries can be cloned and shared without
/// risking cross-call mutation of scope or ordering metadata.
#[derive(Clone)]
pub struct SimilarityMetric {
    name: String,
    kernel: MetricKernel,
    scope: MetricScope,
    greater_is_better: bool,
    allows_scope_reduction: bool,
}

impl SimilarityMetric {
    /// Creates a metric from a kernel and its declared behavior.
    pub fn new(
        name: impl Into<String>,
        kernel: MetricKernel,
        scope: MetricScope,
        greater_is_better: bool,
        allows_scope_reduction: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kernel,
            scope,
            greater_is_better,
            allows_scope_reduction,
        }
    }

    /// Returns the metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the scoring kernel.
    pub fn kernel(&self) -> &MetricKernel {
        &self.kernel
    }

    /// Returns the declared scope.
    pub fn scope(&self) -> MetricScope {
        self.scope
    }

    /// Returns true if higher scores rank first.
    pub fn greater_is_better(&self) -> bool {
        self.greater_is_better
    }

    /// Returns true if the kernel consumes pre-flattened row vectors.
    pub fn is_flat(&self) -> bool {
        matches!(self.kernel, MetricKernel::Flat(_))
    }

    /// Returns true if the metric also accepts lower-scope inputs.
    pub fn allows_scope_reduction(&self) -> bool {
        self.allows_scope_reduction
    }

    /// Checks whether the metric accepts the given extra-axis counts
    /// (axes beyond the two image axes on each side).
    ///
    /// Incompatibility is reported as `false`, never as an error; callers
    /// turn it into [`DictIndexError::IncompatibleScope`].
    pub fn is_compatible(&self, pattern_extra: usize, template_extra: usize) -> bool {
        let given = (pattern_extra, template_extra);
        if given == self.scope.expected_extra_axes() {
            return true;
        }
        self.allows_scope_reduction && self.scope.reducible_extra_axes().contains(&given)
    }

    pub(crate) fn incompatible_error(
        &self,
        pattern_extra: usize,
        template_extra: usize,
    ) -> DictIndexError {
        DictIndexError::IncompatibleScope {
            name: self.name.clone(),
            scope: self.scope.as_str(),
            pattern_extra,
            template_extra,
        }
    }
}

impl fmt::Debug for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityMetric")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("greater_is_better", &self.greater_is_better)
            .field("flat", &self.is_flat())
            .field("allows_scope_reduction", &self.allows_scope_reduction)
            .finish()
    }
}

/// A metric selected by registry name or supplied as an instance.
#[derive(Clone, Debug)]
pub enum MetricRef {
    /// Look the metric up in the built-in registry.
    Name(String),
    /// Use the given instance directly.
    Instance(SimilarityMetric),
}

impl MetricRef {
    /// Resolves to a concrete metric, failing on unrecognized names.
    pub fn resolve(&self) -> DictIndexResult<SimilarityMetric> {
        match self {
            Self::Name(name) => metric_by_name(name),
            Self::Instance(metric) => Ok(metric.clone()),
        }
    }
}

impl Default for MetricRef {
    fn default() -> Self {
        Self::Name("zncc".to_string())
    }
}

impl From<&str> for MetricRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<SimilarityMetric> for MetricRef {
    fn from(metric: SimilarityMetric) -> Self {
        Self::Instance(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricKernel, MetricScope, SimilarityMetric};
    use std::sync::Arc;

    fn dummy(scope: MetricScope, reducible: bool) -> SimilarityMetric {
        SimilarityMetric::new(
            "dummy",
            MetricKernel::Flat(Arc::new(|p, t| vec![0.0; p.n_rows() * t.n_rows()])),
            scope,
            true,
            reducible,
        )
    }

    #[test]
    fn exact_scope_pairs_are_compatible() {
        assert!(dummy(MetricScope::OneToOne, false).is_compatible(0, 0));
        assert!(dummy(MetricScope::OneToMany, false).is_compatible(0, 1));
        assert!(dummy(MetricScope::ManyToMany, false).is_compatible(1, 1));
    }

    #[test]
    fn non_reducible_metric_rejects_lower_scopes() {
        let m = dummy(MetricScope::ManyToMany, false);
        assert!(!m.is_compatible(0, 1));
        assert!(!m.is_compatible(0, 0));
    }

    #[test]
    fn reducible_metric_accepts_strictly_lower_scopes() {
        let m = dummy(MetricScope::ManyToMany, true);
        assert!(m.is_compatible(1, 1));
        assert!(m.is_compatible(0, 1));
        assert!(m.is_compatible(0, 0));

        let m = dummy(MetricScope::OneToMany, true);
        assert!(m.is_compatible(0, 0));
        assert!(!m.is_compatible(1, 1));
    }

    #[test]
    fn larger_than_scoped_inputs_are_rejected() {
        let m = dummy(MetricScope::OneToOne, false);
        assert!(!m.is_compatible(1, 1));
        let m = dummy(MetricScope::ManyToMany, true);
        assert!(!m.is_compatible(2, 1));
    }
}
