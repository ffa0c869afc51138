//! Built-in similarity metrics and the name registry.
//!
//! Both built-ins score every navigation/template pair in one batched pass.
//! Pairs with a degenerate denominator (zero variance for zncc, zero norm
//! for ndp) score 0.0 so the ranking order stays total.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::metric::{MetricKernel, MetricScope, SimilarityMetric};
use crate::stack::ImageStack;
use crate::util::{DictIndexError, DictIndexResult};

/// Names recognized by the built-in registry.
pub const METRIC_NAMES: &[&str] = &["ndp", "zncc"];

const MIN_DENOM: f32 = 1e-8;

fn zncc_kernel(patterns: &ImageStack<'_>, templates: &ImageStack<'_>) -> Vec<f32> {
    let d = patterns.pixels();
    let d_f = d as f32;
    let p = patterns.images();
    let t = templates.images();
    let np = patterns.nav_len();
    let nt = templates.nav_len();

    // Per-vector mean and centered L2 norm, one pass each.
    let stats = |data: &[f32], n: usize| -> Vec<(f32, f32)> {
        (0..n)
            .map(|i| {
                let v = &data[i * d..(i + 1) * d];
                let mut sum = 0.0f32;
                let mut sum_sq = 0.0f32;
                for &x in v {
                    sum += x;
                    sum_sq += x * x;
                }
                let mean = sum / d_f;
                let centered = (sum_sq - d_f * mean * mean).max(0.0).sqrt();
                (mean, centered)
            })
            .collect()
    };
    let p_stats = stats(p, np);
    let t_stats = stats(t, nt);

    let mut out = vec![0.0f32; np * nt];
    for (i, &(mp, cp)) in p_stats.iter().enumerate() {
        let pv = &p[i * d..(i + 1) * d];
        for (j, &(mt, ct)) in t_stats.iter().enumerate() {
            let tv = &t[j * d..(j + 1) * d];
            let mut dot = 0.0f32;
            for k in 0..d {
                dot += pv[k] * tv[k];
            }
            let denom = cp * ct;
            if denom > MIN_DENOM {
                out[i * nt + j] = (dot - d_f * mp * mt) / denom;
            }
        }
    }
    out
}

fn ndp_kernel(patterns: &ImageStack<'_>, templates: &ImageStack<'_>) -> Vec<f32> {
    let d = patterns.pixels();
    let p = patterns.images();
    let t = templates.images();
    let np = patterns.nav_len();
    let nt = templates.nav_len();

    let norms = |data: &[f32], n: usize| -> Vec<f32> {
        (0..n)
            .map(|i| {
                let v = &data[i * d..(i + 1) * d];
                v.iter().map(|x| x * x).sum::<f32>().sqrt()
            })
            .collect()
    };
    let p_norms = norms(p, np);
    let t_norms = norms(t, nt);

    let mut out = vec![0.0f32; np * nt];
    for (i, &pn) in p_norms.iter().enumerate() {
        let pv = &p[i * d..(i + 1) * d];
        for (j, &tn) in t_norms.iter().enumerate() {
            let tv = &t[j * d..(j + 1) * d];
            let mut dot = 0.0f32;
            for k in 0..d {
                dot += pv[k] * tv[k];
            }
            let denom = pn * tn;
            if denom > MIN_DENOM {
                out[i * nt + j] = dot / denom;
            }
        }
    }
    out
}

/// Normalized cross-correlation: mean-subtracted inner product over the
/// product of centered norms, one scalar in [-1, 1] per pair.
pub fn zncc() -> SimilarityMetric {
    SimilarityMetric::new(
        "zncc",
        MetricKernel::Image(Arc::new(zncc_kernel)),
        MetricScope::ManyToMany,
        true,
        true,
    )
}

/// Normalized dot product: inner product over the product of plain norms,
/// in [0, 1] for non-negative inputs.
pub fn ndp() -> SimilarityMetric {
    SimilarityMetric::new(
        "ndp",
        MetricKernel::Image(Arc::new(ndp_kernel)),
        MetricScope::ManyToMany,
        true,
        true,
    )
}

fn registry() -> &'static BTreeMap<&'static str, SimilarityMetric> {
    static REGISTRY: OnceLock<BTreeMap<&'static str, SimilarityMetric>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = BTreeMap::new();
        map.insert("zncc", zncc());
        map.insert("ndp", ndp());
        map
    })
}

/// Looks up a built-in metric by name.
pub fn metric_by_name(name: &str) -> DictIndexResult<SimilarityMetric> {
    registry()
        .get(name)
        .cloned()
        .ok_or_else(|| DictIndexError::UnknownMetric {
            name: name.to_string(),
            known: METRIC_NAMES,
        })
}
