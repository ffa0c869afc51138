use std::sync::Arc;

use dictindex::{
    match_templates, DictIndexError, ImageStack, MatchConfig, MetricKernel, MetricRef,
    MetricScope, NavShape, SimilarityMetric,
};

/// Four experimental patterns on a 2x2 navigation grid, 2x2 pixels each.
fn patterns() -> Vec<f32> {
    vec![
        1.0, 2.0, 3.0, 4.0, // nav (0, 0)
        5.0, 6.0, 7.0, 8.0, // nav (0, 1)
        9.0, 8.0, 1.0, 7.0, // nav (1, 0)
        5.0, 2.0, 2.0, 7.0, // nav (1, 1)
    ]
}

/// Five templates; template 1 is an exact copy of the pattern at flattened
/// navigation index 2.
fn templates() -> Vec<f32> {
    vec![
        5.0, 3.0, 2.0, 7.0, //
        9.0, 8.0, 1.0, 7.0, //
        10.0, 2.0, 5.0, 3.0, //
        8.0, 4.0, 6.0, 12.0, //
        43.0, 0.0, 5.0, 3.0, //
    ]
}

#[test]
fn zncc_places_the_identical_template_at_rank_zero() {
    let p = patterns();
    let t = templates();
    let pattern_stack =
        ImageStack::new(&p, NavShape::Grid { rows: 2, cols: 2 }, 2, 2).unwrap();
    let template_stack = ImageStack::new(&t, NavShape::Line(5), 2, 2).unwrap();

    let result = match_templates(
        &pattern_stack,
        &template_stack,
        &MetricRef::default(),
        &MatchConfig::default(),
    )
    .unwrap();

    assert_eq!(result.nav(), NavShape::Grid { rows: 2, cols: 2 });
    assert_eq!(result.keep_n(), 5); // clamped from the default 50
    let (best_idx, best_score) = result.best(2);
    assert_eq!(best_idx, 1);
    assert!((best_score - 1.0).abs() < 1e-6);
}

#[test]
fn results_are_invariant_to_the_slice_count() {
    let p = patterns();
    let t = templates();
    let pattern_stack =
        ImageStack::new(&p, NavShape::Grid { rows: 2, cols: 2 }, 2, 2).unwrap();
    let template_stack = ImageStack::new(&t, NavShape::Line(5), 2, 2).unwrap();

    let reference = match_templates(
        &pattern_stack,
        &template_stack,
        &MetricRef::default(),
        &MatchConfig {
            keep_n: 3,
            n_slices: 1,
        },
    )
    .unwrap();

    for n_slices in 2..=6 {
        let sliced = match_templates(
            &pattern_stack,
            &template_stack,
            &MetricRef::default(),
            &MatchConfig { keep_n: 3, n_slices },
        )
        .unwrap();
        assert_eq!(
            sliced.simulation_indices(),
            reference.simulation_indices(),
            "indices differ for n_slices={n_slices}"
        );
        for (a, b) in sliced.scores().iter().zip(reference.scores()) {
            assert!((a - b).abs() < 1e-6, "scores differ for n_slices={n_slices}");
        }
    }
}

#[test]
fn unrecognized_metric_name_fails_fast() {
    let p = patterns();
    let t = templates();
    let pattern_stack = ImageStack::single(&p[..4], 2, 2).unwrap();
    let template_stack = ImageStack::new(&t, NavShape::Line(5), 2, 2).unwrap();

    let err = match_templates(
        &pattern_stack,
        &template_stack,
        &MetricRef::from("not_recognized"),
        &MatchConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, DictIndexError::UnknownMetric { .. }));
    assert!(err.to_string().contains("zncc"));
}

#[test]
fn flat_lower_is_better_metric_ranks_ascending() {
    // Squared euclidean distance over flattened row vectors; the exact copy
    // scores 0 and must come first.
    let l2 = SimilarityMetric::new(
        "sqeuclidean",
        MetricKernel::Flat(Arc::new(|p, t| {
            let mut out = Vec::with_capacity(p.n_rows() * t.n_rows());
            for i in 0..p.n_rows() {
                let pv = p.row(i).unwrap();
                for j in 0..t.n_rows() {
                    let tv = t.row(j).unwrap();
                    out.push(
                        pv.iter()
                            .zip(tv)
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum::<f32>(),
                    );
                }
            }
            out
        })),
        MetricScope::ManyToMany,
        false,
        true,
    );

    let p = patterns();
    let t = templates();
    let pattern_stack =
        ImageStack::new(&p, NavShape::Grid { rows: 2, cols: 2 }, 2, 2).unwrap();
    let template_stack = ImageStack::new(&t, NavShape::Line(5), 2, 2).unwrap();

    let result = match_templates(
        &pattern_stack,
        &template_stack,
        &MetricRef::from(l2),
        &MatchConfig::default(),
    )
    .unwrap();
    let (best_idx, best_score) = result.best(2);
    assert_eq!(best_idx, 1);
    assert_eq!(best_score, 0.0);
    // Ranked ascending for a lower-is-better metric.
    let row = result.scores_at(2);
    assert!(row.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn single_pattern_against_a_dictionary_yields_one_row() {
    let p = patterns();
    let t = templates();
    let pattern_stack = ImageStack::single(&p[8..12], 2, 2).unwrap();
    let template_stack = ImageStack::new(&t, NavShape::Line(5), 2, 2).unwrap();

    let result = match_templates(
        &pattern_stack,
        &template_stack,
        &MetricRef::default(),
        &MatchConfig {
            keep_n: 2,
            n_slices: 2,
        },
    )
    .unwrap();
    assert_eq!(result.nav(), NavShape::Point);
    assert_eq!(result.simulation_indices().len(), 2);
    assert_eq!(result.best(0).0, 1);
}
