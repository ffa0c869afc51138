use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use dictindex::{match_templates, ImageStack, MatchConfig, MetricRef, NavShape};

fn make_stack_data(rng: &mut StdRng, n: usize, rows: usize, cols: usize) -> Vec<f32> {
    (0..n * rows * cols).map(|_| rng.random::<f32>()).collect()
}

fn bench_matcher(c: &mut Criterion) {
    let rows = 32;
    let cols = 32;
    let n_patterns = 16;
    let n_templates = 512;

    let mut rng = StdRng::seed_from_u64(7);
    let p = make_stack_data(&mut rng, n_patterns, rows, cols);
    let t = make_stack_data(&mut rng, n_templates, rows, cols);
    let patterns = ImageStack::new(&p, NavShape::Line(n_patterns), rows, cols).unwrap();
    let templates = ImageStack::new(&t, NavShape::Line(n_templates), rows, cols).unwrap();

    for (name, n_slices) in [("zncc_match_1_slice", 1usize), ("zncc_match_4_slices", 4)] {
        c.bench_function(name, |b| {
            b.iter(|| {
                black_box(
                    match_templates(
                        &patterns,
                        &templates,
                        &MetricRef::default(),
                        &MatchConfig {
                            keep_n: 20,
                            n_slices,
                        },
                    )
                    .unwrap(),
                )
            });
        });
    }

    c.bench_function("ndp_match_1_slice", |b| {
        b.iter(|| {
            black_box(
                match_templates(
                    &patterns,
                    &templates,
                    &MetricRef::from("ndp"),
                    &MatchConfig {
                        keep_n: 20,
                        n_slices: 1,
                    },
                )
                .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
