//! Criterion benchmarks for the search hot loops.
//!
//! Run with: `cargo bench -p levellab-runner`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use levellab_core::data::{SyntheticShape, SyntheticSource};
use levellab_core::domain::LevelParams;
use levellab_core::objective::{Objective, PipelineConfig};
use levellab_runner::{GeneticConfig, GeneticSearch, GridSweep, IntRange, ParamSpace};

fn bars(n: usize) -> Vec<levellab_core::domain::PriceBar> {
    SyntheticSource::new(SyntheticShape::default(), n, 42).generate("BENCH")
}

/// One objective evaluation at increasing series lengths.
fn bench_objective(c: &mut Criterion) {
    let mut group = c.benchmark_group("objective_score");
    let objective = Objective::new(PipelineConfig::default());

    for size in [500, 2_000, 10_000].iter() {
        let bars = bars(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| objective.score(black_box(&bars), LevelParams::new(20, 1)));
        });
    }

    group.finish();
}

fn bench_grid_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_sweep");
    let objective = Objective::new(PipelineConfig::default());
    let bars = bars(2_000);
    let space = ParamSpace::new(IntRange::new(5, 50), IntRange::new(0, 4));

    for parallel in [false, true] {
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "sequential" }),
            &parallel,
            |b, &parallel| {
                b.iter(|| {
                    GridSweep::new(&objective)
                        .with_parallelism(parallel)
                        .sweep(black_box(&bars), &space)
                });
            },
        );
    }

    group.finish();
}

fn bench_genetic(c: &mut Criterion) {
    let objective = Objective::new(PipelineConfig::default());
    let bars = bars(2_000);
    let space = ParamSpace::new(IntRange::new(5, 50), IntRange::new(0, 4));

    c.bench_function("genetic_default", |b| {
        b.iter(|| {
            GeneticSearch::new(&objective, GeneticConfig::default()).run(black_box(&bars), &space)
        });
    });
}

criterion_group!(benches, bench_objective, bench_grid_sweep, bench_genetic);
criterion_main!(benches);
