//! Benchmarks for the boundary-layer flow solver

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dunestrat_algorithms::flow::{solve_hydro_coefficients, FlowParameters, SolverParams};

fn bench_hydro_coefficients(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydro_coefficients");
    group.sample_size(20);

    let cases = [
        ("neutral", FlowParameters::new(2.0, 1e-3, f64::INFINITY, 1.0)),
        ("stratified", FlowParameters::new(1.0, 1e-3, 2.0, 0.5)),
        ("shallow", FlowParameters::new(0.3, 1e-3, 0.5, 2.0)),
    ];

    for (name, params) in cases.iter() {
        for parallel in [false, true] {
            let solver = SolverParams {
                parallel_branches: parallel,
                ..Default::default()
            };
            let id = BenchmarkId::new(*name, if parallel { "parallel" } else { "sequential" });
            group.bench_with_input(id, params, |b, p| {
                b.iter(|| solve_hydro_coefficients(black_box(p), &solver).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_tolerance(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver_tolerance");
    group.sample_size(20);
    let params = FlowParameters::new(1.0, 1e-3, 2.0, 0.5);

    for tol in [1e-6, 1e-8, 1e-10].iter() {
        let solver = SolverParams {
            atol: *tol,
            rtol: *tol,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(tol), tol, |b, _| {
            b.iter(|| solve_hydro_coefficients(black_box(&params), &solver).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hydro_coefficients, bench_tolerance);
criterion_main!(benches);
