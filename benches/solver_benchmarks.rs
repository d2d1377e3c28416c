use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use satis::{Domain, Predicate, Problem};

fn n_queens_problem(n: usize) -> Problem {
    let names: Vec<String> = (1..=n).map(|i| format!("Q{i}")).collect();
    let vars: Vec<&str> = names.iter().map(String::as_str).collect();

    let mut problem = Problem::new();
    problem
        .add_variables(&vars, Domain::int_range(1, n as i64))
        .unwrap();
    problem.add_all_different(&vars).unwrap();

    for i in 0..n {
        for j in (i + 1)..n {
            let gap = (j - i) as f64;
            problem
                .add_constraint(
                    &[vars[i], vars[j]],
                    Predicate::binary(move |a, b| match (a.as_num(), b.as_num()) {
                        (Some(x), Some(y)) => (x - y).abs() != gap,
                        _ => false,
                    }),
                )
                .unwrap();
        }
    }
    problem
}

fn map_colouring_problem() -> Problem {
    let regions = ["WA", "NT", "SA", "Q", "NSW", "V", "T"];
    let adjacent = [
        ("WA", "NT"),
        ("WA", "SA"),
        ("NT", "SA"),
        ("NT", "Q"),
        ("SA", "Q"),
        ("SA", "NSW"),
        ("SA", "V"),
        ("Q", "NSW"),
        ("NSW", "V"),
    ];
    let mut problem = Problem::new();
    problem
        .add_variables(&regions, Domain::symbols(["red", "green", "blue"]))
        .unwrap();
    for (a, b) in adjacent {
        problem.add_all_different(&[a, b]).unwrap();
    }
    problem
}

fn n_queens_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("N-Queens");
    for n in [6, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let problem = n_queens_problem(n);
            b.iter(|| {
                let solution = black_box(&problem).solve();
                assert!(solution.is_some());
            });
        });
    }
    group.finish();
}

fn enumeration_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Map Colouring");

    let problem = map_colouring_problem();
    group.bench_function("count all colourings", |b| {
        b.iter(|| {
            let count = black_box(&problem).count_solutions();
            assert_eq!(count, 18);
        });
    });

    group.bench_function("first solution", |b| {
        b.iter(|| {
            let solution = black_box(&problem).solve();
            assert!(solution.is_some());
        });
    });

    group.finish();
}

fn min_conflicts_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Min-Conflicts");
    let problem = n_queens_problem(8);
    group.bench_function("8-queens, seeded", |b| {
        b.iter(|| {
            let _ = black_box(&problem).solve_with_min_conflicts_seeded(1000, 17);
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    n_queens_benchmark,
    enumeration_benchmark,
    min_conflicts_benchmark
);
criterion_main!(benches);
