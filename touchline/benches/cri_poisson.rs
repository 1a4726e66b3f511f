use criterion::{criterion_group, criterion_main, Criterion};

use touchline::poisson;

fn criterion_benchmark(c: &mut Criterion) {
    // sanity check
    let mut masses = [0.0; 8];
    poisson::fill_masses(1.5, &mut masses);
    assert!((masses[1] - poisson::univariate(1, 1.5)).abs() < 1e-12);

    c.bench_function("cri_poisson_univariate_8", |b| {
        b.iter(|| (0..8).map(|k| poisson::univariate(k, 1.5)).sum::<f64>());
    });

    fn bench<const C: usize>(c: &mut Criterion) {
        c.bench_function(&format!("cri_poisson_fill_masses_{C}"), |b| {
            let mut masses = [0.0; C];
            b.iter(|| {
                poisson::fill_masses(1.5, &mut masses);
                masses[C - 1]
            });
        });
    }
    bench::<8>(c);
    bench::<16>(c);
    bench::<32>(c);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
