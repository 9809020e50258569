use criterion::Criterion;
use epi_sft::expected::TheoreticalDistribution;
use epi_sft::loaders::ObservedSeries;
use epi_sft::parameters::DistributionSpec;
use epi_sft::stats::{anderson_darling_test, ks_one_sample_test, ks_two_sample_test};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

pub fn comparator_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats::comparators");
    let dist = TheoreticalDistribution::from_spec(DistributionSpec::Exponential { rate: 0.02 })
        .expect("Valid exponential parameters");
    let mut rng = StdRng::seed_from_u64(42);
    let observed = ObservedSeries::new(
        "durations",
        dist.sample(5000, &mut rng).expect("Valid sampler"),
    );
    let reference = dist.sample(5000, &mut rng).expect("Valid sampler");

    // One-sample KS against the theoretical CDF at the common sample size
    group.bench_function("ks_one_sample_5k", |b| {
        b.iter(|| {
            black_box(ks_one_sample_test(black_box(&observed), &dist, 0.05));
        });
    });

    // Two-sample KS against a generated reference draw
    group.bench_function("ks_two_sample_5k", |b| {
        b.iter(|| {
            black_box(ks_two_sample_test(
                black_box(&observed),
                black_box(&reference),
                0.05,
            ));
        });
    });

    // Anderson-Darling is quadratic in the pooled unique values; bench a
    // smaller size that matches the noisier tests in practice
    let small_observed = ObservedSeries::new(
        "durations",
        dist.sample(500, &mut rng).expect("Valid sampler"),
    );
    let small_reference = dist.sample(500, &mut rng).expect("Valid sampler");
    group.bench_function("anderson_darling_500", |b| {
        b.iter(|| {
            black_box(anderson_darling_test(
                black_box(&small_observed),
                black_box(&small_reference),
                0.05,
            ));
        });
    });

    group.finish();
}
