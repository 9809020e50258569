use criterion::{criterion_group, criterion_main};

mod benchmarks;
use benchmarks::comparators::comparator_benchmarks;

criterion_group!(comparator_benches, comparator_benchmarks,);

criterion_main!(comparator_benches);
