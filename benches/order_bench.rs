// Benchmarks for order resolution and merging.
//
// Every replica mutation re-resolves the whole log, so typing n values
// costs n resolutions. Sizes stay small for the pairwise resolver.

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use weave::crdt::PositionEnv;
use weave::crdt::Replica;
use weave::crdt::merge_states;
use weave::crdt::position::FractionEnv;
use weave::crdt::position::LeftEnv;
use weave::crdt::position::LeftRightEnv;

// =============================================================================
// Benchmark Helpers
// =============================================================================

/// Type `count` values at random visible positions.
fn random_typing<E: PositionEnv>(replica: &mut Replica<E, u8>, count: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for i in 0..count {
        let len = replica.len();
        let index = if len == 0 { 0 } else { rng.gen_range(0..=len) };
        replica.insert(index, b'a' + (i % 26) as u8).unwrap();
    }
}

fn typed<E: PositionEnv>(env: E, count: usize, seed: u64) -> Replica<E, u8> {
    let mut replica = Replica::new(env);
    random_typing(&mut replica, count, seed);
    return replica;
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_typing");

    for size in [50, 200] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("LeftRight", size), &size, |b, &size| {
            b.iter(|| black_box(typed(LeftRightEnv::new("r"), size, 1).len()));
        });

        group.bench_with_input(BenchmarkId::new("Left", size), &size, |b, &size| {
            b.iter(|| black_box(typed(LeftEnv::new("r"), size, 1).len()));
        });

        group.bench_with_input(BenchmarkId::new("Fraction", size), &size, |b, &size| {
            b.iter(|| black_box(typed(FractionEnv::with_seed("r", 1), size, 1).len()));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [100, 400] {
        group.throughput(Throughput::Elements(size as u64));

        let replica = typed(LeftRightEnv::new("r"), size, 2);
        group.bench_with_input(BenchmarkId::new("LeftRight", size), &replica, |b, replica| {
            b.iter(|| black_box(replica.env().order(replica.state()).unwrap()));
        });

        let replica = typed(FractionEnv::with_seed("r", 2), size, 2);
        group.bench_with_input(BenchmarkId::new("Fraction", size), &replica, |b, replica| {
            b.iter(|| black_box(replica.env().order(replica.state()).unwrap()));
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 400] {
        group.throughput(Throughput::Elements(2 * size as u64));

        let r = typed(LeftRightEnv::new("r"), size, 3);
        let s = typed(LeftRightEnv::new("s"), size, 4);
        group.bench_with_input(BenchmarkId::new("LeftRight", size), &(r, s), |b, (r, s)| {
            b.iter(|| black_box(merge_states(r.env(), [r.state(), s.state()]).unwrap().len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_typing, bench_resolve, bench_merge);
criterion_main!(benches);
