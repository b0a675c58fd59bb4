//! Transaction manager benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use replidb_bench::utils::{generate_script, Workload};
use replidb_core::{LockMode, LockTable, TransactionId, TransactionManager, VariableId};

/// Benchmark whole scripts with more transactions in flight.
fn bench_concurrency(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrency");

    for concurrency in [1, 4, 16, 64].iter() {
        let workload = Workload {
            concurrency: *concurrency,
            ticks: 500,
            ..Workload::default()
        };
        let script = generate_script(&workload, 42);

        group.throughput(Throughput::Elements(workload.ticks as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &script,
            |b, script| {
                b.iter(|| {
                    let mut tm = TransactionManager::default();
                    for batch in script {
                        black_box(tm.step(batch.iter().cloned()));
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark contention: fewer hot variables means more waiting and dying.
fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    for hot in [2_u32, 5, 20].iter() {
        let workload = Workload {
            concurrency: 16,
            ticks: 500,
            hot_variables: *hot,
            ..Workload::default()
        };
        let script = generate_script(&workload, 42);

        group.throughput(Throughput::Elements(workload.ticks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(hot), &script, |b, script| {
            b.iter(|| {
                let mut tm = TransactionManager::default();
                for batch in script {
                    black_box(tm.step(batch.iter().cloned()));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark scripts with sites failing and recovering.
fn bench_failures(c: &mut Criterion) {
    let mut group = c.benchmark_group("failures");

    for percent in [0_u32, 5, 20].iter() {
        let workload = Workload {
            concurrency: 8,
            ticks: 500,
            failure_percent: *percent,
            ..Workload::default()
        };
        let script = generate_script(&workload, 42);

        group.bench_with_input(BenchmarkId::from_parameter(percent), &script, |b, script| {
            b.iter(|| {
                let mut tm = TransactionManager::default();
                for batch in script {
                    black_box(tm.step(batch.iter().cloned()));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark lock acquisition and release on one table.
fn bench_lock_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_table");

    for holders in [10, 100, 1000].iter() {
        let txs: Vec<TransactionId> = (0..*holders)
            .map(|i| TransactionId::new(format!("T{i}")))
            .collect();

        group.throughput(Throughput::Elements(*holders as u64));
        group.bench_with_input(BenchmarkId::from_parameter(holders), &txs, |b, txs| {
            b.iter(|| {
                let mut table = LockTable::new();
                for (i, tx) in txs.iter().enumerate() {
                    let var = VariableId::new((i % 20) as u32 + 1);
                    if table.can_acquire(tx, var, LockMode::Read) {
                        table.acquire(tx, var, LockMode::Read);
                    }
                }
                for tx in txs {
                    table.release_all(tx);
                }
                black_box(table.is_empty());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_concurrency,
    bench_contention,
    bench_failures,
    bench_lock_table
);
criterion_main!(benches);
