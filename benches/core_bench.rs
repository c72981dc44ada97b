//! Criterion micro-benchmarks for the hot paths.
//!
//! Benchmarks:
//! - Page cache fetch (warm hit path)
//! - Full table scan through the cache
//! - Eviction churn with a one-page cache
//! - Grouped aggregation pipeline
//! - Histogram ingest and selectivity estimation

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use tempfile::TempDir;

use minnowdb::db::Database;
use minnowdb::exec::{Aggregate, AggregateOp, Operator, SeqScan};
use minnowdb::histogram::{CmpOp, IntHistogram};
use minnowdb::tuple::{Field, Tuple};
use minnowdb::{AccessMode, PageId, TableId, TransactionId};

fn criterion_config() -> Criterion {
    Criterion::default().configure_from_args()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Database with a seeded `nums (g int, v int)` table of `rows` rows.
fn seeded_db(capacity: usize, rows: i64) -> (TempDir, Database, TableId) {
    let dir = TempDir::new().unwrap();
    let schema_path = dir.path().join("schema.txt");
    std::fs::write(&schema_path, "nums (g int, v int)\n").unwrap();

    let db = Database::with_cache_capacity(capacity);
    db.load_schema(&schema_path).unwrap();

    let table = db.catalog().table_id("nums").unwrap();
    let schema = db.catalog().schema(table).unwrap();
    let tx = TransactionId::new();
    for i in 0..rows {
        let tuple = Tuple::new(
            Arc::clone(&schema),
            vec![Field::Int(i % 16), Field::Int(i)],
        )
        .unwrap();
        db.cache().insert_tuple(tx, table, tuple).unwrap();
    }
    db.flush_all().unwrap();

    (dir, db, table)
}

fn drain_rows<O: Operator>(mut op: O) -> usize {
    op.open().unwrap();
    let mut count = 0;
    while op.has_next().unwrap() {
        black_box(op.next().unwrap());
        count += 1;
    }
    op.close();
    count
}

// ---------------------------------------------------------------------------
// Page cache benchmarks
// ---------------------------------------------------------------------------

/// Benchmark: fetch an already-cached page (pure hit path).
fn bench_cached_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache/fetch_hit");
    group.throughput(Throughput::Elements(1));

    group.bench_function("warm", |b| {
        let (_dir, db, table) = seeded_db(50, 2000);
        let pid = PageId::new(table, 0);
        db.cache().fetch(pid, AccessMode::ReadOnly).unwrap();

        b.iter(|| {
            let handle = db.cache().fetch(black_box(pid), AccessMode::ReadOnly);
            black_box(handle).unwrap();
        });
    });

    group.finish();
}

/// Benchmark: scan a multi-page table with a cache large enough to keep it
/// resident after the first pass.
fn bench_scan_throughput(c: &mut Criterion) {
    const ROWS: i64 = 2000;

    let mut group = c.benchmark_group("cache/scan");
    group.throughput(Throughput::Elements(ROWS as u64));

    group.bench_function("resident_table", |b| {
        let (_dir, db, table) = seeded_db(50, ROWS);
        b.iter(|| {
            let scan = SeqScan::new(&db, table, "n").unwrap();
            assert_eq!(drain_rows(scan), ROWS as usize);
        });
    });

    group.finish();
}

/// Benchmark: alternate between two pages with room for only one, so every
/// fetch is a miss that evicts the other page.
fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache/eviction_churn");
    group.sample_size(50);
    group.throughput(Throughput::Elements(2));

    group.bench_function("two_pages_one_slot", |b| {
        let (_dir, db, table) = seeded_db(1, 600);
        let first = PageId::new(table, 0);
        let second = PageId::new(table, 1);

        b.iter(|| {
            black_box(db.cache().fetch(first, AccessMode::ReadOnly)).unwrap();
            black_box(db.cache().fetch(second, AccessMode::ReadOnly)).unwrap();
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Operator benchmarks
// ---------------------------------------------------------------------------

/// Benchmark: grouped SUM over a resident multi-page table.
fn bench_grouped_aggregate(c: &mut Criterion) {
    const ROWS: i64 = 2000;

    let mut group = c.benchmark_group("exec/grouped_sum");
    group.throughput(Throughput::Elements(ROWS as u64));

    group.bench_function("sixteen_groups", |b| {
        let (_dir, db, table) = seeded_db(50, ROWS);
        b.iter(|| {
            let scan = SeqScan::new(&db, table, "n").unwrap();
            let agg = Aggregate::new(scan, 1, Some(0), AggregateOp::Sum).unwrap();
            assert_eq!(drain_rows(agg), 16);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Histogram benchmarks
// ---------------------------------------------------------------------------

/// Benchmark: ingest values into a fresh histogram.
fn bench_histogram_ingest(c: &mut Criterion) {
    const VALUES: i64 = 10_000;

    let mut group = c.benchmark_group("histogram/ingest");
    group.throughput(Throughput::Elements(VALUES as u64));

    group.bench_function("ten_thousand", |b| {
        b.iter_batched(
            || IntHistogram::new(100, 0, VALUES - 1),
            |mut hist| {
                for i in 0..VALUES {
                    hist.add_value((i * 7919) % VALUES);
                }
                black_box(hist.total());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark: selectivity estimates over a populated histogram.
fn bench_histogram_estimate(c: &mut Criterion) {
    const PROBES: i64 = 100;

    let mut group = c.benchmark_group("histogram/estimate");
    group.throughput(Throughput::Elements(PROBES as u64));

    let mut hist = IntHistogram::new(100, 0, 9999);
    for i in 0..10_000 {
        hist.add_value((i * 7919) % 10_000);
    }

    group.bench_function("gt_sweep", |b| {
        b.iter(|| {
            for probe in 0..PROBES {
                black_box(hist.estimate_selectivity(CmpOp::Gt, black_box(probe * 100)));
            }
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups
// ---------------------------------------------------------------------------

criterion_group!(
    name = cache;
    config = criterion_config();
    targets =
        bench_cached_fetch,
        bench_scan_throughput,
        bench_eviction_churn
);

criterion_group!(
    name = operators;
    config = criterion_config();
    targets =
        bench_grouped_aggregate
);

criterion_group!(
    name = histogram;
    config = criterion_config();
    targets =
        bench_histogram_ingest,
        bench_histogram_estimate
);

criterion_main!(cache, operators, histogram);
