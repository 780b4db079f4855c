use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use drift_guard::dataset::Dataset;
use drift_guard::detectors::{Detector, DetectorParams, DriftDetector, DriftMethod};
use drift_guard::stats::{chi2_contingency, ks_2samp, ContingencyTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn dataset(name: &str, rows: usize, shift: f64, rng: &mut StdRng) -> Arc<Dataset> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("amount", DataType::Float64, false),
        Field::new("channel", DataType::Utf8, false),
    ]));
    let amounts: Vec<f64> = (0..rows).map(|_| rng.random::<f64>() * 100.0 + shift).collect();
    let channels: Vec<&str> = (0..rows)
        .map(|_| ["web", "store", "phone", "partner"][rng.random_range(0..4)])
        .collect();
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(amounts)) as ArrayRef,
            Arc::new(StringArray::from(channels)) as ArrayRef,
        ],
    )
    .unwrap();
    Arc::new(Dataset::new(name, batch))
}

fn benchmark_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_drift");
    let params = DetectorParams::default();

    for rows in [1_000, 10_000, 100_000] {
        let mut rng = StdRng::seed_from_u64(42);
        let historical = dataset("historical", rows, 0.0, &mut rng);
        let recent = dataset("recent", rows / 4, 5.0, &mut rng);
        group.throughput(Throughput::Elements(rows as u64));

        for method in DriftMethod::ALL {
            let column = if method.is_categorical() { "channel" } else { "amount" };
            let detector = Detector::new(method, historical.clone(), recent.clone(), &params);
            group.bench_with_input(
                BenchmarkId::new(method.as_str(), rows),
                &column,
                |b, &column| {
                    b.iter(|| detector.detect_drift(std::hint::black_box(column)).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn benchmark_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");
    let mut rng = StdRng::seed_from_u64(7);
    let a: Vec<f64> = (0..50_000).map(|_| rng.random()).collect();
    let b: Vec<f64> = (0..50_000).map(|_| rng.random::<f64>() + 0.01).collect();

    group.bench_function("ks_2samp_50k", |bench| {
        bench.iter(|| ks_2samp(std::hint::black_box(&a), std::hint::black_box(&b)));
    });

    let labels = ["a", "b", "c", "d", "e"];
    let pairs: Vec<(&str, &str)> = (0..50_000)
        .map(|_| (labels[rng.random_range(0..5)], labels[rng.random_range(0..5)]))
        .collect();
    group.bench_function("contingency_50k", |bench| {
        bench.iter(|| {
            let table = ContingencyTable::from_pairs(pairs.iter().copied());
            chi2_contingency(&table)
        });
    });

    group.finish();
}

fn benchmark_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let mut rng = StdRng::seed_from_u64(1);
    let data = dataset("orders", 100_000, 0.0, &mut rng);

    group.throughput(Throughput::Elements(100_000));
    group.bench_function("split_100k", |b| {
        let mut rng = StdRng::seed_from_u64(2);
        b.iter(|| data.split(0.8, &mut rng).unwrap());
    });

    group.finish();
}

criterion_group!(benches, benchmark_detectors, benchmark_primitives, benchmark_split);
criterion_main!(benches);
