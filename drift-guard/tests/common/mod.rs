//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::Rng;

/// Draws `n` values from Normal(`mean`, `std`) with the Box-Muller transform.
pub fn normal_samples(rng: &mut StdRng, n: usize, mean: f64, std: f64) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let u1: f64 = 1.0 - rng.random::<f64>();
            let u2: f64 = rng.random();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + std * z
        })
        .collect()
}

/// Picks `n` labels uniformly from `labels`.
pub fn categorical_samples(rng: &mut StdRng, n: usize, labels: &[&'static str]) -> Vec<&'static str> {
    (0..n)
        .map(|_| labels[rng.random_range(0..labels.len())])
        .collect()
}

/// Single `Float64` column batch.
pub fn numeric_batch(column: &str, values: Vec<f64>) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new(column, DataType::Float64, false)]));
    RecordBatch::try_new(schema, vec![Arc::new(Float64Array::from(values)) as ArrayRef]).unwrap()
}

/// Single `Utf8` column batch.
pub fn categorical_batch(column: &str, values: Vec<&str>) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new(column, DataType::Utf8, false)]));
    RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(values)) as ArrayRef]).unwrap()
}

/// Writes a CSV file with the given header and pre-rendered rows.
pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    writeln!(file, "{header}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    path
}

/// `orders.csv` with 1000 rows: the first 800 amounts from Normal(100, 10),
/// the last 200 from Normal(150, 10).
pub fn write_orders_csv(dir: &Path, rng: &mut StdRng) -> PathBuf {
    let mut amounts = normal_samples(rng, 800, 100.0, 10.0);
    amounts.extend(normal_samples(rng, 200, 150.0, 10.0));
    let channels = categorical_samples(rng, 1000, &["web", "store", "phone"]);
    let rows: Vec<String> = amounts
        .iter()
        .zip(&channels)
        .enumerate()
        .map(|(i, (amount, channel))| format!("{i},{amount:.4},{channel}"))
        .collect();
    write_csv(dir, "orders.csv", "order_id,amount,channel", &rows)
}
