//! Named tabular datasets and the historical/recent split.

use arrow::array::{Array, ArrayRef, AsArray, UInt32Array};
use arrow::compute::{cast, concat_batches, take_record_batch};
use arrow::datatypes::{DataType, Float64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use rand::Rng;
use tracing::{debug, instrument};

use crate::error::{DriftError, Result};

/// A named, immutable Arrow record batch.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    batch: RecordBatch,
}

impl Dataset {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Concatenates batches sharing `schema` into one dataset.
    pub fn from_batches(
        name: impl Into<String>,
        schema: SchemaRef,
        batches: &[RecordBatch],
    ) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self::new(name, batch))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Looks up a column by name.
    pub fn column(&self, column: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(column)
            .ok_or_else(|| DriftError::column_not_found(column, &self.name))
    }

    /// Non-null, non-NaN values of a numeric column as `f64`.
    pub fn numeric_values(&self, column: &str) -> Result<Vec<f64>> {
        Ok(self
            .numeric_series(column)?
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect())
    }

    /// One `f64` per row of a numeric column, with nulls as NaN.
    pub fn numeric_series(&self, column: &str) -> Result<Vec<f64>> {
        let array = self.column(column)?;
        if !array.data_type().is_numeric() {
            return Err(DriftError::TypeMismatch {
                column: column.to_string(),
                expected: "numeric".to_string(),
                found: array.data_type().to_string(),
            });
        }

        let floats = cast(array, &DataType::Float64)?;
        Ok(floats
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Values of any column rendered as strings, nulls preserved as `None`.
    pub fn categorical_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        let array = self.column(column)?;
        let strings = cast(array, &DataType::Utf8)?;
        Ok(strings
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Randomly partitions the rows into a historical and a recent slice.
    ///
    /// `round(fraction * n)` rows are sampled without replacement into the
    /// historical slice; the rest form the recent slice. Both slices keep
    /// the source row order.
    #[instrument(skip(self, rng), fields(dataset = %self.name, rows = self.num_rows()))]
    pub fn split<R: Rng + ?Sized>(&self, fraction: f64, rng: &mut R) -> Result<(Dataset, Dataset)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(DriftError::Configuration(format!(
                "historical fraction must be within [0, 1], got {fraction}"
            )));
        }

        let rows = self.num_rows();
        let amount = ((fraction * rows as f64).round() as usize).min(rows);

        let mut chosen = vec![false; rows];
        for idx in rand::seq::index::sample(rng, rows, amount).into_iter() {
            chosen[idx] = true;
        }

        let (historical, recent): (Vec<u32>, Vec<u32>) =
            (0..rows as u32).partition(|&idx| chosen[idx as usize]);

        debug!(
            historical = historical.len(),
            recent = recent.len(),
            "split dataset"
        );

        Ok((
            self.take(format!("{}/historical", self.name), historical)?,
            self.take(format!("{}/recent", self.name), recent)?,
        ))
    }

    fn take(&self, name: String, indices: Vec<u32>) -> Result<Dataset> {
        let indices = UInt32Array::from(indices);
        let batch = take_record_batch(&self.batch, &indices)?;
        Ok(Dataset::new(name, batch))
    }
}
