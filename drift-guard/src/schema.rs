//! Declarative table schemas and lazy validation.
//!
//! A [`TableSchema`] names the columns a table must carry, their logical
//! type, nullability and a list of [`ColumnCheck`] predicates. Validation
//! inspects every declared column and reports all violations at once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{cast, cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::dataset::Dataset;
use crate::error::{DriftError, Result};

/// Logical column types a schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    String,
    Bool,
    Datetime,
}

impl ColumnType {
    /// Whether an Arrow type already satisfies this logical type.
    pub fn accepts(&self, data_type: &DataType) -> bool {
        match self {
            Self::Int => data_type.is_integer(),
            Self::Float => data_type.is_floating(),
            Self::String => matches!(
                data_type,
                DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
            ),
            Self::Bool => matches!(data_type, DataType::Boolean),
            Self::Datetime => matches!(
                data_type,
                DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
            ),
        }
    }

    /// Arrow type a column is cast to when coercion is enabled.
    pub fn coercion_target(&self) -> DataType {
        match self {
            Self::Int => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::String => DataType::Utf8,
            Self::Bool => DataType::Boolean,
            Self::Datetime => DataType::Timestamp(TimeUnit::Nanosecond, None),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Datetime => "datetime",
        };
        f.write_str(name)
    }
}

/// Value predicates a column must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnCheck {
    /// Every non-null value lies within the inclusive bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// No value is null.
    NotNull,
    /// Every non-null value matches the regular expression.
    Regex { pattern: String },
    /// Every non-null value, rendered as a string, is one of `values`.
    OneOf { values: Vec<String> },
}

impl ColumnCheck {
    /// Rejects checks that can never be evaluated.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Range {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(DriftError::Configuration(format!(
                "range check has min {min} greater than max {max}"
            ))),
            Self::Regex { pattern } => Regex::new(pattern).map(|_| ()).map_err(|e| {
                DriftError::Configuration(format!("invalid regex pattern '{pattern}': {e}"))
            }),
            Self::OneOf { values } if values.is_empty() => Err(DriftError::Configuration(
                "one_of check needs at least one value".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, column: &str, array: &ArrayRef) -> Result<Option<String>> {
        match self {
            Self::NotNull => Ok((array.null_count() > 0).then(|| {
                format!("column '{column}' has {} null values", array.null_count())
            })),
            Self::Range { min, max } => {
                if !array.data_type().is_numeric() {
                    return Ok(Some(format!(
                        "column '{column}': range check needs a numeric column, found {}",
                        array.data_type()
                    )));
                }
                let lower = min.unwrap_or(f64::NEG_INFINITY);
                let upper = max.unwrap_or(f64::INFINITY);
                let floats = cast(array, &DataType::Float64)?;
                let outside: Vec<f64> = floats
                    .as_primitive::<Float64Type>()
                    .iter()
                    .flatten()
                    .filter(|v| !(lower..=upper).contains(v))
                    .collect();
                Ok(first_offender(&outside).map(|example| {
                    format!(
                        "column '{column}': {} values outside [{lower}, {upper}] (e.g. {example})",
                        outside.len()
                    )
                }))
            }
            Self::Regex { pattern } => {
                let regex = Regex::new(pattern).map_err(|e| {
                    DriftError::Configuration(format!("invalid regex pattern '{pattern}': {e}"))
                })?;
                let offenders = string_offenders(array, |v| !regex.is_match(v))?;
                Ok(first_offender(&offenders).map(|example| {
                    format!(
                        "column '{column}': {} values do not match /{pattern}/ (e.g. '{example}')",
                        offenders.len()
                    )
                }))
            }
            Self::OneOf { values } => {
                let allowed: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                let offenders = string_offenders(array, |v| !allowed.contains(v))?;
                Ok(first_offender(&offenders).map(|example| {
                    format!(
                        "column '{column}': {} values not in [{}] (e.g. '{example}')",
                        offenders.len(),
                        values.join(", ")
                    )
                }))
            }
        }
    }
}

fn first_offender<T: fmt::Display>(offenders: &[T]) -> Option<String> {
    offenders.first().map(ToString::to_string)
}

fn string_offenders<F>(array: &ArrayRef, rejects: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let strings = cast(array, &DataType::Utf8)?;
    Ok(strings
        .as_string::<i32>()
        .iter()
        .flatten()
        .filter(|v| rejects(v))
        .map(str::to_string)
        .collect())
}

fn default_nullable() -> bool {
    false
}

/// Declaration of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Columns are non-nullable unless declared otherwise.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Cast the column to `column_type` before checking it.
    #[serde(default)]
    pub coerce: bool,
    #[serde(default)]
    pub checks: Vec<ColumnCheck>,
}

impl ColumnSchema {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: default_nullable(),
            coerce: false,
            checks: Vec::new(),
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    pub fn with_check(mut self, check: ColumnCheck) -> Self {
        self.checks.push(check);
        self
    }
}

/// Declared columns of a table. Columns not declared are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnSchema>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, column: ColumnSchema) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    /// Checks every declared check for evaluability.
    pub fn validate_definition(&self) -> Result<()> {
        for (name, column) in &self.columns {
            for check in &column.checks {
                check.validate().map_err(|e| {
                    DriftError::Configuration(format!("schema column '{name}': {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Validates `dataset`, returning it with coerced columns replaced.
    ///
    /// All violations are collected before failing with
    /// [`DriftError::SchemaViolation`].
    #[instrument(skip(self, dataset), fields(columns = self.columns.len()))]
    pub fn validate(&self, table: &str, dataset: Dataset) -> Result<Dataset> {
        let batch = dataset.batch();
        let mut violations = Vec::new();
        let mut replacements: Vec<(usize, ArrayRef)> = Vec::new();

        for (name, declared) in &self.columns {
            let Ok(index) = batch.schema_ref().index_of(name) else {
                violations.push(format!("column '{name}' is missing"));
                continue;
            };
            let mut array = batch.column(index).clone();

            if !declared.column_type.accepts(array.data_type()) {
                if declared.coerce {
                    let target = declared.column_type.coercion_target();
                    let options = CastOptions {
                        safe: false,
                        ..Default::default()
                    };
                    match cast_with_options(&array, &target, &options) {
                        Ok(coerced) => {
                            debug!(column = %name, from = %array.data_type(), to = %target, "coerced column");
                            array = coerced;
                            replacements.push((index, array.clone()));
                        }
                        Err(e) => {
                            violations.push(format!(
                                "column '{name}': cannot coerce {} to {}: {e}",
                                array.data_type(),
                                declared.column_type
                            ));
                            continue;
                        }
                    }
                } else {
                    violations.push(format!(
                        "column '{name}': expected {}, found {}",
                        declared.column_type,
                        array.data_type()
                    ));
                    continue;
                }
            }

            if !declared.nullable && array.null_count() > 0 {
                violations.push(format!(
                    "column '{name}' is not nullable but has {} null values",
                    array.null_count()
                ));
            }

            for check in &declared.checks {
                if let Some(violation) = check.evaluate(name, &array)? {
                    violations.push(violation);
                }
            }
        }

        if !violations.is_empty() {
            warn!(
                table = %table,
                violations = violations.len(),
                "Schema validation failed"
            );
            return Err(DriftError::SchemaViolation {
                table: table.to_string(),
                violations,
            });
        }

        if replacements.is_empty() {
            return Ok(dataset);
        }
        let batch = replace_columns(batch, replacements)?;
        Ok(Dataset::new(dataset.name(), batch))
    }
}

fn replace_columns(batch: &RecordBatch, replacements: Vec<(usize, ArrayRef)>) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();
    for (index, array) in replacements {
        fields[index] = Field::new(
            fields[index].name(),
            array.data_type().clone(),
            fields[index].is_nullable() || array.null_count() > 0,
        );
        columns[index] = array;
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};

    fn orders() -> Dataset {
        let schema = Arc::new(Schema::new(vec![
            Field::new("amount", DataType::Float64, true),
            Field::new("quantity", DataType::Utf8, true),
            Field::new("channel", DataType::Utf8, true),
            Field::new("id", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![Some(10.0), Some(-2.0), None])),
                Arc::new(StringArray::from(vec!["1", "2", "3"])),
                Arc::new(StringArray::from(vec!["web", "app", "fax"])),
                Arc::new(Int64Array::from(vec![1, 2, 3])),
            ],
        )
        .unwrap();
        Dataset::new("orders", batch)
    }

    #[test]
    fn test_valid_dataset_passes_through() {
        let schema = TableSchema::new()
            .with_column("id", ColumnSchema::new(ColumnType::Int))
            .with_column(
                "amount",
                ColumnSchema::new(ColumnType::Float).nullable(true),
            );
        let dataset = schema.validate("orders", orders()).unwrap();
        assert_eq!(dataset.num_rows(), 3);
    }

    #[test]
    fn test_collects_every_violation() {
        let schema = TableSchema::new()
            .with_column(
                "amount",
                ColumnSchema::new(ColumnType::Float).with_check(ColumnCheck::Range {
                    min: Some(0.0),
                    max: None,
                }),
            )
            .with_column(
                "channel",
                ColumnSchema::new(ColumnType::String).with_check(ColumnCheck::OneOf {
                    values: vec!["web".to_string(), "app".to_string()],
                }),
            )
            .with_column("missing", ColumnSchema::new(ColumnType::Bool))
            .with_column("quantity", ColumnSchema::new(ColumnType::Int));

        let err = schema.validate("orders", orders()).unwrap_err();
        let DriftError::SchemaViolation { table, violations } = err else {
            panic!("expected schema violation");
        };
        assert_eq!(table, "orders");
        assert_eq!(violations.len(), 5, "{violations:?}");
        assert!(violations
            .iter()
            .any(|v| v.contains("'amount' is not nullable")));
        assert!(violations.iter().any(|v| v.contains("outside [0, inf]")));
        assert!(violations.iter().any(|v| v.contains("'fax'")));
        assert!(violations.iter().any(|v| v.contains("'missing' is missing")));
        assert!(violations.iter().any(|v| v.contains("expected int, found Utf8")));
    }

    #[test]
    fn test_coercion_replaces_column() {
        let schema = TableSchema::new().with_column(
            "quantity",
            ColumnSchema::new(ColumnType::Int).coerce(true).with_check(ColumnCheck::Range {
                min: Some(1.0),
                max: Some(3.0),
            }),
        );
        let dataset = schema.validate("orders", orders()).unwrap();
        let quantity = dataset.column("quantity").unwrap();
        assert_eq!(quantity.data_type(), &DataType::Int64);
        assert_eq!(dataset.numeric_values("quantity").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_failed_coercion_is_violation() {
        let schema = TableSchema::new()
            .with_column("channel", ColumnSchema::new(ColumnType::Float).coerce(true));
        let err = schema.validate("orders", orders()).unwrap_err();
        assert!(err.to_string().contains("cannot coerce Utf8 to float"));
    }

    #[test]
    fn test_regex_check() {
        let schema = TableSchema::new().with_column(
            "channel",
            ColumnSchema::new(ColumnType::String).with_check(ColumnCheck::Regex {
                pattern: "^[a-z]{3}$".to_string(),
            }),
        );
        assert!(schema.validate("orders", orders()).is_ok());

        let schema = TableSchema::new().with_column(
            "channel",
            ColumnSchema::new(ColumnType::String).with_check(ColumnCheck::Regex {
                pattern: "^w".to_string(),
            }),
        );
        let err = schema.validate("orders", orders()).unwrap_err();
        assert!(err.to_string().contains("2 values do not match"));
    }

    #[test]
    fn test_check_definitions() {
        assert!(ColumnCheck::Regex {
            pattern: "(".to_string()
        }
        .validate()
        .is_err());
        assert!(ColumnCheck::Range {
            min: Some(2.0),
            max: Some(1.0)
        }
        .validate()
        .is_err());
        assert!(ColumnCheck::OneOf { values: vec![] }.validate().is_err());
        assert!(ColumnCheck::NotNull.validate().is_ok());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let schema: TableSchema = toml::from_str(
            r#"
            [columns.amount]
            type = "float"
            coerce = true
            checks = [{ kind = "range", min = 0.0 }, { kind = "not_null" }]

            [columns.channel]
            type = "string"
            nullable = true
            checks = [{ kind = "one_of", values = ["web", "app"] }]
            "#,
        )
        .unwrap();

        let amount = &schema.columns["amount"];
        assert_eq!(amount.column_type, ColumnType::Float);
        assert!(!amount.nullable);
        assert!(amount.coerce);
        assert_eq!(
            amount.checks,
            vec![
                ColumnCheck::Range {
                    min: Some(0.0),
                    max: None
                },
                ColumnCheck::NotNull
            ]
        );
        assert!(schema.columns["channel"].nullable);
    }
}
