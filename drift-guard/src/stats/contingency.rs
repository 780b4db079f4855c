//! Contingency tables and the chi-squared family of association tests.

use std::collections::{BTreeMap, BTreeSet};

use super::special::chi_squared_sf;

/// Cross-tabulation of paired categorical observations.
///
/// Rows are the distinct values of the first element of each pair, columns
/// the distinct values of the second, both in sorted order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    counts: Vec<Vec<f64>>,
    total: f64,
}

impl ContingencyTable {
    /// Builds a table from `(row, column)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut cells: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        let mut rows = BTreeSet::new();
        let mut columns = BTreeSet::new();

        for (row, column) in pairs {
            *cells.entry((row, column)).or_default() += 1;
            rows.insert(row);
            columns.insert(column);
        }

        let row_index: BTreeMap<&str, usize> =
            rows.iter().enumerate().map(|(i, &r)| (r, i)).collect();
        let column_index: BTreeMap<&str, usize> =
            columns.iter().enumerate().map(|(i, &c)| (c, i)).collect();

        let mut counts = vec![vec![0.0; columns.len()]; rows.len()];
        let mut total = 0.0;
        for ((row, column), count) in cells {
            counts[row_index[row]][column_index[column]] = count as f64;
            total += count as f64;
        }

        Self {
            row_labels: rows.into_iter().map(str::to_string).collect(),
            column_labels: columns.into_iter().map(str::to_string).collect(),
            counts,
            total,
        }
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.column_labels.len())
    }

    /// Sum of all cells.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// True when no pair was observed.
    pub fn is_empty(&self) -> bool {
        self.total == 0.0
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    /// Observed count at `(row, column)`.
    pub fn count(&self, row: usize, column: usize) -> f64 {
        self.counts[row][column]
    }

    fn row_totals(&self) -> Vec<f64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    fn column_totals(&self) -> Vec<f64> {
        let (_, cols) = self.shape();
        (0..cols)
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }
}

/// Result of a chi-squared test of independence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquaredOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
}

/// Chi-squared test of independence on a contingency table.
///
/// Yates' continuity correction is applied when the table has exactly one
/// degree of freedom. A table with zero degrees of freedom is trivially
/// independent (`statistic = 0`, `p = 1`); an empty table yields NaN.
pub fn chi2_contingency(table: &ContingencyTable) -> ChiSquaredOutcome {
    if table.is_empty() {
        return ChiSquaredOutcome {
            statistic: f64::NAN,
            p_value: f64::NAN,
            dof: 0,
        };
    }

    let (rows, cols) = table.shape();
    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return ChiSquaredOutcome {
            statistic: 0.0,
            p_value: 1.0,
            dof,
        };
    }

    let row_totals = table.row_totals();
    let column_totals = table.column_totals();
    let n = table.total();

    let mut statistic = 0.0;
    for (r, row_total) in row_totals.iter().enumerate() {
        for (c, column_total) in column_totals.iter().enumerate() {
            let expected = row_total * column_total / n;
            let mut observed = table.count(r, c);
            if dof == 1 {
                let diff = expected - observed;
                observed += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (observed - expected).powi(2) / expected;
        }
    }

    ChiSquaredOutcome {
        statistic,
        p_value: chi_squared_sf(statistic, dof),
        dof,
    }
}

/// Cramér's V effect size: `sqrt(chi2 / (n * (min(rows, cols) - 1)))`.
///
/// NaN when either dimension is one or the table is empty.
pub fn cramers_v(table: &ContingencyTable) -> f64 {
    let chi2 = chi2_contingency(table).statistic;
    let (rows, cols) = table.shape();
    let min_dim = rows.min(cols) as f64;
    (chi2 / (table.total() * (min_dim - 1.0))).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_from(rows: &[(&'static str, &'static str, usize)]) -> ContingencyTable {
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .flat_map(|&(r, c, n)| std::iter::repeat((r, c)).take(n))
            .collect();
        ContingencyTable::from_pairs(pairs)
    }

    #[test]
    fn test_table_shape_and_labels() {
        let table = ContingencyTable::from_pairs(vec![("b", "x"), ("a", "y"), ("a", "x")]);
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.row_labels(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.column_labels(), &["x".to_string(), "y".to_string()]);
        assert_eq!(table.count(0, 0), 1.0);
        assert_eq!(table.count(1, 1), 0.0);
        assert_eq!(table.total(), 3.0);
    }

    #[test]
    fn test_chi2_three_by_two_without_correction() {
        // Observed [[10, 20], [20, 20], [30, 0]]
        let table = table_from(&[
            ("a", "x", 10),
            ("a", "y", 20),
            ("b", "x", 20),
            ("b", "y", 20),
            ("c", "x", 30),
        ]);
        let outcome = chi2_contingency(&table);
        assert_eq!(outcome.dof, 2);
        // Expected [[18, 12], [24, 16], [18, 12]]
        let expected_stat = 64.0 / 18.0 + 64.0 / 12.0 + 16.0 / 24.0 + 16.0 / 16.0
            + 144.0 / 18.0
            + 144.0 / 12.0;
        assert!((outcome.statistic - expected_stat).abs() < 1e-9);
        assert!((outcome.p_value - (-expected_stat / 2.0).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_chi2_two_by_two_applies_yates() {
        // Observed [[12, 8], [8, 12]], expected 10 everywhere, |O-E| = 2 -> 1.5
        let table = table_from(&[("a", "x", 12), ("a", "y", 8), ("b", "x", 8), ("b", "y", 12)]);
        let outcome = chi2_contingency(&table);
        assert_eq!(outcome.dof, 1);
        assert!((outcome.statistic - 4.0 * 2.25 / 10.0).abs() < 1e-12);
        assert!(outcome.p_value > 0.05);
    }

    #[test]
    fn test_chi2_single_category_is_independent() {
        let table = table_from(&[("a", "x", 5), ("a", "y", 7)]);
        let outcome = chi2_contingency(&table);
        assert_eq!(outcome.dof, 0);
        assert_eq!(outcome.statistic, 0.0);
        assert_eq!(outcome.p_value, 1.0);
    }

    #[test]
    fn test_chi2_empty_table_is_nan() {
        let table = ContingencyTable::from_pairs(Vec::<(&str, &str)>::new());
        let outcome = chi2_contingency(&table);
        assert!(outcome.statistic.is_nan());
        assert!(outcome.p_value.is_nan());
    }

    #[test]
    fn test_cramers_v_perfect_association() {
        let table = table_from(&[("a", "x", 50), ("b", "y", 50), ("c", "z", 50)]);
        let v = cramers_v(&table);
        assert!((v - 1.0).abs() < 1e-9, "v = {v}");
    }

    #[test]
    fn test_cramers_v_degenerate_dimension_is_nan() {
        let table = table_from(&[("a", "x", 3), ("a", "y", 4)]);
        assert!(cramers_v(&table).is_nan());
    }
}
