//! The shape-checked table every engine works on.
//!
//! A `TimeSeriesTable<T>` is row-major: one row per item/product-group, one
//! column per monthly period. All constructors validate shape, so the engines
//! can index rows and columns positionally without re-checking.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use rayon::prelude::*;

use crate::domain::{Marker, Period, RowKey};
use crate::error::AdjustError;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable<T> {
    key_names: Vec<String>,
    row_keys: Vec<RowKey>,
    periods: Vec<Period>,
    cells: Vec<Vec<T>>,
}

/// `true` marks a cell of interest (to adjust, to reset, holds an `N`, ...).
pub type BooleanMask = TimeSeriesTable<bool>;

/// Categorical marker table.
pub type MarkerTable = TimeSeriesTable<Marker>;

/// Numeric table whose cells may be undefined (missing observations,
/// ratios without a predecessor).
pub type ValueTable = TimeSeriesTable<Option<f64>>;

/// Fully defined numeric table (final adjustment factors).
pub type FactorTable = TimeSeriesTable<f64>;

impl<T> TimeSeriesTable<T> {
    pub fn new(
        key_names: Vec<String>,
        row_keys: Vec<RowKey>,
        periods: Vec<Period>,
        cells: Vec<Vec<T>>,
    ) -> Result<Self, AdjustError> {
        if row_keys.len() != cells.len() {
            return Err(AdjustError::InvalidTable(format!(
                "{} row keys but {} rows of cells",
                row_keys.len(),
                cells.len()
            )));
        }

        for (key, row) in row_keys.iter().zip(&cells) {
            if row.len() != periods.len() {
                return Err(AdjustError::InvalidTable(format!(
                    "row '{key}' has {} cells, expected {} (one per period)",
                    row.len(),
                    periods.len()
                )));
            }
            if key.len() != key_names.len() {
                return Err(AdjustError::InvalidTable(format!(
                    "row key '{key}' has {} levels, expected {} ({})",
                    key.len(),
                    key_names.len(),
                    key_names.join(", ")
                )));
            }
        }

        if let Some(w) = periods.windows(2).find(|w| w[0] >= w[1]) {
            return Err(AdjustError::InvalidTable(format!(
                "periods must be strictly increasing, found {} followed by {}",
                w[0], w[1]
            )));
        }

        let mut seen = HashSet::with_capacity(row_keys.len());
        for key in &row_keys {
            if !seen.insert(key) {
                return Err(AdjustError::InvalidTable(format!("duplicate row key '{key}'")));
            }
        }

        Ok(Self {
            key_names,
            row_keys,
            periods,
            cells,
        })
    }

    /// Single-level keys named `key_name`, mainly for tests and small callers.
    pub fn from_rows(
        key_name: &str,
        periods: Vec<Period>,
        rows: Vec<(&str, Vec<T>)>,
    ) -> Result<Self, AdjustError> {
        let (row_keys, cells): (Vec<RowKey>, Vec<Vec<T>>) =
            rows.into_iter().map(|(k, r)| (RowKey::single(k), r)).unzip();
        Self::new(vec![key_name.to_string()], row_keys, periods, cells)
    }

    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    pub fn row_keys(&self) -> &[RowKey] {
        &self.row_keys
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn n_rows(&self) -> usize {
        self.row_keys.len()
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn row(&self, idx: usize) -> Option<&[T]> {
        self.cells.get(idx).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&RowKey, &[T])> {
        self.row_keys.iter().zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Fails unless `other` has the same row keys (in order) and periods.
    pub fn ensure_aligned<U>(&self, other: &TimeSeriesTable<U>, context: &str) -> Result<(), AdjustError> {
        self.ensure_same_periods(other, context)?;
        if self.row_keys.len() != other.row_keys.len() {
            return Err(AdjustError::shape_mismatch(
                context,
                format!("{} rows vs {} rows", self.row_keys.len(), other.row_keys.len()),
            ));
        }
        if let Some((idx, (a, b))) = self
            .row_keys
            .iter()
            .zip(&other.row_keys)
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(AdjustError::shape_mismatch(
                context,
                format!("row #{idx} is '{a}' vs '{b}'"),
            ));
        }
        Ok(())
    }

    /// Reorder this table's rows to follow `target`'s row order.
    ///
    /// Rows are matched by key, so a table holding the same key set in a
    /// different order is accepted. Periods must match exactly.
    pub fn align_rows_to<U>(&self, target: &TimeSeriesTable<U>, context: &str) -> Result<Self, AdjustError>
    where
        T: Clone,
    {
        self.ensure_same_periods(target, context)?;
        if self.row_keys.len() != target.row_keys.len() {
            return Err(AdjustError::shape_mismatch(
                context,
                format!("{} rows vs {} rows", target.row_keys.len(), self.row_keys.len()),
            ));
        }
        if self.row_keys == target.row_keys {
            return Ok(self.clone());
        }

        let index: HashMap<&RowKey, usize> = self.row_keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
        let mut cells = Vec::with_capacity(target.row_keys.len());
        for key in &target.row_keys {
            let idx = index
                .get(key)
                .ok_or_else(|| AdjustError::shape_mismatch(context, format!("row '{key}' is missing")))?;
            cells.push(self.cells[*idx].clone());
        }
        Ok(TimeSeriesTable {
            key_names: self.key_names.clone(),
            row_keys: target.row_keys.clone(),
            periods: self.periods.clone(),
            cells,
        })
    }

    fn ensure_same_periods<U>(&self, other: &TimeSeriesTable<U>, context: &str) -> Result<(), AdjustError> {
        if self.periods.len() != other.periods.len() {
            return Err(AdjustError::shape_mismatch(
                context,
                format!("{} periods vs {} periods", self.periods.len(), other.periods.len()),
            ));
        }
        if let Some((idx, (a, b))) = self
            .periods
            .iter()
            .zip(&other.periods)
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(AdjustError::shape_mismatch(
                context,
                format!("period #{idx} is {a} vs {b}"),
            ));
        }
        Ok(())
    }

    /// Same keys and periods, new cells. Callers guarantee the shape.
    pub(crate) fn with_cells<U>(&self, cells: Vec<Vec<U>>) -> TimeSeriesTable<U> {
        debug_assert_eq!(cells.len(), self.row_keys.len());
        debug_assert!(cells.iter().all(|r| r.len() == self.periods.len()));
        TimeSeriesTable {
            key_names: self.key_names.clone(),
            row_keys: self.row_keys.clone(),
            periods: self.periods.clone(),
            cells,
        }
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> TimeSeriesTable<U> {
        let cells = self
            .cells
            .iter()
            .map(|row| row.iter().map(&f).collect())
            .collect();
        self.with_cells(cells)
    }

    /// Cell-wise combination of two aligned tables.
    pub fn zip_map<U, V>(
        &self,
        other: &TimeSeriesTable<U>,
        context: &str,
        f: impl Fn(&T, &U) -> V,
    ) -> Result<TimeSeriesTable<V>, AdjustError> {
        self.ensure_aligned(other, context)?;
        let cells = self
            .cells
            .iter()
            .zip(&other.cells)
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| f(x, y)).collect())
            .collect();
        Ok(self.with_cells(cells))
    }

    /// Apply `f` to every row in parallel. Rows never depend on each other,
    /// so the result is identical to a sequential pass.
    pub fn map_rows_par<U, F>(&self, f: F) -> TimeSeriesTable<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&[T]) -> Vec<U> + Sync + Send,
    {
        let cells: Vec<Vec<U>> = self.cells.par_iter().map(|row| f(row)).collect();
        self.with_cells(cells)
    }

    /// Row-wise combination of two aligned tables, in parallel.
    pub fn zip_rows_par<U, V, F>(
        &self,
        other: &TimeSeriesTable<U>,
        context: &str,
        f: F,
    ) -> Result<TimeSeriesTable<V>, AdjustError>
    where
        T: Sync,
        U: Sync,
        V: Send,
        F: Fn(&[T], &[U]) -> Vec<V> + Sync + Send,
    {
        self.ensure_aligned(other, context)?;
        let cells: Vec<Vec<V>> = self
            .cells
            .par_iter()
            .zip(other.cells.par_iter())
            .map(|(a, b)| f(a, b))
            .collect();
        Ok(self.with_cells(cells))
    }

    /// Replace cells where `mask` is `true` with `value`.
    pub fn mask(&self, mask: &BooleanMask, value: T, context: &str) -> Result<Self, AdjustError>
    where
        T: Clone,
    {
        self.zip_map(mask, context, |cell, &hit| if hit { value.clone() } else { cell.clone() })
    }

    /// Keep only the rows in `range` (clamped to the table).
    pub fn slice_rows(&self, range: Range<usize>) -> Self
    where
        T: Clone,
    {
        let end = range.end.min(self.row_keys.len());
        let start = range.start.min(end);
        TimeSeriesTable {
            key_names: self.key_names.clone(),
            row_keys: self.row_keys[start..end].to_vec(),
            periods: self.periods.clone(),
            cells: self.cells[start..end].to_vec(),
        }
    }
}

impl TimeSeriesTable<bool> {
    pub fn any(&self) -> bool {
        self.cells.iter().any(|row| row.iter().any(|&b| b))
    }

    pub fn count_true(&self) -> usize {
        self.cells.iter().flatten().filter(|&&b| b).count()
    }

    pub fn and(&self, other: &BooleanMask, context: &str) -> Result<BooleanMask, AdjustError> {
        self.zip_map(other, context, |&a, &b| a && b)
    }

    pub fn or(&self, other: &BooleanMask, context: &str) -> Result<BooleanMask, AdjustError> {
        self.zip_map(other, context, |&a, &b| a || b)
    }

    pub fn not(&self) -> BooleanMask {
        self.map(|&b| !b)
    }
}

impl TimeSeriesTable<Option<f64>> {
    /// Replace every undefined cell with `value`.
    pub fn fill_undefined(&self, value: f64) -> ValueTable {
        self.map(|cell| Some(cell.unwrap_or(value)))
    }

    /// Convert to a fully defined table, failing on the first cell that is
    /// undefined or not finite.
    pub fn into_defined(self) -> Result<FactorTable, AdjustError> {
        let mut cells = Vec::with_capacity(self.cells.len());
        for (key, row) in self.row_keys.iter().zip(&self.cells) {
            let mut out = Vec::with_capacity(row.len());
            for (period, cell) in self.periods.iter().zip(row) {
                match cell {
                    Some(v) if v.is_finite() => out.push(*v),
                    _ => {
                        return Err(AdjustError::UndefinedValue {
                            row: key.to_string(),
                            period: *period,
                        });
                    }
                }
            }
            cells.push(out);
        }
        Ok(TimeSeriesTable {
            key_names: self.key_names,
            row_keys: self.row_keys,
            periods: self.periods,
            cells,
        })
    }
}
