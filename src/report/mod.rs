//! Run summaries for the terminal.
//!
//! Summaries are computed here from the engines' outputs and rendered by
//! `format`, so the engines never print.

use crate::calendar::{CycleIndex, WindowSegment};
use crate::domain::{BooleanMask, FactorTable, Marker, MarkerTable, Period};

pub mod format;

pub use format::*;

/// Shape of a table: rows, periods, and the windows its periods span.
#[derive(Debug, Clone, PartialEq)]
pub struct TableShape {
    pub n_rows: usize,
    pub n_periods: usize,
    pub first_period: Option<Period>,
    pub last_period: Option<Period>,
    pub windows: Vec<WindowSegment>,
}

impl TableShape {
    pub fn of(n_rows: usize, periods: &[Period]) -> Self {
        Self {
            n_rows,
            n_periods: periods.len(),
            first_period: periods.first().copied(),
            last_period: periods.last().copied(),
            windows: CycleIndex::new(periods).segments().to_vec(),
        }
    }
}

/// Outcome of a quality-adjustment run.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustSummary {
    pub shape: TableShape,
    pub resets: Option<usize>,
    pub adjusted_cells: Option<usize>,
    /// Rows whose factors differ from 1 somewhere.
    pub rows_changed: usize,
    pub min_factor: f64,
    pub max_factor: f64,
}

pub fn summarize_adjustments(
    factors: &FactorTable,
    to_reset: Option<&BooleanMask>,
    to_adjust: Option<&BooleanMask>,
) -> AdjustSummary {
    let mut min_factor = f64::INFINITY;
    let mut max_factor = f64::NEG_INFINITY;
    let mut rows_changed = 0;
    for (_, row) in factors.rows() {
        if row.iter().any(|v| *v != 1.0) {
            rows_changed += 1;
        }
        for v in row {
            min_factor = min_factor.min(*v);
            max_factor = max_factor.max(*v);
        }
    }
    // Empty table: report the neutral factor.
    if !min_factor.is_finite() || !max_factor.is_finite() {
        min_factor = 1.0;
        max_factor = 1.0;
    }

    AdjustSummary {
        shape: TableShape::of(factors.n_rows(), factors.periods()),
        resets: to_reset.map(BooleanMask::count_true),
        adjusted_cells: to_adjust.map(BooleanMask::count_true),
        rows_changed,
        min_factor,
        max_factor,
    }
}

/// Marker counts before and after follow-up propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSummary {
    pub shape: TableShape,
    pub n: usize,
    pub m: usize,
    pub t: usize,
    pub n2_before: usize,
    pub n2_after: usize,
}

impl MarkerSummary {
    pub fn added(&self) -> usize {
        self.n2_after.saturating_sub(self.n2_before)
    }
}

pub fn summarize_markers(before: &MarkerTable, after: &MarkerTable) -> MarkerSummary {
    let count = |t: &MarkerTable, m: Marker| -> usize {
        t.rows().map(|(_, row)| row.iter().filter(|c| **c == m).count()).sum()
    };
    MarkerSummary {
        shape: TableShape::of(before.n_rows(), before.periods()),
        n: count(before, Marker::N),
        m: count(before, Marker::M),
        t: count(before, Marker::T),
        n2_before: count(before, Marker::N2),
        n2_after: count(after, Marker::N2),
    }
}
