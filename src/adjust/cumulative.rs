//! Cumulative adjustment factors within February-to-January windows.
//!
//! For a period `t`, the cumulative factor is the product of the per-period
//! factors from the start of `t`'s window through `t`. February's own factor
//! (its ratio to the preceding January) opens the window's product, so the
//! value in February already carries the first change of the new cycle.
//!
//! The table's first period has no predecessor and is left undefined. An
//! undefined factor yields an undefined cumulative value at that cell, while
//! the running product carries on past it unchanged.

use tracing::debug;

use crate::calendar::CycleIndex;
use crate::domain::{BooleanMask, ValueTable};
use crate::error::AdjustError;

/// Running product of `factors`, restarting at every annual window.
pub fn cumulative_adjustments(factors: &ValueTable) -> ValueTable {
    let cycles = CycleIndex::new(factors.periods());
    debug!(
        rows = factors.n_rows(),
        windows = cycles.segments().len(),
        "accumulating factors within annual windows"
    );
    factors.map_rows_par(|row| cumulative_row(row, None, &cycles))
}

/// Running product of `factors` that is also re-based at every reset cell.
///
/// A reset cell gets exactly `1`, whatever the product before it, and the
/// product restarts from there. Its own factor is discarded.
pub fn cumulative_with_resets(factors: &ValueTable, to_reset: &BooleanMask) -> Result<ValueTable, AdjustError> {
    let cycles = CycleIndex::new(factors.periods());
    debug!(
        rows = factors.n_rows(),
        resets = to_reset.count_true(),
        "accumulating factors with resets"
    );
    factors.zip_rows_par(to_reset, "to_reset", |row, resets| cumulative_row(row, Some(resets), &cycles))
}

fn cumulative_row(row: &[Option<f64>], resets: Option<&[bool]>, cycles: &CycleIndex) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(row.len());
    for seg in cycles.segments() {
        let mut running = 1.0;
        for idx in seg.range.clone() {
            if resets.is_some_and(|r| r[idx]) {
                running = 1.0;
                out.push(Some(1.0));
                continue;
            }
            if idx == 0 {
                out.push(None);
                continue;
            }
            match row[idx] {
                Some(f) => {
                    running *= f;
                    out.push(Some(running));
                }
                None => out.push(None),
            }
        }
    }
    out
}
