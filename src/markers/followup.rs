//! Follow-up imputation markers.
//!
//! When a price is imputed (`N`), the next usable period's base reference is
//! the imputed value, so that period is flagged `N2`. "Next usable" skips
//! periods that are missing or temporarily unavailable (`M`/`T`). A January
//! `N` never carries into the following February, since the next window
//! starts from a fresh base.

use tracing::debug;

use crate::calendar::WINDOW_END_MONTH;
use crate::domain::{Marker, MarkerTable};
use crate::error::AdjustError;
use crate::mask::{MonthFilter, shift_mask};

/// Return `markers` with `N2` added at every follow-up period.
///
/// Cells that already carry `N`, `M` or `T` are never overwritten.
pub fn add_followup_markers(markers: &MarkerTable) -> Result<MarkerTable, AdjustError> {
    let has_marker = markers.map(|m| m.is_marked());
    let is_unavailable = markers.map(|m| m.is_unavailable());
    let mut pending = markers.map(|m| *m == Marker::N);
    let mut flagged = markers.map(|_| false);

    let no_january = MonthFilter::exclude(&[WINDOW_END_MONTH])?;
    // Each pass moves every pending cell one period forward, so the table
    // width bounds the number of passes.
    let bound = markers.n_periods() + 1;

    let mut iterations = 0;
    while pending.any() {
        if iterations >= bound {
            return Err(AdjustError::Convergence { iterations });
        }
        iterations += 1;

        let advanced = shift_mask(&pending, 1, &no_january);
        let new_flags = advanced.and(&has_marker.not(), "followup")?;
        flagged = flagged.or(&new_flags, "followup")?;
        pending = advanced.and(&is_unavailable, "followup")?;
    }

    debug!(iterations, added = flagged.count_true(), "follow-up markers settled");
    markers.mask(&flagged, Marker::N2, "followup")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Period, TimeSeriesTable};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Comma-separated markers, one per period.
    fn parse_row(cells: &str) -> Vec<Marker> {
        cells.split(',').map(|c| c.parse().unwrap()).collect()
    }

    fn table(start: Period, rows: Vec<(&str, &str)>) -> MarkerTable {
        let rows: Vec<(&str, Vec<Marker>)> = rows.into_iter().map(|(k, r)| (k, parse_row(r))).collect();
        let n = rows.first().map(|(_, r)| r.len()).unwrap_or(0);
        TimeSeriesTable::from_rows("item", Period::range(start, n), rows).unwrap()
    }

    fn n2_positions(t: &MarkerTable, row: usize) -> Vec<usize> {
        t.row(row)
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == Marker::N2)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn fixture_rows() {
        let jan17 = Period::from_ym(2017, 1).unwrap();
        let input = table(
            jan17,
            vec![
                ("a", ",,,N,,,,N,T,,,,,,"),
                ("b", ",N,N,,,,,N,N,,M,,,N,"),
                ("c", "N,,,,,,,,,,,,,,"),
                ("d", ",,,,,N,,,,N,,,N,,"),
                ("e", ",,,,,,,M,,N,M,,,,"),
                ("f", ",,,N,,,T,,N,T,,N,,,"),
            ],
        );

        let out = add_followup_markers(&input).unwrap();
        assert_eq!(n2_positions(&out, 0), vec![4, 9]);
        assert_eq!(n2_positions(&out, 1), vec![3, 9, 14]);
        assert_eq!(n2_positions(&out, 2), Vec::<usize>::new());
        // The January N (index 12) does not spill into February.
        assert_eq!(n2_positions(&out, 3), vec![6, 10]);
        assert_eq!(n2_positions(&out, 4), vec![11]);
        assert_eq!(n2_positions(&out, 5), vec![4, 10, 12]);

        // Existing markers are untouched.
        for ((_, before), (_, after)) in input.rows().zip(out.rows()) {
            for (b, a) in before.iter().zip(after) {
                if *b != Marker::Empty {
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn chain_running_off_the_table_adds_nothing() {
        let mar17 = Period::from_ym(2017, 3).unwrap();
        let input = table(mar17, vec![("a", ",,,N,,,,N,T")]);
        let out = add_followup_markers(&input).unwrap();
        assert_eq!(n2_positions(&out, 0), vec![4]);
    }

    #[test]
    fn december_flags_january_but_not_february() {
        let dec17 = Period::from_ym(2017, 12).unwrap();
        let input = table(dec17, vec![("a", "N,,"), ("b", ",N,")]);
        let out = add_followup_markers(&input).unwrap();
        assert_eq!(out.row(0).unwrap(), &[Marker::N, Marker::N2, Marker::Empty]);
        assert_eq!(out.row(1).unwrap(), &[Marker::Empty, Marker::N, Marker::Empty]);
    }

    #[test]
    fn unavailable_run_is_skipped_up_to_the_window_end() {
        // N in Oct, then M/T through January: the search stops at January.
        let oct17 = Period::from_ym(2017, 10).unwrap();
        let input = table(oct17, vec![("a", "N,M,T,M,,")]);
        let out = add_followup_markers(&input).unwrap();
        assert!(n2_positions(&out, 0).is_empty());
    }

    #[test]
    fn output_is_saturated() {
        let mut rng = StdRng::seed_from_u64(11);
        let choices = [Marker::Empty, Marker::Empty, Marker::Empty, Marker::N, Marker::M, Marker::T];
        let keys: Vec<String> = (0..20).map(|i| format!("item{i}")).collect();
        let rows = keys
            .iter()
            .map(|k| {
                let row = (0..40).map(|_| choices[rng.gen_range(0..choices.len())]).collect();
                (k.as_str(), row)
            })
            .collect();
        let input =
            TimeSeriesTable::from_rows("item", Period::range(Period::from_ym(2015, 7).unwrap(), 40), rows).unwrap();

        let once = add_followup_markers(&input).unwrap();
        let twice = add_followup_markers(&once).unwrap();
        assert_eq!(once, twice);

        // Propagation never crosses from January into February, so no
        // February is ever flagged.
        for (_, row) in once.rows() {
            for (period, m) in once.periods().iter().zip(row) {
                if period.month() == 2 {
                    assert_ne!(*m, Marker::N2, "N2 in {period}");
                }
            }
        }
    }

    #[test]
    fn empty_table_is_returned_unchanged() {
        let t: MarkerTable = TimeSeriesTable::from_rows("item", Vec::new(), vec![("a", Vec::new())]).unwrap();
        assert_eq!(add_followup_markers(&t).unwrap(), t);
    }
}
