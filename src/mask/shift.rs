//! Shift a boolean mask along the time axis.
//!
//! Before shifting, source cells can be dropped by calendar month. This is how
//! marker propagation stops an `N` in January from spilling into the next
//! window's February.

use std::collections::BTreeSet;

use crate::domain::BooleanMask;
use crate::error::AdjustError;

/// Which source months may take part in a shift.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Exclude(BTreeSet<u32>),
    OnlyInclude(BTreeSet<u32>),
}

impl MonthFilter {
    /// Build a filter from the two optional month lists.
    ///
    /// An empty list counts as not supplied. Supplying both lists is an error.
    pub fn from_options(
        exclude_months: Option<&[u32]>,
        only_include_months: Option<&[u32]>,
    ) -> Result<Self, AdjustError> {
        let exclude = exclude_months.filter(|m| !m.is_empty());
        let only_include = only_include_months.filter(|m| !m.is_empty());

        match (exclude, only_include) {
            (Some(_), Some(_)) => Err(AdjustError::Configuration(
                "only one of `exclude_months` or `only_include_months` may be given".to_string(),
            )),
            (Some(months), None) => Ok(MonthFilter::Exclude(validate_months(months)?)),
            (None, Some(months)) => Ok(MonthFilter::OnlyInclude(validate_months(months)?)),
            (None, None) => Ok(MonthFilter::All),
        }
    }

    pub fn exclude(months: &[u32]) -> Result<Self, AdjustError> {
        Self::from_options(Some(months), None)
    }

    pub fn only_include(months: &[u32]) -> Result<Self, AdjustError> {
        Self::from_options(None, Some(months))
    }

    pub fn admits(&self, month: u32) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Exclude(months) => !months.contains(&month),
            MonthFilter::OnlyInclude(months) => months.contains(&month),
        }
    }
}

fn validate_months(months: &[u32]) -> Result<BTreeSet<u32>, AdjustError> {
    if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(AdjustError::Configuration(format!(
            "month {bad} is out of range (expected 1..=12)"
        )));
    }
    Ok(months.iter().copied().collect())
}

/// Shift `mask` by `periods` columns (positive = later) after applying `filter`
/// to the source cells. Cells shifted in from outside the table are `false`.
pub fn shift_mask(mask: &BooleanMask, periods: isize, filter: &MonthFilter) -> BooleanMask {
    // Every row shares the same period sequence.
    let admitted: Vec<bool> = mask.periods().iter().map(|p| filter.admits(p.month())).collect();
    let n = admitted.len();

    mask.map_rows_par(|row| {
        (0..n)
            .map(|col| {
                // Offsets too large to represent fall outside the table.
                let src = (col as isize)
                    .checked_sub(periods)
                    .and_then(|src| usize::try_from(src).ok())
                    .filter(|&src| src < n);
                match src {
                    Some(src) => row[src] && admitted[src],
                    None => false,
                }
            })
            .collect()
    })
}

/// Validate the month options and shift in one call.
pub fn shift(
    mask: &BooleanMask,
    periods: isize,
    exclude_months: Option<&[u32]>,
    only_include_months: Option<&[u32]>,
) -> Result<BooleanMask, AdjustError> {
    let filter = MonthFilter::from_options(exclude_months, only_include_months)?;
    Ok(shift_mask(mask, periods, &filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Period, TimeSeriesTable};

    /// Dec 2017 .. Mar 2018.
    fn mask(rows: Vec<(&str, Vec<bool>)>) -> BooleanMask {
        let periods = Period::range(Period::from_ym(2017, 12).unwrap(), 4);
        TimeSeriesTable::from_rows("item", periods, rows).unwrap()
    }

    #[test]
    fn shifts_forward_and_backward() {
        let m = mask(vec![("a", vec![true, false, false, true])]);

        let fwd = shift(&m, 1, None, None).unwrap();
        assert_eq!(fwd.row(0).unwrap(), &[false, true, false, false]);

        let back = shift(&m, -1, None, None).unwrap();
        assert_eq!(back.row(0).unwrap(), &[false, false, true, false]);

        let far = shift(&m, 10, None, None).unwrap();
        assert!(!far.any());
    }

    #[test]
    fn extreme_offsets_clear_the_mask() {
        let m = mask(vec![("a", vec![true; 4])]);
        assert!(!shift(&m, isize::MIN, None, None).unwrap().any());
        assert!(!shift(&m, isize::MAX, None, None).unwrap().any());
    }

    #[test]
    fn exclude_drops_source_months_before_shifting() {
        let m = mask(vec![("a", vec![true, true, false, false])]);
        let out = shift(&m, 1, Some(&[1]), None).unwrap();
        // December moves into January; January itself does not move into February.
        assert_eq!(out.row(0).unwrap(), &[false, true, false, false]);
    }

    #[test]
    fn only_include_keeps_listed_months() {
        let m = mask(vec![("a", vec![true, true, true, false])]);
        let out = shift(&m, 1, None, Some(&[2])).unwrap();
        assert_eq!(out.row(0).unwrap(), &[false, false, false, true]);
    }

    #[test]
    fn both_filters_is_a_configuration_error() {
        let m = mask(vec![("a", vec![true, false, false, false])]);
        let err = shift(&m, 1, Some(&[1]), Some(&[2])).unwrap_err();
        assert!(matches!(err, AdjustError::Configuration(_)));
    }

    #[test]
    fn empty_lists_count_as_absent_and_months_are_validated() {
        assert_eq!(MonthFilter::from_options(Some(&[]), Some(&[3])).unwrap(), MonthFilter::only_include(&[3]).unwrap());
        assert_eq!(MonthFilter::from_options(Some(&[]), None).unwrap(), MonthFilter::All);
        assert!(matches!(MonthFilter::exclude(&[13]), Err(AdjustError::Configuration(_))));
        assert!(matches!(MonthFilter::only_include(&[0]), Err(AdjustError::Configuration(_))));
    }
}
