//! Quality adjustment factors from a quality-value table.
//!
//! The period-on-period ratio of the quality value is the raw adjustment. Cells
//! outside `to_adjust` are neutralised, cells in `to_reset` re-base the window,
//! and the result is accumulated per February-to-January window.

use tracing::{debug, warn};

use crate::adjust::{cumulative_adjustments, cumulative_with_resets};
use crate::domain::{BooleanMask, FactorTable, ValueTable};
use crate::error::AdjustError;

/// `value[t] / value[t-1]` per row.
///
/// Undefined in the first period, where either side is missing, and where the
/// ratio is not finite.
pub fn period_ratios(values: &ValueTable) -> ValueTable {
    let periods = values.periods();
    let cells = values
        .rows()
        .map(|(key, row)| {
            if row.is_empty() {
                return Vec::new();
            }
            let mut out = Vec::with_capacity(row.len());
            out.push(None);
            for idx in 1..row.len() {
                let ratio = match (row[idx - 1], row[idx]) {
                    (Some(prev), Some(cur)) => {
                        let r = cur / prev;
                        if r.is_finite() {
                            Some(r)
                        } else {
                            warn!(row = %key, period = %periods[idx], prev, cur, "non-finite quality ratio treated as undefined");
                            None
                        }
                    }
                    _ => None,
                };
                out.push(ratio);
            }
            out
        })
        .collect();
    values.with_cells(cells)
}

/// Cumulative quality adjustment factors.
///
/// `to_adjust` restricts which period-on-period changes count; `to_reset`
/// marks cells where the cumulative factor is forced back to exactly `1`.
/// Every cell of the result is defined.
pub fn get_quality_adjustments(
    quality_value: &ValueTable,
    to_reset: Option<&BooleanMask>,
    to_adjust: Option<&BooleanMask>,
) -> Result<FactorTable, AdjustError> {
    // Masks are matched to the quality rows by key, not by position.
    let to_adjust = to_adjust
        .map(|mask| mask.align_rows_to(quality_value, "to_adjust"))
        .transpose()?;
    let to_reset = to_reset
        .map(|mask| mask.align_rows_to(quality_value, "to_reset"))
        .transpose()?;

    let mut factors = period_ratios(quality_value);

    if let Some(mask) = &to_adjust {
        factors = factors.mask(&mask.not(), Some(1.0), "to_adjust")?;
    }

    let cumulative = match &to_reset {
        Some(mask) => {
            debug!(resets = mask.count_true(), "re-basing factors at reset cells");
            cumulative_with_resets(&factors, mask)?
        }
        None => cumulative_adjustments(&factors),
    };

    cumulative.fill_undefined(1.0).into_defined()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Period, TimeSeriesTable};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOL: f64 = 1e-9;

    /// Jan 2017 .. Mar 2018.
    fn periods() -> Vec<Period> {
        Period::range(Period::from_ym(2017, 1).unwrap(), 15)
    }

    const KEYS: [&str; 5] = ["q1", "q2", "q3", "q4", "q5"];

    fn quality() -> ValueTable {
        let raw: [[f64; 15]; 5] = [
            [30., 30., 30., 32., 32., 32., 32., 32., 37., 37., 37., 37., 35., 30., 30.],
            [500., 500., 480., 480., 480., 480., 480., 480., 450., 450., 450., 450., 400., 400., 400.],
            [10.; 15],
            [1., 1., 1., 1., 1., 1., 1., 1., 1., 1., 1., 2., 2., 2., 2.],
            [10., 11., 11., 11., 11., 11., 12., 12., 12., 12., 14., 14., 13., 13., 13.],
        ];
        let rows = KEYS
            .iter()
            .zip(raw)
            .map(|(k, r)| (*k, r.iter().map(|v| Some(*v)).collect()))
            .collect();
        TimeSeriesTable::from_rows("item", periods(), rows).unwrap()
    }

    /// `true` at the listed column indices, one entry per quality row.
    fn mask(hits: [&[usize]; 5]) -> BooleanMask {
        let rows = KEYS
            .iter()
            .zip(hits)
            .map(|(k, idx)| {
                let mut row = vec![false; 15];
                for &i in idx {
                    row[i] = true;
                }
                (*k, row)
            })
            .collect();
        TimeSeriesTable::from_rows("item", periods(), rows).unwrap()
    }

    fn to_adjust() -> BooleanMask {
        // Apr, Feb18 | Sep | - | Dec | Feb, Jul, Nov, Jan18
        mask([&[3, 13], &[8], &[], &[11], &[1, 6, 10, 12]])
    }

    fn to_reset() -> BooleanMask {
        // Nov | Oct | - | - | Apr
        mask([&[10], &[9], &[], &[], &[3]])
    }

    fn assert_rows(actual: &FactorTable, expected: &[Vec<f64>]) {
        for (r, want) in expected.iter().enumerate() {
            let got = actual.row(r).unwrap();
            for (c, (g, w)) in got.iter().zip(want).enumerate() {
                assert!((g - w).abs() < TOL, "row {r} col {c}: {g} != {w}");
            }
        }
    }

    fn rep(v: f64, n: usize) -> Vec<f64> {
        vec![v; n]
    }

    fn cat(parts: &[Vec<f64>]) -> Vec<f64> {
        parts.concat()
    }

    #[test]
    fn fixture_without_masks() {
        let out = get_quality_adjustments(&quality(), None, None).unwrap();
        assert_rows(
            &out,
            &[
                cat(&[rep(1., 3), rep(32. / 30., 5), rep(37. / 30., 4), vec![35. / 30., 30. / 35., 30. / 35.]]),
                cat(&[rep(1., 2), rep(0.96, 6), rep(0.9, 4), vec![0.8, 1., 1.]]),
                rep(1., 15),
                cat(&[rep(1., 11), vec![2., 2., 1., 1.]]),
                cat(&[vec![1.], rep(1.1, 5), rep(1.2, 4), vec![1.4, 1.4, 1.3, 1., 1.]]),
            ],
        );
    }

    #[test]
    fn fixture_with_to_adjust() {
        let out = get_quality_adjustments(&quality(), None, Some(&to_adjust())).unwrap();
        assert_rows(
            &out,
            &[
                cat(&[rep(1., 3), rep(32. / 30., 10), rep(30. / 35., 2)]),
                cat(&[rep(1., 8), rep(0.9375, 5), rep(1., 2)]),
                rep(1., 15),
                cat(&[rep(1., 11), vec![2., 2., 1., 1.]]),
                cat(&[vec![1.], rep(1.1, 5), rep(1.2, 4), vec![1.4, 1.4, 1.3, 1., 1.]]),
            ],
        );
    }

    #[test]
    fn fixture_with_to_reset() {
        let out = get_quality_adjustments(&quality(), Some(&to_reset()), None).unwrap();
        assert_rows(
            &out,
            &[
                cat(&[
                    rep(1., 3),
                    rep(32. / 30., 5),
                    rep(37. / 30., 2),
                    vec![1., 1., 35. / 37., 30. / 35., 30. / 35.],
                ]),
                cat(&[rep(1., 2), rep(0.96, 6), vec![0.9, 1., 1., 1., 400. / 450., 1., 1.]]),
                rep(1., 15),
                cat(&[rep(1., 11), vec![2., 2., 1., 1.]]),
                cat(&[
                    vec![1., 1.1, 1.1],
                    rep(1., 3),
                    rep(12. / 11., 4),
                    vec![14. / 11., 14. / 11., 13. / 11., 1., 1.],
                ]),
            ],
        );
    }

    #[test]
    fn fixture_with_both_masks() {
        let out = get_quality_adjustments(&quality(), Some(&to_reset()), Some(&to_adjust())).unwrap();
        assert_rows(
            &out,
            &[
                cat(&[rep(1., 3), rep(32. / 30., 7), rep(1., 3), rep(30. / 35., 2)]),
                cat(&[rep(1., 8), vec![0.9375], rep(1., 6)]),
                rep(1., 15),
                cat(&[rep(1., 11), vec![2., 2., 1., 1.]]),
                cat(&[
                    vec![1., 1.1, 1.1],
                    rep(1., 3),
                    rep(12. / 11., 4),
                    vec![14. / 11., 14. / 11., 13. / 11., 1., 1.],
                ]),
            ],
        );
    }

    #[test]
    fn single_row_scenario() {
        let ps = Period::range(Period::from_ym(2017, 1).unwrap(), 4);
        let q = TimeSeriesTable::from_rows("item", ps.clone(), vec![("a", vec![Some(30.), Some(30.), Some(30.), Some(32.)])])
            .unwrap();

        let ratios = period_ratios(&q);
        let r = ratios.row(0).unwrap();
        assert_eq!(r[0], None);
        assert_eq!(&r[1..3], &[Some(1.0), Some(1.0)]);
        assert!((r[3].unwrap() - 32. / 30.).abs() < TOL);

        let adj = TimeSeriesTable::from_rows("item", ps, vec![("a", vec![false, false, true, true])]).unwrap();
        let out = get_quality_adjustments(&q, None, Some(&adj)).unwrap();
        let row = out.row(0).unwrap();
        assert_eq!(&row[..3], &[1.0, 1.0, 1.0]);
        assert!((row[3] - 32. / 30.).abs() < TOL);
    }

    #[test]
    fn nothing_to_adjust_gives_all_ones() {
        let none = quality().map(|_| false);
        let out = get_quality_adjustments(&quality(), None, Some(&none)).unwrap();
        assert!(out.rows().all(|(_, row)| row.iter().all(|v| *v == 1.0)));
    }

    #[test]
    fn missing_and_zero_values_do_not_leak() {
        let ps = Period::range(Period::from_ym(2017, 2).unwrap(), 5);
        let q = TimeSeriesTable::from_rows(
            "item",
            ps,
            vec![("a", vec![Some(0.0), Some(5.0), None, Some(10.0), Some(20.0)])],
        )
        .unwrap();
        let out = get_quality_adjustments(&q, None, None).unwrap();
        // 5/0 and both ratios touching the gap are undefined and become 1.
        assert_eq!(out.row(0).unwrap(), &[1.0, 1.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn resets_land_on_exactly_one() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let ps = Period::range(Period::from_ym(2016, 5).unwrap(), 30);
        let keys: Vec<String> = (0..8).map(|i| format!("item{i}")).collect();

        let q = TimeSeriesTable::from_rows(
            "item",
            ps.clone(),
            keys.iter()
                .map(|k| (k.as_str(), (0..30).map(|_| Some(rng.gen_range(1.0..100.0))).collect()))
                .collect(),
        )
        .unwrap();
        let resets = TimeSeriesTable::from_rows(
            "item",
            ps,
            keys.iter()
                .map(|k| (k.as_str(), (0..30).map(|_| rng.gen_bool(0.2)).collect()))
                .collect(),
        )
        .unwrap();

        let out = get_quality_adjustments(&q, Some(&resets), None).unwrap();
        for ((_, got), (_, hit)) in out.rows().zip(resets.rows()) {
            for (v, h) in got.iter().zip(hit) {
                if *h {
                    assert_eq!(*v, 1.0, "reset cell is {v}");
                }
            }
        }
    }

    #[test]
    fn reset_is_exact_where_the_inverse_rounds() {
        // 49 * (1 / 49) is not 1.0 in binary floating point.
        let ps = Period::range(Period::from_ym(2017, 2).unwrap(), 4);
        let q = TimeSeriesTable::from_rows("item", ps.clone(), vec![("a", vec![Some(1.), Some(1.), Some(49.), Some(49.)])])
            .unwrap();
        let reset = TimeSeriesTable::from_rows("item", ps, vec![("a", vec![false, false, false, true])]).unwrap();
        let out = get_quality_adjustments(&q, Some(&reset), None).unwrap();
        assert_eq!(out.row(0).unwrap(), &[1.0, 1.0, 49.0, 1.0]);
    }

    #[test]
    fn reset_after_a_zero_quality_restarts_the_product() {
        let ps = Period::range(Period::from_ym(2017, 2).unwrap(), 5);
        let q = TimeSeriesTable::from_rows(
            "item",
            ps.clone(),
            vec![("a", vec![Some(10.), Some(0.), Some(4.), Some(4.), Some(8.)])],
        )
        .unwrap();
        let reset =
            TimeSeriesTable::from_rows("item", ps, vec![("a", vec![false, false, false, true, false])]).unwrap();
        let out = get_quality_adjustments(&q, Some(&reset), None).unwrap();
        assert_eq!(out.row(0).unwrap(), &[1.0, 0.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn masks_in_a_different_row_order_are_matched_by_key() {
        let ps = Period::range(Period::from_ym(2017, 2).unwrap(), 3);
        let q = TimeSeriesTable::from_rows(
            "item",
            ps.clone(),
            vec![("a", vec![Some(10.), Some(20.), Some(20.)]), ("b", vec![Some(4.), Some(4.), Some(2.)])],
        )
        .unwrap();
        let all = TimeSeriesTable::from_rows("item", ps.clone(), vec![("b", vec![true; 3]), ("a", vec![true; 3])])
            .unwrap();
        let out = get_quality_adjustments(&q, None, Some(&all)).unwrap();
        assert_eq!(out.row(0).unwrap(), &[1.0, 2.0, 2.0]);
        assert_eq!(out.row(1).unwrap(), &[1.0, 1.0, 0.5]);

        // Only "b" adjusts, and it is listed first in the mask.
        let only_b = TimeSeriesTable::from_rows("item", ps.clone(), vec![("b", vec![true; 3]), ("a", vec![false; 3])])
            .unwrap();
        let reset_a =
            TimeSeriesTable::from_rows("item", ps, vec![("b", vec![false; 3]), ("a", vec![false, false, true])])
                .unwrap();
        let out = get_quality_adjustments(&q, Some(&reset_a), Some(&only_b)).unwrap();
        assert_eq!(out.row(0).unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(out.row(1).unwrap(), &[1.0, 1.0, 0.5]);
    }

    #[test]
    fn changing_a_factor_stays_inside_its_window() {
        let mut rng = StdRng::seed_from_u64(42);
        // Jun 2016 .. Nov 2018: partial, full, partial windows.
        let ps = Period::range(Period::from_ym(2016, 6).unwrap(), 30);
        let factors: Vec<Option<f64>> = (0..30).map(|_| Some(rng.gen_range(0.5..1.5))).collect();
        let base = TimeSeriesTable::from_rows("item", ps.clone(), vec![("a", factors.clone())]).unwrap();

        // Jul 2017 sits in the Feb 2017 - Jan 2018 window (indices 8..20).
        let mut bumped = factors;
        bumped[13] = Some(rng.gen_range(2.0..3.0));
        let bumped = TimeSeriesTable::from_rows("item", ps, vec![("a", bumped)]).unwrap();

        let a = cumulative_adjustments(&base);
        let b = cumulative_adjustments(&bumped);
        for (idx, (x, y)) in a.row(0).unwrap().iter().zip(b.row(0).unwrap()).enumerate() {
            if (8..20).contains(&idx) {
                continue;
            }
            assert_eq!(x, y, "cell {idx} outside the bumped window changed");
        }
        assert_ne!(a.row(0).unwrap()[13], b.row(0).unwrap()[13]);
    }

    #[test]
    fn misaligned_masks_fail_fast() {
        let short = quality().slice_rows(0..3).map(|_| true);
        let err = get_quality_adjustments(&quality(), None, Some(&short)).unwrap_err();
        assert!(matches!(err, AdjustError::ShapeMismatch { ref context, .. } if context == "to_adjust"));

        let err = get_quality_adjustments(&quality(), Some(&short), None).unwrap_err();
        assert!(matches!(err, AdjustError::ShapeMismatch { ref context, .. } if context == "to_reset"));
    }
}
