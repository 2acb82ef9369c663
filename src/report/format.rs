//! Formatted terminal output.
//!
//! All text layout lives here so output changes stay local.

use crate::calendar::WindowSegment;
use crate::domain::Period;
use crate::markers::BasePriceImputation;
use crate::report::{AdjustSummary, MarkerSummary, TableShape};

/// Header block shared by every summary.
pub fn format_shape(title: &str, shape: &TableShape) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== precon - {title} ===\n"));
    out.push_str(&format!(
        "Table: rows={} | periods={} | span={}\n",
        shape.n_rows,
        shape.n_periods,
        fmt_span(shape.first_period, shape.last_period),
    ));
    out.push_str(&format!("Windows: {}\n", shape.windows.len()));
    out
}

pub fn format_adjust_summary(summary: &AdjustSummary) -> String {
    let mut out = format_shape("quality adjustment", &summary.shape);
    out.push_str(&format!("to_reset cells: {}\n", fmt_count(summary.resets)));
    out.push_str(&format!("to_adjust cells: {}\n", fmt_count(summary.adjusted_cells)));
    out.push_str(&format!(
        "Rows with adjustments: {} of {}\n",
        summary.rows_changed, summary.shape.n_rows
    ));
    out.push_str(&format!(
        "Factor range: [{:.6}, {:.6}]\n",
        summary.min_factor, summary.max_factor
    ));
    out
}

pub fn format_marker_summary(summary: &MarkerSummary) -> String {
    let mut out = format_shape("follow-up markers", &summary.shape);
    out.push_str(&format!(
        "Input markers: N={} M={} T={} N2={}\n",
        summary.n, summary.m, summary.t, summary.n2_before
    ));
    out.push_str(&format!("N2 added: {}\n", summary.added()));
    out
}

pub fn format_imputation_summary(group_on: &[&str], imputations: &[BasePriceImputation]) -> String {
    let mut groups: Vec<&[String]> = imputations.iter().map(|i| i.group.as_slice()).collect();
    groups.dedup();
    format!(
        "=== precon - base-price imputations ===\nGrouped on: {}\nPairs: {} | groups affected: {}\n",
        group_on.join(", "),
        imputations.len(),
        groups.len()
    )
}

/// One line per window segment.
pub fn format_windows(periods: &[Period], segments: &[WindowSegment]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<22} {:<10} {:<10} {:>7} {:<8}\n",
            "window", "first", "last", "periods", "partial"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<22} {:-<10} {:-<10} {:-<7} {:-<8}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for seg in segments {
        let first = periods.get(seg.range.start).map(|p| fmt_month(*p)).unwrap_or_default();
        let last = seg
            .range
            .end
            .checked_sub(1)
            .and_then(|i| periods.get(i))
            .map(|p| fmt_month(*p))
            .unwrap_or_default();
        let partial = seg.is_partial_start(periods) || seg.range.len() < 12;
        out.push_str(
            format!(
                "{:<22} {:<10} {:<10} {:>7} {:<8}\n",
                seg.window.to_string(),
                first,
                last,
                seg.range.len(),
                if partial { "yes" } else { "no" },
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_span(first: Option<Period>, last: Option<Period>) -> String {
    match (first, last) {
        (Some(a), Some(b)) => format!("{} .. {}", fmt_month(a), fmt_month(b)),
        _ => "(empty)".to_string(),
    }
}

fn fmt_month(p: Period) -> String {
    p.date().format("%Y-%m").to_string()
}

fn fmt_count(v: Option<usize>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}
