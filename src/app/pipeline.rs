//! Per-subcommand workflows: load inputs, run the engine, summarize.
//!
//! Nothing here writes output; `app` decides where results go. That keeps
//! every workflow callable from tests with plain temp files.

use tracing::info;

use crate::adjust::get_quality_adjustments;
use crate::calendar::CycleIndex;
use crate::domain::{
    AdjustConfig, BooleanMask, FactorTable, ImputationsConfig, MarkerTable, MarkersConfig, Period, ShiftConfig,
    WindowsConfig,
};
use crate::error::AppError;
use crate::io::ingest::{read_bool_table, read_header, read_marker_table, read_value_table};
use crate::markers::{BasePriceImputation, add_followup_markers, base_price_imputations};
use crate::report::{AdjustSummary, MarkerSummary, summarize_adjustments, summarize_markers};

/// Outputs of `precon adjust`.
#[derive(Debug, Clone)]
pub struct AdjustRun {
    pub factors: FactorTable,
    pub summary: AdjustSummary,
}

/// Outputs of `precon markers`.
#[derive(Debug, Clone)]
pub struct MarkersRun {
    pub markers: MarkerTable,
    pub summary: MarkerSummary,
}

/// Outputs of `precon imputations`.
#[derive(Debug, Clone)]
pub struct ImputationsRun {
    pub imputations: Vec<BasePriceImputation>,
    /// Follow-up summary, when markers were propagated first.
    pub followup: Option<MarkerSummary>,
}

/// Outputs of `precon windows`.
#[derive(Debug, Clone)]
pub struct WindowsRun {
    pub periods: Vec<Period>,
    pub cycles: CycleIndex,
}

pub fn run_adjust(config: &AdjustConfig) -> Result<AdjustRun, AppError> {
    let quality = read_value_table(&config.quality_path)?;
    let to_reset = config.to_reset_path.as_deref().map(read_bool_table).transpose()?;
    let to_adjust = config.to_adjust_path.as_deref().map(read_bool_table).transpose()?;

    let factors = get_quality_adjustments(&quality, to_reset.as_ref(), to_adjust.as_ref())?;
    let summary = summarize_adjustments(&factors, to_reset.as_ref(), to_adjust.as_ref());
    info!(
        rows = summary.shape.n_rows,
        periods = summary.shape.n_periods,
        rows_changed = summary.rows_changed,
        "quality adjustments computed"
    );

    Ok(AdjustRun { factors, summary })
}

pub fn run_markers(config: &MarkersConfig) -> Result<MarkersRun, AppError> {
    let input = read_marker_table(&config.markers_path)?;
    let markers = add_followup_markers(&input)?;
    let summary = summarize_markers(&input, &markers);
    info!(added = summary.added(), "follow-up markers added");
    Ok(MarkersRun { markers, summary })
}

pub fn run_imputations(config: &ImputationsConfig) -> Result<ImputationsRun, AppError> {
    let input = read_marker_table(&config.markers_path)?;

    let (markers, followup) = if config.followup {
        let propagated = add_followup_markers(&input)?;
        let summary = summarize_markers(&input, &propagated);
        (propagated, Some(summary))
    } else {
        (input, None)
    };

    let to_impute = markers.map(|m| m.needs_imputation());
    let group_on: Vec<&str> = config.group_on.iter().map(String::as_str).collect();
    let imputations = base_price_imputations(&to_impute, &group_on)?;
    info!(pairs = imputations.len(), "base-price imputations listed");

    Ok(ImputationsRun { imputations, followup })
}

pub fn run_shift(config: &ShiftConfig) -> Result<BooleanMask, AppError> {
    let mask = read_bool_table(&config.mask_path)?;
    let shifted = crate::mask::shift(
        &mask,
        config.periods,
        config.exclude_months.as_deref(),
        config.only_include_months.as_deref(),
    )?;
    info!(
        periods = config.periods,
        before = mask.count_true(),
        after = shifted.count_true(),
        "mask shifted"
    );
    Ok(shifted)
}

pub fn run_windows(config: &WindowsConfig) -> Result<WindowsRun, AppError> {
    let header = read_header(&config.table_path)?;
    let cycles = CycleIndex::new(&header.periods);
    Ok(WindowsRun {
        periods: header.periods,
        cycles,
    })
}
