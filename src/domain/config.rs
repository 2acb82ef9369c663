//! Resolved run configuration.
//!
//! Built from CLI flags (plus environment defaults) by `app`, consumed by
//! `app::pipeline`. Nothing in here touches clap's parser types.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Serialization of table output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Wide CSV, same layout as the inputs.
    #[default]
    Csv,
    /// Pretty JSON document with keys, periods and rows.
    Json,
}

/// Where and how results are written.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// `None` writes to stdout.
    pub out: Option<PathBuf>,
    pub format: OutputFormat,
    /// Decimals for numeric CSV cells.
    pub decimals: usize,
    /// Suppress the run summary on stderr.
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct AdjustConfig {
    pub quality_path: PathBuf,
    pub to_reset_path: Option<PathBuf>,
    pub to_adjust_path: Option<PathBuf>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct MarkersConfig {
    pub markers_path: PathBuf,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct ImputationsConfig {
    pub markers_path: PathBuf,
    pub group_on: Vec<String>,
    /// Add follow-up `N2` markers before deriving the mask.
    pub followup: bool,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct ShiftConfig {
    pub mask_path: PathBuf,
    pub periods: isize,
    pub exclude_months: Option<Vec<u32>>,
    pub only_include_months: Option<Vec<u32>>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct WindowsConfig {
    pub table_path: PathBuf,
}

/// One resolved subcommand.
#[derive(Debug, Clone)]
pub enum RunConfig {
    Adjust(AdjustConfig),
    Markers(MarkersConfig),
    Imputations(ImputationsConfig),
    Shift(ShiftConfig),
    Windows(WindowsConfig),
}
