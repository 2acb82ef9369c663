//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments into a `RunConfig`
//! - runs the matching pipeline
//! - writes results and the run summary

use std::io::Write;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{AdjustArgs, Cli, Command, ImputationsArgs, MarkersArgs, OutputArgs, ShiftArgs, WindowsArgs};
use crate::domain::{
    AdjustConfig, ImputationsConfig, MarkersConfig, OutputConfig, OutputFormat, RunConfig, ShiftConfig,
    TimeSeriesTable, WindowsConfig,
};
use crate::error::AppError;
use crate::io::export::{CsvCell, open_output, write_imputations_csv, write_table_csv, write_table_json};
use crate::report;

pub mod pipeline;

/// Entry point for the `precon` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    execute(run_config_from_command(cli.command))
}

/// Logs go to stderr so stdout stays clean for table output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("PRECON_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when embedded in another program.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run one resolved subcommand.
pub fn execute(config: RunConfig) -> Result<(), AppError> {
    match config {
        RunConfig::Adjust(cfg) => {
            let run = pipeline::run_adjust(&cfg)?;
            emit_table(&run.factors, "quality_adjustments", &cfg.output)?;
            print_summary(&cfg.output, || report::format_adjust_summary(&run.summary));
        }
        RunConfig::Markers(cfg) => {
            let run = pipeline::run_markers(&cfg)?;
            emit_table(&run.markers, "markers", &cfg.output)?;
            print_summary(&cfg.output, || report::format_marker_summary(&run.summary));
        }
        RunConfig::Imputations(cfg) => {
            let run = pipeline::run_imputations(&cfg)?;
            let group_on: Vec<&str> = cfg.group_on.iter().map(String::as_str).collect();

            let mut writer = open_output(cfg.output.out.as_deref())?;
            match cfg.output.format {
                OutputFormat::Csv => write_imputations_csv(&mut writer, &group_on, &run.imputations)?,
                OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, &run.imputations)
                    .map_err(|e| AppError::new(2, format!("Failed to write JSON output: {e}")))?,
            }
            writer
                .flush()
                .map_err(|e| AppError::new(2, format!("Failed to flush output: {e}")))?;

            print_summary(&cfg.output, || {
                let mut text = String::new();
                if let Some(summary) = &run.followup {
                    text.push_str(&report::format_marker_summary(summary));
                }
                text.push_str(&report::format_imputation_summary(&group_on, &run.imputations));
                text
            });
        }
        RunConfig::Shift(cfg) => {
            let shifted = pipeline::run_shift(&cfg)?;
            emit_table(&shifted, "shifted_mask", &cfg.output)?;
        }
        RunConfig::Windows(cfg) => {
            let run = pipeline::run_windows(&cfg)?;
            let text = report::format_windows(&run.periods, run.cycles.segments());
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .map_err(|e| AppError::new(2, format!("Failed to write output: {e}")))?;
        }
    }
    Ok(())
}

fn emit_table<T: CsvCell + Serialize>(
    table: &TimeSeriesTable<T>,
    kind: &str,
    output: &OutputConfig,
) -> Result<(), AppError> {
    let mut writer = open_output(output.out.as_deref())?;
    match output.format {
        OutputFormat::Csv => write_table_csv(&mut writer, table, output.decimals)?,
        OutputFormat::Json => {
            write_table_json(&mut writer, kind, table)?;
            writeln!(writer).map_err(|e| AppError::new(2, format!("Failed to write output: {e}")))?;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush output: {e}")))
}

fn print_summary(output: &OutputConfig, render: impl FnOnce() -> String) {
    if !output.quiet {
        eprint!("{}", render());
    }
}

pub fn run_config_from_command(command: Command) -> RunConfig {
    match command {
        Command::Adjust(args) => RunConfig::Adjust(adjust_config_from_args(args)),
        Command::Markers(args) => RunConfig::Markers(markers_config_from_args(args)),
        Command::Imputations(args) => RunConfig::Imputations(imputations_config_from_args(args)),
        Command::Shift(args) => RunConfig::Shift(shift_config_from_args(args)),
        Command::Windows(args) => RunConfig::Windows(windows_config_from_args(args)),
    }
}

fn output_config_from_args(args: OutputArgs) -> OutputConfig {
    OutputConfig {
        out: args.out,
        format: args.format,
        decimals: args.decimals,
        quiet: args.quiet,
    }
}

fn adjust_config_from_args(args: AdjustArgs) -> AdjustConfig {
    AdjustConfig {
        quality_path: args.quality,
        to_reset_path: args.to_reset,
        to_adjust_path: args.to_adjust,
        output: output_config_from_args(args.output),
    }
}

fn markers_config_from_args(args: MarkersArgs) -> MarkersConfig {
    MarkersConfig {
        markers_path: args.markers,
        output: output_config_from_args(args.output),
    }
}

fn imputations_config_from_args(args: ImputationsArgs) -> ImputationsConfig {
    ImputationsConfig {
        markers_path: args.markers,
        group_on: args.group_on,
        followup: !args.no_followup,
        output: output_config_from_args(args.output),
    }
}

fn shift_config_from_args(args: ShiftArgs) -> ShiftConfig {
    // An empty list means "not given".
    let non_empty = |v: Vec<u32>| if v.is_empty() { None } else { Some(v) };
    ShiftConfig {
        mask_path: args.mask,
        periods: args.periods,
        exclude_months: non_empty(args.exclude_months),
        only_include_months: non_empty(args.only_include_months),
        output: output_config_from_args(args.output),
    }
}

fn windows_config_from_args(args: WindowsArgs) -> WindowsConfig {
    WindowsConfig {
        table_path: args.table,
    }
}
