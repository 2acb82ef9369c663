//! Command-line parsing for `precon`.
//!
//! Parsing and dispatch stay apart from the engines: `app` turns these
//! argument structs into a `RunConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::OutputFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "precon",
    version,
    about = "Quality adjustment and imputation markers for monthly price tables"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute cumulative quality adjustment factors from a quality-value table.
    Adjust(AdjustArgs),
    /// Add follow-up `N2` markers to a marker table.
    Markers(MarkersArgs),
    /// List the (group, period) pairs that need a base-price imputation.
    Imputations(ImputationsArgs),
    /// Shift a boolean mask along the period axis.
    Shift(ShiftArgs),
    /// Show the February-January windows covered by a table's periods.
    Windows(WindowsArgs),
}

/// Output options shared by every table-producing subcommand.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Write results here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, env = "PRECON_FORMAT", default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Decimals for numeric CSV cells.
    #[arg(long, env = "PRECON_DECIMALS", default_value_t = 6)]
    pub decimals: usize,

    /// Do not print the run summary to stderr.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AdjustArgs {
    /// Wide CSV of quality values (keys, then one column per month).
    #[arg(long, value_name = "CSV")]
    pub quality: PathBuf,

    /// Boolean CSV: periods where the cumulative factor restarts at 1.
    #[arg(long = "to-reset", value_name = "CSV")]
    pub to_reset: Option<PathBuf>,

    /// Boolean CSV: periods whose quality change is applied (all others count as no change).
    #[arg(long = "to-adjust", value_name = "CSV")]
    pub to_adjust: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct MarkersArgs {
    /// Wide CSV of markers (empty, N, M, T, N2).
    #[arg(long, value_name = "CSV")]
    pub markers: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ImputationsArgs {
    /// Wide CSV of markers; cells holding N or N2 need imputing.
    #[arg(long, value_name = "CSV")]
    pub markers: PathBuf,

    /// Key level(s) to group on. Repeat or comma-separate for several levels.
    #[arg(long = "group-on", value_name = "LEVEL", value_delimiter = ',', required = true)]
    pub group_on: Vec<String>,

    /// Use the markers as given, without adding follow-up N2 markers first.
    #[arg(long)]
    pub no_followup: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShiftArgs {
    /// Boolean CSV to shift.
    #[arg(long, value_name = "CSV")]
    pub mask: PathBuf,

    /// Number of periods to shift by (negative shifts earlier).
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub periods: isize,

    /// Calendar months (1-12) dropped from the source before shifting.
    #[arg(long = "exclude-months", value_name = "MONTHS", value_delimiter = ',')]
    pub exclude_months: Vec<u32>,

    /// Calendar months (1-12) kept in the source before shifting.
    #[arg(long = "only-include-months", value_name = "MONTHS", value_delimiter = ',')]
    pub only_include_months: Vec<u32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct WindowsArgs {
    /// Any wide CSV; only its header is read.
    #[arg(long, value_name = "CSV")]
    pub table: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_shift_with_month_lists() {
        let cli = Cli::try_parse_from([
            "precon",
            "shift",
            "--mask",
            "m.csv",
            "--periods",
            "-2",
            "--exclude-months",
            "1,12",
        ])
        .unwrap();
        match cli.command {
            Command::Shift(args) => {
                assert_eq!(args.periods, -2);
                assert_eq!(args.exclude_months, vec![1, 12]);
                assert!(args.only_include_months.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn imputations_require_a_grouping_level() {
        assert!(Cli::try_parse_from(["precon", "imputations", "--markers", "m.csv"]).is_err());

        let cli = Cli::try_parse_from([
            "precon",
            "imputations",
            "--markers",
            "m.csv",
            "--group-on",
            "level_1,level_2",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Imputations(args) => {
                assert_eq!(args.group_on, vec!["level_1".to_string(), "level_2".to_string()]);
                assert_eq!(args.output.format, OutputFormat::Json);
                assert!(!args.no_followup);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
