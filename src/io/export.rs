//! Export tables and imputation lists.
//!
//! Tables go out in the same wide layout they came in (CSV) or as a
//! self-describing JSON document. Imputations are a long CSV, one pair per
//! line.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::{Marker, Period, RowKey, TimeSeriesTable};
use crate::error::AppError;
use crate::markers::BasePriceImputation;

/// How a cell is rendered in CSV output.
pub trait CsvCell {
    fn render(&self, decimals: usize) -> String;
}

impl CsvCell for f64 {
    fn render(&self, decimals: usize) -> String {
        format!("{self:.decimals$}")
    }
}

impl CsvCell for Option<f64> {
    fn render(&self, decimals: usize) -> String {
        self.map(|v| v.render(decimals)).unwrap_or_default()
    }
}

impl CsvCell for bool {
    fn render(&self, _decimals: usize) -> String {
        self.to_string()
    }
}

impl CsvCell for Marker {
    fn render(&self, _decimals: usize) -> String {
        self.as_str().to_string()
    }
}

/// JSON document for a single table.
#[derive(Debug, Clone, Serialize)]
pub struct TableFile<'a, T: Serialize> {
    pub tool: &'static str,
    /// What the table holds, e.g. `quality_adjustments` or `markers`.
    pub kind: &'a str,
    pub key_names: &'a [String],
    pub periods: &'a [Period],
    pub rows: Vec<TableFileRow<'a, T>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableFileRow<'a, T: Serialize> {
    pub key: &'a RowKey,
    pub values: &'a [T],
}

/// Write `table` as wide CSV to any writer.
pub fn write_table_csv<W: Write, T: CsvCell>(
    writer: W,
    table: &TimeSeriesTable<T>,
    decimals: usize,
) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header = table
        .key_names()
        .iter()
        .cloned()
        .chain(table.periods().iter().map(Period::to_string));
    wtr.write_record(header).map_err(csv_err)?;

    for (key, row) in table.rows() {
        let record = key
            .parts()
            .iter()
            .cloned()
            .chain(row.iter().map(|c| c.render(decimals)));
        wtr.write_record(record).map_err(csv_err)?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV output: {e}")))
}

/// Write `table` as pretty JSON to any writer.
pub fn write_table_json<W: Write, T: Serialize>(
    writer: W,
    kind: &str,
    table: &TimeSeriesTable<T>,
) -> Result<(), AppError> {
    let doc = TableFile {
        tool: "precon",
        kind,
        key_names: table.key_names(),
        periods: table.periods(),
        rows: table
            .rows()
            .map(|(key, values)| TableFileRow { key, values })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON output: {e}")))
}

/// Write base-price imputations as `level..., period, imputation_type`.
pub fn write_imputations_csv<W: Write>(
    writer: W,
    group_on: &[&str],
    imputations: &[BasePriceImputation],
) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header = group_on
        .iter()
        .copied()
        .chain(["period", "imputation_type"]);
    wtr.write_record(header).map_err(csv_err)?;

    for imp in imputations {
        let record = imp
            .group
            .iter()
            .cloned()
            .chain([imp.period.to_string(), imp.imputation_type.to_string()]);
        wtr.write_record(record).map_err(csv_err)?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV output: {e}")))
}

/// Output destination: a file path, or stdout when none is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, AppError> {
    match path {
        Some(p) => {
            let file = File::create(p)
                .map_err(|e| AppError::new(2, format!("Failed to create output '{}': {e}", p.display())))?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::new(2, format!("Failed to write CSV output: {e}"))
}
