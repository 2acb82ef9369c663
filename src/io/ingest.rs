//! Wide-CSV ingest.
//!
//! Layout: leading key columns, then one column per monthly period. The first
//! header that parses as a date starts the period columns; everything before it
//! is a key level.
//!
//! Unlike a row-per-observation load, nothing is skipped here: dropping a row
//! would silently misalign it against the other tables of the run, so the first
//! bad cell fails the whole file with its line and column.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{BooleanMask, Marker, MarkerTable, Period, RowKey, TimeSeriesTable, ValueTable};
use crate::error::AppError;

/// Split of the header row into key levels and periods.
#[derive(Debug, Clone, PartialEq)]
pub struct WideHeader {
    pub key_names: Vec<String>,
    pub periods: Vec<Period>,
}

/// Read a numeric table. Empty cells are undefined.
pub fn read_value_table(path: &Path) -> Result<ValueTable, AppError> {
    read_table(path, parse_value_cell)
}

/// Read a boolean mask (`true/false/t/f/1/0/yes/no`).
pub fn read_bool_table(path: &Path) -> Result<BooleanMask, AppError> {
    read_table(path, parse_bool_cell)
}

/// Read a marker table (empty, `N`, `M`, `T`, `N2`).
pub fn read_marker_table(path: &Path) -> Result<MarkerTable, AppError> {
    read_table(path, |s| s.parse::<Marker>().map_err(|e| e.to_string()))
}

/// Read only the header row of a wide CSV.
pub fn read_header(path: &Path) -> Result<WideHeader, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    split_header(headers)
}

/// Open `path` and parse it as a wide table with `parse` applied to each cell.
pub fn read_table<T>(path: &Path, parse: impl Fn(&str) -> Result<T, String>) -> Result<TimeSeriesTable<T>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = read_table_from_reader(file, parse)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    debug!(
        path = %path.display(),
        rows = table.n_rows(),
        periods = table.n_periods(),
        "loaded table"
    );
    Ok(table)
}

/// Parse a wide table from any reader.
pub fn read_table_from_reader<R: Read, T>(
    reader: R,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<TimeSeriesTable<T>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header = split_header(&headers)?;
    let n_keys = header.key_names.len();
    let width = n_keys + header.periods.len();

    let mut row_keys = Vec::new();
    let mut cells = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("line {line}: CSV parse error: {e}")))?;

        if record.len() != width {
            return Err(AppError::new(
                2,
                format!("line {line}: expected {width} fields, found {}", record.len()),
            ));
        }

        let key: Vec<String> = record.iter().take(n_keys).map(str::to_string).collect();
        let mut row = Vec::with_capacity(header.periods.len());
        for (offset, raw) in record.iter().skip(n_keys).enumerate() {
            let column = n_keys + offset + 1;
            let cell = parse(raw).map_err(|msg| {
                AppError::new(
                    2,
                    format!("line {line}, column {column} ({}): {msg}", header.periods[offset]),
                )
            })?;
            row.push(cell);
        }

        row_keys.push(RowKey::new(key));
        cells.push(row);
    }

    Ok(TimeSeriesTable::new(header.key_names, row_keys, header.periods, cells)?)
}

/// Classify header cells into key levels and periods.
pub fn split_header(headers: &StringRecord) -> Result<WideHeader, AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let first_period = names
        .iter()
        .position(|n| n.parse::<Period>().is_ok())
        .ok_or_else(|| AppError::new(2, "No period columns found in CSV header."))?;

    if first_period == 0 {
        return Err(AppError::new(
            2,
            "CSV header must start with at least one key column before the period columns.",
        ));
    }

    let mut periods = Vec::with_capacity(names.len() - first_period);
    for (idx, name) in names.iter().enumerate().skip(first_period) {
        let period = name.parse::<Period>().map_err(|e| {
            AppError::new(
                2,
                format!("Header column {} ('{name}') follows the period columns but is not a period: {e}", idx + 1),
            )
        })?;
        periods.push(period);
    }

    Ok(WideHeader {
        key_names: names[..first_period].to_vec(),
        periods,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

pub fn parse_value_cell(s: &str) -> Result<Option<f64>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}'."))?;
    if v.is_finite() {
        Ok(Some(v))
    } else {
        Err(format!("Non-finite number '{s}'."))
    }
}

pub fn parse_bool_cell(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Ok(true),
        "false" | "f" | "0" | "no" => Ok(false),
        other => Err(format!(
            "Invalid boolean '{other}'. Expected one of: true, false, t, f, 1, 0, yes, no."
        )),
    }
}
