//! Shared domain types.
//!
//! These types are small and serializable so they can be:
//!
//! - parsed from CSV headers/cells
//! - used as keys and cell values inside `TimeSeriesTable`
//! - exported to JSON

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AdjustError;

/// A calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(NaiveDate);

impl Period {
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Period)
    }

    /// Any date inside the month maps to that month.
    pub fn from_date(date: NaiveDate) -> Self {
        Period(date.with_day(1).unwrap_or(date))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Month number, `1..=12`.
    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Period)
    }

    /// `count` consecutive months starting at `start`.
    pub fn range(start: Period, count: usize) -> Vec<Period> {
        let mut out = Vec::with_capacity(count);
        let mut current = Some(start);
        while out.len() < count {
            let Some(p) = current else { break };
            out.push(p);
            current = p.next();
        }
        out
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Period {
    type Err = AdjustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Day-first formats are the common spreadsheet exports; month-only
        // labels (`2017-01`, `201701`) show up in index extracts.
        const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
        let s = s.trim();
        for fmt in FMTS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Ok(Period::from_date(d));
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
            return Ok(Period::from_date(d));
        }
        if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}01"), "%Y%m%d") {
                return Ok(Period::from_date(d));
            }
        }
        Err(AdjustError::Parse(format!(
            "Invalid period '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD, YYYY-MM, YYYYMM."
        )))
    }
}

/// Row identifier. Composite keys (e.g. item x region) hold one value per level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(Vec<String>);

impl RowKey {
    pub fn new(parts: Vec<String>) -> Self {
        RowKey(parts)
    }

    pub fn single(value: impl Into<String>) -> Self {
        RowKey(vec![value.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn level(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Categorical cell annotation.
///
/// - `N`: the price needs imputing this period
/// - `M`: missing
/// - `T`: temporarily unavailable
/// - `N2`: follow-up imputation, the base reference value was itself imputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Marker {
    #[default]
    #[serde(rename = "")]
    Empty,
    N,
    M,
    T,
    N2,
}

impl Marker {
    pub fn as_str(self) -> &'static str {
        match self {
            Marker::Empty => "",
            Marker::N => "N",
            Marker::M => "M",
            Marker::T => "T",
            Marker::N2 => "N2",
        }
    }

    /// The cell already carries its own `N`, `M` or `T` annotation.
    pub fn is_marked(self) -> bool {
        matches!(self, Marker::N | Marker::M | Marker::T)
    }

    /// `M` or `T`: no usable observation, so a follow-up has to look further ahead.
    pub fn is_unavailable(self) -> bool {
        matches!(self, Marker::M | Marker::T)
    }

    pub fn needs_imputation(self) -> bool {
        matches!(self, Marker::N | Marker::N2)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marker {
    type Err = AdjustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" => Ok(Marker::Empty),
            "N" => Ok(Marker::N),
            "M" => Ok(Marker::M),
            "T" => Ok(Marker::T),
            "N2" => Ok(Marker::N2),
            other => Err(AdjustError::Parse(format!(
                "Invalid marker '{other}'. Expected one of: (empty), N, M, T, N2."
            ))),
        }
    }
}
