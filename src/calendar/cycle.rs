//! February-to-January windows over a period sequence.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::domain::Period;

/// Calendar month that opens every annual window.
pub const WINDOW_START_MONTH: u32 = 2;

/// Calendar month that closes every annual window.
pub const WINDOW_END_MONTH: u32 = 1;

/// The window `[February start_year, January start_year + 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnualWindow {
    start_year: i32,
}

impl AnnualWindow {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// The window a period belongs to. Depends on the calendar month only.
    pub fn containing(period: Period) -> Self {
        if period.month() >= WINDOW_START_MONTH {
            Self::new(period.year())
        } else {
            Self::new(period.year() - 1)
        }
    }

    pub fn start_year(self) -> i32 {
        self.start_year
    }

    pub fn first_period(self) -> Option<Period> {
        Period::from_ym(self.start_year, WINDOW_START_MONTH)
    }

    pub fn last_period(self) -> Option<Period> {
        Period::from_ym(self.start_year + 1, WINDOW_END_MONTH)
    }

    pub fn contains(self, period: Period) -> bool {
        Self::containing(period) == self
    }
}

impl fmt::Display for AnnualWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Feb {} - Jan {}", self.start_year, self.start_year + 1)
    }
}

/// True iff `period` opens its window (is a February).
pub fn is_window_start(period: Period) -> bool {
    period.month() == WINDOW_START_MONTH
}

/// A run of consecutive period indices that share one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSegment {
    pub window: AnnualWindow,
    pub range: Range<usize>,
}

impl WindowSegment {
    /// A segment that does not begin with its window's February, e.g. the
    /// first segment of a table starting in June.
    pub fn is_partial_start(&self, periods: &[Period]) -> bool {
        periods
            .get(self.range.start)
            .is_none_or(|p| !is_window_start(*p))
    }
}

/// Window membership for a whole period sequence, computed once and reused
/// for every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleIndex {
    windows: Vec<AnnualWindow>,
    first_of_window: Vec<bool>,
    segments: Vec<WindowSegment>,
}

impl CycleIndex {
    /// `periods` must be strictly increasing (guaranteed by `TimeSeriesTable`).
    pub fn new(periods: &[Period]) -> Self {
        let windows: Vec<AnnualWindow> = periods.iter().map(|p| AnnualWindow::containing(*p)).collect();
        let first_of_window = periods.iter().map(|p| is_window_start(*p)).collect();

        let mut segments: Vec<WindowSegment> = Vec::new();
        for (idx, window) in windows.iter().enumerate() {
            match segments.last_mut() {
                Some(seg) if seg.window == *window => seg.range.end = idx + 1,
                _ => segments.push(WindowSegment {
                    window: *window,
                    range: idx..idx + 1,
                }),
            }
        }

        Self {
            windows,
            first_of_window,
            segments,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window_of(&self, idx: usize) -> Option<AnnualWindow> {
        self.windows.get(idx).copied()
    }

    pub fn is_first_of_window(&self, idx: usize) -> bool {
        self.first_of_window.get(idx).copied().unwrap_or(false)
    }

    pub fn segments(&self) -> &[WindowSegment] {
        &self.segments
    }
}
