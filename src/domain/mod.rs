//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - period labels, row keys and markers (`Period`, `RowKey`, `Marker`)
//! - the shape-checked table (`TimeSeriesTable`) and its aliases
//! - resolved run configuration (`RunConfig`)

pub mod config;
pub mod table;
pub mod types;

pub use config::*;
pub use table::*;
pub use types::*;
