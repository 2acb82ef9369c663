//! Input/output helpers.
//!
//! - wide-CSV ingest + validation (`ingest`)
//! - table and imputation exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
