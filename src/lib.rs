//! `precon` library crate.
//!
//! Price-index preprocessing on wide monthly tables: cumulative quality
//! adjustment within February-January windows, follow-up imputation markers,
//! and base-price imputation lists.
//!
//! The binary (`precon`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the engines can be embedded in other pipelines

pub mod adjust;
pub mod app;
pub mod calendar;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod mask;
pub mod markers;
pub mod report;
