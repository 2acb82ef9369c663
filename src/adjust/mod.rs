//! Quality adjustment.
//!
//! - windowed cumulative products (`cumulative`)
//! - ratio, masking and re-basing orchestration (`quality`)

pub mod cumulative;
pub mod quality;

pub use cumulative::*;
pub use quality::*;
