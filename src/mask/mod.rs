//! Boolean mask primitives.

pub mod shift;

pub use shift::*;
