//! Annual cycle windowing.
//!
//! Price bases are refreshed every January and apply from February, so all
//! accumulation restarts on a February-to-January cycle instead of the
//! calendar year.

pub mod cycle;

pub use cycle::*;
