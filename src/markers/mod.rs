//! Imputation markers.
//!
//! - follow-up `N2` propagation (`followup`)
//! - base-price imputation pairs per group (`imputation`)

pub mod followup;
pub mod imputation;

pub use followup::*;
pub use imputation::*;
