//! Base-price imputations per group.
//!
//! A group needs its base price imputed in a period as soon as any member
//! needs imputing in that period.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BooleanMask, Period};
use crate::error::AdjustError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationType {
    BasePrice,
}

impl ImputationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImputationType::BasePrice => "base_price",
        }
    }
}

impl fmt::Display for ImputationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (group, period) pair that needs a base-price imputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePriceImputation {
    /// Values of the grouping levels, in `group_on` order.
    pub group: Vec<String>,
    pub period: Period,
    pub imputation_type: ImputationType,
}

/// Reduce `to_impute` to the (group, period) pairs where any row of the group
/// is `true`. Groups are formed from the key levels named in `group_on`.
///
/// The result is sorted by group then period.
pub fn base_price_imputations(
    to_impute: &BooleanMask,
    group_on: &[&str],
) -> Result<Vec<BasePriceImputation>, AdjustError> {
    let levels = resolve_levels(to_impute.key_names(), group_on)?;

    let mut groups: BTreeMap<Vec<String>, Vec<bool>> = BTreeMap::new();
    for (key, row) in to_impute.rows() {
        let group: Vec<String> = levels
            .iter()
            .map(|&l| key.level(l).unwrap_or_default().to_string())
            .collect();
        let acc = groups
            .entry(group)
            .or_insert_with(|| vec![false; to_impute.n_periods()]);
        for (a, &hit) in acc.iter_mut().zip(row) {
            *a |= hit;
        }
    }

    let out: Vec<BasePriceImputation> = groups
        .into_iter()
        .flat_map(|(group, hits)| {
            to_impute
                .periods()
                .iter()
                .zip(hits)
                .filter(|(_, hit)| *hit)
                .map(move |(period, _)| BasePriceImputation {
                    group: group.clone(),
                    period: *period,
                    imputation_type: ImputationType::BasePrice,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    debug!(pairs = out.len(), levels = ?group_on, "base-price imputations");
    Ok(out)
}

fn resolve_levels(key_names: &[String], group_on: &[&str]) -> Result<Vec<usize>, AdjustError> {
    if group_on.is_empty() {
        return Err(AdjustError::Configuration(
            "`group_on` must name at least one key level".to_string(),
        ));
    }
    group_on
        .iter()
        .map(|name| {
            key_names.iter().position(|k| k == name).ok_or_else(|| {
                AdjustError::Configuration(format!(
                    "unknown key level '{name}' (available: {})",
                    key_names.join(", ")
                ))
            })
        })
        .collect()
}
