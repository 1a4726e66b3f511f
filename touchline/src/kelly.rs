//! Fractional Kelly stake sizing.
//!
//! The full Kelly fraction of a bet priced at decimal odds `o`, with a modelled win probability
//! `p`, is `(p·o − 1) / (o − 1)`, i.e., the edge divided by the net odds. Staking the full fraction
//! maximises long-run growth but is extremely sensitive to model error, so it is scaled down and
//! capped at a fixed share of the bankroll.

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Expected return per unit staked, in excess of the stake.
#[inline]
pub fn edge(prob: f64, price: f64) -> f64 {
    prob * price - 1.0
}

/// The full (unscaled) Kelly fraction; zero for non-positive edges or degenerate prices.
#[inline]
pub fn full_fraction(edge: f64, price: f64) -> f64 {
    if price <= 1.0 || edge <= 0.0 {
        0.0
    } else {
        edge / (price - 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Multiplier applied to the full Kelly fraction.
    pub fraction: f64,
    /// Largest share of the bankroll that may be staked on a single selection.
    pub max_stake: f64,
    /// Edges at or below this threshold are not staked.
    pub min_edge: f64,
}
impl KellyConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(0.0..=1.0).contains(&self.fraction) || self.fraction == 0.0 {
            bail!("Kelly fraction must lie in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.max_stake) {
            bail!("max stake must lie in [0, 1]");
        }
        if self.min_edge < 0.0 {
            bail!("min edge must be non-negative");
        }
        Ok(())
    }

    /// Bankroll fraction to stake for the given `edge` at decimal `price`.
    pub fn stake(&self, edge: f64, price: f64) -> f64 {
        if edge <= self.min_edge {
            return 0.0;
        }
        f64::min(full_fraction(edge, price) * self.fraction, self.max_stake)
    }

    pub fn is_value(&self, edge: f64) -> bool {
        edge > self.min_edge
    }
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            fraction: 0.25,
            max_stake: 0.05,
            min_edge: 0.05,
        }
    }
}
