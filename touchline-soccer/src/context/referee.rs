//! Referee penalty tendency.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideFactors};
use crate::domain::RefereeRecord;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// League penalties awarded per match.
    pub baseline_penalties: f64,
    /// Goal inflation per unit of bias above 1.0.
    pub inflation: f64,
    pub min_inflation: f64,
    pub max_inflation: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.baseline_penalties <= 0.0 {
            return Err(anyhow!("baseline penalties must be positive").into());
        }
        if self.min_inflation <= 0.0 || self.min_inflation > 1.0 || self.max_inflation < 1.0 {
            return Err(anyhow!("inflation bounds must straddle 1.0").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baseline_penalties: 0.30,
            inflation: 0.03,
            min_inflation: 0.97,
            max_inflation: 1.06,
        }
    }
}

/// Penalties per match relative to the league baseline; 1.0 without a record.
pub fn bias(referee: Option<&RefereeRecord>, config: &Config) -> f64 {
    match referee {
        Some(referee) if referee.penalties_per_match.is_finite() => {
            f64::max(0.0, referee.penalties_per_match) / config.baseline_penalties
        }
        _ => 1.0,
    }
}

pub fn goal_inflation(bias: f64, config: &Config) -> f64 {
    (1.0 + config.inflation * (bias - 1.0)).clamp(config.min_inflation, config.max_inflation)
}

#[derive(Debug)]
pub struct Referee(pub Config);

impl Factor for Referee {
    fn name(&self) -> &'static str {
        "referee"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let bias = bias(snapshot.referee.as_ref(), &self.0);
        adjustments.referee_bias = bias;
        let inflation = goal_inflation(bias, &self.0);
        let detail = match &snapshot.referee {
            Some(referee) => format!("{} bias {bias:.2}", referee.name),
            None => String::new(),
        };
        adjustments.record(
            self.name(),
            SideFactors::attack(inflation),
            SideFactors::attack(inflation),
            detail,
        );
    }
}
