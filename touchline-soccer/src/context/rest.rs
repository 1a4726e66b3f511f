//! Days of rest before the fixture and fixture congestion over the last month.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideContext, SideFactors};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fewer days of rest than this is a short turnaround.
    pub short_rest_days: i64,
    pub short_rest: f64,
    pub reduced_rest_days: i64,
    pub reduced_rest: f64,
    /// More days of rest than this earns the bonus.
    pub long_rest_days: i64,
    pub long_rest: f64,
    /// Matches in the last 30 days beyond which congestion sets in.
    pub congestion_threshold: u32,
    pub congestion_penalty: f64,
    pub min_congestion: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.short_rest_days <= self.reduced_rest_days
            && self.reduced_rest_days <= self.long_rest_days)
        {
            return Err(anyhow!("rest bands must be in ascending order").into());
        }
        if self.min_congestion <= 0.0 || self.min_congestion > 1.0 {
            return Err(anyhow!("min congestion must lie in (0, 1]").into());
        }
        if self.congestion_penalty < 0.0 {
            return Err(anyhow!("congestion penalty cannot be negative").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            short_rest_days: 3,
            short_rest: 0.92,
            reduced_rest_days: 5,
            reduced_rest: 0.97,
            long_rest_days: 7,
            long_rest: 1.03,
            congestion_threshold: 6,
            congestion_penalty: 0.02,
            min_congestion: 0.90,
        }
    }
}

pub fn rest_multiplier(days: Option<i64>, config: &Config) -> f64 {
    match days {
        None => 1.0,
        Some(days) if days < config.short_rest_days => config.short_rest,
        Some(days) if days < config.reduced_rest_days => config.reduced_rest,
        Some(days) if days <= config.long_rest_days => 1.0,
        Some(_) => config.long_rest,
    }
}

pub fn congestion_multiplier(matches_last_30_days: u32, config: &Config) -> f64 {
    let excess = matches_last_30_days.saturating_sub(config.congestion_threshold);
    f64::max(
        config.min_congestion,
        1.0 - config.congestion_penalty * excess as f64,
    )
}

pub fn multiplier(side: &SideContext, config: &Config) -> f64 {
    rest_multiplier(side.days_since_last_match, config)
        * congestion_multiplier(side.matches_last_30_days, config)
}

#[derive(Debug)]
pub struct Rest(pub Config);

impl Factor for Rest {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let describe = |side: &SideContext| match side.days_since_last_match {
            Some(days) => format!("{days}d rest, {} in 30d", side.matches_last_30_days),
            None => "no recent match".to_string(),
        };
        adjustments.record(
            self.name(),
            SideFactors::attack(multiplier(&snapshot.home, &self.0)),
            SideFactors::attack(multiplier(&snapshot.away, &self.0)),
            format!("{} vs {}", describe(&snapshot.home), describe(&snapshot.away)),
        );
    }
}
