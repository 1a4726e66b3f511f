//! Expected goals for each side, from team strengths and contextual multipliers.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::domain::TeamId;
use crate::error::ValidationError;
use crate::strength::StrengthTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub home_advantage: f64,
    pub min_goals: f64,
    pub max_goals: f64,
    /// Expected goals used when no strength table is available.
    pub default_home_goals: f64,
    pub default_away_goals: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.home_advantage <= 0.0 {
            return Err(anyhow!("home advantage must be positive").into());
        }
        if self.min_goals <= 0.0 || self.min_goals >= self.max_goals {
            return Err(anyhow!("goal bounds must satisfy 0 < min < max").into());
        }
        if !(self.min_goals..=self.max_goals).contains(&self.default_home_goals)
            || !(self.min_goals..=self.max_goals).contains(&self.default_away_goals)
        {
            return Err(anyhow!("default expected goals must lie within the goal bounds").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_advantage: 1.12,
            min_goals: 0.3,
            max_goals: 4.0,
            default_home_goals: 1.45,
            default_away_goals: 1.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedGoals {
    pub home: f64,
    pub away: f64,
}
impl ExpectedGoals {
    pub fn total(&self) -> f64 {
        self.home + self.away
    }
}

/// Expected goals before any contextual adjustment. With a strength table the home rate is
/// `home_attack × away_defense × league_home_average × home_advantage` and the away rate is
/// `away_attack × home_defense × league_away_average`. Without one, the configured defaults stand
/// in for the strength product and home advantage still applies.
pub fn base(
    table: Option<&StrengthTable>,
    home: &TeamId,
    away: &TeamId,
    config: &Config,
) -> ExpectedGoals {
    match table {
        Some(table) => {
            let home_profile = table.profile_or_average(home);
            let away_profile = table.profile_or_average(away);
            ExpectedGoals {
                home: home_profile.home_attack
                    * away_profile.away_defense
                    * table.avg_home_goals
                    * config.home_advantage,
                away: away_profile.away_attack * home_profile.home_defense * table.avg_away_goals,
            }
        }
        None => ExpectedGoals {
            home: config.default_home_goals * config.home_advantage,
            away: config.default_away_goals,
        },
    }
}

/// Applies the per-side multipliers and clamps both rates to the configured bounds, keeping them
/// away from the degenerate tails of the score distribution.
pub fn adjust(
    base: &ExpectedGoals,
    home_multiplier: f64,
    away_multiplier: f64,
    config: &Config,
) -> ExpectedGoals {
    let clamp = |rate: f64| {
        if rate.is_nan() {
            config.min_goals
        } else {
            rate.clamp(config.min_goals, config.max_goals)
        }
    };
    ExpectedGoals {
        home: clamp(base.home * home_multiplier),
        away: clamp(base.away * away_multiplier),
    }
}
