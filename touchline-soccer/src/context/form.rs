//! Recent results, weighted toward the latest.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideFactors};
use crate::domain::MatchResult;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: usize,
    pub decay: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.window == 0 {
            return Err(anyhow!("form window cannot be empty").into());
        }
        if self.decay <= 0.0 || self.decay > 1.0 {
            return Err(anyhow!("form decay must lie in (0, 1]").into());
        }
        if self.min_multiplier <= 0.0 || self.min_multiplier > self.max_multiplier {
            return Err(anyhow!("form multipliers must satisfy 0 < min ≤ max").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: 6,
            decay: 0.82,
            min_multiplier: 0.85,
            max_multiplier: 1.15,
        }
    }
}

/// Decay-weighted share of the available points, in `[0, 1]`. `results` are newest first.
/// `None` when there are no results.
pub fn score(results: &[MatchResult], config: &Config) -> Option<f64> {
    let (mut earned, mut available) = (0.0, 0.0);
    let mut weight = 1.0;
    for result in results.iter().take(config.window) {
        earned += weight * result.points() as f64;
        available += weight * MatchResult::Win.points() as f64;
        weight *= config.decay;
    }
    if available > 0.0 {
        Some(earned / available)
    } else {
        None
    }
}

/// Maps a form score linearly onto the configured multiplier range; no results is neutral.
pub fn multiplier(results: &[MatchResult], config: &Config) -> f64 {
    match score(results, config) {
        Some(score) => {
            config.min_multiplier + (config.max_multiplier - config.min_multiplier) * score
        }
        None => 1.0,
    }
}

#[derive(Debug)]
pub struct Form(pub Config);

impl Factor for Form {
    fn name(&self) -> &'static str {
        "form"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let home = multiplier(&snapshot.home.recent, &self.0);
        let away = multiplier(&snapshot.away.recent, &self.0);
        adjustments.record(
            self.name(),
            SideFactors::attack(home),
            SideFactors::attack(away),
            format!(
                "{} vs {} recent results",
                snapshot.home.recent.len(),
                snapshot.away.recent.len()
            ),
        );
    }
}
