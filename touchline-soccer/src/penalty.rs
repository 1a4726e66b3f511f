//! Probability of at least one penalty being awarded in the match.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{ContextSnapshot, SideContext};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// League penalties per match.
    pub base_rate: f64,
    pub league_fouls_committed: f64,
    pub league_fouls_drawn: f64,
    pub league_dribbles: f64,
    /// Tension when one side has elevated stakes.
    pub one_elevated: f64,
    pub both_elevated: f64,
    pub min_probability: f64,
    pub max_probability: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_rate <= 0.0 {
            return Err(anyhow!("base penalty rate must be positive").into());
        }
        if self.league_fouls_committed <= 0.0
            || self.league_fouls_drawn <= 0.0
            || self.league_dribbles <= 0.0
        {
            return Err(anyhow!("league discipline averages must be positive").into());
        }
        if !(0.0 <= self.min_probability
            && self.min_probability <= self.max_probability
            && self.max_probability <= 1.0)
        {
            return Err(
                anyhow!("penalty probability bounds must satisfy 0 ≤ min ≤ max ≤ 1").into(),
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_rate: 0.30,
            league_fouls_committed: 11.5,
            league_fouls_drawn: 11.5,
            league_dribbles: 8.5,
            one_elevated: 1.10,
            both_elevated: 1.15,
            min_probability: 0.05,
            max_probability: 0.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyEstimate {
    /// Expected penalties in the match.
    pub rate: f64,
    pub probability: f64,
    pub referee_bias: f64,
    pub foul_factor: f64,
    pub attacker_factor: f64,
    pub tension: f64,
}

fn ratio(value: Option<f64>, average: f64) -> Option<f64> {
    value
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value / average)
}

fn mean_or_neutral(values: impl IntoIterator<Item = Option<f64>>) -> f64 {
    let known = values.into_iter().flatten().collect::<Vec<_>>();
    if known.is_empty() {
        1.0
    } else {
        known.iter().sum::<f64>() / known.len() as f64
    }
}

/// Fouls committed by the defending sides relative to the league; 1.0 when unknown.
pub fn foul_factor(home: &SideContext, away: &SideContext, config: &Config) -> f64 {
    mean_or_neutral([home, away].map(|side| {
        ratio(
            side.discipline.as_ref().map(|profile| profile.fouls_committed_per_match),
            config.league_fouls_committed,
        )
    }))
}

/// How much the attacking sides draw fouls and take players on, relative to the league.
pub fn attacker_factor(home: &SideContext, away: &SideContext, config: &Config) -> f64 {
    mean_or_neutral([home, away].map(|side| {
        side.discipline.as_ref().map(|profile| {
            mean_or_neutral([
                ratio(Some(profile.fouls_drawn_per_match), config.league_fouls_drawn),
                ratio(Some(profile.dribbles_per_match), config.league_dribbles),
            ])
        })
    }))
}

pub fn tension(home: &SideContext, away: &SideContext, config: &Config) -> f64 {
    match (home.stakes.is_elevated(), away.stakes.is_elevated()) {
        (true, true) => config.both_elevated,
        (true, false) | (false, true) => config.one_elevated,
        (false, false) => 1.0,
    }
}

pub fn estimate(snapshot: &ContextSnapshot, referee_bias: f64, config: &Config) -> PenaltyEstimate {
    let (home, away) = (&snapshot.home, &snapshot.away);
    let foul_factor = foul_factor(home, away, config);
    let attacker_factor = attacker_factor(home, away, config);
    let tension = tension(home, away, config);
    let rate = config.base_rate
        * referee_bias
        * foul_factor.sqrt()
        * attacker_factor.sqrt()
        * tension;
    let probability = (1.0 - (-rate).exp()).clamp(config.min_probability, config.max_probability);
    debug!("penalty λ={rate:.3}, p={probability:.3}");
    PenaltyEstimate {
        rate,
        probability,
        referee_bias,
        foul_factor,
        attacker_factor,
        tension,
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use crate::context::StakesLabel;
    use crate::domain::DisciplineProfile;

    use super::*;

    fn neutral() -> ContextSnapshot {
        ContextSnapshot::neutral("A".into(), "B".into())
    }

    #[test]
    fn baseline() {
        let estimate = estimate(&neutral(), 1.0, &Config::default());
        assert_float_absolute_eq!(0.30, estimate.rate, 1e-12);
        assert_float_absolute_eq!(1.0 - (-0.3f64).exp(), estimate.probability, 1e-12);
        assert_eq!(1.0, estimate.foul_factor);
        assert_eq!(1.0, estimate.attacker_factor);
        assert_eq!(1.0, estimate.tension);
    }

    #[test]
    fn lenient_referee_raises_probability() {
        let config = Config::default();
        let baseline = estimate(&neutral(), 1.0, &config);
        let lenient = estimate(&neutral(), 0.6 / 0.3, &config);
        assert_float_absolute_eq!(0.60, lenient.rate, 1e-12);
        assert!(lenient.probability > baseline.probability + 0.15);
        assert_eq!(0.45, lenient.probability);
    }

    #[test]
    fn probability_is_clamped() {
        let config = Config::default();
        assert_eq!(0.05, estimate(&neutral(), 0.0, &config).probability);
        assert_eq!(0.45, estimate(&neutral(), 10.0, &config).probability);
    }

    #[test]
    fn tension_from_stakes() {
        let config = Config::default();
        let mut snapshot = neutral();
        snapshot.home.stakes = StakesLabel::Relegation;
        assert_eq!(1.10, tension(&snapshot.home, &snapshot.away, &config));
        snapshot.away.stakes = StakesLabel::ContinentalQualification;
        assert_eq!(1.15, tension(&snapshot.home, &snapshot.away, &config));
    }

    #[test]
    fn discipline_factors() {
        let config = Config::default();
        let mut snapshot = neutral();
        snapshot.home.discipline = Some(DisciplineProfile {
            fouls_committed_per_match: 13.8,
            fouls_drawn_per_match: 11.5,
            dribbles_per_match: 12.75,
        });
        // away unknown, so the known side alone sets the factors
        assert_float_absolute_eq!(1.2, foul_factor(&snapshot.home, &snapshot.away, &config), 1e-12);
        assert_float_absolute_eq!(
            1.25,
            attacker_factor(&snapshot.home, &snapshot.away, &config),
            1e-12
        );
        let estimate = estimate(&snapshot, 1.0, &config);
        assert_float_absolute_eq!(0.30 * 1.2f64.sqrt() * 1.25f64.sqrt(), estimate.rate, 1e-12);
    }
}
