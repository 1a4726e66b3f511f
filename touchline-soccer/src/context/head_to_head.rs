//! Historical results between the two sides.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideFactors};
use crate::domain::{MatchResult, PlayedMatch, TeamId};
use crate::error::ValidationError;

/// Meetings counted from the fixture's home team's perspective, whichever venue they were played
/// at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub meetings: u32,
    pub home_wins: u32,
    pub draws: u32,
    pub away_wins: u32,
}
impl HeadToHead {
    pub fn summarise(home: &TeamId, away: &TeamId, matches: &[PlayedMatch]) -> Self {
        let mut summary = Self::default();
        for played in matches.iter().filter(|played| played.involves(away)) {
            match played.result_for(home) {
                Some(MatchResult::Win) => summary.home_wins += 1,
                Some(MatchResult::Draw) => summary.draws += 1,
                Some(MatchResult::Loss) => summary.away_wins += 1,
                None => continue,
            }
            summary.meetings += 1;
        }
        summary
    }

    /// Net win rate of the home team over the meetings, in `[-1, 1]`.
    pub fn balance(&self) -> f64 {
        if self.meetings == 0 {
            0.0
        } else {
            (self.home_wins as f64 - self.away_wins as f64) / self.meetings as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_meetings: u32,
    /// Multiplier swing for a clean sweep at `min_meetings`; also the cap.
    pub amplitude: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_meetings == 0 {
            return Err(anyhow!("min meetings must be positive").into());
        }
        if !(0.0..0.5).contains(&self.amplitude) {
            return Err(anyhow!("head-to-head amplitude must lie in [0, 0.5)").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_meetings: 3,
            amplitude: 0.08,
        }
    }
}

/// Amplitude after damping for the number of meetings; zero below the minimum.
pub fn damped_amplitude(meetings: u32, config: &Config) -> f64 {
    if meetings < config.min_meetings {
        0.0
    } else {
        let amplitude =
            config.amplitude / (meetings as f64 / config.min_meetings as f64).sqrt();
        amplitude.min(config.amplitude)
    }
}

/// Attack multipliers for the home and away sides.
pub fn multipliers(summary: &HeadToHead, config: &Config) -> (f64, f64) {
    let swing = damped_amplitude(summary.meetings, config) * summary.balance();
    (1.0 + swing, 1.0 - swing)
}

#[derive(Debug)]
pub struct HeadToHeadFactor(pub Config);

impl Factor for HeadToHeadFactor {
    fn name(&self) -> &'static str {
        "head_to_head"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let summary = &snapshot.head_to_head;
        let (home, away) = multipliers(summary, &self.0);
        adjustments.record(
            self.name(),
            SideFactors::attack(home),
            SideFactors::attack(away),
            format!(
                "{}W {}D {}L in {} meetings",
                summary.home_wins, summary.draws, summary.away_wins, summary.meetings
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use chrono::NaiveDate;

    use super::*;

    fn meeting(home: &str, away: &str, home_goals: u8, away_goals: u8) -> PlayedMatch {
        PlayedMatch {
            id: format!("{home}-{away}-{home_goals}-{away_goals}"),
            date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            home: home.into(),
            away: away.into(),
            home_goals,
            away_goals,
        }
    }

    #[test]
    fn summarise_across_venues() {
        let matches = [
            meeting("A", "B", 2, 0),
            meeting("B", "A", 0, 1),
            meeting("B", "A", 2, 2),
            meeting("A", "B", 0, 3),
            meeting("A", "C", 5, 0),
        ];
        let summary = HeadToHead::summarise(&"A".into(), &"B".into(), &matches);
        assert_eq!(
            HeadToHead {
                meetings: 4,
                home_wins: 2,
                draws: 1,
                away_wins: 1
            },
            summary
        );
        assert_float_absolute_eq!(0.25, summary.balance(), 1e-12);
    }

    #[test]
    fn too_few_meetings_is_neutral() {
        let summary = HeadToHead {
            meetings: 2,
            home_wins: 2,
            draws: 0,
            away_wins: 0,
        };
        assert_eq!((1.0, 1.0), multipliers(&summary, &Config::default()));
    }

    #[test]
    fn sweep_is_capped() {
        let summary = HeadToHead {
            meetings: 3,
            home_wins: 3,
            draws: 0,
            away_wins: 0,
        };
        let (home, away) = multipliers(&summary, &Config::default());
        assert_float_absolute_eq!(1.08, home, 1e-12);
        assert_float_absolute_eq!(0.92, away, 1e-12);
    }

    #[test]
    fn amplitude_damps_with_meetings() {
        let config = Config::default();
        assert_float_absolute_eq!(0.08, damped_amplitude(3, &config), 1e-12);
        assert_float_absolute_eq!(0.04, damped_amplitude(12, &config), 1e-12);
        assert!(damped_amplitude(30, &config) < damped_amplitude(12, &config));
        assert_eq!(0.0, damped_amplitude(0, &config));
    }
}
