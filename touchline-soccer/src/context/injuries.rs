//! Unavailable players, weighed by position and by what they contribute over the season.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideFactors};
use crate::domain::{InjuryReport, Position, SquadTotals, UnavailablePlayer};
use crate::error::ValidationError;

#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display, Serialize,
    Deserialize,
)]
pub enum Severity {
    Critical,
    Major,
    Significant,
    Moderate,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub goalkeeper_base: f64,
    pub goalkeeper_quality: f64,
    pub defender_base: f64,
    pub defender_quality: f64,
    /// Attack impact per unit of season goal share.
    pub attacker_goal_share: f64,
    pub midfielder_attack: f64,
    pub midfielder_defense: f64,
    /// Quality assumed for a player without a save rate or match rating.
    pub default_quality: f64,
    /// Lower bounds of the critical, major, significant and moderate buckets.
    pub thresholds: [f64; 4],
    /// Impact scale for critical, major, significant, moderate and minor absences.
    pub scales: [f64; 5],
    pub min_attack: f64,
    pub max_defense: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.thresholds.windows(2).any(|pair| pair[0] < pair[1]) {
            return Err(anyhow!("severity thresholds must be in descending order").into());
        }
        if self.scales.iter().any(|scale| !(0.0..=1.0).contains(scale)) {
            return Err(anyhow!("severity scales must lie in [0, 1]").into());
        }
        if !(0.0..=1.0).contains(&self.min_attack) || self.max_defense < 1.0 {
            return Err(anyhow!(
                "attack floor must lie in [0, 1] and defense ceiling at or above 1"
            )
            .into());
        }
        if !(0.0..=1.0).contains(&self.default_quality) {
            return Err(anyhow!("default quality must lie in [0, 1]").into());
        }
        Ok(())
    }

    pub fn severity(&self, impact: f64) -> Severity {
        let [critical, major, significant, moderate] = self.thresholds;
        if impact >= critical {
            Severity::Critical
        } else if impact >= major {
            Severity::Major
        } else if impact >= significant {
            Severity::Significant
        } else if impact >= moderate {
            Severity::Moderate
        } else {
            Severity::Minor
        }
    }

    pub fn scale(&self, severity: Severity) -> f64 {
        self.scales[severity as usize]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            goalkeeper_base: 0.10,
            goalkeeper_quality: 0.15,
            defender_base: 0.03,
            defender_quality: 0.05,
            attacker_goal_share: 0.8,
            midfielder_attack: 0.5,
            midfielder_defense: 0.25,
            default_quality: 0.5,
            thresholds: [0.20, 0.12, 0.07, 0.03],
            scales: [1.0, 0.85, 0.7, 0.5, 0.25],
            min_attack: 0.70,
            max_defense: 1.35,
        }
    }
}

/// The weakening caused by one absence. `attack` is subtracted from the side's attack multiplier
/// and `defense` added to its defense multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerImpact {
    pub name: String,
    pub position: Position,
    pub severity: Severity,
    pub attack: f64,
    pub defense: f64,
}

fn share(part: u16, total: u16) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::min(1.0, part as f64 / total as f64)
    }
}

/// Player quality in `[0, 1]` from the save rate (goalkeepers) and the average match rating.
pub fn quality(player: &UnavailablePlayer, config: &Config) -> f64 {
    let save_rate = match player.position {
        Position::Goalkeeper => player.stats.save_rate,
        _ => None,
    };
    let rating = player.stats.rating.map(|rating| rating / 10.0);
    let signals = [save_rate, rating]
        .into_iter()
        .flatten()
        .filter(|signal| signal.is_finite())
        .collect::<Vec<_>>();
    if signals.is_empty() {
        config.default_quality
    } else {
        (signals.iter().sum::<f64>() / signals.len() as f64).clamp(0.0, 1.0)
    }
}

pub fn impact(player: &UnavailablePlayer, totals: &SquadTotals, config: &Config) -> PlayerImpact {
    let stats = &player.stats;
    let (attack, defense) = match player.position {
        Position::Goalkeeper => (
            0.0,
            config.goalkeeper_base + config.goalkeeper_quality * quality(player, config),
        ),
        Position::Defender => (
            0.0,
            config.defender_base + config.defender_quality * quality(player, config),
        ),
        Position::Attacker => (
            config.attacker_goal_share * share(stats.goals, totals.goals),
            0.0,
        ),
        Position::Midfielder => {
            let creative = (share(stats.key_passes, totals.key_passes)
                + share(stats.assists, totals.assists))
                / 2.0;
            (
                config.midfielder_attack * creative,
                config.midfielder_defense * creative,
            )
        }
    };
    let severity = config.severity(f64::max(attack, defense));
    let scale = config.scale(severity);
    PlayerImpact {
        name: player.name.clone(),
        position: player.position,
        severity,
        attack: attack * scale,
        defense: defense * scale,
    }
}

/// Net multipliers for a side: attack in `[min_attack, 1]`, defense in `[1, max_defense]`.
pub fn multipliers(report: &InjuryReport, config: &Config) -> (SideFactors, Vec<PlayerImpact>) {
    let impacts = report
        .unavailable
        .iter()
        .map(|player| impact(player, &report.totals, config))
        .collect::<Vec<_>>();
    let attack_loss: f64 = impacts.iter().map(|impact| impact.attack).sum();
    let defense_loss: f64 = impacts.iter().map(|impact| impact.defense).sum();
    let factors = SideFactors {
        attack: (1.0 - attack_loss).clamp(config.min_attack, 1.0),
        defense: (1.0 + defense_loss).clamp(1.0, config.max_defense),
    };
    (factors, impacts)
}

#[derive(Debug)]
pub struct Injuries(pub Config);

impl Factor for Injuries {
    fn name(&self) -> &'static str {
        "injuries"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let (home, home_impacts) = multipliers(&snapshot.home.injuries, &self.0);
        let (away, away_impacts) = multipliers(&snapshot.away.injuries, &self.0);
        let detail = home_impacts
            .iter()
            .chain(away_impacts.iter())
            .map(|impact| format!("{} ({}, {})", impact.name, impact.position, impact.severity))
            .collect::<Vec<_>>()
            .join(", ");
        adjustments.record(self.name(), home, away, detail);
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use crate::domain::PlayerSeasonStats;

    use super::*;

    fn player(position: Position, stats: PlayerSeasonStats) -> UnavailablePlayer {
        UnavailablePlayer {
            name: format!("{position}"),
            position,
            stats,
        }
    }

    fn totals() -> SquadTotals {
        SquadTotals {
            goals: 50,
            assists: 40,
            key_passes: 300,
        }
    }

    #[test]
    fn severity_buckets() {
        let config = Config::default();
        assert_eq!(Severity::Critical, config.severity(0.20));
        assert_eq!(Severity::Major, config.severity(0.15));
        assert_eq!(Severity::Significant, config.severity(0.07));
        assert_eq!(Severity::Moderate, config.severity(0.05));
        assert_eq!(Severity::Minor, config.severity(0.01));
        assert_eq!(0.85, config.scale(Severity::Major));
        assert_eq!(0.25, config.scale(Severity::Minor));
    }

    #[test]
    fn goalkeeper_quality_from_save_rate_and_rating() {
        let config = Config::default();
        let keeper = player(
            Position::Goalkeeper,
            PlayerSeasonStats {
                save_rate: Some(0.74),
                rating: Some(7.0),
                ..Default::default()
            },
        );
        assert_float_absolute_eq!(0.72, quality(&keeper, &config), 1e-12);
        let impact = impact(&keeper, &totals(), &config);
        assert_eq!(Severity::Critical, impact.severity);
        assert_float_absolute_eq!(0.10 + 0.15 * 0.72, impact.defense, 1e-12);
        assert_eq!(0.0, impact.attack);
    }

    #[test]
    fn unknown_defender_is_moderate() {
        let config = Config::default();
        let defender = player(Position::Defender, PlayerSeasonStats::default());
        let impact = impact(&defender, &totals(), &config);
        assert_eq!(Severity::Moderate, impact.severity);
        assert_float_absolute_eq!((0.03 + 0.05 * 0.5) * 0.5, impact.defense, 1e-12);
    }

    #[test]
    fn attacker_goal_share() {
        let config = Config::default();
        let striker = player(
            Position::Attacker,
            PlayerSeasonStats {
                goals: 20,
                ..Default::default()
            },
        );
        let impact = impact(&striker, &totals(), &config);
        assert_eq!(Severity::Critical, impact.severity);
        assert_float_absolute_eq!(0.32, impact.attack, 1e-12);

        let no_goals = SquadTotals::default();
        let impact = super::impact(&striker, &no_goals, &config);
        assert_eq!(0.0, impact.attack);
        assert_eq!(Severity::Minor, impact.severity);
    }

    #[test]
    fn midfielder_blends_attack_and_defense() {
        let config = Config::default();
        let playmaker = player(
            Position::Midfielder,
            PlayerSeasonStats {
                assists: 10,
                key_passes: 90,
                ..Default::default()
            },
        );
        // creative share (0.3 + 0.25) / 2 = 0.275; attack impact 0.1375 is major
        let impact = impact(&playmaker, &totals(), &config);
        assert_eq!(Severity::Major, impact.severity);
        assert_float_absolute_eq!(0.1375 * 0.85, impact.attack, 1e-12);
        assert_float_absolute_eq!(0.06875 * 0.85, impact.defense, 1e-12);
    }

    #[test]
    fn net_multipliers_are_clamped() {
        let config = Config::default();
        let striker = |goals| {
            player(
                Position::Attacker,
                PlayerSeasonStats {
                    goals,
                    ..Default::default()
                },
            )
        };
        let keeper = player(
            Position::Goalkeeper,
            PlayerSeasonStats {
                save_rate: Some(0.9),
                rating: Some(9.0),
                ..Default::default()
            },
        );
        let report = InjuryReport {
            totals: totals(),
            unavailable: vec![striker(20), striker(15), keeper.clone(), keeper],
        };
        let (factors, impacts) = multipliers(&report, &config);
        assert_eq!(4, impacts.len());
        assert_eq!(0.70, factors.attack);
        assert_eq!(1.35, factors.defense);

        let (factors, impacts) = multipliers(&InjuryReport::default(), &config);
        assert!(impacts.is_empty());
        assert_eq!(SideFactors::NEUTRAL, factors);
    }
}
