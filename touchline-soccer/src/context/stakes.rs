//! What each side is playing for, judged from the standings.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideFactors};
use crate::domain::{StandingsRow, TeamId};
use crate::error::ValidationError;

#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, strum_macros::Display, Serialize, Deserialize,
)]
pub enum StakesLabel {
    TitleRace,
    ContinentalQualification,
    Relegation,
    MidTable,
    #[default]
    Normal,
}
impl StakesLabel {
    /// Whether a result matters more than usual.
    pub fn is_elevated(&self) -> bool {
        matches!(
            self,
            StakesLabel::TitleRace | StakesLabel::ContinentalQualification | StakesLabel::Relegation
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title_places: u16,
    pub title_gap: u16,
    /// Last place that qualifies for continental competition.
    pub continental_places: u16,
    pub continental_gap: u16,
    pub relegation_places: u16,
    pub relegation_gap: u16,
    /// Gap to both lines beyond which a side has nothing to play for.
    pub comfort_gap: u16,
    /// Share of the season played before mid-table comfort applies.
    pub late_season: f64,
    pub title_race: f64,
    pub continental: f64,
    pub relegation: f64,
    pub mid_table: f64,
    /// Draw boost, in percentage points, when both sides have elevated stakes.
    pub draw_boost: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title_places == 0 || self.continental_places < self.title_places {
            return Err(anyhow!("continental places cannot be fewer than title places").into());
        }
        if !(0.0..=1.0).contains(&self.late_season) {
            return Err(anyhow!("late season must lie in [0, 1]").into());
        }
        if !(0.0..=20.0).contains(&self.draw_boost) {
            return Err(anyhow!("draw boost must lie in [0, 20] percentage points").into());
        }
        Ok(())
    }

    pub fn multiplier(&self, label: StakesLabel) -> f64 {
        match label {
            StakesLabel::TitleRace => self.title_race,
            StakesLabel::ContinentalQualification => self.continental,
            StakesLabel::Relegation => self.relegation,
            StakesLabel::MidTable => self.mid_table,
            StakesLabel::Normal => 1.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title_places: 3,
            title_gap: 6,
            continental_places: 4,
            continental_gap: 3,
            relegation_places: 3,
            relegation_gap: 3,
            comfort_gap: 6,
            late_season: 0.75,
            title_race: 1.05,
            continental: 1.03,
            relegation: 1.04,
            mid_table: 0.95,
            draw_boost: 3.0,
        }
    }
}

/// Labels `team` from the standings. A team missing from the table is `Normal`.
pub fn label(team: &TeamId, standings: &[StandingsRow], config: &Config) -> StakesLabel {
    let Some(row) = standings.iter().find(|row| row.team == *team) else {
        return StakesLabel::Normal;
    };
    let points = row.points as i32;
    let points_at = |position: u16| {
        standings
            .iter()
            .find(|row| row.position == position)
            .map(|row| row.points as i32)
    };

    let leader = standings.iter().map(|row| row.points as i32).max().unwrap_or(points);
    if row.position <= config.title_places && leader - points <= config.title_gap as i32 {
        return StakesLabel::TitleRace;
    }

    let continental_line = points_at(config.continental_places);
    if let Some(line) = continental_line {
        if (points - line).abs() <= config.continental_gap as i32 {
            return StakesLabel::ContinentalQualification;
        }
    }

    let teams = standings.len() as u16;
    let relegation_line = if teams > config.relegation_places {
        points_at(teams - config.relegation_places + 1)
    } else {
        None
    };
    if let Some(line) = relegation_line {
        if points - line <= config.relegation_gap as i32 {
            return StakesLabel::Relegation;
        }
    }

    let season_matches = 2 * teams.saturating_sub(1);
    let late =
        season_matches > 0 && row.played as f64 >= config.late_season * season_matches as f64;
    let comfortable = |line: Option<i32>| {
        line.map_or(true, |line| (points - line).abs() > config.comfort_gap as i32)
    };
    if late && comfortable(continental_line) && comfortable(relegation_line) {
        return StakesLabel::MidTable;
    }
    StakesLabel::Normal
}

#[derive(Debug)]
pub struct Stakes(pub Config);

impl Factor for Stakes {
    fn name(&self) -> &'static str {
        "stakes"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let (home, away) = (snapshot.home.stakes, snapshot.away.stakes);
        if home.is_elevated() && away.is_elevated() {
            adjustments.draw_boost += self.0.draw_boost;
        }
        adjustments.record(
            self.name(),
            SideFactors::attack(self.0.multiplier(home)),
            SideFactors::attack(self.0.multiplier(away)),
            format!("{home} vs {away}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standings(played: u16) -> Vec<StandingsRow> {
        // 10 teams, 18 matches in a season
        [60, 57, 50, 45, 42, 35, 27, 24, 22, 20]
            .into_iter()
            .enumerate()
            .map(|(index, points)| StandingsRow {
                team: TeamId(format!("T{}", index + 1)),
                position: index as u16 + 1,
                points,
                played,
            })
            .collect()
    }

    fn label_of(team: &str, played: u16) -> StakesLabel {
        label(&team.into(), &standings(played), &Config::default())
    }

    #[test]
    fn title_race() {
        assert_eq!(StakesLabel::TitleRace, label_of("T1", 10));
        assert_eq!(StakesLabel::TitleRace, label_of("T2", 10));
        assert_ne!(StakesLabel::TitleRace, label_of("T3", 10));
    }

    #[test]
    fn continental() {
        assert_eq!(StakesLabel::ContinentalQualification, label_of("T4", 10));
        assert_eq!(StakesLabel::ContinentalQualification, label_of("T5", 10));
        assert_eq!(StakesLabel::Normal, label_of("T3", 10));
    }

    #[test]
    fn relegation() {
        // first relegation place is 8th, on 24 points
        assert_eq!(StakesLabel::Relegation, label_of("T7", 10));
        assert_eq!(StakesLabel::Relegation, label_of("T8", 10));
        assert_eq!(StakesLabel::Relegation, label_of("T10", 10));
    }

    #[test]
    fn mid_table_late_in_season() {
        assert_eq!(StakesLabel::Normal, label_of("T6", 10));
        assert_eq!(StakesLabel::MidTable, label_of("T6", 14));
    }

    #[test]
    fn unknown_team_is_normal() {
        assert_eq!(StakesLabel::Normal, label_of("X", 10));
    }

    #[test]
    fn elevated() {
        assert!(StakesLabel::TitleRace.is_elevated());
        assert!(StakesLabel::Relegation.is_elevated());
        assert!(!StakesLabel::MidTable.is_elevated());
        assert!(!StakesLabel::Normal.is_elevated());
    }
}
