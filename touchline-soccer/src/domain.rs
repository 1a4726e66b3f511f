use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod fixture;

pub use fixture::{Fixture, FixtureStatus, MarketOdds, RefereeRecord, Weather};

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for TeamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueId(pub String);

impl From<&str> for LeagueId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for LeagueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display, Serialize,
    Deserialize,
)]
pub enum Side {
    Home,
    Away,
}
impl Side {
    pub fn flip(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score {
    pub home: u8,
    pub away: u8,
}
impl Score {
    pub fn new(home: u8, away: u8) -> Self {
        Self { home, away }
    }

    pub fn nil_all() -> Self {
        Self { home: 0, away: 0 }
    }

    pub fn total(&self) -> u16 {
        self.home as u16 + self.away as u16
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// An outcome that can be gathered from a score grid. `Over(n)` covers totals strictly above `n`
/// (the `n.5` line), while `Under(n)` covers totals strictly below `n`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    Win(Side),
    Draw,
    Under(u8),
    Over(u8),
    BothTeamsScore(bool),
    Score(Score),
}

/// The three-way (1X2) market: home win, draw, away win. Depending on context the values are either
/// probabilities in `[0, 1]` or percentages in `[0, 100]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeWay {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}
impl ThreeWay {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.home, self.draw, self.away]
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.home * factor, self.draw * factor, self.away * factor)
    }

    pub fn max_abs_diff(&self, other: &ThreeWay) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Gap between the most likely and the second most likely outcome.
    pub fn top_two_spread(&self) -> f64 {
        let mut sorted = self.to_array();
        sorted.sort_by(|a, b| b.total_cmp(a));
        sorted[0] - sorted[1]
    }
}

impl From<[f64; 3]> for ThreeWay {
    fn from(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}
impl MatchResult {
    pub fn points(&self) -> u8 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss => 0,
        }
    }
}

/// A finished match, as recorded by the match store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayedMatch {
    pub id: String,
    pub date: NaiveDate,
    pub home: TeamId,
    pub away: TeamId,
    pub home_goals: u8,
    pub away_goals: u8,
}
impl PlayedMatch {
    pub fn involves(&self, team: &TeamId) -> bool {
        self.home == *team || self.away == *team
    }

    pub fn result_for(&self, team: &TeamId) -> Option<MatchResult> {
        let (goals_for, goals_against) = if self.home == *team {
            (self.home_goals, self.away_goals)
        } else if self.away == *team {
            (self.away_goals, self.home_goals)
        } else {
            return None;
        };
        Some(match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Loss,
        })
    }

    pub fn goal_difference(&self) -> i32 {
        self.home_goals as i32 - self.away_goals as i32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team: TeamId,
    pub position: u16,
    pub points: u16,
    pub played: u16,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, strum_macros::Display, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
}

/// Season contribution of a player who is unavailable for the fixture.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSeasonStats {
    pub appearances: u16,
    pub goals: u16,
    pub assists: u16,
    pub key_passes: u16,
    /// Fraction of shots on target saved; goalkeepers only.
    pub save_rate: Option<f64>,
    /// Average match rating on a 0–10 scale.
    pub rating: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnavailablePlayer {
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub stats: PlayerSeasonStats,
}

/// Team season totals, used to express a player's contribution as a share.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadTotals {
    pub goals: u16,
    pub assists: u16,
    pub key_passes: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjuryReport {
    pub totals: SquadTotals,
    pub unavailable: Vec<UnavailablePlayer>,
}

/// Per-match foul and dribble averages for a team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisciplineProfile {
    pub fouls_committed_per_match: f64,
    pub fouls_drawn_per_match: f64,
    pub dribbles_per_match: f64,
}
