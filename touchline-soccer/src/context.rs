//! Contextual adjustments to expected goals.
//!
//! A [ContextSnapshot] is gathered once per forecast from the repository. It is then passed through
//! an ordered [Pipeline] of [Factor]s. Each factor is a pure function of the snapshot that
//! multiplies per-side `attack` and `defense` terms into an [Adjustments] accumulator and records
//! what it did. A side's expected goals are scaled by its own attack term times its opponent's
//! defense term.

use std::fmt::Debug;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::{
    DisciplineProfile, Fixture, InjuryReport, MatchResult, PlayedMatch, RefereeRecord, Side,
    StandingsRow, TeamId, Weather,
};
use crate::error::{UpstreamUnavailable, ValidationError};
use crate::repository::Repository;

pub mod form;
pub mod head_to_head;
pub mod injuries;
pub mod referee;
pub mod rest;
pub mod stakes;
pub mod weather;

pub use head_to_head::HeadToHead;
pub use injuries::Severity;
pub use stakes::StakesLabel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Most recent matches fetched per team.
    pub history_limit: usize,
    pub form: form::Config,
    pub rest: rest::Config,
    pub stakes: stakes::Config,
    pub head_to_head: head_to_head::Config,
    pub weather: weather::Config,
    pub referee: referee::Config,
    pub injuries: injuries::Config,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.history_limit < self.form.window {
            return Err(anyhow!("history limit cannot be less than the form window").into());
        }
        self.form.validate()?;
        self.rest.validate()?;
        self.stakes.validate()?;
        self.head_to_head.validate()?;
        self.weather.validate()?;
        self.referee.validate()?;
        self.injuries.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: 20,
            form: Default::default(),
            rest: Default::default(),
            stakes: Default::default(),
            head_to_head: Default::default(),
            weather: Default::default(),
            referee: Default::default(),
            injuries: Default::default(),
        }
    }
}

/// What is known about one side going into the fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideContext {
    pub team: TeamId,
    /// Results of the latest matches, newest first.
    pub recent: Vec<MatchResult>,
    pub days_since_last_match: Option<i64>,
    pub matches_last_30_days: u32,
    pub standing: Option<StandingsRow>,
    pub stakes: StakesLabel,
    pub injuries: InjuryReport,
    pub discipline: Option<DisciplineProfile>,
}
impl SideContext {
    /// A side about which nothing is known.
    pub fn unknown(team: TeamId) -> Self {
        Self {
            team,
            recent: vec![],
            days_since_last_match: None,
            matches_last_30_days: 0,
            standing: None,
            stakes: StakesLabel::Normal,
            injuries: InjuryReport::default(),
            discipline: None,
        }
    }

    fn from_history(
        team: TeamId,
        history: &[PlayedMatch],
        as_of: NaiveDate,
        config: &Config,
    ) -> Self {
        let mut history = history
            .iter()
            .filter(|played| played.date < as_of)
            .collect::<Vec<_>>();
        history.sort_by(|a, b| b.date.cmp(&a.date));

        let recent = history
            .iter()
            .filter_map(|played| played.result_for(&team))
            .take(config.form.window)
            .collect();
        let days_since_last_match = history.first().map(|last| (as_of - last.date).num_days());
        let matches_last_30_days = history
            .iter()
            .filter(|played| (as_of - played.date).num_days() <= 30)
            .count() as u32;
        Self {
            recent,
            days_since_last_match,
            matches_last_30_days,
            ..Self::unknown(team)
        }
    }
}

/// Everything the adjustment factors look at, gathered for a single forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub home: SideContext,
    pub away: SideContext,
    pub head_to_head: HeadToHead,
    pub weather: Option<Weather>,
    pub referee: Option<RefereeRecord>,
}
impl ContextSnapshot {
    pub fn neutral(home: TeamId, away: TeamId) -> Self {
        Self {
            home: SideContext::unknown(home),
            away: SideContext::unknown(away),
            head_to_head: HeadToHead::default(),
            weather: None,
            referee: None,
        }
    }

    pub fn side(&self, side: Side) -> &SideContext {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Gathers the snapshot for `fixture`. Only a failing match store is fatal; every other missing
    /// input leaves the corresponding field neutral.
    pub fn gather(
        fixture: &Fixture,
        repository: &impl Repository,
        config: &Config,
    ) -> Result<Self, UpstreamUnavailable> {
        let as_of = fixture.date;
        let home_history = repository.recent_matches(&fixture.home, as_of, config.history_limit)?;
        let away_history = repository.recent_matches(&fixture.away, as_of, config.history_limit)?;
        let meetings = repository.head_to_head(&fixture.home, &fixture.away, as_of)?;

        let mut home =
            SideContext::from_history(fixture.home.clone(), &home_history, as_of, config);
        let mut away =
            SideContext::from_history(fixture.away.clone(), &away_history, as_of, config);

        if let Some(standings) = repository.standings(&fixture.league)? {
            for side in [&mut home, &mut away] {
                side.stakes = stakes::label(&side.team, &standings, &config.stakes);
                side.standing = standings.iter().find(|row| row.team == side.team).cloned();
            }
        }
        for side in [&mut home, &mut away] {
            if let Some(report) = repository.injuries(&side.team)? {
                side.injuries = report;
            }
            side.discipline = repository.discipline(&side.team)?;
        }

        let referee = match &fixture.referee {
            Some(name) => repository.referee(name)?,
            None => None,
        };

        let snapshot = Self {
            head_to_head: HeadToHead::summarise(&fixture.home, &fixture.away, &meetings),
            home,
            away,
            weather: fixture.weather.clone(),
            referee,
        };
        debug!(
            "context for {}: stakes {}/{}, {} meetings, {}/{} unavailable",
            fixture.id,
            snapshot.home.stakes,
            snapshot.away.stakes,
            snapshot.head_to_head.meetings,
            snapshot.home.injuries.unavailable.len(),
            snapshot.away.injuries.unavailable.len()
        );
        Ok(snapshot)
    }
}

/// Multipliers for one side. `attack` scales the side's own expected goals; `defense` scales its
/// opponent's, so values above 1.0 mean a leakier defense.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideFactors {
    pub attack: f64,
    pub defense: f64,
}
impl SideFactors {
    pub const NEUTRAL: SideFactors = SideFactors {
        attack: 1.0,
        defense: 1.0,
    };

    pub fn attack(attack: f64) -> Self {
        Self {
            attack,
            ..Self::NEUTRAL
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.attack == 1.0 && self.defense == 1.0
    }

    fn compound(&mut self, other: &SideFactors) {
        self.attack *= other.attack;
        self.defense *= other.defense;
    }
}

impl Default for SideFactors {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Audit entry for a factor that moved something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFactor {
    pub name: String,
    pub home: SideFactors,
    pub away: SideFactors,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub home: SideFactors,
    pub away: SideFactors,
    /// Percentage points added to the draw at the blending stage.
    pub draw_boost: f64,
    /// Referee penalty tendency relative to the league baseline.
    pub referee_bias: f64,
    pub applied: Vec<AppliedFactor>,
}
impl Adjustments {
    pub fn side(&self, side: Side) -> &SideFactors {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// The expected-goals multiplier for `side`.
    pub fn multiplier(&self, side: Side) -> f64 {
        self.side(side).attack * self.side(side.flip()).defense
    }

    /// Compounds the given factors into the running totals. Neutral contributions are not audited.
    pub fn record(
        &mut self,
        name: &str,
        home: SideFactors,
        away: SideFactors,
        detail: impl Into<String>,
    ) {
        if home.is_neutral() && away.is_neutral() {
            return;
        }
        self.home.compound(&home);
        self.away.compound(&away);
        let detail = detail.into();
        trace!("{name}: home {home:?}, away {away:?} ({detail})");
        self.applied.push(AppliedFactor {
            name: name.to_string(),
            home,
            away,
            detail,
        });
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            home: SideFactors::NEUTRAL,
            away: SideFactors::NEUTRAL,
            draw_boost: 0.0,
            referee_bias: 1.0,
            applied: vec![],
        }
    }
}

pub trait Factor: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments);
}

#[derive(Debug, Default)]
pub struct Pipeline {
    factors: Vec<Box<dyn Factor>>,
}
impl Pipeline {
    /// Form, rest, stakes, head-to-head, weather, referee and injuries, in that order.
    pub fn standard(config: &Config) -> Self {
        Self::default()
            .with(form::Form(config.form.clone()))
            .with(rest::Rest(config.rest.clone()))
            .with(stakes::Stakes(config.stakes.clone()))
            .with(head_to_head::HeadToHeadFactor(config.head_to_head.clone()))
            .with(weather::WeatherFactor(config.weather.clone()))
            .with(referee::Referee(config.referee.clone()))
            .with(injuries::Injuries(config.injuries.clone()))
    }

    pub fn with(mut self, factor: impl Factor + 'static) -> Self {
        self.factors.push(Box::new(factor));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factors.iter().map(|factor| factor.name()).collect()
    }

    pub fn run(&self, snapshot: &ContextSnapshot) -> Adjustments {
        let mut adjustments = Adjustments::default();
        for factor in &self.factors {
            factor.apply(snapshot, &mut adjustments);
        }
        debug!(
            "adjustments: home ×{:.3}, away ×{:.3}, draw boost {:.1}, {} factors applied",
            adjustments.multiplier(Side::Home),
            adjustments.multiplier(Side::Away),
            adjustments.draw_boost,
            adjustments.applied.len()
        );
        adjustments
    }
}

#[cfg(test)]
mod tests;
