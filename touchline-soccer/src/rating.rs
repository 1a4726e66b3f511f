//! Logistic rating system: a second, result-driven opinion on the three-way market.

use anyhow::anyhow;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::{LeagueId, PlayedMatch, TeamId, ThreeWay};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub k_factor: f64,
    /// Rating points added to the home side.
    pub home_advantage: f64,
    pub scale: f64,
    pub draw_base_rate: f64,
    /// League-calibrated draw base rates, overriding `draw_base_rate`.
    pub league_draw_rates: FxHashMap<LeagueId, f64>,
    /// Rating gap over which the draw rate decays by a factor of e.
    pub draw_decay: f64,
    pub inactivity_days: i64,
    pub half_life_days: f64,
    pub baseline: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.k_factor <= 0.0 {
            return Err(anyhow!("K-factor must be positive").into());
        }
        if self.scale <= 0.0 || self.draw_decay <= 0.0 || self.half_life_days <= 0.0 {
            return Err(anyhow!("scale, draw decay and half-life must be positive").into());
        }
        if self.inactivity_days < 0 {
            return Err(anyhow!("inactivity threshold cannot be negative").into());
        }
        let valid_draw_rate = |rate: &f64| (0.0..1.0).contains(rate);
        if !valid_draw_rate(&self.draw_base_rate) {
            return Err(anyhow!("draw base rate must lie in [0, 1)").into());
        }
        if let Some((league, _)) = self
            .league_draw_rates
            .iter()
            .find(|(_, rate)| !valid_draw_rate(*rate))
        {
            return Err(anyhow!("draw base rate for {league} must lie in [0, 1)").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k_factor: 20.0,
            home_advantage: 65.0,
            scale: 400.0,
            draw_base_rate: 0.26,
            league_draw_rates: FxHashMap::default(),
            draw_decay: 450.0,
            inactivity_days: 14,
            half_life_days: 180.0,
            baseline: 1500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub rating: f64,
    #[serde(default)]
    pub last_played: Option<NaiveDate>,
}
impl RatingRecord {
    pub fn new(rating: f64, last_played: Option<NaiveDate>) -> Self {
        Self {
            rating,
            last_played,
        }
    }
}

/// Probability of the side rated `rating` beating one rated `opponent`, with draws counting half.
#[inline]
pub fn expected_score(rating: f64, opponent: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / scale))
}

/// Grows logarithmically with the absolute goal difference; 1.0 for a draw.
#[inline]
pub fn margin_factor(goal_difference: i32) -> f64 {
    1.0 + (1.0 + goal_difference.unsigned_abs() as f64).ln()
}

#[derive(Debug)]
pub struct RatingSystem {
    config: Config,
}
impl RatingSystem {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn baseline(&self) -> RatingRecord {
        RatingRecord::new(self.config.baseline, None)
    }

    pub fn draw_base_rate(&self, league: &LeagueId) -> f64 {
        self.config
            .league_draw_rates
            .get(league)
            .copied()
            .unwrap_or(self.config.draw_base_rate)
    }

    /// The rating as read on `as_of`. Beyond the inactivity threshold the rating regresses toward
    /// the baseline with the configured half-life; records never played are returned as-is.
    pub fn decayed(&self, record: &RatingRecord, as_of: NaiveDate) -> f64 {
        let Some(last_played) = record.last_played else {
            return record.rating;
        };
        let idle_days = (as_of - last_played).num_days();
        if idle_days <= self.config.inactivity_days {
            return record.rating;
        }
        let excess = (idle_days - self.config.inactivity_days) as f64;
        let retained = 0.5f64.powf(excess / self.config.half_life_days);
        self.config.baseline + (record.rating - self.config.baseline) * retained
    }

    /// Three-way probabilities for a fixture between sides with the given (already decayed)
    /// ratings. The draw rate decays with the rating gap, including the home offset; the rest is
    /// split in proportion to the expected scores.
    pub fn probabilities(&self, league: &LeagueId, home_rating: f64, away_rating: f64) -> ThreeWay {
        let home_rating = home_rating + self.config.home_advantage;
        let diff = home_rating - away_rating;
        let draw = self.draw_base_rate(league) * (-diff.abs() / self.config.draw_decay).exp();
        let home_expected = expected_score(home_rating, away_rating, self.config.scale);
        let remaining = 1.0 - draw;
        let probs = ThreeWay::new(
            remaining * home_expected,
            draw,
            remaining * (1.0 - home_expected),
        );
        trace!("ratings {home_rating:.1} (incl. offset) vs {away_rating:.1}: {probs:?}");
        probs
    }

    /// Applies a finished match to both records, returning the rating points moved to the home
    /// side.
    pub fn update(
        &self,
        home: &mut RatingRecord,
        away: &mut RatingRecord,
        home_goals: u8,
        away_goals: u8,
        date: NaiveDate,
    ) -> f64 {
        let expected = expected_score(
            home.rating + self.config.home_advantage,
            away.rating,
            self.config.scale,
        );
        let actual = match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        };
        let goal_difference = home_goals as i32 - away_goals as i32;
        let delta = self.config.k_factor * margin_factor(goal_difference) * (actual - expected);
        home.rating += delta;
        away.rating -= delta;
        home.last_played = Some(date);
        away.last_played = Some(date);
        delta
    }
}

impl TryFrom<Config> for RatingSystem {
    type Error = ValidationError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self { config })
    }
}

/// Ratings of every team seen by a replay of finished matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingBook {
    records: FxHashMap<TeamId, RatingRecord>,
}
impl RatingBook {
    /// Replays `matches` in chronological order, ties broken by match id, starting every team from
    /// the baseline. The book is built in full before it is returned.
    pub fn replay(system: &RatingSystem, matches: &[PlayedMatch]) -> Self {
        let mut ordered = matches.iter().collect::<Vec<_>>();
        ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let mut book = Self::default();
        for played in ordered {
            let mut home = book.get_or_baseline(system, &played.home);
            let mut away = book.get_or_baseline(system, &played.away);
            let delta = system.update(
                &mut home,
                &mut away,
                played.home_goals,
                played.away_goals,
                played.date,
            );
            trace!(
                "{} {}-{} {}: Δ={delta:.2}",
                played.home,
                played.home_goals,
                played.away_goals,
                played.away
            );
            book.records.insert(played.home.clone(), home);
            book.records.insert(played.away.clone(), away);
        }
        debug!("replayed {} matches over {} teams", matches.len(), book.len());
        book
    }

    pub fn get(&self, team: &TeamId) -> Option<&RatingRecord> {
        self.records.get(team)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> FxHashMap<TeamId, RatingRecord> {
        self.records
    }

    fn get_or_baseline(&self, system: &RatingSystem, team: &TeamId) -> RatingRecord {
        self.records
            .get(team)
            .cloned()
            .unwrap_or_else(|| system.baseline())
    }
}
