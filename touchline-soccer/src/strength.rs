//! Team strength estimation.
//!
//! Each team's scoring and conceding rates, split by venue, are expressed as ratios to the league
//! average and then shrunk toward 1.0 (the league average) in proportion to how few matches back
//! them. A ratio observed over `n` matches is blended with `k` pseudo-matches of an average team:
//! `(n·raw + k) / (n + k)`.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::{LeagueId, TeamId};
use crate::error::{UpstreamUnavailable, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonRecord {
    pub team: TeamId,
    pub home_played: u32,
    pub home_goals_for: u32,
    pub home_goals_against: u32,
    pub away_played: u32,
    pub away_goals_for: u32,
    pub away_goals_against: u32,
}
impl TeamSeasonRecord {
    pub fn played(&self) -> u32 {
        self.home_played + self.away_played
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fewest teams with at least one match for a table to be estimated.
    pub min_teams: usize,
    /// Effective prior sample size, in matches.
    pub prior_matches: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        const MIN_TEAMS: usize = 4;
        if self.min_teams < MIN_TEAMS {
            return Err(anyhow!("min teams cannot be less than {MIN_TEAMS}").into());
        }
        if !self.prior_matches.is_finite() || self.prior_matches < 0.0 {
            return Err(anyhow!("prior matches must be a non-negative number").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_teams: 4,
            prior_matches: 8.0,
        }
    }
}

/// Shrinks `raw`, observed over `samples` matches, toward the league average of 1.0.
#[inline]
pub fn shrink(raw: f64, samples: f64, prior_matches: f64) -> f64 {
    let weight = samples + prior_matches;
    if weight <= 0.0 {
        1.0
    } else {
        (samples * raw + prior_matches) / weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthProfile {
    pub home_attack: f64,
    pub home_defense: f64,
    pub away_attack: f64,
    pub away_defense: f64,
    /// Matches backing the ratios.
    pub matches: u32,
}
impl StrengthProfile {
    pub fn average() -> Self {
        Self {
            home_attack: 1.0,
            home_defense: 1.0,
            away_attack: 1.0,
            away_defense: 1.0,
            matches: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrengthTable {
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    profiles: FxHashMap<TeamId, StrengthProfile>,
}
impl StrengthTable {
    /// Estimates strength profiles for every team in `records`. Returns `None` when the data is too
    /// sparse to say anything: fewer than `min_teams` teams with matches, or a league that has not
    /// scored at home or away.
    pub fn estimate(records: &[TeamSeasonRecord], config: &Config) -> Option<Self> {
        let active = records.iter().filter(|record| record.played() > 0).count();
        if active < config.min_teams {
            debug!("only {active} active teams; strengths unavailable");
            return None;
        }

        let (mut home_played, mut home_goals, mut away_played, mut away_goals) = (0, 0, 0, 0);
        for record in records {
            home_played += record.home_played;
            home_goals += record.home_goals_for;
            away_played += record.away_played;
            away_goals += record.away_goals_for;
        }
        let avg_home_goals = per_match(home_goals, home_played)?;
        let avg_away_goals = per_match(away_goals, away_played)?;
        if avg_home_goals <= 0.0 || avg_away_goals <= 0.0 {
            debug!(
                "league averages {avg_home_goals:.3}/{avg_away_goals:.3}; strengths unavailable"
            );
            return None;
        }

        let prior = config.prior_matches;
        let mut profiles = FxHashMap::with_capacity_and_hasher(records.len(), Default::default());
        for record in records {
            let ratio = |goals: u32, played: u32, average: f64| {
                per_match(goals, played).map_or(1.0, |rate| rate / average)
            };
            let home_samples = record.home_played as f64;
            let away_samples = record.away_played as f64;
            let profile = StrengthProfile {
                home_attack: shrink(
                    ratio(record.home_goals_for, record.home_played, avg_home_goals),
                    home_samples,
                    prior,
                ),
                home_defense: shrink(
                    ratio(record.home_goals_against, record.home_played, avg_away_goals),
                    home_samples,
                    prior,
                ),
                away_attack: shrink(
                    ratio(record.away_goals_for, record.away_played, avg_away_goals),
                    away_samples,
                    prior,
                ),
                away_defense: shrink(
                    ratio(record.away_goals_against, record.away_played, avg_home_goals),
                    away_samples,
                    prior,
                ),
                matches: record.played(),
            };
            trace!("{}: {profile:?}", record.team);
            profiles.insert(record.team.clone(), profile);
        }

        Some(Self {
            avg_home_goals,
            avg_away_goals,
            profiles,
        })
    }

    /// Recomputes the whole table from fresh records. The table is only replaced when the new
    /// records support an estimate; otherwise it is left as it was and `false` is returned.
    pub fn refresh(&mut self, records: &[TeamSeasonRecord], config: &Config) -> bool {
        match Self::estimate(records, config) {
            Some(table) => {
                *self = table;
                true
            }
            None => false,
        }
    }

    pub fn profile(&self, team: &TeamId) -> Option<&StrengthProfile> {
        self.profiles.get(team)
    }

    /// The profile of `team`, or the league-average profile for a team without records.
    pub fn profile_or_average(&self, team: &TeamId) -> StrengthProfile {
        self.profile(team)
            .copied()
            .unwrap_or_else(StrengthProfile::average)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn per_match(goals: u32, played: u32) -> Option<f64> {
    if played == 0 {
        None
    } else {
        Some(goals as f64 / played as f64)
    }
}

/// Memoises strength tables per `(league, epoch)`. The epoch changes whenever the standings do, so
/// a table is estimated once per refresh no matter how many forecasts read it. An estimate that
/// came back unavailable is memoised too.
#[derive(Debug, Default)]
pub struct StrengthMemo {
    tables: Mutex<FxHashMap<(LeagueId, u64), Option<Arc<StrengthTable>>>>,
}
impl StrengthMemo {
    pub fn get_or_estimate(
        &self,
        league: &LeagueId,
        epoch: u64,
        config: &Config,
        load: impl FnOnce() -> Result<Vec<TeamSeasonRecord>, UpstreamUnavailable>,
    ) -> Result<Option<Arc<StrengthTable>>, UpstreamUnavailable> {
        let key = (league.clone(), epoch);
        if let Some(table) = self.lock().get(&key) {
            trace!("strength memo hit for {league}@{epoch}");
            return Ok(table.clone());
        }

        let records = load()?;
        let table = StrengthTable::estimate(&records, config).map(Arc::new);
        debug!(
            "estimated strengths for {league}@{epoch}: {} teams",
            table.as_ref().map_or(0, |table| table.len())
        );
        let mut tables = self.lock();
        tables.retain(|(other_league, other_epoch), _| {
            other_league != league || *other_epoch >= epoch
        });
        Ok(tables.entry(key).or_insert(table).clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, FxHashMap<(LeagueId, u64), Option<Arc<StrengthTable>>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    fn record(team: &str, played: u32, home: (u32, u32), away: (u32, u32)) -> TeamSeasonRecord {
        TeamSeasonRecord {
            team: team.into(),
            home_played: played,
            home_goals_for: home.0,
            home_goals_against: home.1,
            away_played: played,
            away_goals_for: away.0,
            away_goals_against: away.1,
        }
    }

    fn league() -> Vec<TeamSeasonRecord> {
        vec![
            record("A", 10, (25, 8), (18, 10)),
            record("B", 10, (15, 12), (10, 14)),
            record("C", 10, (12, 15), (9, 18)),
            record("D", 10, (8, 17), (6, 19)),
        ]
    }

    #[test]
    fn shrink_extremes() {
        assert_eq!(1.0, shrink(1.8, 0.0, 8.0));
        assert_float_relative_eq!(1.8, shrink(1.8, 1e12, 8.0), 1e-9);
        assert_eq!(1.8, shrink(1.8, 10.0, 0.0));
        assert_eq!(1.0, shrink(1.8, 0.0, 0.0));
    }

    #[test]
    fn shrink_approaches_raw_monotonically() {
        let mut previous = shrink(1.5, 0.0, 8.0);
        for samples in [1.0, 4.0, 16.0, 64.0, 256.0] {
            let current = shrink(1.5, samples, 8.0);
            assert!(current > previous);
            assert!(current < 1.5);
            previous = current;
        }
    }

    #[test]
    fn estimate_league_averages() {
        let table = StrengthTable::estimate(&league(), &Config::default()).unwrap();
        assert_float_absolute_eq!(60.0 / 40.0, table.avg_home_goals);
        assert_float_absolute_eq!(43.0 / 40.0, table.avg_away_goals);
        assert_eq!(4, table.len());
    }

    #[test]
    fn estimate_ranks_teams() {
        let table = StrengthTable::estimate(&league(), &Config::default()).unwrap();
        let a = table.profile(&"A".into()).unwrap();
        let d = table.profile(&"D".into()).unwrap();
        assert!(a.home_attack > 1.0);
        assert!(a.home_defense < 1.0);
        assert!(d.home_attack < 1.0);
        assert!(d.away_defense > 1.0);

        // raw home attack for A is 2.5 / 1.5; 10 samples against 8 pseudo-matches
        let raw = 2.5 / 1.5;
        assert_float_relative_eq!((10.0 * raw + 8.0) / 18.0, a.home_attack, 1e-12);
    }

    #[test]
    fn estimate_without_prior_is_raw() {
        let config = Config {
            prior_matches: 0.0,
            ..Config::default()
        };
        let table = StrengthTable::estimate(&league(), &config).unwrap();
        let b = table.profile(&"B".into()).unwrap();
        assert_float_relative_eq!(1.5 / 1.5, b.home_attack, 1e-12);
        assert_float_relative_eq!(1.2 / (43.0 / 40.0), b.home_defense, 1e-12);
    }

    #[test]
    fn estimate_too_few_teams() {
        let mut records = league();
        records.truncate(3);
        assert!(StrengthTable::estimate(&records, &Config::default()).is_none());

        let mut records = league();
        records[3].home_played = 0;
        records[3].away_played = 0;
        assert!(StrengthTable::estimate(&records, &Config::default()).is_none());
    }

    #[test]
    fn estimate_goalless_league() {
        let records = ["A", "B", "C", "D"]
            .into_iter()
            .map(|team| record(team, 3, (0, 0), (0, 0)))
            .collect::<Vec<_>>();
        assert!(StrengthTable::estimate(&records, &Config::default()).is_none());
    }

    #[test]
    fn refresh_is_all_or_nothing() {
        let mut table = StrengthTable::estimate(&league(), &Config::default()).unwrap();
        assert_eq!(20, table.profile(&"A".into()).unwrap().matches);

        let mut records = league();
        records.push(record("E", 10, (10, 10), (10, 10)));
        assert!(table.refresh(&records, &Config::default()));
        assert_eq!(5, table.len());

        let before = table.clone();
        assert!(!table.refresh(&records[..2], &Config::default()));
        assert_eq!(before, table);
    }

    #[test]
    fn unknown_team_is_average() {
        let table = StrengthTable::estimate(&league(), &Config::default()).unwrap();
        assert_eq!(StrengthProfile::average(), table.profile_or_average(&"Z".into()));
    }

    #[test]
    fn memo_estimates_once_per_epoch() {
        let memo = StrengthMemo::default();
        let league_id = LeagueId::from("EPL");
        let mut loads = 0;
        for _ in 0..3 {
            let table = memo
                .get_or_estimate(&league_id, 1, &Config::default(), || {
                    loads += 1;
                    Ok(league())
                })
                .unwrap();
            assert!(table.is_some());
        }
        assert_eq!(1, loads);

        memo.get_or_estimate(&league_id, 2, &Config::default(), || {
            loads += 1;
            Ok(league())
        })
        .unwrap();
        assert_eq!(2, loads);
        assert_eq!(1, memo.len(), "stale epoch should be evicted");
    }

    #[test]
    fn memo_propagates_upstream_failure() {
        let memo = StrengthMemo::default();
        let league_id = LeagueId::from("EPL");
        let err = memo
            .get_or_estimate(&league_id, 1, &Config::default(), || {
                Err(UpstreamUnavailable::Strengths(league_id.clone()))
            })
            .unwrap_err();
        assert_eq!(UpstreamUnavailable::Strengths("EPL".into()), err);
        assert!(memo.is_empty());
    }

    #[test]
    fn validate() {
        assert!(Config::default().validate().is_ok());
        let config = Config {
            min_teams: 3,
            ..Config::default()
        };
        assert_eq!(
            "min teams cannot be less than 4",
            config.validate().unwrap_err().to_string()
        );
    }
}
