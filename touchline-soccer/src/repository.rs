//! The store boundary. The engine reads everything it needs through [Repository]; nothing is held
//! in shared mutable state between forecasts.

use std::cell::RefCell;
use std::hash::Hash;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{
    DisciplineProfile, InjuryReport, LeagueId, PlayedMatch, RefereeRecord, StandingsRow, TeamId,
};
use crate::error::UpstreamUnavailable;
use crate::rating::RatingRecord;
use crate::strength::TeamSeasonRecord;

/// Read access to the stores behind the engine. Ratings, strengths and matches are core: an `Err`
/// aborts the forecast. The remaining lookups are auxiliary and answer `Ok(None)` when there is
/// nothing on record.
pub trait Repository {
    /// Changes whenever the league's season records do.
    fn strength_epoch(&self, league: &LeagueId) -> Result<u64, UpstreamUnavailable>;

    fn season_records(
        &self,
        league: &LeagueId,
    ) -> Result<Vec<TeamSeasonRecord>, UpstreamUnavailable>;

    fn rating(&self, team: &TeamId) -> Result<Option<RatingRecord>, UpstreamUnavailable>;

    /// Up to `limit` finished matches of `team` played before `before`, newest first.
    fn recent_matches(
        &self,
        team: &TeamId,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<PlayedMatch>, UpstreamUnavailable>;

    /// Finished matches between the two teams, at either venue, played before `before`.
    fn head_to_head(
        &self,
        home: &TeamId,
        away: &TeamId,
        before: NaiveDate,
    ) -> Result<Vec<PlayedMatch>, UpstreamUnavailable>;

    fn standings(
        &self,
        league: &LeagueId,
    ) -> Result<Option<Vec<StandingsRow>>, UpstreamUnavailable>;

    fn injuries(&self, team: &TeamId) -> Result<Option<InjuryReport>, UpstreamUnavailable>;

    fn referee(&self, name: &str) -> Result<Option<RefereeRecord>, UpstreamUnavailable>;

    fn discipline(&self, team: &TeamId) -> Result<Option<DisciplineProfile>, UpstreamUnavailable>;
}

/// An in-memory store, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryRepository {
    pub epochs: FxHashMap<LeagueId, u64>,
    pub season_records: FxHashMap<LeagueId, Vec<TeamSeasonRecord>>,
    pub ratings: FxHashMap<TeamId, RatingRecord>,
    pub matches: Vec<PlayedMatch>,
    pub standings: FxHashMap<LeagueId, Vec<StandingsRow>>,
    pub injuries: FxHashMap<TeamId, InjuryReport>,
    pub referees: FxHashMap<String, RefereeRecord>,
    pub discipline: FxHashMap<TeamId, DisciplineProfile>,
}
impl MemoryRepository {
    /// Appends finished matches and bumps the epoch of `league`, so memoised strengths are
    /// re-estimated on the next read.
    pub fn record_matches(
        &mut self,
        league: &LeagueId,
        matches: impl IntoIterator<Item = PlayedMatch>,
    ) {
        self.matches.extend(matches);
        *self.epochs.entry(league.clone()).or_default() += 1;
    }

    fn newest_first(&self, mut filter: impl FnMut(&PlayedMatch) -> bool) -> Vec<&PlayedMatch> {
        let mut selected = self
            .matches
            .iter()
            .filter(|played| filter(played))
            .collect::<Vec<_>>();
        selected.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        selected
    }
}

impl Repository for MemoryRepository {
    fn strength_epoch(&self, league: &LeagueId) -> Result<u64, UpstreamUnavailable> {
        Ok(self.epochs.get(league).copied().unwrap_or_default())
    }

    fn season_records(
        &self,
        league: &LeagueId,
    ) -> Result<Vec<TeamSeasonRecord>, UpstreamUnavailable> {
        Ok(self.season_records.get(league).cloned().unwrap_or_default())
    }

    fn rating(&self, team: &TeamId) -> Result<Option<RatingRecord>, UpstreamUnavailable> {
        Ok(self.ratings.get(team).cloned())
    }

    fn recent_matches(
        &self,
        team: &TeamId,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<PlayedMatch>, UpstreamUnavailable> {
        Ok(self
            .newest_first(|played| played.date < before && played.involves(team))
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    fn head_to_head(
        &self,
        home: &TeamId,
        away: &TeamId,
        before: NaiveDate,
    ) -> Result<Vec<PlayedMatch>, UpstreamUnavailable> {
        Ok(self
            .newest_first(|played| {
                played.date < before && played.involves(home) && played.involves(away)
            })
            .into_iter()
            .cloned()
            .collect())
    }

    fn standings(
        &self,
        league: &LeagueId,
    ) -> Result<Option<Vec<StandingsRow>>, UpstreamUnavailable> {
        Ok(self.standings.get(league).cloned())
    }

    fn injuries(&self, team: &TeamId) -> Result<Option<InjuryReport>, UpstreamUnavailable> {
        Ok(self.injuries.get(team).cloned())
    }

    fn referee(&self, name: &str) -> Result<Option<RefereeRecord>, UpstreamUnavailable> {
        Ok(self.referees.get(name).cloned())
    }

    fn discipline(&self, team: &TeamId) -> Result<Option<DisciplineProfile>, UpstreamUnavailable> {
        Ok(self.discipline.get(team).cloned())
    }
}

type Cache<K, V> = RefCell<FxHashMap<K, V>>;

/// Memoises lookups against an underlying repository for the duration of one forecast. Not shared
/// between threads; every forecast builds its own. Failures are passed through and not memoised.
pub struct RequestCache<'a, R: ?Sized> {
    inner: &'a R,
    ratings: Cache<TeamId, Option<RatingRecord>>,
    recent: Cache<(TeamId, NaiveDate, usize), Vec<PlayedMatch>>,
    standings: Cache<LeagueId, Option<Vec<StandingsRow>>>,
    injuries: Cache<TeamId, Option<InjuryReport>>,
    discipline: Cache<TeamId, Option<DisciplineProfile>>,
}
impl<'a, R: Repository + ?Sized> RequestCache<'a, R> {
    pub fn new(inner: &'a R) -> Self {
        Self {
            inner,
            ratings: Default::default(),
            recent: Default::default(),
            standings: Default::default(),
            injuries: Default::default(),
            discipline: Default::default(),
        }
    }
}

fn memoise<K: Eq + Hash + Clone, V: Clone>(
    cache: &Cache<K, V>,
    key: &K,
    load: impl FnOnce() -> Result<V, UpstreamUnavailable>,
) -> Result<V, UpstreamUnavailable> {
    if let Some(value) = cache.borrow().get(key) {
        return Ok(value.clone());
    }
    let value = load()?;
    cache.borrow_mut().insert(key.clone(), value.clone());
    Ok(value)
}

impl<'a, R: Repository + ?Sized> Repository for RequestCache<'a, R> {
    fn strength_epoch(&self, league: &LeagueId) -> Result<u64, UpstreamUnavailable> {
        self.inner.strength_epoch(league)
    }

    fn season_records(
        &self,
        league: &LeagueId,
    ) -> Result<Vec<TeamSeasonRecord>, UpstreamUnavailable> {
        self.inner.season_records(league)
    }

    fn rating(&self, team: &TeamId) -> Result<Option<RatingRecord>, UpstreamUnavailable> {
        memoise(&self.ratings, team, || self.inner.rating(team))
    }

    fn recent_matches(
        &self,
        team: &TeamId,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<PlayedMatch>, UpstreamUnavailable> {
        let key = (team.clone(), before, limit);
        memoise(&self.recent, &key, || {
            trace!("loading recent matches for {team}");
            self.inner.recent_matches(team, before, limit)
        })
    }

    fn head_to_head(
        &self,
        home: &TeamId,
        away: &TeamId,
        before: NaiveDate,
    ) -> Result<Vec<PlayedMatch>, UpstreamUnavailable> {
        self.inner.head_to_head(home, away, before)
    }

    fn standings(
        &self,
        league: &LeagueId,
    ) -> Result<Option<Vec<StandingsRow>>, UpstreamUnavailable> {
        memoise(&self.standings, league, || self.inner.standings(league))
    }

    fn injuries(&self, team: &TeamId) -> Result<Option<InjuryReport>, UpstreamUnavailable> {
        memoise(&self.injuries, team, || self.inner.injuries(team))
    }

    fn referee(&self, name: &str) -> Result<Option<RefereeRecord>, UpstreamUnavailable> {
        self.inner.referee(name)
    }

    fn discipline(&self, team: &TeamId) -> Result<Option<DisciplineProfile>, UpstreamUnavailable> {
        memoise(&self.discipline, team, || self.inner.discipline(team))
    }
}
