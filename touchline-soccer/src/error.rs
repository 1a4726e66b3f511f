use std::error::Error;

use thiserror::Error;

use crate::domain::{FixtureStatus, LeagueId, TeamId};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("fixture {fixture} is {status:?}; only scheduled fixtures are forecast")]
    NotScheduled {
        fixture: String,
        status: FixtureStatus,
    },

    #[error("{0}")]
    Upstream(#[from] UpstreamUnavailable),
}

/// A store the engine cannot proceed without did not answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamUnavailable {
    #[error("ratings store unavailable for {0}")]
    Ratings(TeamId),

    #[error("strength store unavailable for {0}")]
    Strengths(LeagueId),

    #[error("match store unavailable: {0}")]
    Matches(String),
}

#[derive(Debug, Error)]
#[error("cannot move fixture {fixture} from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub fixture: String,
    pub from: FixtureStatus,
    pub to: FixtureStatus,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(#[from] pub Box<dyn Error + Send + Sync>);

impl From<anyhow::Error> for ValidationError {
    fn from(value: anyhow::Error) -> Self {
        ValidationError(value.into())
    }
}
