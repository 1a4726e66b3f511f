//! Engine-wide configuration, aggregating the configuration of every stage.

use std::fs;
use std::path::Path;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use touchline::kelly::KellyConfig;
use touchline::market::{OverroundMethod, PriceBounds};

use crate::error::ValidationError;
use crate::{blend, context, penalty, rating, scoregrid, strength, xg};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strength: strength::Config,
    pub xg: xg::Config,
    pub scoregrid: scoregrid::Config,
    pub rating: rating::Config,
    pub context: context::Config,
    pub penalty: penalty::Config,
    pub blend: blend::Config,
    pub kelly: KellyConfig,
    pub markets: MarketsConfig,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.strength.validate()?;
        self.xg.validate()?;
        self.scoregrid.validate()?;
        self.rating.validate()?;
        self.context.validate()?;
        self.penalty.validate()?;
        self.blend.validate()?;
        self.kelly.validate()?;
        self.markets.validate(&self.scoregrid)?;
        Ok(())
    }

    /// Reads a JSON configuration. Absent fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|err| anyhow!("cannot read {}: {err}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| anyhow!("malformed config: {err}"))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strength: Default::default(),
            xg: Default::default(),
            scoregrid: Default::default(),
            rating: Default::default(),
            context: Default::default(),
            penalty: Default::default(),
            blend: Default::default(),
            kelly: Default::default(),
            markets: Default::default(),
        }
    }
}

/// Which derived markets a forecast reports, and how market prices are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
    pub top_scores: usize,
    /// Goals `n` of the `n.5` over/under lines.
    pub total_lines: Vec<u8>,
    /// Home-side Asian handicap lines, in quarter-goal steps.
    pub handicap_lines: Vec<f64>,
    pub overround_method: OverroundMethod,
    pub price_bounds: PriceBounds,
}
impl MarketsConfig {
    pub fn validate(&self, scoregrid: &scoregrid::Config) -> Result<(), ValidationError> {
        if self.top_scores == 0 {
            return Err(anyhow!("at least one top score must be reported").into());
        }
        if let Some(line) = self.total_lines.iter().find(|&&line| line >= scoregrid.max_goals) {
            return Err(anyhow!("total line {line}.5 lies beyond the score grid").into());
        }
        if let Some(line) = self
            .handicap_lines
            .iter()
            .find(|line| !line.is_finite() || (*line * 4.0).fract() != 0.0)
        {
            return Err(anyhow!("handicap line {line} is not a quarter-goal line").into());
        }
        if *self.price_bounds.start() <= 1.0 || self.price_bounds.is_empty() {
            return Err(anyhow!("price bounds must lie above 1.0").into());
        }
        Ok(())
    }
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            top_scores: 5,
            total_lines: vec![0, 1, 2, 3, 4],
            handicap_lines: vec![-1.5, -1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 1.0, 1.5],
            overround_method: OverroundMethod::Multiplicative,
            price_bounds: 1.01..=301.0,
        }
    }
}
