//! Blending of the grid, rating and market opinions into one three-way forecast, expressed in
//! percentages that add up to 100.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::debug;

use touchline::probs::round_to;

use crate::domain::ThreeWay;
use crate::error::ValidationError;

const PERCENT: f64 = 100.0;
const DECIMALS: i32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: f64,
    pub rating: f64,
    /// Weights used instead when market odds are available.
    pub with_market: MarketWeights,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let weights = [
            self.grid,
            self.rating,
            self.with_market.grid,
            self.with_market.rating,
            self.with_market.market,
        ];
        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(anyhow!("blend weights must be non-negative").into());
        }
        if self.grid + self.rating <= 0.0 {
            return Err(anyhow!("grid and rating weights cannot both be zero").into());
        }
        if self.with_market.grid + self.with_market.rating + self.with_market.market <= 0.0 {
            return Err(anyhow!("market blend weights cannot all be zero").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: 0.60,
            rating: 0.40,
            with_market: MarketWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketWeights {
    pub grid: f64,
    pub rating: f64,
    pub market: f64,
}

impl Default for MarketWeights {
    fn default() -> Self {
        Self {
            grid: 0.40,
            rating: 0.20,
            market: 0.40,
        }
    }
}

/// The inputs to a blend and the weights they were given, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub grid: ThreeWay,
    pub rating: ThreeWay,
    pub market: Option<ThreeWay>,
    pub weights: MarketWeights,
}

/// Weighted average of the opinions, as probabilities. The market opinion is optional; without it
/// the weights shift onto the grid and rating opinions.
pub fn blend(
    grid: &ThreeWay,
    rating: &ThreeWay,
    market: Option<&ThreeWay>,
    config: &Config,
) -> (ThreeWay, Components) {
    let weights = match market {
        Some(_) => config.with_market.clone(),
        None => MarketWeights {
            grid: config.grid,
            rating: config.rating,
            market: 0.0,
        },
    };
    let mut blended = [0.0; 3];
    let market_values = market.map(ThreeWay::to_array).unwrap_or_default();
    for (index, value) in blended.iter_mut().enumerate() {
        *value = weights.grid * grid.to_array()[index]
            + weights.rating * rating.to_array()[index]
            + weights.market * market_values[index];
    }
    let total_weight = weights.grid + weights.rating + weights.market;
    let blended = ThreeWay::from(blended).scale(1.0 / total_weight);
    debug!("blended {blended:?} with weights {weights:?}");
    (
        blended,
        Components {
            grid: *grid,
            rating: *rating,
            market: market.copied(),
            weights,
        },
    )
}

/// Rescales to percentages summing to exactly 100, rounded to two decimal places. Rounding residue
/// goes to the away outcome. A zero or non-finite input yields an even split.
pub fn normalise_percent(probs: &ThreeWay) -> ThreeWay {
    let sanitised = probs
        .to_array()
        .map(|value| if value.is_finite() { value.max(0.0) } else { 0.0 });
    let sum: f64 = sanitised.iter().sum();
    if sum <= 0.0 {
        return ThreeWay::new(33.33, 33.33, 33.34);
    }
    let home = round_to(sanitised[0] / sum * PERCENT, DECIMALS);
    let draw = round_to(sanitised[1] / sum * PERCENT, DECIMALS);
    let away = round_to(PERCENT - home - draw, DECIMALS);
    if away < 0.0 {
        ThreeWay::new(home, PERCENT - home, 0.0)
    } else {
        ThreeWay::new(home, draw, away)
    }
}

/// Adds `boost` percentage points to the draw, taking them from home and away in proportion to
/// their shares, then renormalises.
pub fn boost_draw(percent: &ThreeWay, boost: f64) -> ThreeWay {
    if boost <= 0.0 {
        return *percent;
    }
    let others = percent.home + percent.away;
    if others <= 0.0 {
        return *percent;
    }
    let taken = f64::min(boost, others);
    normalise_percent(&ThreeWay::new(
        percent.home - taken * percent.home / others,
        percent.draw + taken,
        percent.away - taken * percent.away / others,
    ))
}

/// Weight given to a secondary opinion with the given `confidence` (in `[0, 1]`), whose largest
/// disagreement with the primary opinion is `spread` percentage points. Strong disagreement halves
/// or quarters the weight.
pub fn secondary_weight(confidence: f64, spread: f64) -> f64 {
    let mut weight = 0.30 * confidence;
    if spread > 25.0 {
        weight *= 0.25;
    } else if spread > 15.0 {
        weight *= 0.5;
    }
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 0.5)
    }
}

/// Blends a secondary three-way opinion, in percentages, into the primary one.
pub fn merge_secondary(primary: &ThreeWay, secondary: &ThreeWay, confidence: f64) -> ThreeWay {
    let weight = secondary_weight(confidence, primary.max_abs_diff(secondary));
    normalise_percent(&ThreeWay::new(
        (1.0 - weight) * primary.home + weight * secondary.home,
        (1.0 - weight) * primary.draw + weight * secondary.draw,
        (1.0 - weight) * primary.away + weight * secondary.away,
    ))
}
