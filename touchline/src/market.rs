//! Bookmaker markets: recovering fair probabilities from quoted decimal prices (removing the
//! overround, colloquially the "vig") and framing prices from probabilities.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::probs::SliceExt;

pub type PriceBounds = RangeInclusive<f64>;

pub trait MarketPrice {
    fn decimal(&self) -> f64;
}

impl MarketPrice for f64 {
    fn decimal(&self) -> f64 {
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overround {
    pub method: OverroundMethod,
    pub value: f64,
}
impl Overround {
    pub fn fair() -> Self {
        Self {
            method: OverroundMethod::Multiplicative,
            value: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverroundMethod {
    /// Margin is spread in proportion to each outcome's implied probability.
    Multiplicative,
    /// Margin is spread evenly across outcomes.
    Additive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub probs: Vec<f64>,
    pub prices: Vec<f64>,
    pub overround: Overround,
}
impl Market {
    /// Fits fair probabilities to the given `prices`, such that they sum to `fair_sum`. Returns
    /// `None` if there are no prices, or any price is not a finite decimal above 1.0.
    pub fn fit(method: &OverroundMethod, prices: Vec<f64>, fair_sum: f64) -> Option<Self> {
        if prices.is_empty()
            || prices
                .iter()
                .any(|price| !price.decimal().is_finite() || price.decimal() <= 1.0)
        {
            return None;
        }
        Some(match method {
            OverroundMethod::Multiplicative => Self::fit_multiplicative(prices, fair_sum),
            OverroundMethod::Additive => Self::fit_additive(prices, fair_sum),
        })
    }

    pub fn frame(overround: &Overround, probs: Vec<f64>, price_bounds: &PriceBounds) -> Self {
        let prices = probs
            .iter()
            .map(|prob| match overround.method {
                OverroundMethod::Multiplicative => {
                    multiply_capped(1.0 / prob, overround.value, price_bounds)
                }
                OverroundMethod::Additive => {
                    let share = (overround.value - 1.0) / probs.len() as f64;
                    cap(1.0 / (prob + share), price_bounds)
                }
            })
            .collect();
        Self {
            probs,
            prices,
            overround: overround.clone(),
        }
    }

    fn fit_multiplicative(prices: Vec<f64>, fair_sum: f64) -> Self {
        let mut probs = prices.inverted();
        let overround = probs.normalise(fair_sum) / fair_sum;
        Self {
            probs,
            prices,
            overround: Overround {
                method: OverroundMethod::Multiplicative,
                value: overround,
            },
        }
    }

    fn fit_additive(prices: Vec<f64>, fair_sum: f64) -> Self {
        let mut probs = prices.inverted();
        let booksum = probs.sum();
        let share = (booksum - fair_sum) / probs.len() as f64;
        for prob in &mut probs {
            *prob = f64::max(0.0, *prob - share);
        }
        probs.normalise(fair_sum);
        Self {
            probs,
            prices,
            overround: Overround {
                method: OverroundMethod::Additive,
                value: booksum / fair_sum,
            },
        }
    }
}

/// Applies the overround to a fair price and caps the result. An impossible outcome (infinite fair
/// price) is quoted at the upper bound.
pub fn multiply_capped(fair_price: f64, overround: f64, price_bounds: &PriceBounds) -> f64 {
    cap(fair_price / overround, price_bounds)
}

fn cap(price: f64, price_bounds: &PriceBounds) -> f64 {
    f64::min(f64::max(*price_bounds.start(), price), *price_bounds.end())
}
