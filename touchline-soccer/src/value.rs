//! Picks the selection with the largest edge over the market, sizes the stake, and scores the
//! confidence of the forecast.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use tracing::debug;

use touchline::kelly::{self, KellyConfig};

use crate::domain::{MarketOdds, ThreeWay};

#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, strum_macros::Display, EnumIter, Serialize,
    Deserialize,
)]
pub enum Selection {
    Home,
    Draw,
    Away,
    #[strum(serialize = "Over 2.5")]
    Over2_5,
    #[strum(serialize = "Under 2.5")]
    Under2_5,
    #[strum(serialize = "BTTS yes")]
    BttsYes,
    #[strum(serialize = "BTTS no")]
    BttsNo,
}
impl Selection {
    /// Number of outcomes in the market the selection belongs to.
    pub fn market_size(&self) -> usize {
        match self {
            Selection::Home | Selection::Draw | Selection::Away => 3,
            _ => 2,
        }
    }

    pub fn price(&self, odds: &MarketOdds) -> Option<f64> {
        let price = match self {
            Selection::Home => Some(odds.home),
            Selection::Draw => Some(odds.draw),
            Selection::Away => Some(odds.away),
            Selection::Over2_5 => odds.over_2_5,
            Selection::Under2_5 => odds.under_2_5,
            Selection::BttsYes => odds.btts_yes,
            Selection::BttsNo => odds.btts_no,
        };
        price.filter(|price| price.is_finite() && *price > 1.0)
    }
}

/// Model probabilities for every selection, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionProbs {
    pub three_way: ThreeWay,
    pub over_2_5: f64,
    pub btts: f64,
}
impl SelectionProbs {
    pub fn get(&self, selection: Selection) -> f64 {
        match selection {
            Selection::Home => self.three_way.home,
            Selection::Draw => self.three_way.draw,
            Selection::Away => self.three_way.away,
            Selection::Over2_5 => self.over_2_5,
            Selection::Under2_5 => 1.0 - self.over_2_5,
            Selection::BttsYes => self.btts,
            Selection::BttsNo => 1.0 - self.btts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub selection: Selection,
    pub probability: f64,
    pub price: Option<f64>,
    pub edge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub selection: Selection,
    pub probability: f64,
    pub price: Option<f64>,
    pub edge: f64,
    /// Bankroll fraction to stake; zero without a price or below the edge threshold.
    pub kelly: f64,
    pub is_value: bool,
}

/// Scores every selection. Against a price the edge is the expected return `p·o − 1`; without one
/// it is the distance of `p` above a uniform split of its market.
pub fn candidates(probs: &SelectionProbs, odds: Option<&MarketOdds>) -> Vec<Candidate> {
    Selection::iter()
        .map(|selection| {
            let probability = probs.get(selection);
            let price = odds.and_then(|odds| selection.price(odds));
            let edge = match price {
                Some(price) => kelly::edge(probability, price),
                None => probability - 1.0 / selection.market_size() as f64,
            };
            Candidate {
                selection,
                probability,
                price,
                edge,
            }
        })
        .collect()
}

/// The highest-edge candidate. When any candidate is priced, only priced candidates compete; ties
/// go to the earlier selection.
pub fn recommend(candidates: &[Candidate], config: &KellyConfig) -> Option<Recommendation> {
    let any_priced = candidates.iter().any(|candidate| candidate.price.is_some());
    let mut best: Option<&Candidate> = None;
    for candidate in candidates
        .iter()
        .filter(|candidate| !any_priced || candidate.price.is_some())
        .filter(|candidate| candidate.edge.is_finite())
    {
        match best {
            Some(current) if candidate.edge <= current.edge => {}
            _ => best = Some(candidate),
        }
    }
    let best = best?;
    let (kelly, is_value) = match best.price {
        Some(price) => (config.stake(best.edge, price), config.is_value(best.edge)),
        None => (0.0, false),
    };
    debug!(
        "recommending {} at edge {:.3} (kelly {kelly:.4}, value {is_value})",
        best.selection, best.edge
    );
    Some(Recommendation {
        selection: best.selection,
        probability: best.probability,
        price: best.price,
        edge: best.edge,
        kelly,
        is_value,
    })
}

/// What the confidence score is built from. Three-way opinions are in percentages.
#[derive(Debug, Clone)]
pub struct ConfidenceInputs<'a> {
    pub grid: &'a ThreeWay,
    pub rating: &'a ThreeWay,
    pub blended: &'a ThreeWay,
    pub has_market: bool,
    pub meetings: u32,
    pub has_strengths: bool,
}

/// Confidence from 1 to 10: agreement between the grid and rating opinions (up to 4 points), data
/// richness (up to 3) and the gap between the two likeliest outcomes (up to 3).
pub fn confidence(inputs: &ConfidenceInputs) -> u8 {
    let disagreement = inputs.grid.max_abs_diff(inputs.rating);
    let agreement = match disagreement {
        d if d < 5.0 => 4,
        d if d < 10.0 => 3,
        d if d < 15.0 => 2,
        d if d < 20.0 => 1,
        _ => 0,
    };
    let richness = [
        inputs.has_market,
        inputs.meetings >= 3,
        inputs.has_strengths,
    ]
    .into_iter()
    .filter(|present| *present)
    .count() as u8;
    let spread = inputs.blended.top_two_spread();
    let decisiveness = match spread {
        s if s >= 25.0 => 3,
        s if s >= 15.0 => 2,
        s if s >= 8.0 => 1,
        _ => 0,
    };
    (agreement + richness + decisiveness).clamp(1, 10)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    fn probs() -> SelectionProbs {
        SelectionProbs {
            three_way: ThreeWay::new(0.5, 0.27, 0.23),
            over_2_5: 0.55,
            btts: 0.48,
        }
    }

    fn odds() -> MarketOdds {
        MarketOdds {
            home: 2.3,
            draw: 3.4,
            away: 3.5,
            over_2_5: Some(1.9),
            under_2_5: None,
            btts_yes: Some(1.8),
            btts_no: Some(0.9),
        }
    }

    #[test]
    fn candidates_with_odds() {
        let candidates = candidates(&probs(), Some(&odds()));
        assert_eq!(7, candidates.len());
        assert_float_absolute_eq!(0.15, candidates[0].edge, 1e-12);
        assert_float_absolute_eq!(0.045, candidates[3].edge, 1e-12);
        assert_eq!(None, candidates[4].price);
        assert_float_absolute_eq!(0.45 - 0.5, candidates[4].edge, 1e-12);
        assert_eq!(None, candidates[6].price, "prices at or below 1.0 are ignored");
    }

    #[test]
    fn candidates_without_odds() {
        let candidates = candidates(&probs(), None);
        assert_float_absolute_eq!(0.5 - 1.0 / 3.0, candidates[0].edge, 1e-12);
        assert_float_absolute_eq!(0.05, candidates[3].edge, 1e-12);
        assert!(candidates.iter().all(|candidate| candidate.price.is_none()));
    }

    #[test]
    fn recommend_priced_value() {
        let candidates = candidates(&probs(), Some(&odds()));
        let recommendation = recommend(&candidates, &KellyConfig::default()).unwrap();
        assert_eq!(Selection::Home, recommendation.selection);
        assert!(recommendation.is_value);
        // full Kelly 0.15 / 1.3, quartered, capped at 5%
        assert_float_absolute_eq!(0.05f64.min(0.15 / 1.3 * 0.25), recommendation.kelly, 1e-12);
        assert!(recommendation.kelly > 0.0 && recommendation.kelly <= 0.05);
    }

    #[test]
    fn recommend_without_odds_stakes_nothing() {
        let candidates = candidates(&probs(), None);
        let recommendation = recommend(&candidates, &KellyConfig::default()).unwrap();
        assert_eq!(Selection::Home, recommendation.selection);
        assert_eq!(0.0, recommendation.kelly);
        assert!(!recommendation.is_value);
        assert_eq!(None, recommendation.price);
    }

    #[test]
    fn small_edge_is_not_staked() {
        let probs = SelectionProbs {
            three_way: ThreeWay::new(0.45, 0.3, 0.25),
            over_2_5: 0.5,
            btts: 0.5,
        };
        let odds = MarketOdds {
            home: 2.3,
            draw: 3.2,
            away: 3.8,
            over_2_5: None,
            under_2_5: None,
            btts_yes: None,
            btts_no: None,
        };
        let candidates = candidates(&probs, Some(&odds));
        let recommendation = recommend(&candidates, &KellyConfig::default()).unwrap();
        // home edge 0.035 is the best, but under the 5% threshold
        assert_eq!(Selection::Home, recommendation.selection);
        assert_float_absolute_eq!(0.035, recommendation.edge, 1e-12);
        assert_eq!(0.0, recommendation.kelly);
        assert!(!recommendation.is_value);
    }

    #[test]
    fn recommend_empty() {
        assert_eq!(None, recommend(&[], &KellyConfig::default()));
    }

    #[test]
    fn confidence_extremes() {
        let agreeing = ThreeWay::new(60.0, 25.0, 15.0);
        let max = confidence(&ConfidenceInputs {
            grid: &agreeing,
            rating: &agreeing,
            blended: &agreeing,
            has_market: true,
            meetings: 5,
            has_strengths: true,
        });
        assert_eq!(10, max);

        let grid = ThreeWay::new(60.0, 25.0, 15.0);
        let rating = ThreeWay::new(30.0, 25.0, 45.0);
        let blended = ThreeWay::new(35.0, 32.0, 33.0);
        let min = confidence(&ConfidenceInputs {
            grid: &grid,
            rating: &rating,
            blended: &blended,
            has_market: false,
            meetings: 0,
            has_strengths: false,
        });
        assert_eq!(1, min);
    }

    #[test]
    fn confidence_buckets() {
        let grid = ThreeWay::new(50.0, 28.0, 22.0);
        let rating = ThreeWay::new(42.0, 28.0, 30.0);
        let blended = ThreeWay::new(47.0, 28.0, 25.0);
        let score = confidence(&ConfidenceInputs {
            grid: &grid,
            rating: &rating,
            blended: &blended,
            has_market: true,
            meetings: 2,
            has_strengths: true,
        });
        // agreement 3 (8pp), richness 2, spread 2 (19pp)
        assert_eq!(7, score);
    }
}
