//! The forecasting engine: runs one fixture through every stage and assembles the result.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use touchline::linear::matrix::Matrix;
use touchline::market::{Market, Overround};
use touchline::probs::round_to;

use crate::blend::{self, Components};
use crate::config::Config;
use crate::context::{Adjustments, ContextSnapshot, Pipeline};
use crate::domain::{Fixture, Outcome, Score, Side, TeamId, ThreeWay};
use crate::error::{ForecastError, UpstreamUnavailable, ValidationError};
use crate::penalty::{self, PenaltyEstimate};
use crate::rating::RatingSystem;
use crate::repository::{Repository, RequestCache};
use crate::scoregrid;
use crate::strength::{StrengthMemo, StrengthTable};
use crate::value::{self, ConfidenceInputs, Recommendation, SelectionProbs};
use crate::xg::{self, ExpectedGoals};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleChance {
    pub home_or_draw: f64,
    pub home_or_away: f64,
    pub draw_or_away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawNoBet {
    pub home: f64,
    pub away: f64,
}

/// The `line + 0.5` goals market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalLine {
    pub line: f64,
    pub over: f64,
    pub under: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreProb {
    pub score: Score,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandicapLine {
    /// Goals given to the home side.
    pub line: f64,
    pub win: f64,
    pub push: f64,
    pub lose: f64,
    /// Win probability with pushes refunded.
    pub settled: f64,
}

/// Everything forecast for one fixture. The market probabilities are percentages in `[0, 100]`,
/// rounded to two decimal places. The model breakdowns (`penalty`, `recommendation`, `components`)
/// keep their probabilities as fractions in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub fixture: String,
    pub home: TeamId,
    pub away: TeamId,
    /// Sums to exactly 100.
    pub three_way: ThreeWay,
    pub double_chance: DoubleChance,
    pub draw_no_bet: DrawNoBet,
    pub btts: f64,
    pub totals: Vec<TotalLine>,
    pub correct_score: ScoreProb,
    pub top_scores: Vec<ScoreProb>,
    pub asian_handicaps: Vec<HandicapLine>,
    pub expected_goals: ExpectedGoals,
    /// Chance of at least one penalty, as a percentage.
    pub penalty_probability: f64,
    /// Penalty sub-model breakdown; `probability` is a fraction.
    pub penalty: PenaltyEstimate,
    /// Margin-free decimal prices implied by the three-way forecast.
    pub fair_prices: ThreeWay,
    /// Bookmaker overround on the three-way market, when odds were quoted.
    pub market_overround: Option<f64>,
    /// The selected bet; `probability` is a fraction.
    pub recommendation: Option<Recommendation>,
    pub edge: f64,
    /// Bankroll fraction to stake.
    pub kelly: f64,
    pub confidence: u8,
    /// Blend inputs as fractions summing to 1.
    pub components: Components,
    pub context: ContextSnapshot,
    pub adjustments: Adjustments,
}

fn percent(prob: f64) -> f64 {
    if prob.is_nan() {
        0.0
    } else {
        round_to((prob * 100.0).clamp(0.0, 100.0), 2)
    }
}

fn complement(percent: f64) -> f64 {
    round_to((100.0 - percent).clamp(0.0, 100.0), 2)
}

pub fn double_chance(three_way: &ThreeWay) -> DoubleChance {
    let pair = |a: f64, b: f64| round_to((a + b).clamp(0.0, 100.0), 2);
    DoubleChance {
        home_or_draw: pair(three_way.home, three_way.draw),
        home_or_away: pair(three_way.home, three_way.away),
        draw_or_away: pair(three_way.draw, three_way.away),
    }
}

/// The three-way forecast with the draw refunded. An even split when neither side can win.
pub fn draw_no_bet(three_way: &ThreeWay) -> DrawNoBet {
    let decisive = three_way.home + three_way.away;
    if decisive <= 0.0 {
        return DrawNoBet {
            home: 50.0,
            away: 50.0,
        };
    }
    let home = percent(three_way.home / decisive);
    DrawNoBet {
        home,
        away: complement(home),
    }
}

/// Forecasts fixtures. Holds only the validated configuration and the strength memo, so a single
/// engine may serve many threads.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    rating: RatingSystem,
    pipeline: Pipeline,
    strengths: StrengthMemo,
}
impl Engine {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rating_system(&self) -> &RatingSystem {
        &self.rating
    }

    /// Replaces the contextual pipeline, e.g. to add a custom factor.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn forecast(
        &self,
        fixture: &Fixture,
        repository: &(impl Repository + ?Sized),
    ) -> Result<ForecastResult, ForecastError> {
        if !fixture.is_scheduled() {
            return Err(ForecastError::NotScheduled {
                fixture: fixture.id.clone(),
                status: fixture.status,
            });
        }
        let repository = RequestCache::new(repository);
        let config = &self.config;

        let strengths = self.strength_table(fixture, &repository)?;
        let context = ContextSnapshot::gather(fixture, &repository, &config.context)?;
        let adjustments = self.pipeline.run(&context);

        let base = xg::base(strengths.as_deref(), &fixture.home, &fixture.away, &config.xg);
        let expected_goals = xg::adjust(
            &base,
            adjustments.multiplier(Side::Home),
            adjustments.multiplier(Side::Away),
            &config.xg,
        );
        debug!(
            "{}: xG {:.3}-{:.3} (base {:.3}-{:.3})",
            fixture.id, expected_goals.home, expected_goals.away, base.home, base.away
        );

        let grid = scoregrid::build(expected_goals.home, expected_goals.away, &config.scoregrid);
        let grid_opinion = scoregrid::three_way(&grid);

        let home_rating = self.rating_for(&fixture.home, fixture, &repository)?;
        let away_rating = self.rating_for(&fixture.away, fixture, &repository)?;
        let rating_opinion = self.rating.probabilities(&fixture.league, home_rating, away_rating);

        let market = fixture.odds.as_ref().and_then(|odds| {
            Market::fit(&config.markets.overround_method, odds.three_way(), 1.0)
        });
        let market_opinion = market
            .as_ref()
            .map(|market| ThreeWay::new(market.probs[0], market.probs[1], market.probs[2]));

        let (blended, components) = blend::blend(
            &grid_opinion,
            &rating_opinion,
            market_opinion.as_ref(),
            &config.blend,
        );
        let three_way =
            blend::boost_draw(&blend::normalise_percent(&blended), adjustments.draw_boost);

        let penalty = penalty::estimate(&context, adjustments.referee_bias, &config.penalty);

        let probs = SelectionProbs {
            three_way: three_way.scale(0.01),
            over_2_5: Outcome::Over(2).gather(&grid),
            btts: Outcome::BothTeamsScore(true).gather(&grid),
        };
        let candidates = value::candidates(&probs, fixture.odds.as_ref());
        let recommendation = value::recommend(&candidates, &config.kelly);
        let confidence = value::confidence(&ConfidenceInputs {
            grid: &blend::normalise_percent(&grid_opinion),
            rating: &blend::normalise_percent(&rating_opinion),
            blended: &three_way,
            has_market: market_opinion.is_some(),
            meetings: context.head_to_head.meetings,
            has_strengths: strengths.is_some(),
        });

        let fair = Market::frame(
            &Overround::fair(),
            three_way.scale(0.01).to_array().to_vec(),
            &config.markets.price_bounds,
        );

        let (edge, kelly) = recommendation
            .as_ref()
            .map_or((0.0, 0.0), |recommendation| (recommendation.edge, recommendation.kelly));
        let result = ForecastResult {
            fixture: fixture.id.clone(),
            home: fixture.home.clone(),
            away: fixture.away.clone(),
            double_chance: double_chance(&three_way),
            draw_no_bet: draw_no_bet(&three_way),
            btts: percent(probs.btts),
            totals: self.totals(&grid),
            correct_score: {
                let (score, probability) = scoregrid::most_probable_score(&grid);
                ScoreProb {
                    score,
                    probability: percent(probability),
                }
            },
            top_scores: scoregrid::top_scores(&grid, config.markets.top_scores)
                .into_iter()
                .map(|(score, probability)| ScoreProb {
                    score,
                    probability: percent(probability),
                })
                .collect(),
            asian_handicaps: self.asian_handicaps(&grid),
            expected_goals,
            penalty_probability: percent(penalty.probability),
            penalty,
            fair_prices: ThreeWay::new(fair.prices[0], fair.prices[1], fair.prices[2]),
            market_overround: market.map(|market| market.overround.value),
            recommendation,
            edge,
            kelly,
            confidence,
            three_way,
            components,
            context,
            adjustments,
        };
        info!(
            "forecast {} {} v {}: {:.2}/{:.2}/{:.2}, confidence {}",
            result.fixture,
            result.home,
            result.away,
            result.three_way.home,
            result.three_way.draw,
            result.three_way.away,
            result.confidence
        );
        Ok(result)
    }

    /// Forecasts fixtures in parallel on the rayon pool. Results are in the order of `fixtures`.
    pub fn forecast_all<R: Repository + Sync + ?Sized>(
        &self,
        fixtures: &[Fixture],
        repository: &R,
    ) -> Vec<Result<ForecastResult, ForecastError>> {
        fixtures
            .par_iter()
            .map(|fixture| self.forecast(fixture, repository))
            .collect()
    }

    fn strength_table(
        &self,
        fixture: &Fixture,
        repository: &impl Repository,
    ) -> Result<Option<Arc<StrengthTable>>, UpstreamUnavailable> {
        let epoch = repository.strength_epoch(&fixture.league)?;
        self.strengths
            .get_or_estimate(&fixture.league, epoch, &self.config.strength, || {
                repository.season_records(&fixture.league)
            })
    }

    fn rating_for(
        &self,
        team: &TeamId,
        fixture: &Fixture,
        repository: &impl Repository,
    ) -> Result<f64, UpstreamUnavailable> {
        let record = repository
            .rating(team)?
            .unwrap_or_else(|| self.rating.baseline());
        Ok(self.rating.decayed(&record, fixture.date))
    }

    fn totals(&self, grid: &Matrix<f64>) -> Vec<TotalLine> {
        self.config
            .markets
            .total_lines
            .iter()
            .map(|&goals| {
                let over = percent(Outcome::Over(goals).gather(grid));
                TotalLine {
                    line: goals as f64 + 0.5,
                    over,
                    under: complement(over),
                }
            })
            .collect()
    }

    fn asian_handicaps(&self, grid: &Matrix<f64>) -> Vec<HandicapLine> {
        self.config
            .markets
            .handicap_lines
            .iter()
            .map(|&line| {
                let split = scoregrid::asian_handicap(line, grid);
                HandicapLine {
                    line,
                    win: percent(split.win),
                    push: percent(split.push),
                    lose: percent(split.lose),
                    settled: percent(split.settled_win_prob()),
                }
            })
            .collect()
    }
}

impl TryFrom<Config> for Engine {
    type Error = ValidationError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        config.validate()?;
        let rating = RatingSystem::try_from(config.rating.clone())?;
        let pipeline = Pipeline::standard(&config.context);
        Ok(Self {
            config,
            rating,
            pipeline,
            strengths: StrengthMemo::default(),
        })
    }
}
