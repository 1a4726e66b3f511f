//! The joint distribution of full-time goals. Rows index home goals and columns index away goals,
//! so home wins sit below the diagonal, draws on it and away wins above it.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::trace;

use touchline::linear::matrix::Matrix;
use touchline::poisson;
use touchline::probs::{gather, SliceExt};

use crate::domain::{Outcome, Score, Side, ThreeWay};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Largest number of goals per side represented in the grid.
    pub max_goals: u8,
    /// Correlation magnitude at the reference goal total.
    pub correlation_base: f64,
    pub correlation_reference_total: f64,
    pub min_correlation: f64,
    pub max_correlation: f64,
    /// Rates above this are treated as this; keeps the masses from underflowing.
    pub max_rate: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        const MIN_MAX_GOALS: u8 = 4;
        if self.max_goals < MIN_MAX_GOALS {
            return Err(anyhow!("max goals cannot be less than {MIN_MAX_GOALS}").into());
        }
        if !self.max_rate.is_finite() || self.max_rate <= 0.0 {
            return Err(anyhow!("max rate must be positive").into());
        }
        if !self.correlation_base.is_finite() || self.correlation_base < 0.0 {
            return Err(anyhow!("correlation base cannot be negative").into());
        }
        if !self.correlation_reference_total.is_finite()
            || self.correlation_reference_total <= 0.0
        {
            return Err(anyhow!("correlation reference total must be positive").into());
        }
        if self.min_correlation.is_nan()
            || self.max_correlation.is_nan()
            || self.min_correlation < 0.0
            || self.min_correlation > self.max_correlation
        {
            return Err(anyhow!("correlation bounds must satisfy 0 ≤ min ≤ max").into());
        }
        if self.max_tau_deflation() >= 1.0 {
            return Err(
                anyhow!("correlation too strong; the 0-1 and 1-0 cells would turn negative").into(),
            );
        }
        Ok(())
    }

    /// The largest `rate × |ρ|` any admissible pair of rates can produce. The 0-1 and 1-0 factors
    /// `1 + λρ` and `1 + μρ` stay positive while this is below 1. The product peaks at the rate cap
    /// with the opposing rate at zero.
    fn max_tau_deflation(&self) -> f64 {
        (self.correlation_base * self.correlation_reference_total).clamp(
            self.max_rate * self.min_correlation,
            self.max_rate * self.max_correlation,
        )
    }

    pub fn dimension(&self) -> usize {
        self.max_goals as usize + 1
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_goals: 7,
            correlation_base: 0.10,
            correlation_reference_total: 2.6,
            min_correlation: 0.03,
            max_correlation: 0.18,
            max_rate: 20.0,
        }
    }
}

/// Builds a normalised score grid for the given expected goals, with the low-score correlation
/// correction applied.
pub fn build(home_rate: f64, away_rate: f64, config: &Config) -> Matrix<f64> {
    let sanitise = |rate: f64| {
        if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, config.max_rate)
        }
    };
    let (home_rate, away_rate) = (sanitise(home_rate), sanitise(away_rate));
    let dimension = config.dimension();
    let mut scoregrid = from_univariate_poisson(home_rate, away_rate, dimension);
    let rho = correlation(home_rate, away_rate, config);
    correct_low_scores(home_rate, away_rate, rho, &mut scoregrid);
    let mass = scoregrid.flatten_mut().normalise(1.0);
    trace!("λ={home_rate:.3}, μ={away_rate:.3}, ρ={rho:.4}, pre-normalisation mass={mass:.6}");
    scoregrid
}

/// Independent Poisson grid: the outer product of the two mass vectors.
pub fn from_univariate_poisson(home_rate: f64, away_rate: f64, dimension: usize) -> Matrix<f64> {
    let mut home_masses = vec![0.0; dimension];
    let mut away_masses = vec![0.0; dimension];
    poisson::fill_masses(home_rate, &mut home_masses);
    poisson::fill_masses(away_rate, &mut away_masses);
    Matrix::outer(&home_masses, &away_masses, |home_prob, away_prob| home_prob * away_prob)
}

/// The (negative) correlation coefficient for a fixture. Its magnitude scales inversely with the
/// combined goal expectation: low-scoring fixtures get the strongest correction.
pub fn correlation(home_rate: f64, away_rate: f64, config: &Config) -> f64 {
    let total = f64::max(home_rate + away_rate, f64::EPSILON);
    let magnitude = config.correlation_base * config.correlation_reference_total / total;
    -magnitude.clamp(config.min_correlation, config.max_correlation)
}

/// Scales the 0-0, 0-1, 1-0 and 1-1 cells by the Dixon–Coles τ factors. A negative `rho` inflates
/// the draws (0-0, 1-1) and deflates the one-goal wins. Cells never go below zero.
pub fn correct_low_scores(home_rate: f64, away_rate: f64, rho: f64, scoregrid: &mut Matrix<f64>) {
    if scoregrid.rows() < 2 || scoregrid.cols() < 2 {
        return;
    }
    let tau = [
        ((0, 0), 1.0 - home_rate * away_rate * rho),
        ((0, 1), 1.0 + home_rate * rho),
        ((1, 0), 1.0 + away_rate * rho),
        ((1, 1), 1.0 - rho),
    ];
    for (cell, factor) in tau {
        scoregrid[cell] = f64::max(0.0, scoregrid[cell] * factor);
    }
}

pub fn home_away_expectations(scoregrid: &Matrix<f64>) -> (f64, f64) {
    let (mut home_expectation, mut away_expectation) = (0.0, 0.0);
    for (home_goals, away_goals, &prob) in scoregrid.cells() {
        home_expectation += home_goals as f64 * prob;
        away_expectation += away_goals as f64 * prob;
    }
    (home_expectation, away_expectation)
}

pub fn three_way(scoregrid: &Matrix<f64>) -> ThreeWay {
    ThreeWay::new(
        Outcome::Win(Side::Home).gather(scoregrid),
        Outcome::Draw.gather(scoregrid),
        Outcome::Win(Side::Away).gather(scoregrid),
    )
}

/// Most probable scores, in descending order of probability; ties favour fewer home goals, then
/// fewer away goals.
pub fn top_scores(scoregrid: &Matrix<f64>, count: usize) -> Vec<(Score, f64)> {
    let mut scores = scoregrid
        .cells()
        .map(|(home, away, &prob)| (Score::new(home as u8, away as u8), prob))
        .collect::<Vec<_>>();
    scores.sort_by(|(a_score, a_prob), (b_score, b_prob)| {
        b_prob.total_cmp(a_prob).then_with(|| a_score.cmp(b_score))
    });
    scores.truncate(count);
    scores
}

pub fn most_probable_score(scoregrid: &Matrix<f64>) -> (Score, f64) {
    let index = scoregrid.flatten().argmax().unwrap_or(0);
    let cols = scoregrid.cols();
    (
        Score::new((index / cols) as u8, (index % cols) as u8),
        scoregrid.flatten().get(index).copied().unwrap_or(0.0),
    )
}

/// Settlement masses of a home-side Asian handicap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandicapSplit {
    pub win: f64,
    pub push: f64,
    pub lose: f64,
}
impl HandicapSplit {
    /// Probability-equivalent of the bet with pushes refunded as half a win.
    pub fn settled_win_prob(&self) -> f64 {
        self.win + self.push / 2.0
    }

    fn average(&self, other: &HandicapSplit) -> HandicapSplit {
        HandicapSplit {
            win: (self.win + other.win) / 2.0,
            push: (self.push + other.push) / 2.0,
            lose: (self.lose + other.lose) / 2.0,
        }
    }
}

/// Splits the grid for the home side receiving `line` goals (negative lines give goals away). Lines
/// are rounded to the nearest quarter goal; quarter lines split the stake across the two
/// neighbouring half-goal lines. On whole-goal lines an adjusted tie is an exact push.
pub fn asian_handicap(line: f64, scoregrid: &Matrix<f64>) -> HandicapSplit {
    let quarters = (line * 4.0).round() as i32;
    if quarters % 2 != 0 {
        let lower = half_goal_handicap((quarters - 1) / 2, scoregrid);
        let upper = half_goal_handicap((quarters + 1) / 2, scoregrid);
        lower.average(&upper)
    } else {
        half_goal_handicap(quarters / 2, scoregrid)
    }
}

fn half_goal_handicap(halves: i32, scoregrid: &Matrix<f64>) -> HandicapSplit {
    let mut split = HandicapSplit {
        win: 0.0,
        push: 0.0,
        lose: 0.0,
    };
    for (home_goals, away_goals, &prob) in scoregrid.cells() {
        let adjusted = 2 * (home_goals as i32 - away_goals as i32) + halves;
        match adjusted.cmp(&0) {
            std::cmp::Ordering::Greater => split.win += prob,
            std::cmp::Ordering::Equal => split.push += prob,
            std::cmp::Ordering::Less => split.lose += prob,
        }
    }
    split
}

impl Outcome {
    pub fn gather(&self, scoregrid: &Matrix<f64>) -> f64 {
        match self {
            Outcome::Win(side) => Self::gather_win(side, scoregrid),
            Outcome::Draw => gather(scoregrid, |home, away| home == away),
            Outcome::Under(goals) => {
                let goals = *goals as usize;
                gather(scoregrid, |home, away| home + away < goals)
            }
            Outcome::Over(goals) => {
                let goals = *goals as usize;
                gather(scoregrid, |home, away| home + away > goals)
            }
            Outcome::BothTeamsScore(true) => gather(scoregrid, |home, away| home > 0 && away > 0),
            Outcome::BothTeamsScore(false) => {
                gather(scoregrid, |home, away| home == 0 || away == 0)
            }
            Outcome::Score(score) => Self::gather_correct_score(score, scoregrid),
        }
    }

    fn gather_win(side: &Side, scoregrid: &Matrix<f64>) -> f64 {
        match side {
            Side::Home => gather(scoregrid, |home, away| home > away),
            Side::Away => gather(scoregrid, |home, away| home < away),
        }
    }

    fn gather_correct_score(score: &Score, scoregrid: &Matrix<f64>) -> f64 {
        if (score.home as usize) < scoregrid.rows() && (score.away as usize) < scoregrid.cols() {
            scoregrid[(score.home as usize, score.away as usize)]
        } else {
            0.0
        }
    }
}
