//! Sport-agnostic numerics behind the touchline forecasting engine: Poisson masses, a dense
//! matrix for score grids, probability slice helpers, bookmaker overround removal and
//! fractional Kelly staking.

#![allow(clippy::too_many_arguments)]

pub mod kelly;
pub mod linear;
pub mod market;
pub mod poisson;
pub mod probs;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
