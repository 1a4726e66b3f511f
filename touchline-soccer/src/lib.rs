pub mod blend;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod penalty;
pub mod print;
pub mod rating;
pub mod repository;
pub mod scoregrid;
pub mod strength;
pub mod value;
pub mod xg;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
