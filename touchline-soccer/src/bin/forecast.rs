use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use touchline_soccer::config::Config;
use touchline_soccer::domain::Fixture;
use touchline_soccer::forecast::Engine;
use touchline_soccer::print;
use touchline_soccer::rating::RatingBook;
use touchline_soccer::repository::MemoryRepository;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file to source the scenario (repository and fixtures) from
    #[clap(short = 'f', long)]
    file: PathBuf,

    /// engine configuration; defaults apply to anything absent
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// emit forecasts as JSON instead of tables
    #[clap(long)]
    json: bool,

    /// rebuild team ratings by replaying the scenario's finished matches
    #[clap(long = "replay-ratings")]
    replay_ratings: bool,

    /// print the contextual factors applied to each fixture
    #[clap(long)]
    factors: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Scenario {
    #[serde(default)]
    repository: MemoryRepository,
    fixtures: Vec<Fixture>,
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("args: {args:?}");

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let engine = Engine::try_from(config)?;

    let json = fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let mut scenario: Scenario = serde_json::from_str(&json)
        .with_context(|| format!("malformed scenario {}", args.file.display()))?;
    info!(
        "loaded {} fixtures, {} finished matches",
        scenario.fixtures.len(),
        scenario.repository.matches.len()
    );

    if args.replay_ratings {
        let book = RatingBook::replay(engine.rating_system(), &scenario.repository.matches);
        info!("replayed ratings for {} teams", book.len());
        scenario.repository.ratings.extend(book.into_records());
    }

    let results = engine.forecast_all(&scenario.fixtures, &scenario.repository);
    if args.json {
        let forecasts = results
            .into_iter()
            .zip(&scenario.fixtures)
            .filter_map(|(result, fixture)| match result {
                Ok(forecast) => Some(forecast),
                Err(err) => {
                    warn!("skipping {}: {err}", fixture.id);
                    None
                }
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&forecasts)?);
        return Ok(());
    }

    let console = Console::default();
    for (fixture, result) in scenario.fixtures.iter().zip(results) {
        let forecast = match result {
            Ok(forecast) => forecast,
            Err(err) => {
                warn!("skipping {}: {err}", fixture.id);
                continue;
            }
        };
        println!(
            "\n{} v {} ({}, {})",
            fixture.home, fixture.away, fixture.league, fixture.date
        );
        println!("1X2:\n{}", console.render(&print::tabulate_three_way(&forecast)));
        println!("Goals:\n{}", console.render(&print::tabulate_goal_markets(&forecast)));
        println!(
            "Correct score:\n{}",
            console.render(&print::tabulate_correct_scores(&forecast))
        );
        println!(
            "Asian handicap:\n{}",
            console.render(&print::tabulate_handicaps(&forecast))
        );
        println!("Summary:\n{}", console.render(&print::tabulate_summary(&forecast)));
        if args.factors {
            println!(
                "Factors:\n{}",
                console.render(&print::tabulate_adjustments(&forecast.adjustments))
            );
        }
    }
    Ok(())
}
