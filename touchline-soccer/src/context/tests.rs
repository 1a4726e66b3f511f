use assert_float_eq::*;

use crate::domain::{FixtureStatus, PlayerSeasonStats, Position, UnavailablePlayer};
use crate::repository::MemoryRepository;

use super::*;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn fixture() -> Fixture {
    Fixture {
        id: "f1".into(),
        home: "A".into(),
        away: "B".into(),
        league: "EPL".into(),
        date: date(3, 1),
        referee: Some("Ref".into()),
        weather: None,
        odds: None,
        status: FixtureStatus::Scheduled,
    }
}

fn played(id: &str, date: NaiveDate, home: &str, away: &str, hg: u8, ag: u8) -> PlayedMatch {
    PlayedMatch {
        id: id.into(),
        date,
        home: home.into(),
        away: away.into(),
        home_goals: hg,
        away_goals: ag,
    }
}

#[test]
fn neutral_snapshot_is_neutral() {
    let snapshot = ContextSnapshot::neutral("A".into(), "B".into());
    let adjustments = Pipeline::standard(&Config::default()).run(&snapshot);
    assert_eq!(1.0, adjustments.multiplier(Side::Home));
    assert_eq!(1.0, adjustments.multiplier(Side::Away));
    assert_eq!(0.0, adjustments.draw_boost);
    assert_eq!(1.0, adjustments.referee_bias);
    assert!(adjustments.applied.is_empty());
}

#[test]
fn standard_order() {
    assert_eq!(
        vec!["form", "rest", "stakes", "head_to_head", "weather", "referee", "injuries"],
        Pipeline::standard(&Config::default()).names()
    );
}

#[test]
fn multiplier_combines_attack_with_opposing_defense() {
    let mut adjustments = Adjustments::default();
    adjustments.record(
        "test",
        SideFactors {
            attack: 1.1,
            defense: 1.2,
        },
        SideFactors {
            attack: 0.9,
            defense: 1.05,
        },
        "",
    );
    assert_float_absolute_eq!(1.1 * 1.05, adjustments.multiplier(Side::Home), 1e-12);
    assert_float_absolute_eq!(0.9 * 1.2, adjustments.multiplier(Side::Away), 1e-12);
    assert_eq!(1, adjustments.applied.len());
}

#[derive(Debug)]
struct Doubler;

impl Factor for Doubler {
    fn name(&self) -> &'static str {
        "doubler"
    }

    fn apply(&self, _: &ContextSnapshot, adjustments: &mut Adjustments) {
        adjustments.record(
            self.name(),
            SideFactors::attack(2.0),
            SideFactors::NEUTRAL,
            "",
        );
    }
}

#[test]
fn custom_factor_extends_pipeline() {
    let pipeline = Pipeline::default().with(Doubler).with(Doubler);
    let adjustments = pipeline.run(&ContextSnapshot::neutral("A".into(), "B".into()));
    assert_eq!(4.0, adjustments.multiplier(Side::Home));
    assert_eq!(1.0, adjustments.multiplier(Side::Away));
    assert_eq!(2, adjustments.applied.len());
}

#[test]
fn elevated_stakes_boost_draw_only() {
    let mut snapshot = ContextSnapshot::neutral("A".into(), "B".into());
    snapshot.home.stakes = StakesLabel::TitleRace;
    snapshot.away.stakes = StakesLabel::Relegation;
    let adjustments = Pipeline::standard(&Config::default()).run(&snapshot);
    assert_eq!(3.0, adjustments.draw_boost);
    assert_float_absolute_eq!(1.05, adjustments.multiplier(Side::Home), 1e-12);
    assert_float_absolute_eq!(1.04, adjustments.multiplier(Side::Away), 1e-12);

    snapshot.away.stakes = StakesLabel::MidTable;
    let adjustments = Pipeline::standard(&Config::default()).run(&snapshot);
    assert_eq!(0.0, adjustments.draw_boost);
}

#[test]
fn injuries_weaken_attack_and_defense() {
    let mut snapshot = ContextSnapshot::neutral("A".into(), "B".into());
    snapshot.away.injuries = InjuryReport {
        totals: Default::default(),
        unavailable: vec![UnavailablePlayer {
            name: "Keeper".into(),
            position: Position::Goalkeeper,
            stats: PlayerSeasonStats {
                save_rate: Some(0.8),
                rating: Some(7.2),
                ..Default::default()
            },
        }],
    };
    let adjustments = Pipeline::standard(&Config::default()).run(&snapshot);
    assert!(adjustments.multiplier(Side::Home) > 1.2);
    assert_eq!(1.0, adjustments.multiplier(Side::Away));
    assert_eq!("Keeper (Goalkeeper, Critical)", adjustments.applied[0].detail);
}

#[test]
fn gather_from_repository() {
    let mut repository = MemoryRepository::default();
    repository.matches = vec![
        played("m1", date(1, 20), "A", "B", 2, 0),
        played("m2", date(2, 3), "B", "A", 1, 1),
        played("m3", date(2, 10), "A", "C", 3, 1),
        played("m4", date(2, 17), "B", "A", 0, 2),
        played("m5", date(2, 27), "A", "D", 1, 0),
        played("m6", date(3, 5), "A", "C", 0, 4),
    ];
    repository.referees.insert(
        "Ref".into(),
        RefereeRecord {
            name: "Ref".into(),
            matches: 20,
            penalties_per_match: 0.45,
        },
    );
    repository.standings.insert(
        "EPL".into(),
        ["A", "B", "C", "D", "E"]
            .into_iter()
            .enumerate()
            .map(|(index, team)| StandingsRow {
                team: team.into(),
                position: index as u16 + 1,
                points: 40 - 5 * index as u16,
                played: 20,
            })
            .collect(),
    );

    let snapshot = ContextSnapshot::gather(&fixture(), &repository, &Config::default()).unwrap();
    assert_eq!(
        vec![
            MatchResult::Win,
            MatchResult::Win,
            MatchResult::Win,
            MatchResult::Draw,
            MatchResult::Win,
        ],
        snapshot.home.recent
    );
    assert_eq!(Some(3), snapshot.home.days_since_last_match);
    assert_eq!(4, snapshot.home.matches_last_30_days);
    assert_eq!(Some(13), snapshot.away.days_since_last_match);
    assert_eq!(StakesLabel::TitleRace, snapshot.home.stakes);
    assert_eq!(Some(1), snapshot.home.standing.as_ref().map(|row| row.position));
    assert_eq!(
        HeadToHead {
            meetings: 3,
            home_wins: 2,
            draws: 1,
            away_wins: 0
        },
        snapshot.head_to_head
    );
    assert_eq!(Some(0.45), snapshot.referee.as_ref().map(|referee| referee.penalties_per_match));

    let adjustments = Pipeline::standard(&Config::default()).run(&snapshot);
    assert_float_absolute_eq!(1.5, adjustments.referee_bias, 1e-12);
    assert!(adjustments.multiplier(Side::Home) > adjustments.multiplier(Side::Away));
    assert!(adjustments.applied.iter().any(|applied| applied.name == "head_to_head"));
}

#[test]
fn validate() {
    assert!(Config::default().validate().is_ok());
    let config = Config {
        history_limit: 3,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}
