use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{LeagueId, TeamId};
use crate::error::InvalidTransition;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixtureStatus {
    Scheduled,
    InProgress,
    Finished,
}

/// Decimal prices quoted for a fixture. The three-way prices are mandatory; the rest are optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
    #[serde(default)]
    pub over_2_5: Option<f64>,
    #[serde(default)]
    pub under_2_5: Option<f64>,
    #[serde(default)]
    pub btts_yes: Option<f64>,
    #[serde(default)]
    pub btts_no: Option<f64>,
}
impl MarketOdds {
    pub fn three_way(&self) -> Vec<f64> {
        vec![self.home, self.draw, self.away]
    }
}

/// Conditions forecast for kick-off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub rain_mm_per_hour: f64,
    pub wind_kph: f64,
    pub temperature_celsius: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefereeRecord {
    pub name: String,
    pub matches: u32,
    pub penalties_per_match: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub home: TeamId,
    pub away: TeamId,
    pub league: LeagueId,
    pub date: NaiveDate,
    #[serde(default)]
    pub referee: Option<String>,
    #[serde(default)]
    pub weather: Option<Weather>,
    #[serde(default)]
    pub odds: Option<MarketOdds>,
    pub status: FixtureStatus,
}
impl Fixture {
    pub fn is_scheduled(&self) -> bool {
        self.status == FixtureStatus::Scheduled
    }

    pub fn kick_off(&mut self) -> Result<(), InvalidTransition> {
        self.transition(FixtureStatus::Scheduled, FixtureStatus::InProgress)
    }

    pub fn final_whistle(&mut self) -> Result<(), InvalidTransition> {
        self.transition(FixtureStatus::InProgress, FixtureStatus::Finished)
    }

    fn transition(
        &mut self,
        expected: FixtureStatus,
        next: FixtureStatus,
    ) -> Result<(), InvalidTransition> {
        if self.status != expected {
            return Err(InvalidTransition {
                fixture: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled() -> Fixture {
        Fixture {
            id: "f1".into(),
            home: "ARS".into(),
            away: "CHE".into(),
            league: "EPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            referee: None,
            weather: None,
            odds: None,
            status: FixtureStatus::Scheduled,
        }
    }

    #[test]
    fn lifecycle() {
        let mut fixture = scheduled();
        assert!(fixture.is_scheduled());
        fixture.kick_off().unwrap();
        assert_eq!(FixtureStatus::InProgress, fixture.status);
        fixture.final_whistle().unwrap();
        assert_eq!(FixtureStatus::Finished, fixture.status);
    }

    #[test]
    fn invalid_transition() {
        let mut fixture = scheduled();
        let err = fixture.final_whistle().unwrap_err();
        assert_eq!(
            "cannot move fixture f1 from Scheduled to Finished",
            err.to_string()
        );
        assert_eq!(FixtureStatus::Scheduled, fixture.status);

        fixture.kick_off().unwrap();
        assert!(fixture.kick_off().is_err());
    }

    #[test]
    fn deserialise_minimal() {
        let json = r#"{
            "id": "f2",
            "home": "LIV",
            "away": "MCI",
            "league": "EPL",
            "date": "2024-04-01",
            "status": "Scheduled"
        }"#;
        let fixture: Fixture = serde_json::from_str(json).unwrap();
        assert_eq!(TeamId::from("LIV"), fixture.home);
        assert!(fixture.odds.is_none());
        assert!(fixture.is_scheduled());
    }
}
