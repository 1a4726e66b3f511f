//! Conditions that suppress scoring for both sides.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::context::{Adjustments, ContextSnapshot, Factor, SideFactors};
use crate::domain::Weather;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub heavy_rain_mm_per_hour: f64,
    pub heavy_rain: f64,
    pub strong_wind_kph: f64,
    pub strong_wind: f64,
    pub cold_celsius: f64,
    pub hot_celsius: f64,
    pub extreme_temperature: f64,
    pub min_combined: f64,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cold_celsius >= self.hot_celsius {
            return Err(anyhow!("cold threshold must be below the hot threshold").into());
        }
        if self.min_combined <= 0.0 || self.min_combined > 1.0 {
            return Err(anyhow!("min combined weather factor must lie in (0, 1]").into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heavy_rain_mm_per_hour: 4.0,
            heavy_rain: 0.06,
            strong_wind_kph: 40.0,
            strong_wind: 0.05,
            cold_celsius: -5.0,
            hot_celsius: 32.0,
            extreme_temperature: 0.04,
            min_combined: 0.5,
        }
    }
}

/// The combined correction for the match, `1 − Σ penalties`, floored at `min_combined`.
pub fn combined(weather: &Weather, config: &Config) -> f64 {
    let mut penalty = 0.0;
    if weather.rain_mm_per_hour >= config.heavy_rain_mm_per_hour {
        penalty += config.heavy_rain;
    }
    if weather.wind_kph >= config.strong_wind_kph {
        penalty += config.strong_wind;
    }
    if weather.temperature_celsius <= config.cold_celsius
        || weather.temperature_celsius >= config.hot_celsius
    {
        penalty += config.extreme_temperature;
    }
    f64::max(config.min_combined, 1.0 - penalty)
}

/// The per-side share of the combined correction. Both sides are affected, so each takes the
/// square root.
pub fn per_side(weather: Option<&Weather>, config: &Config) -> f64 {
    weather.map_or(1.0, |weather| combined(weather, config).sqrt())
}

#[derive(Debug)]
pub struct WeatherFactor(pub Config);

impl Factor for WeatherFactor {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn apply(&self, snapshot: &ContextSnapshot, adjustments: &mut Adjustments) {
        let multiplier = per_side(snapshot.weather.as_ref(), &self.0);
        let detail = match &snapshot.weather {
            Some(weather) => format!(
                "{:.1}mm/h, {:.0}km/h, {:.0}°C",
                weather.rain_mm_per_hour, weather.wind_kph, weather.temperature_celsius
            ),
            None => String::new(),
        };
        adjustments.record(
            self.name(),
            SideFactors::attack(multiplier),
            SideFactors::attack(multiplier),
            detail,
        );
    }
}
