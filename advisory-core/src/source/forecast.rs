use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    Config,
    config::{AreaConfig, ForecastConfig},
    model::{Condition, NO_ADVISORY, WeatherAdvisory},
};

use super::{AdvisorySource, SourceError, SourceId, truncate_body};

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,precipitation";

pub const STORM_ADVISORY: &str =
    "⚠️ Thunderstorm activity detected. Residents are advised to stay indoors and avoid open areas.";
pub const RAIN_ADVISORY: &str =
    "🌧️ Rainfall expected in the area. Please carry an umbrella and drive carefully.";

/// Drizzle, rain and shower codes.
const RAIN_CODES: &[i64] = &[51, 53, 55, 61, 63, 65, 80, 81, 82];
const STORM_CODES: &[i64] = &[95, 96, 99];

/// Fallback tier: the coded numeric forecast API.
#[derive(Debug, Clone)]
pub struct ForecastSource {
    settings: ForecastConfig,
    area: AreaConfig,
    attribution: String,
    http: Client,
}

impl ForecastSource {
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            settings: config.forecast.clone(),
            area: config.area.clone(),
            attribution: config.attribution.primary.clone(),
            http,
        }
    }

    async fn fetch_current(&self) -> Result<CurrentConditions> {
        let res = self
            .http
            .get(&self.settings.url)
            .query(&[
                ("latitude", self.area.latitude.to_string()),
                ("longitude", self.area.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", self.area.timezone.clone()),
            ])
            .send()
            .await
            .context("Failed to send request to forecast API")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read forecast response body")?;

        if !status.is_success() {
            return Err(SourceError::Status {
                source_id: SourceId::Forecast,
                status,
                body: truncate_body(&body),
            }
            .into());
        }

        let parsed: ForecastResponse =
            serde_json::from_str(&body).context("Failed to parse forecast JSON")?;

        Ok(parsed.current)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

/// The `current` block of a forecast response.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub weather_code: i64,
    pub wind_speed_10m: f64,
    pub precipitation: f64,
}

#[async_trait]
impl AdvisorySource for ForecastSource {
    fn id(&self) -> SourceId {
        SourceId::Forecast
    }

    async fn fetch(&self) -> Result<WeatherAdvisory> {
        let current = self.fetch_current().await?;
        debug!(
            code = current.weather_code,
            precipitation = current.precipitation,
            "fetched forecast"
        );

        Ok(advisory_from_current(&current, &self.area.name, &self.attribution, Utc::now()))
    }
}

/// Map a weather code onto its label; codes outside the table are `Unknown`.
pub fn condition_for_code(code: i64) -> Condition {
    match code {
        0 => Condition::ClearSky,
        1 => Condition::MainlyClear,
        2 => Condition::PartlyCloudy,
        3 => Condition::Overcast,
        45 => Condition::Foggy,
        48 => Condition::DepositingRimeFog,
        51 => Condition::LightDrizzle,
        53 => Condition::ModerateDrizzle,
        55 => Condition::DenseDrizzle,
        61 => Condition::SlightRain,
        63 => Condition::ModerateRain,
        65 => Condition::HeavyRain,
        71 => Condition::SlightSnow,
        73 => Condition::ModerateSnow,
        75 => Condition::HeavySnow,
        80 => Condition::SlightRainShowers,
        81 => Condition::ModerateRainShowers,
        82 => Condition::ViolentRainShowers,
        95 => Condition::Thunderstorm,
        96 => Condition::ThunderstormSlightHail,
        99 => Condition::ThunderstormHeavyHail,
        _ => Condition::Unknown,
    }
}

/// Rain is flagged by the code alone, even with zero measured precipitation.
pub fn has_rain(current: &CurrentConditions) -> bool {
    current.precipitation > 0.0 || RAIN_CODES.contains(&current.weather_code)
}

pub fn has_storm(current: &CurrentConditions) -> bool {
    STORM_CODES.contains(&current.weather_code)
}

pub fn advisory_text(current: &CurrentConditions) -> &'static str {
    if has_storm(current) {
        STORM_ADVISORY
    } else if has_rain(current) {
        RAIN_ADVISORY
    } else {
        NO_ADVISORY
    }
}

/// Normalize a forecast reading.
///
/// `rainfall` only looks at measured precipitation, so a rain code with
/// zero precipitation yields the rain advisory next to "No rainfall".
pub fn advisory_from_current(
    current: &CurrentConditions,
    location: &str,
    attribution: &str,
    now: DateTime<Utc>,
) -> WeatherAdvisory {
    let rainfall = if current.precipitation > 0.0 {
        format!("{} mm", current.precipitation)
    } else {
        "No rainfall".to_string()
    };

    WeatherAdvisory {
        location: location.to_string(),
        advisory: advisory_text(current).to_string(),
        temperature: format!("{}°C", round_half_up(current.temperature_2m)),
        condition: condition_for_code(current.weather_code),
        humidity: format!("{}%", round_half_up(current.relative_humidity_2m)),
        wind_speed: format!("{} km/h", round_half_up(current.wind_speed_10m)),
        rainfall,
        last_updated: now,
        source: attribution.to_string(),
    }
}

/// Halves round toward positive infinity (-2.5 -> -2).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
