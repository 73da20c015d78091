use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Advisory text used whenever a source has nothing to report.
pub const NO_ADVISORY: &str = "No active weather advisories at this time.";

/// Advisory text of the degraded record.
pub const UNAVAILABLE_ADVISORY: &str =
    "Weather data temporarily unavailable. Please check back later.";

/// Display value for fields a degraded record cannot fill.
pub const PLACEHOLDER: &str = "--";

/// Normalized advisory returned to clients.
///
/// All measurement fields are already display-formatted (unit-suffixed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAdvisory {
    pub location: String,
    pub advisory: String,
    pub temperature: String,
    pub condition: Condition,
    pub humidity: String,
    pub wind_speed: String,
    pub rainfall: String,
    #[serde(with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
    pub source: String,
}

impl WeatherAdvisory {
    /// Placeholder record for when every source failed.
    pub fn degraded(location: &str, source: &str, now: DateTime<Utc>) -> Self {
        Self {
            location: location.to_string(),
            advisory: UNAVAILABLE_ADVISORY.to_string(),
            temperature: PLACEHOLDER.to_string(),
            condition: Condition::Unknown,
            humidity: PLACEHOLDER.to_string(),
            wind_speed: PLACEHOLDER.to_string(),
            rainfall: PLACEHOLDER.to_string(),
            last_updated: now,
            source: source.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.condition == Condition::Unknown && self.temperature == PLACEHOLDER
    }

    /// Whether the advisory text should be rendered as a warning.
    pub fn has_warning(&self) -> bool {
        let lower = self.advisory.to_lowercase();
        self.advisory.contains('⚠')
            || lower.contains("warning")
            || lower.contains("thunderstorm")
    }
}

/// Closed vocabulary of condition labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    ClearSky,
    MainlyClear,
    PartlyCloudy,
    Cloudy,
    Overcast,
    Foggy,
    DepositingRimeFog,
    LightDrizzle,
    ModerateDrizzle,
    DenseDrizzle,
    Rainy,
    SlightRain,
    ModerateRain,
    HeavyRain,
    SlightSnow,
    ModerateSnow,
    HeavySnow,
    SlightRainShowers,
    ModerateRainShowers,
    ViolentRainShowers,
    /// Bulletin-derived storm label.
    Thunderstorms,
    /// Forecast-code storm label (code 95).
    Thunderstorm,
    ThunderstormSlightHail,
    ThunderstormHeavyHail,
    Unknown,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::ClearSky => "Clear Sky",
            Condition::MainlyClear => "Mainly Clear",
            Condition::PartlyCloudy => "Partly Cloudy",
            Condition::Cloudy => "Cloudy",
            Condition::Overcast => "Overcast",
            Condition::Foggy => "Foggy",
            Condition::DepositingRimeFog => "Depositing Rime Fog",
            Condition::LightDrizzle => "Light Drizzle",
            Condition::ModerateDrizzle => "Moderate Drizzle",
            Condition::DenseDrizzle => "Dense Drizzle",
            Condition::Rainy => "Rainy",
            Condition::SlightRain => "Slight Rain",
            Condition::ModerateRain => "Moderate Rain",
            Condition::HeavyRain => "Heavy Rain",
            Condition::SlightSnow => "Slight Snow",
            Condition::ModerateSnow => "Moderate Snow",
            Condition::HeavySnow => "Heavy Snow",
            Condition::SlightRainShowers => "Slight Rain Showers",
            Condition::ModerateRainShowers => "Moderate Rain Showers",
            Condition::ViolentRainShowers => "Violent Rain Showers",
            Condition::Thunderstorms => "Thunderstorms",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::ThunderstormSlightHail => "Thunderstorm with Slight Hail",
            Condition::ThunderstormHeavyHail => "Thunderstorm with Heavy Hail",
            Condition::Unknown => "Unknown",
        }
    }

    pub const fn all() -> &'static [Condition] {
        &[
            Condition::ClearSky,
            Condition::MainlyClear,
            Condition::PartlyCloudy,
            Condition::Cloudy,
            Condition::Overcast,
            Condition::Foggy,
            Condition::DepositingRimeFog,
            Condition::LightDrizzle,
            Condition::ModerateDrizzle,
            Condition::DenseDrizzle,
            Condition::Rainy,
            Condition::SlightRain,
            Condition::ModerateRain,
            Condition::HeavyRain,
            Condition::SlightSnow,
            Condition::ModerateSnow,
            Condition::HeavySnow,
            Condition::SlightRainShowers,
            Condition::ModerateRainShowers,
            Condition::ViolentRainShowers,
            Condition::Thunderstorms,
            Condition::Thunderstorm,
            Condition::ThunderstormSlightHail,
            Condition::ThunderstormHeavyHail,
            Condition::Unknown,
        ]
    }

    /// Unrecognised labels map to [`Condition::Unknown`].
    pub fn from_label(label: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.label() == label)
            .unwrap_or(Condition::Unknown)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Condition::from_label(&label))
    }
}

/// `2026-10-19T08:00:00.000Z` style timestamps.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        dt: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
