use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, header::USER_AGENT};
use tracing::debug;

use crate::{
    Config,
    config::BulletinConfig,
    model::{Condition, NO_ADVISORY, WeatherAdvisory},
};

use super::{AdvisorySource, SourceError, SourceId, truncate_body};

/// A line mentioning any of these is copied into the advisory.
const TRIGGER_TERMS: &[&str] = &["advisory", "warning", "rainfall", "thunderstorm"];

/// Checked against the whole bulletin in order; first hit wins.
const CONDITION_TERMS: &[(&str, Condition)] = &[
    ("thunderstorm", Condition::Thunderstorms),
    ("rain", Condition::Rainy),
    ("cloudy", Condition::Cloudy),
];

// The bulletin carries no structured measurements.
const TEMPERATURE: &str = "28°C";
const HUMIDITY: &str = "78%";
const WIND_SPEED: &str = "15 km/h";

/// Primary tier: the free-text weather bulletin.
#[derive(Debug, Clone)]
pub struct BulletinSource {
    settings: BulletinConfig,
    location: String,
    attribution: String,
    http: Client,
}

impl BulletinSource {
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            settings: config.bulletin.clone(),
            location: config.area.name.clone(),
            attribution: config.attribution.primary.clone(),
            http,
        }
    }

    async fn fetch_text(&self) -> Result<String> {
        let res = self
            .http
            .get(&self.settings.url)
            .header(USER_AGENT, &self.settings.user_agent)
            .send()
            .await
            .context("Failed to send request for weather bulletin")?;

        let status = res.status();
        let bytes = res.bytes().await.context("Failed to read weather bulletin body")?;

        if !status.is_success() {
            return Err(SourceError::Status {
                source_id: SourceId::Bulletin,
                status,
                body: truncate_body(&String::from_utf8_lossy(&bytes)),
            }
            .into());
        }

        String::from_utf8(bytes.to_vec()).map_err(|_| {
            anyhow::Error::from(SourceError::Decode { source_id: SourceId::Bulletin })
        })
    }
}

#[async_trait]
impl AdvisorySource for BulletinSource {
    fn id(&self) -> SourceId {
        SourceId::Bulletin
    }

    async fn fetch(&self) -> Result<WeatherAdvisory> {
        let text = self.fetch_text().await?;
        debug!(bytes = text.len(), url = %self.settings.url, "fetched weather bulletin");

        Ok(parse_bulletin(&text, &self.location, &self.attribution, Utc::now()))
    }
}

/// Turn bulletin text into an advisory record.
///
/// A bulletin without any trigger line is a valid "no advisory" outcome.
pub fn parse_bulletin(
    text: &str,
    location: &str,
    attribution: &str,
    now: DateTime<Utc>,
) -> WeatherAdvisory {
    let lower = text.to_lowercase();
    let advisory = extract_advisory(text);

    let rainfall =
        if lower.contains("rain") { "Possible rainfall" } else { "No rainfall expected" };

    WeatherAdvisory {
        location: location.to_string(),
        advisory: if advisory.is_empty() { NO_ADVISORY.to_string() } else { advisory },
        temperature: TEMPERATURE.to_string(),
        condition: classify(&lower),
        humidity: HUMIDITY.to_string(),
        wind_speed: WIND_SPEED.to_string(),
        rainfall: rainfall.to_string(),
        last_updated: now,
        source: attribution.to_string(),
    }
}

/// Trigger lines, trimmed and joined by single spaces.
pub fn extract_advisory(text: &str) -> String {
    let mut advisory = String::new();

    for line in text.split('\n') {
        let lower = line.to_lowercase();
        if TRIGGER_TERMS.iter().any(|term| lower.contains(term)) {
            advisory.push_str(line.trim());
            advisory.push(' ');
        }
    }

    advisory.trim().to_string()
}

fn classify(lower_text: &str) -> Condition {
    CONDITION_TERMS
        .iter()
        .find(|(term, _)| lower_text.contains(term))
        .map(|(_, condition)| *condition)
        .unwrap_or(Condition::PartlyCloudy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::{local_config, spawn_upstream};
    use axum::{
        Router,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use chrono::TimeZone;

    const AREA: &str = "Surigao del Sur, Philippines";
    const ATTRIBUTION: &str = "PAG-ASA";

    fn parse(text: &str) -> WeatherAdvisory {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        parse_bulletin(text, AREA, ATTRIBUTION, now)
    }

    #[test]
    fn storm_and_rainfall_bulletin() {
        let advisory =
            parse("Heavy rainfall warning issued for the province. Thunderstorm watch in effect.");

        assert_eq!(advisory.condition, Condition::Thunderstorms);
        assert_eq!(
            advisory.advisory,
            "Heavy rainfall warning issued for the province. Thunderstorm watch in effect."
        );
        assert_eq!(advisory.rainfall, "Possible rainfall");
        assert_eq!(advisory.source, ATTRIBUTION);
        assert_eq!(advisory.location, AREA);
    }

    #[test]
    fn trigger_lines_are_trimmed_and_space_joined() {
        let text = "SYNOPSIS: ridge of high pressure\n   Gale WARNING over northern seaboards.  \nFair weather\r\n\tRainfall advisory for Mindanao.\n";
        let advisory = parse(text);

        assert_eq!(
            advisory.advisory,
            "Gale WARNING over northern seaboards. Rainfall advisory for Mindanao."
        );
    }

    #[test]
    fn every_trigger_line_appears_verbatim() {
        let lines = [
            "  General flood advisory no. 3  ",
            "Thunderstorm information for Caraga",
            "No warning signal raised",
        ];
        let advisory = parse(&lines.join("\n"));

        for line in lines {
            assert!(advisory.advisory.contains(line.trim()), "missing {line:?}");
        }
    }

    #[test]
    fn no_trigger_lines_yields_default_advisory() {
        let advisory = parse("Partly cloudy skies with isolated showers.\nLight winds.");

        assert_eq!(advisory.advisory, NO_ADVISORY);
        assert_eq!(advisory.condition, Condition::Cloudy);
        assert_eq!(advisory.rainfall, "No rainfall expected");
    }

    #[test]
    fn empty_bulletin_is_not_an_error() {
        let advisory = parse("");

        assert_eq!(advisory.advisory, NO_ADVISORY);
        assert_eq!(advisory.condition, Condition::PartlyCloudy);
        assert_eq!(advisory.temperature, "28°C");
        assert_eq!(advisory.humidity, "78%");
        assert_eq!(advisory.wind_speed, "15 km/h");
    }

    #[test]
    fn thunderstorm_wins_over_rain_in_any_order() {
        for text in [
            "rain then thunderstorm",
            "thunderstorm then rain",
            "CLOUDY, RAIN, THUNDERSTORM",
            "Thunderstorms expected; cloudy with rain",
        ] {
            assert_eq!(parse(text).condition, Condition::Thunderstorms, "{text:?}");
        }
    }

    #[test]
    fn rain_wins_over_cloudy() {
        assert_eq!(parse("Cloudy skies with light RAIN").condition, Condition::Rainy);
    }

    #[test]
    fn rain_substring_drives_condition_and_rainfall() {
        // "Drain" contains "rain"; the heuristic is substring based.
        let advisory = parse("Drainage maintenance in the city proper.");

        assert_eq!(advisory.condition, Condition::Rainy);
        assert_eq!(advisory.rainfall, "Possible rainfall");
        assert_eq!(advisory.advisory, NO_ADVISORY);
    }

    async fn echo_user_agent(headers: HeaderMap) -> String {
        let agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default();
        format!("Weather advisory requested by: {agent}\nFair weather.")
    }

    #[tokio::test]
    async fn fetch_sends_user_agent_and_parses_body() {
        let app = Router::new().route("/wfb.txt", get(echo_user_agent));
        let cfg = local_config(spawn_upstream(app).await);
        let source = BulletinSource::new(&cfg, reqwest::Client::new());

        let advisory = source.fetch().await.expect("bulletin must resolve");

        assert_eq!(
            advisory.advisory,
            "Weather advisory requested by: Mozilla/5.0 (compatible; WeatherApp/1.0)"
        );
        assert_eq!(advisory.location, cfg.area.name);
        assert_eq!(advisory.source, cfg.attribution.primary);
    }

    #[tokio::test]
    async fn non_success_status_is_a_status_error() {
        let app = Router::new().route(
            "/wfb.txt",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "Thunderstorm warning (stale)") }),
        );
        let cfg = local_config(spawn_upstream(app).await);
        let source = BulletinSource::new(&cfg, reqwest::Client::new());

        let err = source.fetch().await.unwrap_err();

        match err.downcast_ref::<SourceError>() {
            Some(SourceError::Status { source_id, status, body }) => {
                assert_eq!(*source_id, SourceId::Bulletin);
                assert_eq!(*status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "Thunderstorm warning (stale)");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn binary_body_is_a_decode_error() {
        let app = Router::new().route("/wfb.txt", get(|| async { vec![0xff_u8, 0xfe, 0x00] }));
        let cfg = local_config(spawn_upstream(app).await);
        let source = BulletinSource::new(&cfg, reqwest::Client::new());

        let err = source.fetch().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Decode { source_id: SourceId::Bulletin })
        ));
        assert_eq!(err.to_string(), "bulletin response body is not valid UTF-8 text");
    }
}
