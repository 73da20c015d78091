use crate::{
    Config, WeatherAdvisory,
    source::{bulletin::BulletinSource, forecast::ForecastSource},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use thiserror::Error;

pub mod bulletin;
pub mod forecast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Bulletin,
    Forecast,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Bulletin => "bulletin",
            SourceId::Forecast => "forecast",
        }
    }

    /// Default attempt order.
    pub const fn all() -> &'static [SourceId] {
        &[SourceId::Bulletin, SourceId::Forecast]
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "bulletin" => Ok(SourceId::Bulletin),
            "forecast" => Ok(SourceId::Forecast),
            _ => Err(anyhow::anyhow!(
                "Unknown advisory source '{value}'. Supported sources: bulletin, forecast."
            )),
        }
    }
}

/// Failures a source detects after the transport itself succeeded.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_id} request failed with status {status}: {body}")]
    Status { source_id: SourceId, status: StatusCode, body: String },

    #[error("{source_id} response body is not valid UTF-8 text")]
    Decode { source_id: SourceId },
}

/// One tier of the advisory chain.
#[async_trait]
pub trait AdvisorySource: Send + Sync + Debug {
    fn id(&self) -> SourceId;

    /// Fetch and normalize. Any error sends the resolver to the next tier.
    async fn fetch(&self) -> anyhow::Result<WeatherAdvisory>;
}

/// Shared outbound client; the timeout bounds every call a source makes.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build outbound HTTP client")
}

/// Construct a source from config and explicit SourceId.
pub fn source_from_config(
    id: SourceId,
    config: &Config,
    http: Client,
) -> Box<dyn AdvisorySource> {
    match id {
        SourceId::Bulletin => Box::new(BulletinSource::new(config, http)),
        SourceId::Forecast => Box::new(ForecastSource::new(config, http)),
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::Router;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Serve `app` on an ephemeral local port for the rest of the test.
    pub(crate) async fn spawn_upstream(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local upstream");
        let addr = listener.local_addr().expect("local upstream address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("local upstream stopped");
        });

        addr
    }

    /// Config whose sources all point at `addr`.
    pub(crate) fn local_config(addr: SocketAddr) -> Config {
        let mut cfg = Config::default();
        cfg.bulletin.url = format!("http://{addr}/wfb.txt");
        cfg.forecast.url = format!("http://{addr}/v1/forecast");
        cfg.http.timeout_secs = 5;
        cfg
    }

    #[test]
    fn source_id_as_str_roundtrip() {
        for id in SourceId::all() {
            let s = id.as_str();
            let parsed = SourceId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn source_id_parse_ignores_case() {
        assert_eq!(SourceId::try_from("Forecast").unwrap(), SourceId::Forecast);
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown advisory source"));
    }

    #[test]
    fn source_from_config_keeps_requested_id() {
        let cfg = Config::default();
        let http = http_client(&cfg).expect("client must build");

        for id in SourceId::all() {
            let source = source_from_config(*id, &cfg, http.clone());
            assert_eq!(source.id(), *id);
        }
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(250);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn status_error_names_source() {
        let err = SourceError::Status {
            source_id: SourceId::Bulletin,
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".into(),
        };

        assert_eq!(
            err.to_string(),
            "bulletin request failed with status 503 Service Unavailable: down"
        );
    }
}
