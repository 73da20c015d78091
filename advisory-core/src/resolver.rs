use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, warn};

use crate::{
    Config, WeatherAdvisory,
    source::{AdvisorySource, http_client, source_from_config},
};

/// Walks the source chain in order and always yields a record.
#[derive(Debug)]
pub struct AdvisoryResolver {
    chain: Vec<Box<dyn AdvisorySource>>,
    location: String,
    degraded_attribution: String,
}

impl AdvisoryResolver {
    pub fn new(
        chain: Vec<Box<dyn AdvisorySource>>,
        location: String,
        degraded_attribution: String,
    ) -> Self {
        Self { chain, location, degraded_attribution }
    }

    pub fn chain(&self) -> &[Box<dyn AdvisorySource>] {
        &self.chain
    }

    /// First source to succeed wins; if none does, the degraded record.
    ///
    /// Sources are tried one after another, never concurrently.
    pub async fn resolve(&self) -> WeatherAdvisory {
        for source in &self.chain {
            match source.fetch().await {
                Ok(advisory) => {
                    debug!(
                        source = %source.id(),
                        condition = %advisory.condition,
                        "advisory resolved"
                    );
                    return advisory;
                }
                Err(err) => {
                    warn!(
                        source = %source.id(),
                        error = %format!("{err:#}"),
                        "advisory source failed"
                    );
                }
            }
        }

        error!(location = %self.location, "all advisory sources failed, serving degraded record");
        WeatherAdvisory::degraded(&self.location, &self.degraded_attribution, Utc::now())
    }
}

/// Build the resolver and its source chain from config.
pub fn resolver_from_config(config: &Config) -> Result<AdvisoryResolver> {
    let http = http_client(config)?;

    let chain = config
        .source_ids()?
        .into_iter()
        .map(|id| source_from_config(id, config, http.clone()))
        .collect();

    Ok(AdvisoryResolver::new(
        chain,
        config.area.name.clone(),
        config.attribution.degraded.clone(),
    ))
}
