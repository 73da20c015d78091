use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::{WeatherAdvisory, config::CacheConfig, resolver::AdvisoryResolver};

#[derive(Debug, Clone)]
struct CachedAdvisory {
    fetched_at: DateTime<Utc>,
    advisory: Arc<WeatherAdvisory>,
}

/// Client-side time-boxed cache for the latest advisory.
///
/// Entries younger than `stale_after` are served as-is; anything older is
/// replaced wholesale by the next fetch.
#[derive(Debug, Clone)]
pub struct AdvisoryCache {
    stale_after: Duration,
    entry: Option<CachedAdvisory>,
}

impl AdvisoryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after, entry: None }
    }

    /// Fails when `stale_after_secs` does not fit a time span.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let stale_after = i64::try_from(config.stale_after_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                anyhow!(
                    "Cache staleness window of {} seconds is out of range.\n\
                     Hint: set `cache.stale_after_secs` to a smaller value.",
                    config.stale_after_secs
                )
            })?;

        Ok(Self::new(stale_after))
    }

    /// The cached advisory if it is still inside the staleness window.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<WeatherAdvisory>> {
        self.entry
            .as_ref()
            .filter(|e| now - e.fetched_at < self.stale_after)
            .map(|e| e.advisory.clone())
    }

    /// Last stored advisory regardless of age.
    pub fn latest(&self) -> Option<Arc<WeatherAdvisory>> {
        self.entry.as_ref().map(|e| e.advisory.clone())
    }

    pub fn store(&mut self, advisory: WeatherAdvisory, now: DateTime<Utc>) -> Arc<WeatherAdvisory> {
        let advisory = Arc::new(advisory);
        self.entry = Some(CachedAdvisory { fetched_at: now, advisory: advisory.clone() });
        advisory
    }

    /// Serve the fresh entry or resolve a new one.
    ///
    /// Returns whether a fetch happened alongside the advisory.
    pub async fn get_or_refresh(
        &mut self,
        resolver: &AdvisoryResolver,
        now: DateTime<Utc>,
    ) -> (Arc<WeatherAdvisory>, bool) {
        if let Some(advisory) = self.fresh(now) {
            return (advisory, false);
        }

        let advisory = resolver.resolve().await;
        (self.store(advisory, now), true)
    }
}
