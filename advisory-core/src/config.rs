use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::source::SourceId;

/// The fixed service area the advisory is resolved for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA time zone passed to the forecast API.
    pub timezone: String,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            name: "Surigao del Sur, Philippines".to_string(),
            latitude: 8.9475,
            longitude: 126.0458,
            timezone: "Asia/Manila".to_string(),
        }
    }
}

/// Attribution strings reported in the `source` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Reported by every successful source.
    pub primary: String,
    /// Reported by the degraded record.
    pub degraded: String,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            primary: "PAG-ASA (Philippine Atmospheric, Geophysical and Astronomical Services Administration)"
                .to_string(),
            degraded: "PAG-ASA".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletinConfig {
    pub url: String,
    pub user_agent: String,
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self {
            url: "https://pubfiles.pagasa.dost.gov.ph/climps/weather/wfb.txt".to_string(),
            user_agent: "Mozilla/5.0 (compatible; WeatherApp/1.0)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub url: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { url: "https://api.open-meteo.com/v1/forecast".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for every outbound call.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8000".to_string() }
    }
}

/// Client-side refresh cadence and staleness window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub refresh_interval_secs: u64,
    pub stale_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { refresh_interval_secs: 30 * 60, stale_after_secs: 15 * 60 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// sources = ["bulletin", "forecast"]
///
/// [area]
/// name = "Surigao del Sur, Philippines"
/// latitude = 8.9475
/// longitude = 126.0458
/// timezone = "Asia/Manila"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source ids in the order they are attempted.
    pub sources: Vec<String>,
    pub area: AreaConfig,
    pub attribution: AttributionConfig,
    pub bulletin: BulletinConfig,
    pub forecast: ForecastConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourceId::all().iter().map(|id| id.as_str().to_string()).collect(),
            area: AreaConfig::default(),
            attribution: AttributionConfig::default(),
            bulletin: BulletinConfig::default(),
            forecast: ForecastConfig::default(),
            http: HttpConfig::default(),
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// The configured source chain as strongly-typed ids.
    pub fn source_ids(&self) -> Result<Vec<SourceId>> {
        if self.sources.is_empty() {
            return Err(anyhow!(
                "No advisory sources configured.\n\
                 Hint: set `sources = [\"bulletin\", \"forecast\"]` in the config file."
            ));
        }

        self.sources.iter().map(|s| SourceId::try_from(s.as_str())).collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Load config from the platform config dir, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path, or defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("ph", "surigao-services", "weather-advisory")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
