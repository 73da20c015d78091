use std::{path::PathBuf, time::Duration};

use advisory_core::{
    AdvisoryCache, Config, SourceId, WeatherAdvisory, resolver_from_config, server,
};
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use tracing::info;

/// One year; longer periods overflow the timer.
const MAX_REFRESH_SECS: u64 = 365 * 24 * 60 * 60;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "advisory", version, about = "Weather advisory service")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the advisory over HTTP.
    Serve {
        /// Address to bind, e.g. "127.0.0.1:8000". Defaults to the configured one.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve the advisory once and print it.
    Show {
        /// Print the raw JSON record.
        #[arg(long)]
        json: bool,
    },

    /// Poll the advisory on the configured refresh interval.
    Watch,

    /// Interactively edit the configuration file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let resolver = resolver_from_config(&config)?;
                server::serve(resolver, &bind).await?;
            }
            Command::Show { json } => {
                let resolver = resolver_from_config(&config)?;
                let advisory = resolver.resolve().await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&advisory)?);
                } else {
                    println!("{}", render(&advisory));
                }
            }
            Command::Watch => watch(&config).await?,
            Command::Configure => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };
                configure(config, &path)?;
            }
        }

        Ok(())
    }
}

async fn watch(config: &Config) -> Result<()> {
    let resolver = resolver_from_config(config)?;
    let mut cache = AdvisoryCache::from_config(&config.cache)?;
    let refresh_secs = config.cache.refresh_interval_secs.clamp(1, MAX_REFRESH_SECS);
    let mut ticker = tokio::time::interval(Duration::from_secs(refresh_secs));

    info!(
        refresh_secs = config.cache.refresh_interval_secs,
        stale_secs = config.cache.stale_after_secs,
        "watching advisory"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (advisory, fetched) = cache.get_or_refresh(&resolver, Utc::now()).await;
                if fetched {
                    println!("{}\n", render(&advisory));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping watch");
                return Ok(());
            }
        }
    }
}

fn configure(mut config: Config, path: &std::path::Path) -> Result<()> {
    let sources = Text::new("Sources, in order of preference:")
        .with_default(&config.sources.join(", "))
        .with_help_message("comma-separated; supported: bulletin, forecast")
        .prompt()
        .context("Failed to read source list")?;
    config.sources = parse_sources(&sources)?;

    config.area.name = Text::new("Service area name:")
        .with_default(&config.area.name)
        .prompt()
        .context("Failed to read service area name")?;

    config.area.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(config.area.latitude)
        .with_error_message("Please enter a decimal number")
        .prompt()
        .context("Failed to read latitude")?;

    config.area.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(config.area.longitude)
        .with_error_message("Please enter a decimal number")
        .prompt()
        .context("Failed to read longitude")?;

    config.area.timezone = Text::new("Time zone:")
        .with_default(&config.area.timezone)
        .prompt()
        .context("Failed to read time zone")?;

    config.bulletin.url = Text::new("Bulletin URL:")
        .with_default(&config.bulletin.url)
        .prompt()
        .context("Failed to read bulletin URL")?;

    config.http.timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.http.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Failed to read request timeout")?;

    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

/// Normalize a comma-separated source list, rejecting unknown ids.
fn parse_sources(input: &str) -> Result<Vec<String>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SourceId::try_from(s).map(|id| id.as_str().to_string()))
        .collect()
}

fn render(advisory: &WeatherAdvisory) -> String {
    let marker = if advisory.has_warning() { "[!]" } else { "[i]" };
    let updated = advisory.last_updated.with_timezone(&Local).format("%Y-%m-%d %H:%M");

    format!(
        "{marker} {location}: {condition}\n\
         {advisory}\n\
         Temperature {temperature} | Humidity {humidity} | Wind {wind} | Rainfall {rainfall}\n\
         Updated {updated} | Source: {source}",
        location = advisory.location,
        condition = advisory.condition,
        advisory = advisory.advisory,
        temperature = advisory.temperature,
        humidity = advisory.humidity,
        wind = advisory.wind_speed,
        rainfall = advisory.rainfall,
        source = advisory.source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory_core::Condition;

    #[test]
    fn parses_source_list() {
        let sources = parse_sources(" Forecast ,bulletin,").expect("valid list");
        assert_eq!(sources, vec!["forecast", "bulletin"]);
    }

    #[test]
    fn rejects_unknown_source() {
        let err = parse_sources("bulletin, radar").unwrap_err();
        assert!(err.to_string().contains("Unknown advisory source"));
    }

    #[test]
    fn render_marks_warnings() {
        let mut advisory = WeatherAdvisory::degraded("Tandag City", "PAG-ASA", Utc::now());
        assert!(render(&advisory).starts_with("[i] Tandag City: Unknown"));

        advisory.condition = Condition::Thunderstorm;
        advisory.advisory = "⚠️ Thunderstorm activity detected.".into();
        let text = render(&advisory);

        assert!(text.starts_with("[!] Tandag City: Thunderstorm"));
        assert!(text.contains("Source: PAG-ASA"));
    }

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from(["advisory", "show", "--json", "--config", "/tmp/a.toml"])
            .expect("args must parse");

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
        assert!(matches!(cli.command, Command::Show { json: true }));
    }
}
