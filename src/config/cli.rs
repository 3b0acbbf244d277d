use crate::adapters::http::{redact_url, OpenWeatherClient};
use crate::config::WeatherConfig;
use crate::core::DataKind;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "weather-etl")]
#[command(about = "Fetch current weather and forecasts, archive the raw JSON and load flat tables")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "weather-etl.toml", env = "WEATHER_ETL_CONFIG")]
    pub config: String,

    /// Local directory standing in for the archive bucket and the warehouse
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log CPU / memory usage per phase
    #[arg(long)]
    pub monitor: bool,

    /// Show what would be fetched without executing
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// `<output>/<bucket>`
    pub fn archive_root(&self, config: &WeatherConfig) -> PathBuf {
        PathBuf::from(&self.output_path).join(&config.archive.bucket)
    }

    /// `<output>/warehouse`
    pub fn warehouse_root(&self) -> PathBuf {
        PathBuf::from(&self.output_path).join("warehouse")
    }
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("config", &self.config)?;
        validation::validate_path("output_path", &self.output_path)
    }
}

/// Dry run 用：列出每個地點會呼叫的端點 (隱藏 API key)
pub fn describe_plan(config: &WeatherConfig) -> Result<Vec<String>> {
    let client = OpenWeatherClient::new(
        &config.api.base_url,
        &config.api.api_key,
        &config.api.units,
        std::time::Duration::from_secs(1),
    )?;

    let mut lines = Vec::new();
    for location in &config.locations {
        for kind in DataKind::ALL {
            let url = client.endpoint_url(location, kind)?;
            lines.push(format!("{} [{}] {}", location.name(), kind, redact_url(&url)));
        }
    }
    Ok(lines)
}
