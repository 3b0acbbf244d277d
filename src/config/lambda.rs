use crate::config::{CredentialMode, WeatherConfig};
use crate::core::{ConfigProvider, DataKind, Location};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as S3Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Lambda 執行時的設定：天氣 ETL 設定加上 S3 相關參數
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub weather: WeatherConfig,
    pub s3_region: String,
    pub warehouse_bucket: String,
}

fn required_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| EtlError::MissingConfigError {
        field: format!("{} environment variable", name),
    })
}

impl LambdaConfig {
    /// `WEATHER_ETL_CONFIG` 指向 TOML 檔時以檔案為主，否則全部從環境變數組出設定
    pub fn from_env() -> Result<Self> {
        let weather = match env::var("WEATHER_ETL_CONFIG") {
            Ok(path) => WeatherConfig::from_file(path)?,
            Err(_) => Self::weather_from_env()?,
        };

        let warehouse_bucket =
            env::var("WAREHOUSE_BUCKET").unwrap_or_else(|_| weather.archive.bucket.clone());

        Ok(Self {
            weather,
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
            warehouse_bucket,
        })
    }

    fn weather_from_env() -> Result<WeatherConfig> {
        let mut weather = WeatherConfig::new(
            &required_env("OPENWEATHER_API_KEY")?,
            &required_env("ARCHIVE_BUCKET")?,
            &required_env("PROJECT_ID")?,
            &env::var("DATASET_ID").unwrap_or_else(|_| "weather_api_data".to_string()),
        );

        if let Ok(base_url) = env::var("API_BASE_URL") {
            weather.api.base_url = base_url;
        }
        if let Ok(timeout) = env::var("API_TIMEOUT_SECONDS") {
            let seconds = timeout
                .parse()
                .map_err(|_| EtlError::InvalidConfigValueError {
                    field: "API_TIMEOUT_SECONDS".to_string(),
                    value: timeout.clone(),
                    reason: "Expected a whole number of seconds".to_string(),
                })?;
            weather.api.timeout_seconds = Some(seconds);
        }

        weather.credentials.mode = match env::var("CREDENTIALS_MODE").as_deref() {
            Ok("file") => CredentialMode::File,
            Ok("ambient") | Err(_) => CredentialMode::Ambient,
            Ok(other) => {
                return Err(EtlError::InvalidConfigValueError {
                    field: "CREDENTIALS_MODE".to_string(),
                    value: other.to_string(),
                    reason: "Expected 'file' or 'ambient'".to_string(),
                })
            }
        };
        weather.credentials.archive_credentials_file = env::var("ARCHIVE_CREDENTIALS_FILE").ok();
        weather.credentials.warehouse_credentials_file =
            env::var("WAREHOUSE_CREDENTIALS_FILE").ok();

        Ok(weather)
    }
}

impl ConfigProvider for LambdaConfig {
    fn api_endpoint(&self) -> &str {
        self.weather.api_endpoint()
    }

    fn api_key(&self) -> &str {
        self.weather.api_key()
    }

    fn units(&self) -> &str {
        self.weather.units()
    }

    fn request_timeout(&self) -> Duration {
        self.weather.request_timeout()
    }

    fn locations(&self) -> &[Location] {
        self.weather.locations()
    }

    fn table_name(&self, kind: DataKind) -> &str {
        self.weather.table_name(kind)
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        self.weather.validate()?;
        validation::validate_bucket_name("WAREHOUSE_BUCKET", &self.warehouse_bucket)?;
        validate_aws_region("S3_REGION", &self.s3_region)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// 明確憑證檔的格式
#[derive(Debug, Deserialize)]
struct CredentialFile {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

pub fn load_credentials(path: &str) -> Result<Credentials> {
    let content = std::fs::read_to_string(path)?;
    let file: CredentialFile = serde_json::from_str(&content)?;
    Ok(Credentials::new(
        file.access_key_id,
        file.secret_access_key,
        file.session_token,
        None,
        "weather-etl-credentials-file",
    ))
}

/// 有憑證檔時使用該檔案，否則走 AWS 預設的 provider chain
pub async fn build_s3_client(region: &str, credentials_file: Option<&str>) -> Result<S3Client> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let Some(path) = credentials_file {
        tracing::info!("🔑 Using explicit credentials from {}", path);
        loader = loader.credentials_provider(load_credentials(path)?);
    } else {
        tracing::info!("🔑 Using ambient credentials");
    }

    let shared_config = loader.load().await;
    let config = aws_sdk_s3::config::Builder::from(&shared_config)
        .force_path_style(true)
        .build();
    Ok(S3Client::from_conf(config))
}
