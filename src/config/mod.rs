#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;

use crate::core::{ConfigProvider, DataKind, Location};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CURRENT_TABLE: &str = "current_weather";
pub const DEFAULT_FORECAST_TABLE: &str = "forecast_weather";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const SUPPORTED_UNITS: [&str; 3] = ["metric", "imperial", "standard"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api: ApiConfig,
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
    pub archive: ArchiveConfig,
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_units")]
    pub units: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset_id: String,
    #[serde(default = "default_current_table")]
    pub current_table: String,
    #[serde(default = "default_forecast_table")]
    pub forecast_table: String,
}

/// 憑證取得方式：明確的憑證檔案，或執行環境提供的 ambient credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    #[default]
    Ambient,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub mode: CredentialMode,
    pub archive_credentials_file: Option<String>,
    pub warehouse_credentials_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_current_table() -> String {
    DEFAULT_CURRENT_TABLE.to_string()
}

fn default_forecast_table() -> String {
    DEFAULT_FORECAST_TABLE.to_string()
}

pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Hyderabad", "IN", 17.4065, 78.4772),
        Location::new("London", "GB", 51.50853, -0.12574),
        Location::new("Dubai", "AE", 25.276987, 55.296249),
        Location::new("Kolkata", "IN", 22.5744, 88.3629),
        Location::new("Bloomington", "US", 39.1653, -86.5366),
    ]
}

impl WeatherConfig {
    /// 以預設地點與表名建立設定
    pub fn new(api_key: &str, bucket: &str, project_id: &str, dataset_id: &str) -> Self {
        Self {
            api: ApiConfig {
                base_url: default_base_url(),
                api_key: api_key.to_string(),
                units: default_units(),
                timeout_seconds: None,
            },
            locations: default_locations(),
            archive: ArchiveConfig {
                bucket: bucket.to_string(),
            },
            warehouse: WarehouseConfig {
                project_id: project_id.to_string(),
                dataset_id: dataset_id.to_string(),
                current_table: default_current_table(),
                forecast_table: default_forecast_table(),
            },
            credentials: CredentialsConfig::default(),
            monitoring: None,
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENWEATHER_API_KEY})；未設定的變數保留原樣，交給驗證處理
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 依 credential mode 取得 archive 的憑證檔路徑
    pub fn archive_credentials_file(&self) -> Option<&str> {
        match self.credentials.mode {
            CredentialMode::File => self.credentials.archive_credentials_file.as_deref(),
            CredentialMode::Ambient => None,
        }
    }

    pub fn warehouse_credentials_file(&self) -> Option<&str> {
        match self.credentials.mode {
            CredentialMode::File => self.credentials.warehouse_credentials_file.as_deref(),
            CredentialMode::Ambient => None,
        }
    }

    fn validate_locations(&self) -> Result<()> {
        if self.locations.is_empty() {
            return Err(EtlError::ConfigValidationError {
                field: "locations".to_string(),
                message: "At least one location is required".to_string(),
            });
        }

        for (index, location) in self.locations.iter().enumerate() {
            let field = |name: &str| format!("locations[{}].{}", index, name);
            validation::validate_non_empty_string(&field("city"), &location.city)?;
            validation::validate_non_empty_string(&field("country"), &location.country)?;
            validation::validate_range(&field("lat"), location.lat, -90.0, 90.0)?;
            validation::validate_range(&field("lon"), location.lon, -180.0, 180.0)?;
        }
        Ok(())
    }
}

impl ConfigProvider for WeatherConfig {
    fn api_endpoint(&self) -> &str {
        &self.api.base_url
    }

    fn api_key(&self) -> &str {
        &self.api.api_key
    }

    fn units(&self) -> &str {
        &self.api.units
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn locations(&self) -> &[Location] {
        &self.locations
    }

    fn table_name(&self, kind: DataKind) -> &str {
        match kind {
            DataKind::Current => &self.warehouse.current_table,
            DataKind::Forecast => &self.warehouse.forecast_table,
        }
    }
}

impl Validate for WeatherConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_resolved("api.api_key", &self.api.api_key)?;

        if !SUPPORTED_UNITS.contains(&self.api.units.as_str()) {
            return Err(EtlError::InvalidConfigValueError {
                field: "api.units".to_string(),
                value: self.api.units.clone(),
                reason: format!("Supported units: {}", SUPPORTED_UNITS.join(", ")),
            });
        }

        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 300)?;
        }

        self.validate_locations()?;

        validation::validate_resolved("archive.bucket", &self.archive.bucket)?;
        validation::validate_bucket_name("archive.bucket", &self.archive.bucket)?;

        validation::validate_resolved("warehouse.project_id", &self.warehouse.project_id)?;
        validation::validate_path("warehouse.project_id", &self.warehouse.project_id)?;
        validation::validate_identifier("warehouse.dataset_id", &self.warehouse.dataset_id)?;
        validation::validate_identifier("warehouse.current_table", &self.warehouse.current_table)?;
        validation::validate_identifier(
            "warehouse.forecast_table",
            &self.warehouse.forecast_table,
        )?;

        if self.credentials.mode == CredentialMode::File {
            let archive_file = validation::validate_required_field(
                "credentials.archive_credentials_file",
                &self.credentials.archive_credentials_file,
            )?;
            validation::validate_path("credentials.archive_credentials_file", archive_file)?;

            let warehouse_file = validation::validate_required_field(
                "credentials.warehouse_credentials_file",
                &self.credentials.warehouse_credentials_file,
            )?;
            validation::validate_path("credentials.warehouse_credentials_file", warehouse_file)?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC_TOML: &str = r#"
[api]
api_key = "test-key"

[archive]
bucket = "weather-data-api-openweather"

[warehouse]
project_id = "weather-pipe"
dataset_id = "weather_api_data"
"#;

    #[test]
    fn test_parse_basic_config_applies_defaults() {
        let config = WeatherConfig::from_toml_str(BASIC_TOML).unwrap();

        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.units(), "metric");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.locations().len(), 5);
        assert_eq!(config.locations()[1].name(), "London, GB");
        assert_eq!(config.table_name(DataKind::Current), "current_weather");
        assert_eq!(config.table_name(DataKind::Forecast), "forecast_weather");
        assert_eq!(config.credentials.mode, CredentialMode::Ambient);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_explicit_locations_and_credentials() {
        let toml_content = r#"
[api]
base_url = "http://localhost:9000/data/2.5"
api_key = "k"
units = "imperial"
timeout_seconds = 5

[[locations]]
city = "Bloomington"
country = "US"
lat = 39.1653
lon = -86.5366

[archive]
bucket = "weather-archive"

[warehouse]
project_id = "p"
dataset_id = "d"
current_table = "now"
forecast_table = "later"

[credentials]
mode = "file"
archive_credentials_file = "cloud_storage_service_account.json"
warehouse_credentials_file = "warehouse_service_account.json"

[monitoring]
enabled = true
"#;

        let config = WeatherConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.locations().len(), 1);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.table_name(DataKind::Forecast), "later");
        assert_eq!(
            config.archive_credentials_file(),
            Some("cloud_storage_service_account.json")
        );
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("WEATHER_ETL_TEST_API_KEY", "from-env");

        let toml_content = BASIC_TOML.replace("test-key", "${WEATHER_ETL_TEST_API_KEY}");
        let config = WeatherConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.api_key(), "from-env");

        std::env::remove_var("WEATHER_ETL_TEST_API_KEY");
    }

    #[test]
    fn test_unresolved_api_key_fails_validation() {
        let toml_content = BASIC_TOML.replace("test-key", "${WEATHER_ETL_UNSET_VARIABLE}");
        let config = WeatherConfig::from_toml_str(&toml_content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_file_mode_requires_credential_files() {
        let mut config = WeatherConfig::from_toml_str(BASIC_TOML).unwrap();
        config.credentials.mode = CredentialMode::File;
        config.credentials.archive_credentials_file = Some("archive.json".to_string());

        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { ref field }) if field.contains("warehouse")
        ));
        // ambient 模式忽略憑證檔
        config.credentials.mode = CredentialMode::Ambient;
        assert_eq!(config.archive_credentials_file(), None);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut config = WeatherConfig::from_toml_str(BASIC_TOML).unwrap();
        config.locations[0].lat = 123.0;
        assert!(config.validate().is_err());

        let mut config = WeatherConfig::from_toml_str(BASIC_TOML).unwrap();
        config.api.units = "kelvin".to_string();
        assert!(config.validate().is_err());

        let mut config = WeatherConfig::from_toml_str(BASIC_TOML).unwrap();
        config.warehouse.current_table = "current-weather".to_string();
        assert!(config.validate().is_err());

        let mut config = WeatherConfig::from_toml_str(BASIC_TOML).unwrap();
        config.locations.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = WeatherConfig::from_toml_str("[api\napi_key = 1").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC_TOML.as_bytes()).unwrap();

        let config = WeatherConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.warehouse.dataset_id, "weather_api_data");
    }
}
