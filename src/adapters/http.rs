use crate::core::{ConfigProvider, DataKind, Location, WeatherSource};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const API_KEY_PARAM: &str = "appid";

/// OpenWeather 的 `weather` / `forecast` 端點
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str, units: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            units: units.to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.api_endpoint(),
            config.api_key(),
            config.units(),
            config.request_timeout(),
        )
    }

    /// `<base>/weather?lat=&lon=&appid=&units=` 或 `<base>/forecast?...`
    pub fn endpoint_url(&self, location: &Location, kind: DataKind) -> Result<Url> {
        let endpoint = format!("{}/{}", self.base_url, kind.endpoint());
        Url::parse_with_params(
            &endpoint,
            &[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                (API_KEY_PARAM, self.api_key.clone()),
                ("units", self.units.clone()),
            ],
        )
        .map_err(|e| EtlError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: self.base_url.clone(),
            reason: format!("Invalid URL format: {}", e),
        })
    }

    /// GET 並解析 JSON；非 2xx、連線失敗或內容無法解析都視為 transport error
    pub async fn get_json(&self, url: Url) -> Result<Value> {
        let redacted = redact_url(&url);
        tracing::debug!("Making API request to: {}", redacted);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&redacted, e))?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::TransportError {
                url: redacted,
                message: format!("HTTP status {}", status),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| transport_error(&redacted, e))
    }
}

impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, location: &Location, kind: DataKind) -> Result<Value> {
        let url = self.endpoint_url(location, kind)?;
        self.get_json(url).await
    }
}

fn transport_error(redacted_url: &str, error: reqwest::Error) -> EtlError {
    EtlError::TransportError {
        url: redacted_url.to_string(),
        message: error.without_url().to_string(),
    }
}

/// 記錄 log 時隱藏 API key
pub fn redact_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == API_KEY_PARAM {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted.to_string()
}
