use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// `${VAR}` 未被環境變數取代時，視為缺少設定
pub fn validate_resolved(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(EtlError::MissingConfigError {
            field: format!("{} (unresolved placeholder {})", field_name, value),
        });
    }
    validate_non_empty_string(field_name, value)
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("Bucket name must be between 3 and 63 characters"));
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.' || c == '_')
    {
        return Err(invalid(
            "Bucket name can only contain lowercase letters, numbers, hyphens, underscores and dots",
        ));
    }

    let first_last = [bucket_name.chars().next(), bucket_name.chars().last()];
    if first_last
        .iter()
        .flatten()
        .any(|c| !c.is_ascii_alphanumeric())
    {
        return Err(invalid("Bucket name must start and end with a letter or number"));
    }

    Ok(())
}

/// Dataset / table 名稱: 英數字與底線，不得以數字開頭
pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let starts_with_digit = value.chars().next().is_some_and(|c| c.is_ascii_digit());
    if starts_with_digit || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Identifier may only contain letters, digits and underscores and must not start with a digit"
                .to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api.base_url", "https://api.openweathermap.org/data/2.5").is_ok());
        assert!(validate_url("api.base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("api.base_url", "").is_err());
        assert!(validate_url("api.base_url", "invalid-url").is_err());
        assert!(validate_url("api.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_resolved() {
        assert!(validate_resolved("api.api_key", "abc123").is_ok());
        assert!(matches!(
            validate_resolved("api.api_key", "${OPENWEATHER_API_KEY}"),
            Err(EtlError::MissingConfigError { .. })
        ));
        assert!(validate_resolved("api.api_key", "  ").is_err());
    }

    #[test]
    fn test_validate_coordinates_range() {
        assert!(validate_range("lat", 51.50853, -90.0, 90.0).is_ok());
        assert!(validate_range("lat", 91.0, -90.0, 90.0).is_err());
        assert!(validate_range("lon", -180.5, -180.0, 180.0).is_err());
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(validate_bucket_name("archive.bucket", "weather-data-api-openweather").is_ok());
        assert!(validate_bucket_name("archive.bucket", "ab").is_err());
        assert!(validate_bucket_name("archive.bucket", "Weather").is_err());
        assert!(validate_bucket_name("archive.bucket", "-weather").is_err());
        assert!(validate_bucket_name("archive.bucket", "weather.").is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("warehouse.dataset_id", "weather_api_data").is_ok());
        assert!(validate_identifier("warehouse.dataset_id", "1dataset").is_err());
        assert!(validate_identifier("warehouse.dataset_id", "weather-data").is_err());
        assert!(validate_identifier("warehouse.dataset_id", "").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("creds.json".to_string());
        let missing: Option<String> = None;
        assert_eq!(
            validate_required_field("credentials.archive_credentials_file", &present).unwrap(),
            "creds.json"
        );
        assert!(validate_required_field("credentials.archive_credentials_file", &missing).is_err());
    }
}
