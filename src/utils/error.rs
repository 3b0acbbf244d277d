use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Transport error for {url}: {message}")]
    TransportError { url: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed {context} payload: {message}")]
    MalformedPayload { context: String, message: String },

    #[error("Missing field '{field}' in {context} payload")]
    MissingField { field: String, context: String },

    #[error("Field '{field}' in {context} payload must be {expected}")]
    UnexpectedFieldType {
        field: String,
        context: String,
        expected: String,
    },

    #[error("Empty 'weather' condition list in {context} payload")]
    EmptyWeatherConditions { context: String },

    #[error("Column '{column}' already exists and would be overwritten during normalization")]
    ColumnCollision { column: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Failed to load table '{table}': {message}")]
    LoadError { table: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::HttpError(_) | EtlError::TransportError { .. } => ErrorCategory::Network,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::MalformedPayload { .. }
            | EtlError::MissingField { .. }
            | EtlError::UnexpectedFieldType { .. }
            | EtlError::EmptyWeatherConditions { .. }
            | EtlError::ColumnCollision { .. } => ErrorCategory::Data,
            EtlError::StorageError { .. } | EtlError::LoadError { .. } => ErrorCategory::Storage,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 單一地點抓取失敗屬於此類，由 orchestrator 記錄後略過
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EtlError::TransportError { .. } | EtlError::HttpError(_)
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::HttpError(_) | EtlError::TransportError { .. } => {
                "Check network connectivity and that the API key is valid, then trigger the job again"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment variables"
            }
            EtlError::MissingConfigError { .. } => {
                "Set the missing value in the configuration file or the environment"
            }
            EtlError::MalformedPayload { .. }
            | EtlError::MissingField { .. }
            | EtlError::UnexpectedFieldType { .. }
            | EtlError::EmptyWeatherConditions { .. } => {
                "Inspect the archived raw payload; the upstream API may have changed its response shape"
            }
            EtlError::ColumnCollision { .. } => {
                "A nested field expands onto an existing column; inspect the archived payload"
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Inspect the offending rows for values that cannot be encoded"
            }
            EtlError::StorageError { .. } | EtlError::LoadError { .. } => {
                "Verify bucket/dataset permissions and credentials; already loaded tables are not rolled back"
            }
            EtlError::IoError(_) => "Check disk space and file permissions of the output path",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the weather API: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Unexpected weather data: {}", self),
            ErrorCategory::Storage => format!("Could not store results: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_medium_severity() {
        let err = EtlError::TransportError {
            url: "https://api.example.com/weather".to_string(),
            message: "HTTP status 500".to_string(),
        };

        assert!(err.is_transport());
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_payload_errors_are_not_transport() {
        let err = EtlError::EmptyWeatherConditions {
            context: "current".to_string(),
        };

        assert!(!err.is_transport());
        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(err.user_friendly_message().contains("current"));
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = EtlError::LoadError {
            table: "current_weather".to_string(),
            message: "denied".to_string(),
        };

        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_every_failure_maps_to_non_zero_exit_code() {
        let transport = EtlError::TransportError {
            url: "u".to_string(),
            message: "m".to_string(),
        };
        let data = EtlError::ColumnCollision {
            column: "main_temp".to_string(),
        };
        let storage = EtlError::StorageError {
            message: "denied".to_string(),
        };

        assert_eq!(transport.severity().exit_code(), 2);
        assert_eq!(data.severity().exit_code(), 1);
        assert_eq!(storage.severity().exit_code(), 3);
    }
}
