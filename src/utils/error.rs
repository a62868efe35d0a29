use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("Backend error{}: {message}", code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default())]
    BackendError {
        code: Option<String>,
        message: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 錯誤分類，供上層決定如何呈現
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Backend,
    Configuration,
    Internal,
}

impl DataError {
    pub fn validation(message: impl Into<String>) -> Self {
        DataError::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(table: &'static str, id: impl Into<String>) -> Self {
        DataError::NotFound {
            table,
            id: id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DataError::NotFound { .. } => ErrorCategory::NotFound,
            DataError::ValidationError { .. } => ErrorCategory::Validation,
            DataError::BackendUnavailable { .. } | DataError::BackendError { .. } => {
                ErrorCategory::Backend
            }
            DataError::ConfigError { .. } => ErrorCategory::Configuration,
            DataError::SerializationError(_) | DataError::IoError(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound { .. })
    }

    /// 網路層錯誤可重試，其餘不建議
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::BackendUnavailable { .. })
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            DataError::BackendUnavailable {
                message: err.to_string(),
            }
        } else {
            DataError::BackendError {
                code: err.status().map(|s| s.as_u16().to_string()),
                message: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
