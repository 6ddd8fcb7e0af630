use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("API error: {0}")]
    ApiError(#[from] viera_api::ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),
}

impl SdkError {
    /// The underlying API error, if this is one
    pub fn api_error(&self) -> Option<&viera_api::ApiError> {
        match self {
            SdkError::ApiError(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
