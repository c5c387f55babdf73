//! Interaction layer error types

use thiserror::Error;

/// Interaction layer errors
///
/// None of these are fatal to the page: callers log them and carry on.
#[derive(Error, Debug)]
pub enum InteractError {
    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`InteractConfig`](crate::InteractConfig)
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Request to the data endpoint failed
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Data endpoint answered with a non-success status
    #[error("Data endpoint returned status {0}")]
    Status(u16),

    /// Payload did not decode
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Form submission failed
    #[error("Form submission failed: {0}")]
    Submission(String),

    /// Host page error
    #[error(transparent)]
    Platform(#[from] square_platform::PlatformError),
}

/// Result type for interaction layer operations
pub type Result<T> = std::result::Result<T, InteractError>;
