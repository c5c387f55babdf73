//! Platform error types

use thiserror::Error;

/// Host page errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// Selector could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Element handle does not refer to a live element
    #[error("Element not found: {0}")]
    ElementNotFound(u64),

    /// Host capability not available (intersection observer, media queries, ...)
    #[error("Capability not available: {0}")]
    Unavailable(String),

    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
