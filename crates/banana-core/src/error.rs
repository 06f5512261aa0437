//! Error types for Banana Vision.
//!
//! Errors are split by concern: configuration, the remote generation call,
//! and caller-side session validation. `GenerationError` carries enough
//! information (status code, response body) for front ends to pick a
//! user-facing message.

use thiserror::Error;

/// Top-level error type for Banana Vision operations.
#[derive(Error, Debug)]
pub enum BananaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image generation errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from building, sending, or interpreting an image generation call.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The remote service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The call succeeded but no part of the reply carried inline image data.
    #[error("No image data found in the response")]
    NoArtifact,

    /// Base64 or response body decoding failed.
    #[error("Failed to decode: {0}")]
    Decode(String),

    /// The source image type is not one the model accepts.
    #[error("Unsupported image type: {0}")]
    UnsupportedMediaType(String),

    /// The request could not be assembled.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification of a `GenerationError`, used for retry decisions
/// and for choosing the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 429 or a quota-exhaustion signal. Retried.
    RateLimited,
    /// HTTP 503. Retried.
    ServiceUnavailable,
    /// HTTP 400, e.g. unsupported content. Not retried.
    RejectedRequest,
    /// Successful reply without an image. Not retried.
    NoArtifact,
    /// Everything else. Not retried.
    Unknown,
}

impl GenerationError {
    /// Classify this error.
    ///
    /// Status codes win when present; otherwise the message is searched for
    /// the quota markers Google uses (`RESOURCE_EXHAUSTED`, "quota").
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::NoArtifact => ErrorKind::NoArtifact,
            GenerationError::Api { status: 429, .. } => ErrorKind::RateLimited,
            GenerationError::Api { status: 503, .. } => ErrorKind::ServiceUnavailable,
            GenerationError::Api { message, .. } if mentions_quota(message) => {
                ErrorKind::RateLimited
            }
            GenerationError::Api { status: 400, .. } => ErrorKind::RejectedRequest,
            GenerationError::Transport(message) if mentions_quota(message) => {
                ErrorKind::RateLimited
            }
            _ => ErrorKind::Unknown,
        }
    }
}

fn mentions_quota(message: &str) -> bool {
    message.contains("RESOURCE_EXHAUSTED") || message.to_lowercase().contains("quota")
}

/// Caller-side validation failures raised before any request is sent.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The prompt is empty or whitespace only
    #[error("Please enter a prompt")]
    EmptyPrompt,

    /// Edit mode was submitted without an image to edit
    #[error("Please upload an image to edit")]
    MissingSourceImage,

    /// A request is already in flight
    #[error("A request is already in progress")]
    Busy,
}

/// Convenience type alias for Banana Vision results.
pub type Result<T> = std::result::Result<T, BananaError>;

/// Convenience type alias for generation-specific results.
pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
