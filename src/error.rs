//! Error types for trades-intake.

/// Top-level error type for the intake service.
///
/// Every failure a request can end in is one of these kinds; the HTTP layer
/// maps each kind to a status code (see `server`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Rejections of malformed or empty input, raised before any component runs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No prompt or messages")]
    MissingInput,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// Completion service errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The service answered with a non-success status.
    #[error("Provider {provider} returned status {status}: {detail}")]
    Upstream {
        provider: String,
        status: u16,
        detail: String,
    },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl LlmError {
    /// Raw detail suitable for returning to the caller for diagnosis.
    pub fn detail(&self) -> String {
        match self {
            LlmError::Upstream { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// File storage and record store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Authentication with {service} failed: {reason}")]
    AuthFailed { service: String, reason: String },

    #[error("{operation} request failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("{operation} rejected with status {status}: {detail}")]
    Rejected {
        operation: String,
        status: u16,
        detail: String,
    },

    #[error("Invalid response from {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },

    #[error("Attachment payload could not be decoded: {0}")]
    Decode(String),
}

/// Result type alias for the intake service.
pub type Result<T> = std::result::Result<T, Error>;
