//! Error types for request signing

/// Errors that can occur while building signed requests
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Request body could not be serialized to canonical JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Query parameters could not be form-encoded
    #[error("Query encoding error: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),

    /// The wall clock could not be read
    #[error("Clock unavailable: {0}")]
    ClockUnavailable(String),

    /// Invalid API credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

/// Result type for signing operations
pub type AuthResult<T> = Result<T, AuthError>;
