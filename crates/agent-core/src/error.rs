//! Error Types

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Provider answered with something unusable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable, overloaded or out of quota
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Response carried no generated text
    #[error("Empty completion from {0}")]
    EmptyCompletion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Key rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(String),
}

impl AgentError {
    /// Map an HTTP status returned by a provider API to an error
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => AgentError::Auth(format!("{provider}: HTTP {status}")),
            402 => AgentError::ProviderUnavailable(format!("{provider}: payment required")),
            429 => AgentError::RateLimited(format!("{provider}: quota exceeded")),
            500..=599 => AgentError::ProviderUnavailable(format!("{provider}: HTTP {status}")),
            _ => AgentError::Provider(format!("{provider}: HTTP {status}: {body}")),
        }
    }
}
