//! Error Types for Crypto Monitor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// One market data provider failed; the next one may still succeed
    #[error("{provider}: {reason}")]
    Provider {
        provider: String,
        reason: String,
    },

    /// Every configured market data provider failed this cycle
    #[error("All market data providers failed: {0}")]
    AllProvidersFailed(String),

    #[error("Unexpected payload from {provider}: {reason}")]
    Malformed {
        provider: String,
        reason: String,
    },

    #[error("HTTP {status} from {endpoint}")]
    Status {
        endpoint: String,
        status: u16,
    },

    #[error("Chat channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn provider(provider: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        MonitorError::Provider {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(provider: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        MonitorError::Malformed {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Failure detail without the provider prefix
    pub fn reason(&self) -> String {
        match self {
            MonitorError::Provider { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Text safe to show in the chat
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::AllProvidersFailed(_) => {
                "Market data is unavailable from every provider right now.".into()
            }
            MonitorError::Provider { provider, .. } => format!("{provider} is unavailable right now."),
            MonitorError::Config(msg) => format!("Configuration problem: {msg}"),
            _ => "Unexpected error while collecting market data.".into(),
        }
    }
}
