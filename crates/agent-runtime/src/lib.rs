//! # agent-runtime
//!
//! Generative-text providers for crypto-pulse.
//!
//! ## Providers
//!
//! - **OpenAI**: chat completions (`gpt-3.5-turbo-0125` by default)
//! - **Gemini**: Google `generateContent` API (`gemini-1.5-flash`)
//! - **DeepSeek**: OpenAI-compatible chat completions (`deepseek-chat`)
//! - **Ollama** (feature `ollama`): local inference
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::RuntimeConfig;
//!
//! let chain = RuntimeConfig::from_env().provider_chain()?;
//! ```

pub mod config;
pub mod gemini;
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use config::RuntimeConfig;
pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatProvider;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, ProviderChain, Result, Role};

/// Build the shared HTTP client used by the hosted providers
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))
}

/// Map a transport error to the agent error space; the URL is dropped
pub(crate) fn http_error(provider: &str, err: reqwest::Error) -> AgentError {
    let err = err.without_url();
    if err.is_timeout() {
        AgentError::ProviderUnavailable(format!("{provider}: request timed out"))
    } else {
        AgentError::Http(format!("{provider}: {err}"))
    }
}
