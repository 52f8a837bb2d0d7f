//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all generative-text providers (OpenAI,
//! Gemini, DeepSeek, Ollama, etc.) and a failover chain over them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, ProviderChain};
//!
//! let chain = ProviderChain::new(vec![openai, gemini]);
//! let answer = chain.complete(&messages, &GenerationOptions::default()).await?;
//! println!("{} said: {}", answer.provider, answer.completion.content);
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Configuration for LLM generation
#[derive(Clone, Debug, Default)]
pub struct GenerationOptions {
    /// Model override; each provider falls back to its own default model
    pub model: Option<String>,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,

    /// Maximum tokens to generate (`None` = provider limit)
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Options for a cheap availability check
    pub fn availability_check(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }

    /// Resolve the model name against a provider default
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,
}

/// Token usage statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider display name (e.g. "OpenAI")
    fn name(&self) -> &str;

    /// Check if the provider is available and configured correctly.
    ///
    /// Expected to be cheap: a tiny completion or a model listing.
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

/// Completion together with the provider that produced it
#[derive(Clone, Debug)]
pub struct ChainCompletion {
    pub provider: String,
    pub completion: Completion,
}

/// Priority-ordered failover over several providers.
///
/// Every provider is health-checked before it is asked for real; a failed
/// check or a failed completion moves on to the next one.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Health-check every provider, in order
    pub async fn availability(&self) -> Vec<(String, bool)> {
        let mut out = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let ok = provider.health_check().await.unwrap_or(false);
            out.push((provider.name().to_string(), ok));
        }
        out
    }

    /// Ask providers in priority order until one produces text
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<ChainCompletion> {
        if self.providers.is_empty() {
            return Err(AgentError::ProviderUnavailable("no providers configured".into()));
        }

        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name().to_string();

            match provider.health_check().await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(provider = %name, "provider unavailable, trying next");
                    failures.push(format!("{name}: unavailable"));
                    continue;
                }
                Err(e) => {
                    tracing::info!(provider = %name, error = %e, "provider health check failed");
                    failures.push(format!("{name}: {e}"));
                    continue;
                }
            }

            match provider.complete(messages, options).await {
                Ok(completion) if !completion.content.trim().is_empty() => {
                    if let Some(usage) = &completion.usage {
                        tracing::info!(
                            provider = %name,
                            prompt = usage.prompt_tokens,
                            completion = usage.completion_tokens,
                            total = usage.total_tokens,
                            "tokens used"
                        );
                    }
                    return Ok(ChainCompletion { provider: name, completion });
                }
                Ok(_) => {
                    tracing::warn!(provider = %name, "provider returned empty text");
                    failures.push(format!("{name}: empty completion"));
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "completion failed");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        Err(AgentError::ProviderUnavailable(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        name: &'static str,
        healthy: bool,
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(name: &'static str, healthy: bool, reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self { name, healthy, reply, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.healthy)
        }

        async fn complete(&self, _: &[Message], _: &GenerationOptions) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(Completion { content: text.into(), model: "fake".into(), usage: None }),
                None => Err(AgentError::Provider("boom".into())),
            }
        }
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!(opts.max_tokens.is_none());
        assert_eq!(opts.model_or("gpt"), "gpt");
        assert_eq!(GenerationOptions::availability_check(50).max_tokens, Some(50));
    }

    #[tokio::test]
    async fn test_empty_chain_is_unavailable() {
        let chain = ProviderChain::default();
        let err = chain.complete(&[Message::user("hi")], &GenerationOptions::default()).await;
        assert!(matches!(err, Err(AgentError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unhealthy_provider_is_never_called() {
        let down = FakeProvider::new("down", false, Some("never"));
        let up = FakeProvider::new("up", true, Some("hello"));
        let chain = ProviderChain::new(vec![down.clone(), up.clone()]);

        let answer = chain.complete(&[Message::user("hi")], &GenerationOptions::default()).await.unwrap();
        assert_eq!(answer.provider, "up");
        assert_eq!(answer.completion.content, "hello");
        assert_eq!(down.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_completion_moves_on() {
        let broken = FakeProvider::new("broken", true, None);
        let blank = FakeProvider::new("blank", true, Some("   "));
        let good = FakeProvider::new("good", true, Some("ok"));
        let chain = ProviderChain::new(vec![broken, blank, good]);

        let answer = chain.complete(&[Message::user("hi")], &GenerationOptions::default()).await.unwrap();
        assert_eq!(answer.provider, "good");
    }

    #[tokio::test]
    async fn test_all_failed_collects_reasons() {
        let chain = ProviderChain::new(vec![
            FakeProvider::new("a", false, None),
            FakeProvider::new("b", true, None),
        ]);
        let err = chain.complete(&[Message::user("hi")], &GenerationOptions::default()).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("a: unavailable"));
        assert!(text.contains("b: Provider error: boom"));
    }
}
