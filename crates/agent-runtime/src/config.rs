//! Runtime Configuration
//!
//! Decides which generative-text providers are enabled, in priority order:
//! OpenAI, Gemini, DeepSeek, then Ollama. A provider is enabled iff its key
//! (or host, for Ollama) is present. Zero providers is a valid setup.

use std::sync::Arc;

use agent_core::{LlmProvider, ProviderChain, Result};

use crate::gemini::{GeminiConfig, GeminiProvider};
use crate::openai::{OpenAiCompatConfig, OpenAiCompatProvider};

/// Provider credentials and health-check settings
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,

    /// Max tokens spent on each availability check
    pub test_tokens: u32,

    pub ollama_host: Option<String>,
    pub ollama_port: u16,
    pub ollama_model: String,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            deepseek_api_key: non_empty("DEEPSEEK_API_KEY"),
            test_tokens: non_empty("AI_TEST_TOKENS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(50),
            ollama_host: non_empty("OLLAMA_HOST"),
            ollama_port: non_empty("OLLAMA_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            ollama_model: non_empty("OLLAMA_MODEL").unwrap_or_else(|| "llama3.2".into()),
        }
    }

    /// Names of the providers this configuration enables, in priority order
    pub fn enabled_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.openai_api_key.is_some() {
            names.push("OpenAI");
        }
        if self.gemini_api_key.is_some() {
            names.push("Gemini");
        }
        if self.deepseek_api_key.is_some() {
            names.push("DeepSeek");
        }
        if cfg!(feature = "ollama") && self.ollama_host.is_some() {
            names.push("Ollama");
        }
        names
    }

    /// Instantiate the enabled providers
    pub fn build_providers(&self) -> Result<Vec<Arc<dyn LlmProvider>>> {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

        if let Some(key) = &self.openai_api_key {
            let config = OpenAiCompatConfig::openai(key.clone(), self.test_tokens);
            providers.push(Arc::new(OpenAiCompatProvider::from_config(config)?));
        }

        if let Some(key) = &self.gemini_api_key {
            providers.push(Arc::new(GeminiProvider::from_config(GeminiConfig::new(key.clone()))?));
        }

        if let Some(key) = &self.deepseek_api_key {
            let config = OpenAiCompatConfig::deepseek(key.clone(), self.test_tokens);
            providers.push(Arc::new(OpenAiCompatProvider::from_config(config)?));
        }

        #[cfg(feature = "ollama")]
        {
            if let Some(host) = &self.ollama_host {
                let config = crate::ollama::OllamaConfig {
                    host: host.clone(),
                    port: self.ollama_port,
                    model: self.ollama_model.clone(),
                };
                providers.push(Arc::new(crate::ollama::OllamaProvider::from_config(config)));
            }
        }

        Ok(providers)
    }

    /// Failover chain over the enabled providers
    pub fn provider_chain(&self) -> Result<ProviderChain> {
        Ok(ProviderChain::new(self.build_providers()?))
    }
}
