//! OpenAI-compatible Chat Provider
//!
//! Implementation of `LlmProvider` for any backend speaking the OpenAI
//! `/chat/completions` dialect. Used for OpenAI itself and for DeepSeek.

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{http_client, http_error};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// System prompt used for OpenAI market commentary
pub const TRADER_SYSTEM_PROMPT: &str = "You are an experienced cryptocurrency trader with 10+ years of trading experience. Provide short, concise, fact-based advice as a professional. Only facts, numbers, and specific actions. No fluff.";

/// Provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiCompatConfig {
    /// Display name ("OpenAI", "DeepSeek")
    pub name: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Model used when the caller does not override it
    pub default_model: String,

    /// Temperature used when the caller does not override it
    pub default_temperature: Option<f32>,

    /// System prompt prepended when the caller sends none
    pub system_prompt: Option<String>,

    /// Max tokens for the availability check
    pub check_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiCompatConfig {
    pub fn openai(api_key: impl Into<String>, check_tokens: u32) -> Self {
        Self {
            name: "OpenAI".into(),
            base_url: OPENAI_BASE_URL.into(),
            api_key: api_key.into(),
            default_model: "gpt-3.5-turbo-0125".into(),
            default_temperature: Some(0.3),
            system_prompt: Some(TRADER_SYSTEM_PROMPT.into()),
            check_tokens,
            timeout_secs: 60,
        }
    }

    pub fn deepseek(api_key: impl Into<String>, check_tokens: u32) -> Self {
        Self {
            name: "DeepSeek".into(),
            base_url: DEEPSEEK_BASE_URL.into(),
            api_key: api_key.into(),
            default_model: "deepseek-chat".into(),
            default_temperature: None,
            system_prompt: None,
            check_tokens,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// OpenAI-compatible provider
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    config: OpenAiCompatConfig,
}

impl OpenAiCompatProvider {
    pub fn from_config(config: OpenAiCompatConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            config,
        })
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a GenerationOptions,
    ) -> ChatRequest<'a> {
        let mut wire = Vec::with_capacity(messages.len() + 1);

        let has_system = messages.iter().any(|m| m.role == agent_core::Role::System);
        if let (false, Some(prompt)) = (has_system, self.config.system_prompt.as_deref()) {
            wire.push(ChatMessage { role: "system", content: prompt });
        }

        wire.extend(messages.iter().map(|m| ChatMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        ChatRequest {
            model: options.model_or(&self.config.default_model),
            messages: wire,
            temperature: options.temperature.or(self.config.default_temperature),
            max_tokens: options.max_tokens,
        }
    }

    fn convert_response(&self, response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AgentError::EmptyCompletion(self.config.name.clone()))?;

        Ok(Completion {
            content,
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn health_check(&self) -> Result<bool> {
        let check = GenerationOptions::availability_check(self.config.check_tokens);
        match self.complete(&[Message::user("Test")], &check).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("{} health check failed: {}", self.config.name, e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = self.build_request(messages, options);
        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http_error(&self.config.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::from_status(&self.config.name, status.as_u16(), &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("{}: malformed response: {e}", self.config.name)))?;

        self.convert_response(parsed, request.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(config: OpenAiCompatConfig) -> OpenAiCompatProvider {
        OpenAiCompatProvider::from_config(config).unwrap()
    }

    #[test]
    fn test_openai_defaults() {
        let config = OpenAiCompatConfig::openai("sk-test", 50);
        assert_eq!(config.default_model, "gpt-3.5-turbo-0125");
        assert_eq!(config.default_temperature, Some(0.3));
        assert!(config.system_prompt.is_some());

        let deepseek = OpenAiCompatConfig::deepseek("ds-test", 50);
        assert_eq!(deepseek.name, "DeepSeek");
        assert!(deepseek.base_url.contains("deepseek"));
    }

    #[test]
    fn test_request_injects_system_prompt() {
        let p = provider(OpenAiCompatConfig::openai("sk-test", 50));
        let messages = vec![Message::user("Analyze BTC")];
        let options = GenerationOptions::default();
        let request = p.build_request(&messages, &options);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo-0125");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Analyze BTC");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_availability_request_is_capped() {
        let p = provider(OpenAiCompatConfig::deepseek("ds-test", 50));
        let messages = vec![Message::user("Test")];
        let options = GenerationOptions::availability_check(50);
        let json = serde_json::to_value(p.build_request(&messages, &options)).unwrap();

        assert_eq!(json["max_tokens"], 50);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_conversion() {
        let p = provider(OpenAiCompatConfig::openai("sk-test", 50));
        let body = r#"{
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"message": {"role": "assistant", "content": "Market: BTC up."}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let completion = p.convert_response(parsed, "x").unwrap();

        assert_eq!(completion.content, "Market: BTC up.");
        assert_eq!(completion.usage.unwrap().total_tokens, 150);
    }

    #[test]
    fn test_empty_choices_is_error() {
        let p = provider(OpenAiCompatConfig::openai("sk-test", 50));
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(p.convert_response(parsed, "x"), Err(AgentError::EmptyCompletion(_))));
    }
}
