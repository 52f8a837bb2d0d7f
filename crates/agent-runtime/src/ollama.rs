//! Ollama Provider
//!
//! Local inference. Availability means the daemon answers and the configured
//! model has been pulled.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, GenerationOptions, LlmProvider},
};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
};

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Base URL, e.g. `http://localhost`
    pub host: String,
    pub port: u16,
    pub model: String,
}

pub struct OllamaProvider {
    client: Ollama,
    model: String,
}

impl OllamaProvider {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host, config.port),
            model: config.model,
        }
    }

    /// `llama3.2` matches `llama3.2:latest`
    fn has_model(&self, installed: &[String]) -> bool {
        installed.iter().any(|name| name.starts_with(&self.model))
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let role = match message.role {
        Role::System => MessageRole::System,
        Role::User => MessageRole::User,
        Role::Assistant => MessageRole::Assistant,
    };
    ChatMessage::new(role, message.content.clone())
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        let models = match self.client.list_local_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!("Ollama unreachable: {}", e);
                return Ok(false);
            }
        };

        let installed: Vec<String> = models.into_iter().map(|m| m.name).collect();
        if !self.has_model(&installed) {
            tracing::warn!("Ollama model {} is not installed", self.model);
            return Ok(false);
        }
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let model = options.model_or(&self.model).to_string();
        let request =
            ChatMessageRequest::new(model.clone(), messages.iter().map(to_chat_message).collect());

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::Provider(format!("Ollama: {e}")))?;

        Ok(Completion {
            content: response.message.content,
            model,
            usage: None,
        })
    }
}
