//! Telegram Bot API Channel

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::ChatChannel;
use crate::config::TelegramConfig;
use crate::error::{MonitorError, Result};

/// One inline keyboard button
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Bot API envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    result: Option<Value>,
}

/// Telegram channel bound to one chat
pub struct TelegramChannel {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// The only chat this bot talks to
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// POST a Bot API method and unwrap its envelope
    async fn call(&self, method: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| MonitorError::Channel(format!("{method}: {}", e.without_url())))?;

        let text = response
            .text()
            .await
            .map_err(|e| MonitorError::Channel(format!("{method}: {}", e.without_url())))?;

        parse_response(method, &text)
    }

    /// Message with an inline keyboard
    pub async fn send_keyboard(&self, text: &str, keyboard: &[Vec<InlineButton>]) -> Result<()> {
        self.call("sendMessage", &message_body(&self.chat_id, text, Some(keyboard)))
            .await
            .map(|_| ())
    }

    /// Acknowledge a button press
    pub async fn answer_callback_query(&self, callback_id: &str, text: &str) -> Result<()> {
        let body = json!({ "callback_query_id": callback_id, "text": text });
        self.call("answerCallbackQuery", &body).await.map(|_| ())
    }

    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        self.call("setWebhook", &json!({ "url": url })).await?;
        tracing::info!("Telegram webhook set to {}", url);
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        self.call("deleteWebhook", &json!({})).await?;
        tracing::info!("Telegram webhook removed");
        Ok(())
    }
}

/// `sendMessage` payload; bold via `*` in Markdown mode
pub fn message_body(chat_id: &str, text: &str, keyboard: Option<&[Vec<InlineButton>]>) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "Markdown",
    });
    if let Some(rows) = keyboard {
        body["reply_markup"] = json!({ "inline_keyboard": rows });
    }
    body
}

fn parse_response(method: &str, text: &str) -> Result<Value> {
    let envelope: ApiResponse = serde_json::from_str(text)?;
    if envelope.ok {
        Ok(envelope.result.unwrap_or(Value::Null))
    } else {
        Err(MonitorError::Channel(format!(
            "{method}: {}",
            envelope.description.unwrap_or_else(|| "request rejected".into())
        )))
    }
}

#[async_trait]
impl ChatChannel for TelegramChannel {
    async fn send_message(&self, text: &str) -> Result<()> {
        self.call("sendMessage", &message_body(&self.chat_id, text, None))
            .await
            .map(|_| ())
    }

    async fn health_check(&self) -> bool {
        match self.call("getMe", &json!({})).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Telegram getMe failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "Telegram"
    }
}
