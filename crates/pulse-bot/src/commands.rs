//! Telegram Command Surface
//!
//! Parses webhook updates into bot commands and executes them against the
//! scheduler. Updates from chats other than the configured one are dropped.

use serde::Deserialize;

use crypto_monitor::channel::{InlineButton, notify};
use crypto_monitor::report;
use crypto_monitor::{ReportKind, Scheduler};

use crate::state::AppState;

// ============================================================================
// Update Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,

    #[serde(default)]
    pub message: Option<IncomingMessage>,

    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,

    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,

    #[serde(default)]
    pub data: Option<String>,

    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Report,
    Prices,
    Status,
    Help,
    Unknown(String),
}

impl BotCommand {
    /// `/report`, `/report@my_bot` and `/Report extra` all parse; plain text does not
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_lowercase();

        Some(match name.as_str() {
            "start" => BotCommand::Start,
            "report" => BotCommand::Report,
            "prices" => BotCommand::Prices,
            "status" => BotCommand::Status,
            "help" => BotCommand::Help,
            _ => BotCommand::Unknown(token.to_string()),
        })
    }

    /// Inline keyboard callback data
    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            "report" => Some(BotCommand::Report),
            "prices" => Some(BotCommand::Prices),
            _ => None,
        }
    }
}

/// What a webhook update asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Command(BotCommand),
    Callback {
        id: String,
        command: Option<BotCommand>,
    },
}

/// Turn an update into work, or `None` if it is foreign or not a command
pub fn route(update: &Update, allowed_chat: &str) -> Option<Incoming> {
    let from_allowed = |message: &IncomingMessage| message.chat.id.to_string() == allowed_chat;

    if let Some(message) = &update.message {
        if !from_allowed(message) {
            tracing::warn!("Ignoring update {} from chat {}", update.update_id, message.chat.id);
            return None;
        }
        return message
            .text
            .as_deref()
            .and_then(BotCommand::parse)
            .map(Incoming::Command);
    }

    if let Some(query) = &update.callback_query {
        if !query.message.as_ref().is_some_and(from_allowed) {
            tracing::warn!("Ignoring callback {} from a foreign chat", query.id);
            return None;
        }
        return Some(Incoming::Callback {
            id: query.id.clone(),
            command: query.data.as_deref().and_then(BotCommand::from_callback),
        });
    }

    None
}

pub fn start_keyboard() -> Vec<Vec<InlineButton>> {
    vec![vec![
        InlineButton::new("📊 Full Report", "report"),
        InlineButton::new("📈 Prices Only", "prices"),
    ]]
}

/// `/status` text from live provider and channel checks
pub async fn service_status(scheduler: &Scheduler) -> String {
    let (data, ai) = tokio::join!(
        scheduler.service().health(),
        scheduler.advice().chain().availability()
    );
    report::status_message(scheduler.config(), scheduler.state(), &data, &ai)
}

// ============================================================================
// Execution
// ============================================================================

/// Run one routed update; every reply is best-effort
pub async fn execute(state: &AppState, incoming: Incoming) {
    match incoming {
        Incoming::Command(command) => run_command(state, command).await,
        Incoming::Callback { id, command } => {
            let ack = match command {
                Some(BotCommand::Report) => "📊 Generating full report...",
                Some(BotCommand::Prices) => "📈 Getting prices...",
                _ => "❌ Unknown command",
            };
            if let Err(e) = state.telegram.answer_callback_query(&id, ack).await {
                tracing::warn!("answerCallbackQuery failed: {}", e);
            }
            if let Some(command) = command {
                run_command(state, command).await;
            }
        }
    }
}

async fn run_command(state: &AppState, command: BotCommand) {
    tracing::info!("Handling command {:?}", command);
    let channel = state.telegram.as_ref();

    match command {
        BotCommand::Start => {
            if let Err(e) = state
                .telegram
                .send_keyboard(&report::welcome_message(), &start_keyboard())
                .await
            {
                tracing::error!("Welcome message failed: {}", e);
            }
        }
        BotCommand::Report => {
            notify(channel, "📊 *Generating report...*").await;
            let text = state.scheduler.report_now(ReportKind::Full).await;
            notify(channel, &text).await;
        }
        BotCommand::Prices => {
            let text = state.scheduler.report_now(ReportKind::Prices).await;
            notify(channel, &text).await;
        }
        BotCommand::Status => {
            let text = service_status(&state.scheduler).await;
            notify(channel, &text).await;
        }
        BotCommand::Help => {
            notify(channel, &report::help_message(state.scheduler.config())).await;
        }
        BotCommand::Unknown(_) => {
            notify(channel, &report::unknown_command_message()).await;
        }
    }
}
