//! Application State

use std::sync::Arc;

use crypto_monitor::{Scheduler, TelegramChannel};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Poll cycle, market data and advice
    pub scheduler: Arc<Scheduler>,

    /// Bot API client bound to the configured chat
    pub telegram: Arc<TelegramChannel>,
}
