//! crypto-pulse bot
//!
//! Polls market data on a schedule, pushes alerts and reports to Telegram,
//! and serves a health check plus the Telegram webhook over HTTP.

mod args;
mod commands;
mod server;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::RuntimeConfig;
use crypto_monitor::channel::notify;
use crypto_monitor::provider::http_client;
use crypto_monitor::{
    AdviceGenerator, ChatChannel, MarketDataService, MonitorConfig, ReportKind, Scheduler,
    TelegramChannel,
};

use crate::args::{Cli, Command};
use crate::state::AppState;

/// Variables reported by `status`
const ENV_KEYS: [&str; 6] = [
    "TG_BOT_TOKEN",
    "TG_CHAT_ID",
    "OPENAI_API_KEY",
    "GEMINI_API_KEY",
    "DEEPSEEK_API_KEY",
    "OLLAMA_HOST",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load environment
    if dotenvy::from_path(&cli.env_file).is_err() {
        tracing::debug!("No env file at {}", cli.env_file.display());
    }

    if cli.command() == Command::Status {
        log_environment();
    }

    let config = MonitorConfig::from_env().context("invalid configuration")?;
    let (scheduler, telegram) = build(config)?;

    match cli.command() {
        Command::Run => run(scheduler, telegram).await,
        Command::Report => report_once(&scheduler, &telegram).await,
        Command::Test => test_services(&scheduler).await,
        Command::Status => status(&scheduler, &telegram).await,
    }
}

fn build(config: MonitorConfig) -> anyhow::Result<(Arc<Scheduler>, Arc<TelegramChannel>)> {
    let runtime = RuntimeConfig::from_env();
    let chain = runtime.provider_chain().context("AI provider setup failed")?;

    let service = MarketDataService::from_config(&config)?;
    let client = http_client(config.http_timeout_secs)?;
    let telegram = Arc::new(TelegramChannel::new(client, &config.telegram));
    let advice = AdviceGenerator::new(chain, config.top_gainers_limit);

    tracing::info!("Market data providers: {}", service.provider_names().join(" → "));
    let ai = runtime.enabled_names();
    if ai.is_empty() {
        tracing::warn!("⚠ No AI providers configured - using rule-based summaries");
    } else {
        tracing::info!("AI providers: {}", ai.join(" → "));
    }

    let scheduler = Scheduler::new(
        config,
        service,
        advice,
        Arc::clone(&telegram) as Arc<dyn ChatChannel>,
    );
    Ok((Arc::new(scheduler), telegram))
}

// ============================================================================
// Modes
// ============================================================================

async fn run(scheduler: Arc<Scheduler>, telegram: Arc<TelegramChannel>) -> anyhow::Result<()> {
    let config = scheduler.config();

    let mut webhook_set = false;
    if let Some(url) = &config.telegram.webhook_url {
        match telegram.set_webhook(url).await {
            Ok(()) => webhook_set = true,
            Err(e) => tracing::warn!("⚠ Could not set Telegram webhook: {}", e),
        }
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto-pulse running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Checking every {} minutes", config.check_interval_min);
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  POST /webhook/telegram - Telegram updates");
    tracing::info!("");

    let app = server::router(AppState {
        scheduler: Arc::clone(&scheduler),
        telegram: Arc::clone(&telegram),
    });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, waiting for the scheduler");
    let _ = shutdown_tx.send(true);
    if let Err(e) = poller.await {
        tracing::error!("Scheduler task failed: {}", e);
    }
    if webhook_set {
        if let Err(e) = telegram.delete_webhook().await {
            tracing::warn!("Could not remove Telegram webhook: {}", e);
        }
    }
    Ok(())
}

async fn report_once(scheduler: &Scheduler, telegram: &TelegramChannel) -> anyhow::Result<()> {
    let text = scheduler.report_now(ReportKind::Full).await;
    if notify(telegram, &text).await {
        tracing::info!("✓ Report sent");
        Ok(())
    } else {
        anyhow::bail!("report could not be delivered")
    }
}

async fn test_services(scheduler: &Scheduler) -> anyhow::Result<()> {
    let chain = scheduler.advice().chain();
    if chain.is_empty() {
        tracing::warn!("⚠ No AI providers configured");
    }
    for (name, ok) in chain.availability().await {
        if ok {
            tracing::info!("✓ {} available", name);
        } else {
            tracing::warn!("✗ {} unavailable", name);
        }
    }

    let snapshot = scheduler.service().get_market_data().await?;
    let advice = scheduler.advice().advice(&snapshot).await;
    tracing::info!("Advice sample ({:?}):\n{}", advice.source, advice.text);
    Ok(())
}

async fn status(scheduler: &Scheduler, telegram: &TelegramChannel) -> anyhow::Result<()> {
    let (data, ai, channel) = tokio::join!(
        scheduler.service().health(),
        scheduler.advice().chain().availability(),
        telegram.health_check()
    );

    for (name, ok) in data.iter().chain(ai.iter()) {
        tracing::info!("{}: {}", name, if *ok { "✅ Available" } else { "❌ Unavailable" });
    }
    if ai.is_empty() {
        tracing::info!("AI: none configured (rule-based summary)");
    }
    tracing::info!(
        "Telegram: {}",
        if channel { "✅ Available" } else { "❌ Unavailable" }
    );
    Ok(())
}

fn log_environment() {
    for key in ENV_KEYS {
        let set = std::env::var(key).is_ok_and(|v| !v.trim().is_empty());
        tracing::info!("{}: {}", key, if set { "✅ Set" } else { "❌ Missing" });
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
