//! HTTP Handlers
//!
//! Health check for uptime monitors and the Telegram webhook.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::commands::{self, Update};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/webhook/telegram", post(telegram_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Crypto Bot is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Telegram webhook; acknowledges at once and works in the background
pub async fn telegram_webhook(
    State(state): State<AppState>,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(incoming) = commands::route(&update, state.telegram.chat_id()) {
        tokio::spawn(async move {
            commands::execute(&state, incoming).await;
        });
    }
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use crypto_monitor::config::TelegramConfig;
    use crypto_monitor::provider::{MarketProvider, MockMarketProvider, sample_snapshot};
    use crypto_monitor::{
        AdviceGenerator, ChatChannel, MarketDataService, MonitorConfig, Scheduler, TelegramChannel,
    };
    use tower::ServiceExt;

    fn state() -> AppState {
        let provider: Arc<dyn MarketProvider> = Arc::new(MockMarketProvider::new(
            "Mock",
            sample_snapshot("Mock", "67000".parse().unwrap()),
        ));
        let telegram = Arc::new(TelegramChannel::new(
            crypto_monitor::provider::http_client(1).unwrap(),
            &TelegramConfig {
                bot_token: "123:abc".into(),
                chat_id: "42".into(),
                api_url: "http://127.0.0.1:9".into(),
                webhook_url: None,
            },
        ));
        let scheduler = Scheduler::new(
            MonitorConfig::default(),
            MarketDataService::new(vec![provider]).unwrap(),
            AdviceGenerator::rule_based(5),
            Arc::clone(&telegram) as Arc<dyn ChatChannel>,
        );

        AppState {
            scheduler: Arc::new(scheduler),
            telegram,
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for path in ["/", "/health"] {
            let response = router(state())
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["status"], "ok");
            assert_eq!(json["message"], "Crypto Bot is running");
            assert!(json["timestamp"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn test_webhook_ignores_foreign_chat() {
        let request = Request::post("/webhook/telegram")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"update_id": 9, "message": {"chat": {"id": 7}, "text": "/report"}}"#,
            ))
            .unwrap();

        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_rejects_garbage() {
        let request = Request::post("/webhook/telegram")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let response = router(state()).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
