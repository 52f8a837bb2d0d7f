//! Market Data Service
//!
//! Tries providers in priority order until one returns a snapshot.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::model::Snapshot;
use crate::provider::{self, MarketProvider};

/// Ordered provider fallback
#[derive(Clone)]
pub struct MarketDataService {
    providers: Vec<Arc<dyn MarketProvider>>,
}

impl MarketDataService {
    /// An empty provider list is a configuration error
    pub fn new(providers: Vec<Arc<dyn MarketProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(MonitorError::Config("no market data providers configured".into()));
        }
        Ok(Self { providers })
    }

    /// Build the configured providers
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Self::new(provider::build_providers(config)?)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First successful snapshot; one combined error when every provider fails
    pub async fn get_market_data(&self) -> Result<Snapshot> {
        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.fetch_snapshot().await {
                Ok(snapshot) => {
                    if !failures.is_empty() {
                        tracing::info!("Market data served by fallback provider {}", provider.name());
                    }
                    return Ok(snapshot);
                }
                Err(e) => {
                    tracing::warn!("Market data provider {} failed: {}", provider.name(), e);
                    failures.push(format!("{}: {}", provider.name(), e.reason()));
                }
            }
        }

        let combined = failures.join("; ");
        tracing::error!("All market data providers failed: {}", combined);
        Err(MonitorError::AllProvidersFailed(combined))
    }

    /// Ping every provider
    pub async fn health(&self) -> Vec<(String, bool)> {
        let checks = self.providers.iter().map(|p| async move {
            (p.name().to_string(), p.health_check().await)
        });
        join_all(checks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockMarketProvider, sample_snapshot};
    use rust_decimal_macros::dec;

    fn service(providers: Vec<MockMarketProvider>) -> MarketDataService {
        MarketDataService::new(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn MarketProvider>)
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_aggregator_first() {
        let aggregator = sample_snapshot("CoinGecko", dec!(67000));
        let service = service(vec![
            MockMarketProvider::new("CoinGecko", aggregator.clone()),
            MockMarketProvider::new("Binance", sample_snapshot("Binance", dec!(66900))),
        ]);

        let snapshot = service.get_market_data().await.unwrap();
        assert_eq!(snapshot.source, "CoinGecko");
        assert_eq!(snapshot.as_of, aggregator.as_of);
        assert_eq!(snapshot.main_assets, aggregator.main_assets);
        assert_eq!(snapshot.dominance_pct, aggregator.dominance_pct);
    }

    #[tokio::test]
    async fn test_exchange_fallback() {
        let service = service(vec![
            MockMarketProvider::failing("CoinGecko", "HTTP 429"),
            MockMarketProvider::new("Binance", sample_snapshot("Binance", dec!(66900))),
        ]);

        let snapshot = service.get_market_data().await.unwrap();
        assert_eq!(snapshot.source, "Binance");
        assert_eq!(snapshot.bitcoin().unwrap().price, Some(dec!(66900)));
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let service = service(vec![
            MockMarketProvider::failing("CoinGecko", "timeout"),
            MockMarketProvider::failing("Binance", "HTTP 451"),
        ]);

        let err = service.get_market_data().await.unwrap_err();
        assert!(matches!(err, MonitorError::AllProvidersFailed(_)));

        let message = err.to_string();
        assert!(message.contains("CoinGecko: timeout; Binance"));
        assert!(message.ends_with("Binance: HTTP 451"));
    }

    #[tokio::test]
    async fn test_health() {
        let service = service(vec![
            MockMarketProvider::failing("CoinGecko", "down"),
            MockMarketProvider::new("Binance", sample_snapshot("Binance", dec!(1))),
        ]);

        let health = service.health().await;
        assert_eq!(
            health,
            vec![("CoinGecko".to_string(), false), ("Binance".to_string(), true)]
        );
    }

    #[test]
    fn test_empty_provider_list_rejected() {
        assert!(MarketDataService::new(Vec::new()).is_err());
    }
}
