//! Market Data Providers
//!
//! Abstractions and implementations for market data sources. Each provider
//! fetches its native payloads and hands them to [`crate::normalize`].

mod binance;
mod coingecko;
mod mock;

pub use binance::BinanceProvider;
pub use coingecko::{CoinGeckoProvider, GlobalStatsClient};
pub use mock::{MockMarketProvider, sample_snapshot};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::config::{MonitorConfig, ProviderKind};
use crate::error::{MonitorError, Result};
use crate::model::{MainCoin, Snapshot};
use crate::normalize::UniverseFilter;

/// Market data provider trait (Strategy pattern)
///
/// Implement this for each data source: aggregators, exchanges, etc.
#[async_trait]
pub trait MarketProvider: Send + Sync {
    /// Fetch and normalize one snapshot
    async fn fetch_snapshot(&self) -> Result<Snapshot>;

    /// Cheap ping
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}

/// Settings every provider shares
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub main_coins: Vec<MainCoin>,

    /// Stable quote currency for exchange pairs
    pub quote_currency: String,

    pub filter: UniverseFilter,

    pub dominance_fallback: Decimal,
}

impl From<&MonitorConfig> for ProviderSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            main_coins: config.main_coins.clone(),
            quote_currency: config.quote_currency.clone(),
            filter: UniverseFilter {
                min_volume: config.min_volume_usd,
                top_coins_limit: config.top_coins_limit,
                top_gainers_limit: config.top_gainers_limit,
            },
            dominance_fallback: config.dominance_fallback,
        }
    }
}

/// Shared HTTP client with a per-request timeout
pub fn http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("crypto-pulse/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// GET a JSON document, mapping non-2xx statuses and undecodable bodies to errors
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: &str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    tracing::debug!("{} GET {}", provider, url);

    let response = client
        .get(url)
        .header("accept", "application/json")
        .query(query)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(MonitorError::Status {
            endpoint: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| MonitorError::malformed(provider, format!("{url}: {e}")))
}

/// Build the configured providers in priority order
pub fn build_providers(config: &MonitorConfig) -> Result<Vec<Arc<dyn MarketProvider>>> {
    let client = http_client(config.http_timeout_secs)?;
    let settings = ProviderSettings::from(config);
    let global = GlobalStatsClient::new(client.clone(), config.coingecko_url.clone());

    Ok(config
        .providers
        .iter()
        .map(|kind| -> Arc<dyn MarketProvider> {
            match kind {
                ProviderKind::CoinGecko => Arc::new(CoinGeckoProvider::new(
                    client.clone(),
                    config.coingecko_url.clone(),
                    settings.clone(),
                )),
                ProviderKind::Binance => Arc::new(BinanceProvider::new(
                    client.clone(),
                    config.binance_url.clone(),
                    global.clone(),
                    settings.clone(),
                )),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers_follow_configured_order() {
        let config = MonitorConfig {
            providers: vec![ProviderKind::Binance, ProviderKind::CoinGecko],
            ..Default::default()
        };

        let providers = build_providers(&config).unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Binance", "CoinGecko"]);
    }

    #[test]
    fn test_settings_from_config() {
        let config = MonitorConfig::default();
        let settings = ProviderSettings::from(&config);
        assert_eq!(settings.quote_currency, "USDT");
        assert_eq!(settings.filter.top_gainers_limit, 5);
        assert_eq!(settings.main_coins.len(), 2);
    }
}
