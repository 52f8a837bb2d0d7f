//! CoinGecko Aggregator Provider
//!
//! Prices and 24h change from `/simple/price` (required), low/high and 7-day
//! change from `/coins/markets` (optional), the altcoin universe from the
//! volume-ordered markets listing (optional), dominance from `/global`.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;

use super::{MarketProvider, ProviderSettings, get_json};
use crate::error::{MonitorError, Result};
use crate::model::Snapshot;
use crate::normalize::{self, CoinMarket, GlobalData, GlobalResponse, SimplePrice};

const NAME: &str = "CoinGecko";

/// Client for the aggregator's `/global` statistics
///
/// Shared with the exchange provider, which has no dominance figure of its own.
#[derive(Clone)]
pub struct GlobalStatsClient {
    client: Client,
    base_url: String,
}

impl GlobalStatsClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch `/global`; failures are logged and reported as `None`
    pub async fn fetch(&self) -> Option<GlobalData> {
        let url = format!("{}/global", self.base_url);
        match get_json::<GlobalResponse>(&self.client, NAME, &url, &[]).await {
            Ok(global) => Some(global.data),
            Err(e) => {
                tracing::warn!("Global market stats unavailable: {}", e);
                None
            }
        }
    }
}

/// CoinGecko-backed market provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    global: GlobalStatsClient,
    settings: ProviderSettings,
}

impl CoinGeckoProvider {
    pub fn new(client: Client, base_url: impl Into<String>, settings: ProviderSettings) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            global: GlobalStatsClient::new(client.clone(), base_url.clone()),
            client,
            base_url,
            settings,
        }
    }

    fn ids(&self) -> String {
        self.settings
            .main_coins
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    async fn simple_prices(&self) -> Result<HashMap<String, SimplePrice>> {
        let url = format!("{}/simple/price", self.base_url);
        let query = [
            ("ids", self.ids()),
            ("vs_currencies", "usd".to_string()),
            ("include_24hr_change", "true".to_string()),
        ];
        get_json(&self.client, NAME, &url, &query).await
    }

    async fn main_markets(&self) -> Result<Vec<CoinMarket>> {
        let url = format!("{}/coins/markets", self.base_url);
        let query = [
            ("vs_currency", "usd".to_string()),
            ("ids", self.ids()),
            ("price_change_percentage", "7d".to_string()),
        ];
        get_json(&self.client, NAME, &url, &query).await
    }

    async fn universe(&self) -> Result<Vec<CoinMarket>> {
        let url = format!("{}/coins/markets", self.base_url);
        let query = [
            ("vs_currency", "usd".to_string()),
            ("order", "volume_desc".to_string()),
            ("per_page", self.settings.filter.top_coins_limit.to_string()),
            ("page", "1".to_string()),
        ];
        get_json(&self.client, NAME, &url, &query).await
    }
}

#[async_trait]
impl MarketProvider for CoinGeckoProvider {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let (prices, markets, universe, global) = tokio::join!(
            self.simple_prices(),
            self.main_markets(),
            self.universe(),
            self.global.fetch(),
        );

        let prices = prices?;
        if !self
            .settings
            .main_coins
            .iter()
            .any(|c| prices.get(&c.id).and_then(|p| p.usd).is_some())
        {
            return Err(MonitorError::malformed(NAME, "no price for any main coin"));
        }

        let markets = markets.unwrap_or_else(|e| {
            tracing::warn!("{} markets unavailable, low/high and 7d unknown: {}", NAME, e);
            Vec::new()
        });
        let universe = universe.unwrap_or_else(|e| {
            tracing::warn!("{} universe unavailable, no top gainers: {}", NAME, e);
            Vec::new()
        });

        let main_assets = normalize::coingecko_main_assets(&self.settings.main_coins, &prices, &markets);
        let dominance = normalize::resolve_dominance(global.as_ref(), self.settings.dominance_fallback);
        let btc_change = main_assets
            .values()
            .find(|a| a.ticker == "BTC")
            .and_then(|a| a.change_24h_pct);

        let mut snapshot = Snapshot::new(NAME, dominance.pct);
        snapshot.dominance_change_pct = normalize::dominance_change(&dominance, btc_change);
        snapshot.alt_assets = normalize::coingecko_alt_assets(&universe, &self.settings.filter);
        snapshot.main_assets = main_assets;

        tracing::info!(
            "{} snapshot: {} main, {} alt, dominance {}%",
            NAME,
            snapshot.main_assets.len(),
            snapshot.alt_assets.len(),
            snapshot.dominance_pct
        );
        Ok(snapshot)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/ping", self.base_url);
        get_json::<serde_json::Value>(&self.client, NAME, &url, &[]).await.is_ok()
    }

    fn name(&self) -> &str {
        NAME
    }
}
