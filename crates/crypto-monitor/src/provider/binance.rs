//! Binance Exchange Provider
//!
//! One all-pairs `/api/v3/ticker/24hr` call plus daily klines per main coin.
//! Dominance still comes from the aggregator's `/global`.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;

use super::{GlobalStatsClient, MarketProvider, ProviderSettings, get_json};
use crate::error::{MonitorError, Result};
use crate::model::Snapshot;
use crate::normalize::{self, Kline, Ticker24h, WEEK_CANDLES};

const NAME: &str = "Binance";

/// Binance-backed market provider
pub struct BinanceProvider {
    client: Client,
    base_url: String,
    global: GlobalStatsClient,
    settings: ProviderSettings,
}

impl BinanceProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        global: GlobalStatsClient,
        settings: ProviderSettings,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            global,
            settings,
        }
    }

    async fn tickers(&self) -> Result<Vec<Ticker24h>> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        get_json(&self.client, NAME, &url, &[]).await
    }

    async fn klines(&self, pair: String) -> Result<Vec<Kline>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let query = [
            ("symbol", pair),
            ("interval", "1d".to_string()),
            ("limit", WEEK_CANDLES.to_string()),
        ];
        get_json(&self.client, NAME, &url, &query).await
    }

    /// Daily candles per main-coin ticker; failed calls are left out
    async fn weekly_candles(&self) -> HashMap<String, Vec<Kline>> {
        let quote = &self.settings.quote_currency;
        let requests = self.settings.main_coins.iter().map(|coin| async move {
            let result = self.klines(format!("{}{}", coin.ticker, quote)).await;
            (coin.ticker.clone(), result)
        });

        join_all(requests)
            .await
            .into_iter()
            .filter_map(|(ticker, result)| match result {
                Ok(candles) => Some((ticker, candles)),
                Err(e) => {
                    tracing::warn!("{} klines for {} unavailable, 7d unknown: {}", NAME, ticker, e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl MarketProvider for BinanceProvider {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let (tickers, candles, global) =
            tokio::join!(self.tickers(), self.weekly_candles(), self.global.fetch());
        let tickers = tickers?;

        let quote = &self.settings.quote_currency;
        let listed = self
            .settings
            .main_coins
            .iter()
            .any(|c| tickers.iter().any(|t| t.symbol == format!("{}{}", c.ticker, quote)));
        if !listed {
            return Err(MonitorError::malformed(NAME, format!("no main coin listed against {quote}")));
        }

        let main_assets =
            normalize::binance_main_assets(&self.settings.main_coins, &tickers, &candles, quote);
        let dominance = normalize::resolve_dominance(global.as_ref(), self.settings.dominance_fallback);
        let btc_change = main_assets
            .values()
            .find(|a| a.ticker == "BTC")
            .and_then(|a| a.change_24h_pct);

        let mut snapshot = Snapshot::new(NAME, dominance.pct);
        snapshot.dominance_change_pct = normalize::dominance_change(&dominance, btc_change);
        snapshot.alt_assets = normalize::binance_alt_assets(&tickers, quote, &self.settings.filter);
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
        let url = format!("{}/api/v3/ping", self.base_url);
        get_json::<serde_json::Value>(&self.client, NAME, &url, &[]).await.is_ok()
    }

    fn name(&self) -> &str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::RawQuery;
    use axum::http::StatusCode;
    use axum::routing::get;
    use rust_decimal_macros::dec;

    use crate::model::MainCoin;
    use crate::normalize::UniverseFilter;
    use crate::provider::http_client;
    use crate::testing::{RequestLog, serve};

    const TICKERS: &str = r#"[
        {"symbol": "BTCUSDT", "lastPrice": "50000.00", "priceChangePercent": "2.000",
         "highPrice": "50500.00", "lowPrice": "48500.00", "quoteVolume": "1500000000.0"},
        {"symbol": "ETHUSDT", "lastPrice": "3000.00", "priceChangePercent": "-1.000",
         "highPrice": "3100.00", "lowPrice": "2950.00", "quoteVolume": "800000000.0"},
        {"symbol": "WIFUSDT", "lastPrice": "2.10", "priceChangePercent": "11.000",
         "highPrice": "2.20", "lowPrice": "1.80", "quoteVolume": "90000000.0"}
    ]"#;

    const UNLISTED: &str = r#"[
        {"symbol": "BTCEUR", "lastPrice": "46000.00", "priceChangePercent": "2.000",
         "quoteVolume": "90000000.0"},
        {"symbol": "WIFUSDT", "lastPrice": "2.10", "priceChangePercent": "11.000",
         "quoteVolume": "90000000.0"}
    ]"#;

    const THREE_CANDLES: &str = r#"[
        [1700000000000, "40000", "41000", "39000", "40000.00", "10"],
        [1700086400000, "40000", "41000", "39000", "45000.00", "10"],
        [1700172800000, "45000", "51000", "44000", "50000.00", "10"]
    ]"#;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            main_coins: vec![MainCoin::new("bitcoin", "BTC"), MainCoin::new("ethereum", "ETH")],
            quote_currency: "USDT".into(),
            filter: UniverseFilter {
                min_volume: dec!(1_000_000),
                top_coins_limit: 100,
                top_gainers_limit: 5,
            },
            dominance_fallback: dec!(52.5),
        }
    }

    /// Exchange and aggregator endpoints served from one local fixture
    async fn provider(router: Router) -> BinanceProvider {
        let base_url = serve(router).await;
        let client = http_client(5).unwrap();
        let global = GlobalStatsClient::new(client.clone(), base_url.clone());
        BinanceProvider::new(client, base_url, global, settings())
    }

    #[tokio::test]
    async fn test_short_klines_leave_weekly_change_unknown() {
        let queries = RequestLog::default();
        let log = queries.clone();
        let router = Router::new()
            .route("/api/v3/ticker/24hr", get(|| async { TICKERS }))
            .route(
                "/api/v3/klines",
                get(move |RawQuery(query): RawQuery| {
                    let log = log.clone();
                    async move {
                        log.push(query.unwrap_or_default());
                        THREE_CANDLES
                    }
                }),
            )
            .route("/global", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

        let snapshot = provider(router).await.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.source, "Binance");
        let btc = &snapshot.main_assets["bitcoin"];
        assert_eq!(btc.price, Some(dec!(50000)));
        assert_eq!(btc.change_24h_pct, Some(dec!(2)));
        assert_eq!(btc.change_7d_pct, None);
        assert_eq!(snapshot.main_assets["ethereum"].change_7d_pct, None);
        assert_eq!(snapshot.dominance_pct, dec!(52.5));
        assert!(snapshot.alt_assets.contains_key("WIF"));

        let mut queries = queries.entries();
        queries.sort();
        assert_eq!(
            queries,
            vec![
                "symbol=BTCUSDT&interval=1d&limit=7".to_string(),
                "symbol=ETHUSDT&interval=1d&limit=7".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_klines_do_not_fail_snapshot() {
        let router = Router::new()
            .route("/api/v3/ticker/24hr", get(|| async { TICKERS }))
            .route("/api/v3/klines", get(|| async { StatusCode::BAD_REQUEST }))
            .route(
                "/global",
                get(|| async { r#"{"data": {"market_cap_percentage": {"btc": 56.0}}}"# }),
            );

        let snapshot = provider(router).await.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.main_assets["ethereum"].price, Some(dec!(3000)));
        assert_eq!(snapshot.main_assets["ethereum"].change_7d_pct, None);
        assert_eq!(snapshot.dominance_pct, dec!(56.0));
    }

    #[tokio::test]
    async fn test_no_listed_main_coin_is_error() {
        let router = Router::new()
            .route("/api/v3/ticker/24hr", get(|| async { UNLISTED }))
            .route("/api/v3/klines", get(|| async { THREE_CANDLES }))
            .route("/global", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

        let err = provider(router).await.fetch_snapshot().await.unwrap_err();
        assert!(err.to_string().contains("no main coin listed against USDT"), "{err}");
    }

    #[tokio::test]
    async fn test_ticker_failure_is_error() {
        let router = Router::new()
            .route("/api/v3/ticker/24hr", get(|| async { StatusCode::IM_A_TEAPOT }))
            .route("/global", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

        let err = provider(router).await.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, MonitorError::Status { status: 418, .. }), "{err}");
    }
}
