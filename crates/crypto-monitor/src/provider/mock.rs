//! Mock Market Provider
//!
//! For testing and demo purposes. Returns a canned snapshot or a canned
//! failure, optionally after a delay, and records fetch start/end events in order.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::MarketProvider;
use crate::error::{MonitorError, Result};
use crate::model::{AltAssetRecord, AssetRecord, Snapshot};

enum Outcome {
    Snapshot(Snapshot),
    Failure(String),
}

/// Mock provider with a configurable outcome
pub struct MockMarketProvider {
    name: String,
    outcome: Mutex<Outcome>,
    delay: Duration,
    events: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockMarketProvider {
    /// Provider that always returns `snapshot`
    pub fn new(name: impl Into<String>, snapshot: Snapshot) -> Self {
        Self::with_outcome(name, Outcome::Snapshot(snapshot))
    }

    /// Provider that always fails with `reason`
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_outcome(name, Outcome::Failure(reason.into()))
    }

    fn with_outcome(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome: Mutex::new(outcome),
            delay: Duration::ZERO,
            events: Mutex::default(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the canned snapshot
    pub fn set_snapshot(&self, snapshot: Snapshot) {
        if let Ok(mut outcome) = self.outcome.lock() {
            *outcome = Outcome::Snapshot(snapshot);
        }
    }

    /// Make subsequent fetches fail
    pub fn set_failure(&self, reason: impl Into<String>) {
        if let Ok(mut outcome) = self.outcome.lock() {
            *outcome = Outcome::Failure(reason.into());
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(format!("{}:{}", self.name, event));
        }
    }
}

/// Realistic static snapshot with BTC/ETH and a few altcoins
pub fn sample_snapshot(source: &str, btc_price: Decimal) -> Snapshot {
    let mut snapshot = Snapshot::new(source, dec!(54.2));
    snapshot.dominance_change_pct = dec!(0.35);

    snapshot.main_assets.insert(
        "bitcoin".into(),
        AssetRecord {
            ticker: "BTC".into(),
            price: Some(btc_price),
            low_24h: Some(btc_price * dec!(0.97)),
            high_24h: Some(btc_price * dec!(1.02)),
            change_24h_pct: Some(dec!(1.25)),
            change_7d_pct: Some(dec!(4.8)),
        },
    );
    snapshot.main_assets.insert(
        "ethereum".into(),
        AssetRecord {
            ticker: "ETH".into(),
            price: Some(dec!(3450)),
            low_24h: Some(dec!(3380)),
            high_24h: Some(dec!(3512.5)),
            change_24h_pct: Some(dec!(-0.8)),
            change_7d_pct: Some(dec!(2.1)),
        },
    );

    for (symbol, price, change, volume) in [
        ("SOL", dec!(195), dec!(6.4), dec!(3_000_000_000)),
        ("AVAX", dec!(42), dec!(5.5), dec!(450_000_000)),
        ("LINK", dec!(24.5), dec!(3.1), dec!(600_000_000)),
    ] {
        snapshot.alt_assets.insert(
            symbol.into(),
            AltAssetRecord {
                price,
                change_24h_pct: change,
                volume_24h_quote: volume,
            },
        );
    }

    snapshot
}

#[async_trait]
impl MarketProvider for MockMarketProvider {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record("start");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match self.outcome.lock() {
            Ok(outcome) => match &*outcome {
                Outcome::Snapshot(snapshot) => Ok(snapshot.clone()),
                Outcome::Failure(reason) => Err(MonitorError::provider(self.name.clone(), reason)),
            },
            Err(_) => Err(MonitorError::provider(self.name.clone(), "mock state poisoned")),
        };

        self.record("end");
        result
    }

    async fn health_check(&self) -> bool {
        self.outcome
            .lock()
            .map(|o| matches!(*o, Outcome::Snapshot(_)))
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockMarketProvider::new("Mock", sample_snapshot("Mock", dec!(97500)));

        let snapshot = provider.fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.bitcoin().unwrap().price, Some(dec!(97500)));
        assert!(provider.health_check().await);
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.events(), vec!["Mock:start", "Mock:end"]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let provider = MockMarketProvider::new("Mock", sample_snapshot("Mock", dec!(1)));
        provider.set_failure("HTTP 429");

        let err = provider.fetch_snapshot().await.unwrap_err();
        assert_eq!(err.to_string(), "Mock: HTTP 429");
        assert!(!provider.health_check().await);
    }
}
