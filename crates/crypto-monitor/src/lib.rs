//! # crypto-monitor
//!
//! Market data aggregation and price-change detection for the crypto-pulse bot.
//!
//! ## Pipeline
//!
//! ```text
//! Scheduler ──► MarketDataService ──► CoinGecko ─┐
//!     │                │            └► Binance ──┴► normalize ──► Snapshot
//!     │                ▼
//!     │         detector (vs LastPrices) ──► Alert ──► report ──► ChatChannel
//!     │                │
//!     └────────────────┴──► should_report ──► AdviceGenerator ──► report
//! ```
//!
//! - **Providers are tried in order** - the aggregator first, the exchange as fallback
//! - **Unknown is not zero** - every optional figure is `Option<Decimal>`
//! - **Dominance never fails** - a configured constant substitutes for bad data
//! - **One cycle at a time** - the scheduler serializes cycles behind its `LastPrices` lock

pub mod advice;
pub mod channel;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod report;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use advice::{Advice, AdviceGenerator, AdviceSource};
pub use channel::{ChatChannel, MemoryChannel, TelegramChannel};
pub use config::{MonitorConfig, ProviderKind};
pub use detector::{detect_alerts, should_report};
pub use error::{MonitorError, Result};
pub use model::{Alert, AltAssetRecord, AssetRecord, MainCoin, Snapshot};
pub use provider::{BinanceProvider, CoinGeckoProvider, MarketProvider, MockMarketProvider};
pub use scheduler::{CycleOutcome, ReportKind, Scheduler, SchedulerState};
pub use service::MarketDataService;
