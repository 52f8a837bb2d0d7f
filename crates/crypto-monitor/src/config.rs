//! Monitor Configuration
//!
//! Every knob comes from the environment. Unparseable numbers fall back to
//! their defaults; `validate` rejects values that would make the pipeline
//! meaningless. Missing chat credentials are the only hard failure.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{MonitorError, Result};
use crate::model::MainCoin;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

/// Market data provider kinds, in the order they should be tried
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    CoinGecko,
    Binance,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "coingecko" | "aggregator" => Some(ProviderKind::CoinGecko),
            "binance" | "exchange" => Some(ProviderKind::Binance),
            _ => None,
        }
    }
}

/// Telegram credentials
#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
    pub webhook_url: Option<String>,
}

/// Thresholds and limits shared by the normalizer, detector and scheduler
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub telegram: TelegramConfig,

    /// Poll period in minutes
    pub check_interval_min: u64,

    pub main_coins: Vec<MainCoin>,

    /// Dominance used when the global stats call fails
    pub dominance_fallback: Decimal,

    /// Percent move since last snapshot that fires an alert
    pub alert_threshold: Decimal,

    /// Percent move since last snapshot that justifies a scheduled report
    pub report_min_change: Decimal,

    /// Local hours at which scheduled reports may go out; empty = any hour
    pub report_hours: Vec<u32>,

    /// Minimum 24h quote volume for the altcoin universe
    pub min_volume_usd: Decimal,

    /// Size of the liquidity-ranked altcoin universe
    pub top_coins_limit: usize,

    /// Number of top gainers kept
    pub top_gainers_limit: usize,

    /// Stable quote currency on the exchange
    pub quote_currency: String,

    pub providers: Vec<ProviderKind>,
    pub coingecko_url: String,
    pub binance_url: String,
    pub http_timeout_secs: u64,

    /// HTTP port for health checks and the webhook
    pub port: u16,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: String::new(),
                chat_id: String::new(),
                api_url: DEFAULT_TELEGRAM_URL.into(),
                webhook_url: None,
            },
            check_interval_min: 15,
            main_coins: vec![MainCoin::new("bitcoin", "BTC"), MainCoin::new("ethereum", "ETH")],
            dominance_fallback: dec!(50.0),
            alert_threshold: dec!(2),
            report_min_change: dec!(2.0),
            report_hours: vec![8, 14, 17, 20, 23],
            min_volume_usd: dec!(1_000_000),
            top_coins_limit: 100,
            top_gainers_limit: 5,
            quote_currency: "USDT".into(),
            providers: vec![ProviderKind::CoinGecko, ProviderKind::Binance],
            coingecko_url: DEFAULT_COINGECKO_URL.into(),
            binance_url: DEFAULT_BINANCE_URL.into(),
            http_timeout_secs: 15,
            port: 3000,
        }
    }
}

impl MonitorConfig {
    /// Load from process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bot_token = get("TG_BOT_TOKEN")
            .ok_or_else(|| MonitorError::Config("TG_BOT_TOKEN not set".into()))?;
        let chat_id = get("TG_CHAT_ID")
            .ok_or_else(|| MonitorError::Config("TG_CHAT_ID not set".into()))?;

        let main_coins = match get("MAIN_COINS") {
            Some(list) => list.split(',').filter_map(MainCoin::parse).collect(),
            None => defaults.main_coins,
        };

        let report_hours = match get("SCHEDULED_REPORT_HOURS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(|h| {
                    h.parse::<u32>()
                        .map_err(|_| MonitorError::Config(format!("invalid report hour: {h}")))
                })
                .collect::<Result<Vec<_>>>()?,
            None => defaults.report_hours,
        };

        let providers = match get("MARKET_PROVIDERS") {
            Some(list) => list
                .split(',')
                .filter(|p| !p.trim().is_empty())
                .map(|p| {
                    ProviderKind::parse(p)
                        .ok_or_else(|| MonitorError::Config(format!("unknown market provider: {p}")))
                })
                .collect::<Result<Vec<_>>>()?,
            None => defaults.providers,
        };

        let config = Self {
            telegram: TelegramConfig {
                bot_token,
                chat_id,
                api_url: get("TG_API_URL").unwrap_or(defaults.telegram.api_url),
                webhook_url: get("TG_WEBHOOK_URL"),
            },
            check_interval_min: parse_or(get("CHECK_INTERVAL_MIN"), defaults.check_interval_min),
            main_coins,
            dominance_fallback: parse_or(get("BTC_DOMINANCE_FALLBACK"), defaults.dominance_fallback),
            alert_threshold: parse_or(get("PRICE_ALERT_THRESHOLD"), defaults.alert_threshold),
            report_min_change: parse_or(get("SCHEDULED_REPORT_MIN_CHANGE"), defaults.report_min_change),
            report_hours,
            min_volume_usd: parse_or(get("MIN_VOLUME_USD"), defaults.min_volume_usd),
            top_coins_limit: parse_or(get("TOP_COINS_LIMIT"), defaults.top_coins_limit),
            top_gainers_limit: parse_or(get("TOP_GAINERS_LIMIT"), defaults.top_gainers_limit),
            quote_currency: get("QUOTE_CURRENCY")
                .map(|q| q.to_uppercase())
                .unwrap_or(defaults.quote_currency),
            providers,
            coingecko_url: get("COINGECKO_BASE_URL").unwrap_or(defaults.coingecko_url),
            binance_url: get("BINANCE_BASE_URL").unwrap_or(defaults.binance_url),
            http_timeout_secs: parse_or(get("HTTP_TIMEOUT_SECS"), defaults.http_timeout_secs),
            port: parse_or(get("PORT"), defaults.port),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_min == 0 {
            return Err(MonitorError::Config("CHECK_INTERVAL_MIN must be positive".into()));
        }
        if self.main_coins.is_empty() {
            return Err(MonitorError::Config("MAIN_COINS must name at least one coin".into()));
        }
        if self.alert_threshold <= Decimal::ZERO || self.report_min_change <= Decimal::ZERO {
            return Err(MonitorError::Config("thresholds must be positive".into()));
        }
        if self.dominance_fallback < Decimal::ZERO || self.dominance_fallback > Decimal::ONE_HUNDRED {
            return Err(MonitorError::Config("BTC_DOMINANCE_FALLBACK must be within 0..=100".into()));
        }
        if let Some(hour) = self.report_hours.iter().find(|h| **h > 23) {
            return Err(MonitorError::Config(format!("report hour out of range: {hour}")));
        }
        if self.top_coins_limit == 0 || self.top_gainers_limit == 0 {
            return Err(MonitorError::Config("top-N limits must be positive".into()));
        }
        if self.providers.is_empty() {
            return Err(MonitorError::Config("MARKET_PROVIDERS must name at least one provider".into()));
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_min * 60)
    }

    /// Whether scheduled reports may be sent during `hour`
    pub fn is_report_hour(&self, hour: u32) -> bool {
        self.report_hours.is_empty() || self.report_hours.contains(&hour)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
