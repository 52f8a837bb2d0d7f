//! Domain Models
//!
//! The canonical price model every provider is normalized into.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!
//! Fields a provider could not supply are `None`, never zero.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A coin the monitor always reports on
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainCoin {
    /// Aggregator id (e.g. "bitcoin")
    pub id: String,

    /// Exchange ticker (e.g. "BTC")
    pub ticker: String,
}

impl MainCoin {
    pub fn new(id: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            ticker: ticker.into().to_uppercase(),
        }
    }

    /// Parse `bitcoin` or `bitcoin:BTC`
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        match entry.split_once(':') {
            Some((id, ticker)) if !id.trim().is_empty() && !ticker.trim().is_empty() => {
                Some(Self::new(id.trim(), ticker.trim()))
            }
            Some(_) => None,
            None => {
                let ticker = known_ticker(entry).map_or_else(|| entry.to_uppercase(), str::to_string);
                Some(Self::new(entry, ticker))
            }
        }
    }

    pub fn is_bitcoin(&self) -> bool {
        self.id == "bitcoin" || self.ticker == "BTC"
    }
}

/// Exchange ticker for well-known aggregator ids
fn known_ticker(id: &str) -> Option<&'static str> {
    match id.to_lowercase().as_str() {
        "bitcoin" => Some("BTC"),
        "ethereum" => Some("ETH"),
        "solana" => Some("SOL"),
        "binancecoin" => Some("BNB"),
        "ripple" => Some("XRP"),
        "cardano" => Some("ADA"),
        "dogecoin" => Some("DOGE"),
        "polkadot" => Some("DOT"),
        "avalanche-2" => Some("AVAX"),
        "chainlink" => Some("LINK"),
        "litecoin" => Some("LTC"),
        "tron" => Some("TRX"),
        "the-open-network" => Some("TON"),
        _ => None,
    }
}

/// Full record for a main asset
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Exchange ticker (e.g. "BTC")
    pub ticker: String,

    /// Last price in USD
    pub price: Option<Decimal>,

    /// 24h low
    pub low_24h: Option<Decimal>,

    /// 24h high
    pub high_24h: Option<Decimal>,

    /// 24h price change, percent
    pub change_24h_pct: Option<Decimal>,

    /// 7d price change, percent
    pub change_7d_pct: Option<Decimal>,
}

impl AssetRecord {
    /// Record with every field unknown
    pub fn unknown(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }
}

/// Lighter record for an altcoin in the top-gainer universe
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AltAssetRecord {
    pub price: Decimal,
    pub change_24h_pct: Decimal,
    pub volume_24h_quote: Decimal,
}

/// One normalized, timestamped reading of market state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Acquisition time
    pub as_of: DateTime<Utc>,

    /// Provider that produced this snapshot
    pub source: String,

    /// Main assets keyed by aggregator id; one entry per configured main coin
    pub main_assets: BTreeMap<String, AssetRecord>,

    /// Altcoins keyed by ticker; order carries no meaning
    pub alt_assets: HashMap<String, AltAssetRecord>,

    /// Bitcoin market-cap share, always within [0, 100]
    pub dominance_pct: Decimal,

    /// 24h change of dominance, zero when unknown
    pub dominance_change_pct: Decimal,
}

impl Snapshot {
    pub fn new(source: impl Into<String>, dominance_pct: Decimal) -> Self {
        Self {
            as_of: Utc::now(),
            source: source.into(),
            main_assets: BTreeMap::new(),
            alt_assets: HashMap::new(),
            dominance_pct,
            dominance_change_pct: Decimal::ZERO,
        }
    }

    /// Main asset by aggregator id
    pub fn main_asset(&self, id: &str) -> Option<&AssetRecord> {
        self.main_assets.get(id)
    }

    /// Main asset by exchange ticker
    pub fn main_asset_by_ticker(&self, ticker: &str) -> Option<&AssetRecord> {
        self.main_assets.values().find(|a| a.ticker.eq_ignore_ascii_case(ticker))
    }

    /// Bitcoin's record, if bitcoin is among the main coins
    pub fn bitcoin(&self) -> Option<&AssetRecord> {
        self.main_asset("bitcoin").or_else(|| self.main_asset_by_ticker("BTC"))
    }

    /// Altcoins sorted by 24h change descending, truncated to `limit`
    pub fn top_gainers(&self, limit: usize) -> Vec<(&str, &AltAssetRecord)> {
        let mut ranked: Vec<(&str, &AltAssetRecord)> = self
            .alt_assets
            .iter()
            .map(|(symbol, record)| (symbol.as_str(), record))
            .collect();

        ranked.sort_by(|a, b| {
            b.1.change_24h_pct
                .cmp(&a.1.change_24h_pct)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// A significant move of a main asset since the previous snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Exchange ticker (e.g. "BTC")
    pub symbol: String,

    /// Signed percent change
    pub change_pct: Decimal,

    pub current_price: Decimal,
    pub previous_price: Decimal,
}
