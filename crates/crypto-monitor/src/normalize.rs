//! Market Normalizer
//!
//! Provider-native payloads and the pure functions that turn them into a
//! [`Snapshot`]. Nothing here performs I/O.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{AltAssetRecord, AssetRecord, MainCoin};

/// Minimum candles for a 7-day change
pub const WEEK_CANDLES: usize = 7;

/// Liquidity and ranking limits for the altcoin universe
#[derive(Clone, Debug, PartialEq)]
pub struct UniverseFilter {
    /// Pairs must trade strictly more than this in 24h quote volume
    pub min_volume: Decimal,

    /// Universe size after the volume ranking
    pub top_coins_limit: usize,

    /// Gainers kept after the change ranking
    pub top_gainers_limit: usize,
}

// ---------------------------------------------------------------------------
// CoinGecko payloads
// ---------------------------------------------------------------------------

/// One entry of `/simple/price`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimplePrice {
    #[serde(default)]
    pub usd: Option<Decimal>,

    #[serde(default)]
    pub usd_24h_change: Option<Decimal>,
}

/// One entry of `/coins/markets`
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,

    #[serde(default)]
    pub current_price: Option<Decimal>,

    #[serde(default)]
    pub low_24h: Option<Decimal>,

    #[serde(default)]
    pub high_24h: Option<Decimal>,

    #[serde(default)]
    pub price_change_percentage_24h: Option<Decimal>,

    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<Decimal>,

    #[serde(default)]
    pub total_volume: Option<Decimal>,
}

/// `/global` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalData {
    /// Raw values so a non-numeric share degrades instead of failing the call
    #[serde(default)]
    pub market_cap_percentage: HashMap<String, Value>,

    #[serde(default)]
    pub market_cap_change_percentage_24h_usd: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Binance payloads
// ---------------------------------------------------------------------------

/// One entry of `/api/v3/ticker/24hr`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,

    #[serde(default)]
    pub last_price: Option<Decimal>,

    #[serde(default)]
    pub price_change_percent: Option<Decimal>,

    #[serde(default)]
    pub high_price: Option<Decimal>,

    #[serde(default)]
    pub low_price: Option<Decimal>,

    #[serde(default)]
    pub quote_volume: Option<Decimal>,
}

/// Kline rows are heterogeneous arrays; close price sits at index 4
pub type Kline = Vec<Value>;

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Percent change from `from` to `to`; `None` when `from` is zero
pub fn pct_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from.is_zero() {
        return None;
    }
    (to - from)
        .checked_div(from)
        .map(|ratio| ratio * Decimal::ONE_HUNDRED)
}

/// Lenient decimal from a JSON number or numeric string
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// 7-day change from the oldest candle's close to the latest price
pub fn seven_day_change(last_price: Option<Decimal>, klines: &[Kline]) -> Option<Decimal> {
    if klines.len() < WEEK_CANDLES {
        return None;
    }
    let first_close = klines.first()?.get(4).and_then(decimal_from_value)?;
    pct_change(first_close, last_price?)
}

// ---------------------------------------------------------------------------
// Dominance
// ---------------------------------------------------------------------------

/// Bitcoin dominance after validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dominance {
    pub pct: Decimal,

    /// Total market cap 24h change, if the global call reported it
    pub market_cap_change_24h: Option<Decimal>,

    pub from_fallback: bool,
}

/// Read BTC dominance from `/global`, substituting `fallback` for anything unusable
pub fn resolve_dominance(global: Option<&GlobalData>, fallback: Decimal) -> Dominance {
    let reported = global
        .and_then(|g| g.market_cap_percentage.get("btc"))
        .and_then(decimal_from_value)
        .filter(|pct| *pct >= Decimal::ZERO && *pct <= Decimal::ONE_HUNDRED);

    match reported {
        Some(pct) => Dominance {
            pct,
            market_cap_change_24h: global.and_then(|g| g.market_cap_change_percentage_24h_usd),
            from_fallback: false,
        },
        None => {
            tracing::warn!("BTC dominance unavailable, using fallback {}%", fallback);
            Dominance {
                pct: fallback,
                market_cap_change_24h: None,
                from_fallback: true,
            }
        }
    }
}

/// 24h dominance delta from the total-cap change `t` and BTC's price change `b`
///
/// `prev = dom * (1 + t/100) / (1 + b/100)`, `delta = dom - prev`.
pub fn dominance_change(dominance: &Dominance, btc_change_24h: Option<Decimal>) -> Decimal {
    if dominance.from_fallback {
        return Decimal::ZERO;
    }
    let (Some(total), Some(btc)) = (dominance.market_cap_change_24h, btc_change_24h) else {
        return Decimal::ZERO;
    };

    let hundred = Decimal::ONE_HUNDRED;
    let cap_factor = Decimal::ONE + total / hundred;
    let btc_factor = Decimal::ONE + btc / hundred;

    (dominance.pct * cap_factor)
        .checked_div(btc_factor)
        .map_or(Decimal::ZERO, |previous| (dominance.pct - previous).round_dp(4))
}

// ---------------------------------------------------------------------------
// Altcoin universe
// ---------------------------------------------------------------------------

/// Volume filter, volume ranking, positive-change filter, change ranking
///
/// Duplicate symbols keep only their most liquid entry.
pub fn select_gainers(
    candidates: Vec<(String, AltAssetRecord)>,
    filter: &UniverseFilter,
) -> HashMap<String, AltAssetRecord> {
    let mut liquid: Vec<(String, AltAssetRecord)> = candidates
        .into_iter()
        .filter(|(_, r)| r.volume_24h_quote > filter.min_volume)
        .collect();

    liquid.sort_by(|a, b| b.1.volume_24h_quote.cmp(&a.1.volume_24h_quote));
    let mut seen = HashSet::new();
    liquid.retain(|(symbol, _)| seen.insert(symbol.clone()));
    liquid.truncate(filter.top_coins_limit);

    let mut gainers: Vec<(String, AltAssetRecord)> = liquid
        .into_iter()
        .filter(|(_, r)| r.change_24h_pct > Decimal::ZERO)
        .collect();

    gainers.sort_by(|a, b| {
        b.1.change_24h_pct
            .cmp(&a.1.change_24h_pct)
            .then_with(|| a.0.cmp(&b.0))
    });
    gainers.truncate(filter.top_gainers_limit);

    gainers.into_iter().collect()
}

// ---------------------------------------------------------------------------
// CoinGecko
// ---------------------------------------------------------------------------

/// Merge `/simple/price` with the optional per-coin markets rows
///
/// Every configured coin gets an entry; a coin missing from both payloads
/// is all-unknown.
pub fn coingecko_main_assets(
    coins: &[MainCoin],
    prices: &HashMap<String, SimplePrice>,
    markets: &[CoinMarket],
) -> BTreeMap<String, AssetRecord> {
    coins
        .iter()
        .map(|coin| {
            let simple = prices.get(&coin.id);
            let market = markets.iter().find(|m| m.id == coin.id);

            let record = AssetRecord {
                ticker: coin.ticker.clone(),
                price: simple
                    .and_then(|s| s.usd)
                    .or_else(|| market.and_then(|m| m.current_price)),
                low_24h: market.and_then(|m| m.low_24h),
                high_24h: market.and_then(|m| m.high_24h),
                change_24h_pct: simple
                    .and_then(|s| s.usd_24h_change)
                    .or_else(|| market.and_then(|m| m.price_change_percentage_24h)),
                change_7d_pct: market.and_then(|m| m.price_change_percentage_7d_in_currency),
            };
            (coin.id.clone(), record)
        })
        .collect()
}

/// Altcoin gainers from the volume-ordered markets listing
pub fn coingecko_alt_assets(
    markets: &[CoinMarket],
    filter: &UniverseFilter,
) -> HashMap<String, AltAssetRecord> {
    let candidates = markets
        .iter()
        .filter_map(|m| {
            Some((
                m.symbol.to_uppercase(),
                AltAssetRecord {
                    price: m.current_price?,
                    change_24h_pct: m.price_change_percentage_24h?,
                    volume_24h_quote: m.total_volume?,
                },
            ))
        })
        .collect();

    select_gainers(candidates, filter)
}

// ---------------------------------------------------------------------------
// Binance
// ---------------------------------------------------------------------------

/// Main coins picked out of the all-pairs ticker list by `<TICKER><QUOTE>`
///
/// `klines` maps ticker to that coin's daily candles; a missing entry leaves
/// the 7-day change unknown.
pub fn binance_main_assets(
    coins: &[MainCoin],
    tickers: &[Ticker24h],
    klines: &HashMap<String, Vec<Kline>>,
    quote: &str,
) -> BTreeMap<String, AssetRecord> {
    coins
        .iter()
        .map(|coin| {
            let pair = format!("{}{}", coin.ticker, quote);
            let record = match tickers.iter().find(|t| t.symbol == pair) {
                Some(t) => AssetRecord {
                    ticker: coin.ticker.clone(),
                    price: t.last_price,
                    low_24h: t.low_price,
                    high_24h: t.high_price,
                    change_24h_pct: t.price_change_percent,
                    change_7d_pct: klines
                        .get(&coin.ticker)
                        .and_then(|k| seven_day_change(t.last_price, k)),
                },
                None => AssetRecord::unknown(coin.ticker.clone()),
            };
            (coin.id.clone(), record)
        })
        .collect()
}

/// Altcoin gainers among pairs quoted in `quote`, keyed by base asset
pub fn binance_alt_assets(
    tickers: &[Ticker24h],
    quote: &str,
    filter: &UniverseFilter,
) -> HashMap<String, AltAssetRecord> {
    let candidates = tickers
        .iter()
        .filter_map(|t| {
            let base = t.symbol.strip_suffix(quote).filter(|b| !b.is_empty())?;
            Some((
                base.to_string(),
                AltAssetRecord {
                    price: t.last_price?,
                    change_24h_pct: t.price_change_percent?,
                    volume_24h_quote: t.quote_volume?,
                },
            ))
        })
        .collect();

    select_gainers(candidates, filter)
}
