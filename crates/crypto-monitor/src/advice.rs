//! Advice Generator
//!
//! Best-effort commentary from the generative-text provider chain, with a
//! deterministic rule-based summary whenever no provider answers.

use agent_core::{GenerationOptions, Message, ProviderChain};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::Snapshot;
use crate::report::{format_pct, format_price, format_usd, format_volume};

/// Alt gainers included in the provider prompt
const PROMPT_GAINERS: usize = 3;

/// Where a piece of advice came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdviceSource {
    Provider(String),
    RuleBased,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advice {
    pub source: AdviceSource,
    pub text: String,
}

/// Provider chain plus the rule-based fallback
#[derive(Clone)]
pub struct AdviceGenerator {
    chain: ProviderChain,
    top_n: usize,
}

impl AdviceGenerator {
    pub fn new(chain: ProviderChain, top_n: usize) -> Self {
        Self { chain, top_n }
    }

    /// Rule-based only
    pub fn rule_based(top_n: usize) -> Self {
        Self::new(ProviderChain::default(), top_n)
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Never fails; degrades to the rule-based summary
    pub async fn advice(&self, snapshot: &Snapshot) -> Advice {
        if self.chain.is_empty() {
            return self.fallback(snapshot);
        }

        let messages = [Message::user(build_prompt(snapshot))];
        match self.chain.complete(&messages, &GenerationOptions::default()).await {
            Ok(result) => Advice {
                text: format!(
                    "🤖 AI Analysis ({}):\n{}",
                    result.provider,
                    result.completion.content.trim()
                ),
                source: AdviceSource::Provider(result.provider),
            },
            Err(e) => {
                tracing::warn!("All AI services unavailable, using rule-based summary: {}", e);
                self.fallback(snapshot)
            }
        }
    }

    fn fallback(&self, snapshot: &Snapshot) -> Advice {
        Advice {
            source: AdviceSource::RuleBased,
            text: rule_based_summary(snapshot, self.top_n),
        }
    }
}

/// Prompt with BTC/ETH, dominance and the strongest gaining altcoins
pub fn build_prompt(snapshot: &Snapshot) -> String {
    let line = |ticker: &str| {
        let asset = snapshot.main_asset_by_ticker(ticker);
        format!(
            "{}: ${} ({} 24h)",
            ticker,
            format_usd(asset.and_then(|a| a.price)),
            format_pct(asset.and_then(|a| a.change_24h_pct))
        )
    };

    let gainers: Vec<String> = snapshot
        .top_gainers(PROMPT_GAINERS)
        .into_iter()
        .filter(|(_, r)| r.change_24h_pct > Decimal::ZERO)
        .map(|(symbol, r)| format!("- {}: {}", symbol, format_pct(Some(r.change_24h_pct))))
        .collect();
    let alts = if gainers.is_empty() {
        String::new()
    } else {
        format!("\nAltcoins (gaining):\n{}", gainers.join("\n"))
    };

    format!(
        "You are a crypto trader. Analyze this data in SIMPLE terms:

{}
{}
BTC Dominance: {:.2}% ({} 24h){}

Write in SIMPLE language (max 1-2 sentences each):
📉 Market: BTC going up/down? Key price?
📊 BTC Dominance: Altcoins pump soon?
💰 Strategy: Buy/sell prices (if clear opportunity)
🚀 Altcoins: Pick the best coin with 5-15% gains (avoid 20%+ pumps). Which coin is starting to move?

Be extremely brief. If no clear opportunity, say \"No clear signals\" or skip section.",
        line("BTC"),
        line("ETH"),
        snapshot.dominance_pct,
        format_pct(Some(snapshot.dominance_change_pct)),
        alts
    )
}

/// Deterministic market summary
///
/// BTC trend buckets at ±2%, dominance buckets at 50/55%, recommendation at
/// ±5%. Total for any snapshot: unknown figures read as "unclear"/"hold".
pub fn rule_based_summary(snapshot: &Snapshot, top_n: usize) -> String {
    let btc_change = snapshot.bitcoin().and_then(|b| b.change_24h_pct);

    let trend = match btc_change {
        Some(c) if c >= dec!(2) => "BTC is trending up strongly",
        Some(c) if c >= Decimal::ZERO => "BTC is edging up",
        Some(c) if c > dec!(-2) => "BTC is edging down",
        Some(_) => "BTC is under heavy selling pressure",
        None => "BTC trend unclear",
    };

    let dominance = snapshot.dominance_pct;
    let dominance_view = if dominance > dec!(55) {
        "high, capital is concentrated in BTC"
    } else if dominance > dec!(50) {
        "moderate, altcoins follow BTC"
    } else {
        "low, room for altcoin moves"
    };

    let strategy = match btc_change {
        Some(c) if c >= dec!(5) => "Take partial profits",
        Some(c) if c <= dec!(-5) => "Consider buying the dip in stages",
        _ => "Hold, no clear signals",
    };

    let mut text = format!(
        "📊 Market Summary:\n📉 Market: {} ({} 24h)\n📊 BTC Dominance: {:.2}% - {}\n💰 Strategy: {}",
        trend,
        format_pct(btc_change),
        dominance,
        dominance_view,
        strategy
    );

    let gainers = snapshot.top_gainers(top_n);
    if gainers.is_empty() {
        text.push_str("\n🚀 Top Gainers: none above the volume floor");
    } else {
        text.push_str("\n🚀 Top Gainers:");
        for (symbol, record) in gainers {
            text.push_str(&format!(
                "\n{}: ${} ({}) (Vol: ${})",
                symbol,
                format_price(record.price),
                format_pct(Some(record.change_24h_pct)),
                format_volume(record.volume_24h_quote)
            ));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AltAssetRecord, AssetRecord};
    use agent_core::{
        AgentError, Completion, LlmProvider, Result as AgentResult,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    fn snapshot(btc_change: Option<Decimal>, dominance: Decimal) -> Snapshot {
        let mut snapshot = Snapshot::new("test", dominance);
        snapshot.main_assets.insert(
            "bitcoin".into(),
            AssetRecord {
                price: Some(dec!(67000)),
                change_24h_pct: btc_change,
                ..AssetRecord::unknown("BTC")
            },
        );
        snapshot
    }

    struct FixedProvider {
        name: &'static str,
        healthy: bool,
        reply: &'static str,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn health_check(&self) -> AgentResult<bool> {
            Ok(self.healthy)
        }

        async fn complete(&self, _: &[Message], _: &GenerationOptions) -> AgentResult<Completion> {
            if self.reply.is_empty() {
                return Err(AgentError::Provider("boom".into()));
            }
            Ok(Completion {
                content: self.reply.into(),
                model: "fixed".into(),
                usage: None,
            })
        }
    }

    fn chain(providers: Vec<FixedProvider>) -> ProviderChain {
        ProviderChain::new(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                .collect(),
        )
    }

    #[test]
    fn test_trend_boundaries() {
        let strong = rule_based_summary(&snapshot(Some(dec!(2.00)), dec!(50)), 5);
        assert!(strong.contains("trending up strongly"));

        let slight_up = rule_based_summary(&snapshot(Some(dec!(1.99)), dec!(50)), 5);
        assert!(slight_up.contains("edging up"));

        let flat = rule_based_summary(&snapshot(Some(Decimal::ZERO), dec!(50)), 5);
        assert!(flat.contains("edging up"));

        let slight_down = rule_based_summary(&snapshot(Some(dec!(-1.5)), dec!(50)), 5);
        assert!(slight_down.contains("edging down"));

        let strong_down = rule_based_summary(&snapshot(Some(dec!(-2)), dec!(50)), 5);
        assert!(strong_down.contains("selling pressure"));
    }

    #[test]
    fn test_recommendation_boundaries() {
        let dip = rule_based_summary(&snapshot(Some(dec!(-5.00)), dec!(50)), 5);
        assert!(dip.contains("buying the dip"));

        let almost = rule_based_summary(&snapshot(Some(dec!(-4.99)), dec!(50)), 5);
        assert!(almost.contains("Hold"));

        let profit = rule_based_summary(&snapshot(Some(dec!(5)), dec!(50)), 5);
        assert!(profit.contains("Take partial profits"));
    }

    #[test]
    fn test_dominance_buckets() {
        assert!(rule_based_summary(&snapshot(None, dec!(55.01)), 5).contains("high"));
        assert!(rule_based_summary(&snapshot(None, dec!(55)), 5).contains("moderate"));
        assert!(rule_based_summary(&snapshot(None, dec!(50)), 5).contains("low"));
    }

    #[test]
    fn test_unknown_and_empty_inputs() {
        let empty = Snapshot::new("test", dec!(50));
        let text = rule_based_summary(&empty, 5);
        assert!(text.contains("trend unclear"));
        assert!(text.contains("N/A"));
        assert!(text.contains("Hold"));
        assert!(text.contains("none above the volume floor"));
    }

    #[test]
    fn test_gainers_listed_in_order() {
        let mut snapshot = snapshot(Some(dec!(1)), dec!(52));
        for (symbol, change) in [("SOL", dec!(6.4)), ("WIF", dec!(11)), ("LINK", dec!(3.1))] {
            snapshot.alt_assets.insert(
                symbol.into(),
                AltAssetRecord {
                    price: dec!(2.5),
                    change_24h_pct: change,
                    volume_24h_quote: dec!(90_000_000),
                },
            );
        }

        let text = rule_based_summary(&snapshot, 2);
        let wif = text.find("WIF").unwrap();
        let sol = text.find("SOL").unwrap();
        assert!(wif < sol);
        assert!(!text.contains("LINK"));
        assert!(text.contains("WIF: $2.50 (+11.00%) (Vol: $90.00M)"));
    }

    #[test]
    fn test_prompt_contents() {
        let mut snapshot = snapshot(Some(dec!(1.84)), dec!(54.2));
        snapshot.alt_assets.insert(
            "PEPE".into(),
            AltAssetRecord {
                price: dec!(0.0000121),
                change_24h_pct: dec!(14.2),
                volume_24h_quote: dec!(900_000_000),
            },
        );

        let prompt = build_prompt(&snapshot);
        assert!(prompt.contains("BTC: $67,000.00 (+1.84% 24h)"));
        assert!(prompt.contains("ETH: $N/A (N/A 24h)"));
        assert!(prompt.contains("BTC Dominance: 54.20%"));
        assert!(prompt.contains("- PEPE: +14.20%"));
    }

    #[tokio::test]
    async fn test_no_providers_is_rule_based() {
        let generator = AdviceGenerator::rule_based(5);
        let advice = generator.advice(&snapshot(Some(dec!(1)), dec!(50))).await;
        assert_eq!(advice.source, AdviceSource::RuleBased);
        assert!(advice.text.starts_with("📊 Market Summary:"));
    }

    #[tokio::test]
    async fn test_provider_fallback_order() {
        let generator = AdviceGenerator::new(
            chain(vec![
                FixedProvider { name: "OpenAI", healthy: false, reply: "unused" },
                FixedProvider { name: "Gemini", healthy: true, reply: "" },
                FixedProvider { name: "DeepSeek", healthy: true, reply: "No clear signals" },
            ]),
            5,
        );

        let advice = generator.advice(&snapshot(Some(dec!(1)), dec!(50))).await;
        assert_eq!(advice.source, AdviceSource::Provider("DeepSeek".into()));
        assert_eq!(advice.text, "🤖 AI Analysis (DeepSeek):\nNo clear signals");
    }

    #[tokio::test]
    async fn test_all_providers_down_degrades() {
        let generator = AdviceGenerator::new(
            chain(vec![FixedProvider { name: "OpenAI", healthy: false, reply: "x" }]),
            5,
        );

        let advice = generator.advice(&snapshot(Some(dec!(-6)), dec!(50))).await;
        assert_eq!(advice.source, AdviceSource::RuleBased);
        assert!(advice.text.contains("buying the dip"));
    }
}
