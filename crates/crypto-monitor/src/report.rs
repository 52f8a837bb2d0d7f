//! Report Formatter
//!
//! Renders snapshots, alerts and service status as Telegram Markdown.
//! Unknown figures render as `N/A`; zero and negative values are shown as-is.

use rust_decimal::Decimal;

use crate::config::MonitorConfig;
use crate::model::{Alert, AssetRecord, Snapshot};
use crate::scheduler::SchedulerState;

pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// `1234567.891` → `1,234,567.89`; sub-dollar prices keep up to eight decimals
pub fn format_price(value: Decimal) -> String {
    let text = if value.abs() >= Decimal::ONE {
        format!("{:.2}", value.round_dp(2))
    } else {
        value.round_dp(8).normalize().to_string()
    };
    group_thousands(&text)
}

/// Price or `N/A`
pub fn format_usd(value: Option<Decimal>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), format_price)
}

/// Signed percent with two decimals, or `N/A`
pub fn format_pct(value: Option<Decimal>) -> String {
    match value {
        Some(v) if v > Decimal::ZERO => format!("+{:.2}%", v.round_dp(2)),
        Some(v) => format!("{:.2}%", v.round_dp(2)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Quote volume in millions, e.g. `90.00M`
pub fn format_volume(value: Decimal) -> String {
    let millions = value / Decimal::from(1_000_000);
    format!("{:.2}M", millions.round_dp(2))
}

fn group_thousands(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

fn asset_block(id: &str, asset: &AssetRecord) -> String {
    if asset.price.is_none() {
        return format!("*{}*: Data unavailable\n\n", id.to_uppercase());
    }

    format!(
        "*{}*\n💰 Current: ${}\n📊 24h: {} (7d: {})\n📉 Min: ${}\n📈 Max: ${}\n\n",
        id.to_uppercase(),
        format_usd(asset.price),
        format_pct(asset.change_24h_pct),
        format_pct(asset.change_7d_pct),
        format_usd(asset.low_24h),
        format_usd(asset.high_24h),
    )
}

fn market_body(snapshot: &Snapshot) -> String {
    let mut body: String = snapshot
        .main_assets
        .iter()
        .map(|(id, asset)| asset_block(id, asset))
        .collect();

    body.push_str(&format!(
        "📈 BTC Dominance: {:.2}% ({} 24h)\n\n",
        snapshot.dominance_pct.round_dp(2),
        format_pct(Some(snapshot.dominance_change_pct))
    ));
    body
}

/// Full report: every main asset, dominance and the advice text
pub fn full_report(snapshot: &Snapshot, advice: &str) -> String {
    let mut message = String::from("🚀 *Crypto Report*\n\n");
    message.push_str(&market_body(snapshot));
    message.push_str(advice);
    message
}

/// Prices, dominance and top gainers without advice
pub fn prices_report(snapshot: &Snapshot, top_n: usize) -> String {
    let mut message = String::from("💰 *Current Prices*\n\n");
    message.push_str(&market_body(snapshot));

    let gainers = snapshot.top_gainers(top_n);
    if !gainers.is_empty() {
        message.push_str("🚀 *Top Gainers:*\n");
        for (symbol, record) in gainers {
            message.push_str(&format!(
                "{}: ${} ({}) (Vol: ${})\n",
                symbol,
                format_price(record.price),
                format_pct(Some(record.change_24h_pct)),
                format_volume(record.volume_24h_quote)
            ));
        }
    }

    message.trim_end().to_string()
}

/// One block per alert with direction, price and previous price
pub fn alert_message(alerts: &[Alert]) -> String {
    let mut message = String::from("🚨 PRICE ALERT!\n\n");
    for alert in alerts {
        let direction = if alert.change_pct > Decimal::ZERO { "📈" } else { "📉" };
        message.push_str(&format!(
            "{} {}: ${} ({})\nPrevious: ${}\n\n",
            direction,
            alert.symbol,
            format_price(alert.current_price),
            format_pct(Some(alert.change_pct)),
            format_price(alert.previous_price)
        ));
    }
    message.trim_end().to_string()
}

pub fn error_message(reason: &str) -> String {
    format!("❌ *Error*\n\n{reason}\n\nTry again later.")
}

fn check_mark(ok: bool) -> &'static str {
    if ok { "✅" } else { "❌" }
}

fn report_hours_text(config: &MonitorConfig) -> String {
    if config.report_hours.is_empty() {
        return "every hour".to_string();
    }
    config
        .report_hours
        .iter()
        .map(|h| format!("{h}:00"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Service status for `/status`
pub fn status_message(
    config: &MonitorConfig,
    state: SchedulerState,
    data_providers: &[(String, bool)],
    ai_providers: &[(String, bool)],
) -> String {
    let mut message = String::from("🔍 *Services Status*\n\n📊 *Market Data:*\n");
    for (name, ok) in data_providers {
        message.push_str(&format!("• {}: {}\n", name, check_mark(*ok)));
    }

    message.push_str("\n🤖 *AI Services:*\n");
    if ai_providers.is_empty() {
        message.push_str("• none configured (rule-based summary)\n");
    }
    for (name, ok) in ai_providers {
        message.push_str(&format!("• {}: {}\n", name, check_mark(*ok)));
    }

    message.push_str(&format!(
        "\n⚙️ *Settings:*\n• Check every: {} minutes\n• Alert threshold: {}%\n• Reports at: {}\n• Market check: {}\n\n✅ *Bot is running and monitoring the market*",
        config.check_interval_min,
        config.alert_threshold,
        report_hours_text(config),
        match state {
            SchedulerState::Idle => "idle",
            SchedulerState::CycleRunning => "in progress",
        }
    ));
    message
}

/// Command reference for `/help`
pub fn help_message(config: &MonitorConfig) -> String {
    let coins = config
        .main_coins
        .iter()
        .map(|c| format!("• {}", c.ticker))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📖 *Command Help*

*Main commands:*
📊 /report - Get full report with AI analysis
📈 /prices - Get prices only
🔍 /status - Check all services status
📖 /help - Show this help

*Automatic notifications:*
🚨 Price Alerts - every {} minutes when change >= {}%
📊 Scheduled Reports - at {}

*Monitored coins:*
{}",
        config.check_interval_min,
        config.alert_threshold,
        report_hours_text(config),
        coins
    )
}

/// Greeting for `/start`; sent with the report/prices keyboard
pub fn welcome_message() -> String {
    "🤖 *Welcome to Crypto Bot!*

I monitor cryptocurrency prices and send notifications about important changes.

*Available commands:*
📊 /report - Get full report with AI
📈 /prices - Get prices only

*Or use buttons below:*"
        .to_string()
}

pub fn unknown_command_message() -> String {
    "❌ Unknown command. Use /report or /prices to get data.".to_string()
}
