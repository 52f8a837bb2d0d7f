//! Change Detector
//!
//! Compares the current snapshot with the previous one. A zero or unknown
//! price on either side is skipped rather than producing a bogus change.

use rust_decimal::Decimal;

use crate::model::{Alert, Snapshot};
use crate::normalize::pct_change;

/// Main-asset moves whose magnitude reaches `threshold` percent
pub fn detect_alerts(current: &Snapshot, previous: Option<&Snapshot>, threshold: Decimal) -> Vec<Alert> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    current
        .main_assets
        .iter()
        .filter_map(|(id, asset)| {
            let current_price = asset.price?;
            let previous_price = previous.main_asset(id)?.price?;
            let change_pct = pct_change(previous_price, current_price)?;

            (change_pct.abs() >= threshold).then(|| Alert {
                symbol: asset.ticker.clone(),
                change_pct,
                current_price,
                previous_price,
            })
        })
        .collect()
}

/// Whether any asset present in both snapshots moved by at least `min_change` percent
///
/// Always true without a previous snapshot.
pub fn should_report(current: &Snapshot, previous: Option<&Snapshot>, min_change: Decimal) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    let crosses = |from: Decimal, to: Decimal| {
        pct_change(from, to).is_some_and(|change| change.abs() >= min_change)
    };

    let main_moved = current.main_assets.iter().any(|(id, asset)| {
        match (previous.main_asset(id).and_then(|p| p.price), asset.price) {
            (Some(from), Some(to)) => crosses(from, to),
            _ => false,
        }
    });

    let alt_moved = current.alt_assets.iter().any(|(symbol, asset)| {
        previous
            .alt_assets
            .get(symbol)
            .is_some_and(|prev| crosses(prev.price, asset.price))
    });

    main_moved || alt_moved
}
