//! Fill simulation: slippage, commission, and order sizing.
//!
//! Every fill happens at the bar's close adjusted for slippage. Orders are
//! requested as a notional amount and turned into a share count here; the
//! ledger only ever sees (shares, fill price).

use super::config::ExecutionConfig;

/// Commission on a fill: max(notional * rate, min_commission). Zero for an
/// empty fill.
pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    if notional <= 0.0 {
        return 0.0;
    }
    (notional * config.commission_rate).max(config.min_commission)
}

/// Buy fill: close * (1 + slippage).
pub fn buy_fill_price(close: f64, config: &ExecutionConfig) -> f64 {
    close * (1.0 + config.slippage_rate)
}

/// Sell fill: close * (1 - slippage).
pub fn sell_fill_price(close: f64, config: &ExecutionConfig) -> f64 {
    close * (1.0 - config.slippage_rate)
}

/// Round down to whole lots; `lot_size == 0` leaves the count fractional.
pub fn round_to_lot(shares: f64, lot_size: u32) -> f64 {
    if lot_size == 0 {
        return shares;
    }
    let lot = lot_size as f64;
    (shares / lot).floor() * lot
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub shares: f64,
    pub price: f64,
}

/// Turn a notional buy request into a fill whose total cost, commission
/// included, never exceeds `notional`. `None` when nothing can be bought.
pub fn size_buy(notional: f64, close: f64, config: &ExecutionConfig) -> Option<Fill> {
    if notional <= 0.0 {
        return None;
    }
    let price = buy_fill_price(close, config);
    let budget = notional - calculate_commission(notional, config);
    if budget <= 0.0 {
        return None;
    }
    let shares = round_to_lot(budget / price, config.lot_size);
    (shares > 0.0).then_some(Fill { shares, price })
}

/// Sell `fraction` of `open_shares`, rounded down to whole lots. A fraction of
/// 1 sells everything, odd lots included.
pub fn size_sell(
    open_shares: f64,
    fraction: f64,
    close: f64,
    config: &ExecutionConfig,
) -> Option<Fill> {
    if open_shares <= 0.0 {
        return None;
    }
    let price = sell_fill_price(close, config);
    if fraction >= 1.0 {
        return Some(Fill {
            shares: open_shares,
            price,
        });
    }
    let shares = round_to_lot(open_shares * fraction, config.lot_size);
    (shares > 0.0).then_some(Fill { shares, price })
}

/// Volatility scaling of an order notional from ATR/close.
/// > 3% -> 0.7, > 2% -> 0.85, < 1% -> 1.15, otherwise 1.0. No ATR -> 1.0.
pub fn atr_factor(atr_ratio: Option<f64>) -> f64 {
    match atr_ratio {
        Some(r) if r > 0.03 => 0.7,
        Some(r) if r > 0.02 => 0.85,
        Some(r) if r < 0.01 => 1.15,
        _ => 1.0,
    }
}
