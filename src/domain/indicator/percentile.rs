//! Rolling valuation percentile of the close.
//!
//! For a window of n closes ending at bar i, the percentile is the share of
//! the other n-1 closes that are at or below the current close. The window
//! low reads 0, the window high reads 1. Ties count against the current close,
//! so a flat stretch reads as expensive rather than cheap.
//!
//! Warmup: first (n-1) bars. Windows shorter than 2 never become ready.

use crate::domain::indicator::Reading;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_percentile(bars: &[OhlcvBar], window: usize) -> Vec<Reading<f64>> {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if window < 2 || i + 1 < window {
            values.push(Reading::Warmup);
            continue;
        }

        let current = bars[i].close;
        let others = &bars[i + 1 - window..i];
        let at_or_below = others.iter().filter(|b| b.close <= current).count();
        values.push(Reading::Ready(at_or_below as f64 / (window - 1) as f64));
    }

    values
}
