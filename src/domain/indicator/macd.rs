//! MACD (Moving Average Convergence Divergence), the trend oscillator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: the line is defined from bar slow-1, the full point (with signal
//! and histogram) from bar slow-1 + signal-1.

use crate::domain::indicator::ema::{calculate_ema, ema_of};
use crate::domain::indicator::{MacdPoint, Reading};
use crate::domain::ohlcv::OhlcvBar;

pub fn macd_line(bars: &[OhlcvBar], fast: usize, slow: usize) -> Vec<Reading<f64>> {
    let ema_fast = calculate_ema(bars, fast);
    let ema_slow = calculate_ema(bars, slow);

    ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f.ready(), s.ready()) {
            (Some(f), Some(s)) => Reading::Ready(f - s),
            _ => Reading::Warmup,
        })
        .collect()
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<Reading<MacdPoint>> {
    macd_from_line(&macd_line(bars, fast, slow), signal_period)
}

/// Signal and histogram over an already computed MACD line.
pub fn macd_from_line(line: &[Reading<f64>], signal_period: usize) -> Vec<Reading<MacdPoint>> {
    let signal = ema_of(line, signal_period);

    line.iter()
        .zip(&signal)
        .map(|(l, s)| match (l.ready(), s.ready()) {
            (Some(line), Some(signal)) => Reading::Ready(MacdPoint {
                line,
                signal,
                histogram: line - signal,
            }),
            _ => Reading::Warmup,
        })
        .collect()
}
