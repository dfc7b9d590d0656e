//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n inputs, then
//! EMA[i] = X[i]*k + EMA[i-1]*(1-k). The first (n-1) inputs are warmup.
//!
//! Works on any `Reading` series so the MACD signal line can be an EMA of the
//! MACD line: the seed window starts at the first `Ready` input.

use crate::domain::indicator::Reading;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> Vec<Reading<f64>> {
    let closes: Vec<Reading<f64>> = bars.iter().map(|b| Reading::Ready(b.close)).collect();
    ema_of(&closes, period)
}

pub fn ema_of(values: &[Reading<f64>], period: usize) -> Vec<Reading<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        out.resize(values.len(), Reading::Warmup);
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut seen = 0usize;
    let mut sum = 0.0;
    let mut ema = 0.0;

    for value in values {
        let Some(x) = value.ready() else {
            // Inputs only ever go Warmup -> Ready, so a gap before the seed
            // just delays it.
            out.push(Reading::Warmup);
            continue;
        };
        seen += 1;
        if seen < period {
            sum += x;
            out.push(Reading::Warmup);
        } else if seen == period {
            sum += x;
            ema = sum / period as f64;
            out.push(Reading::Ready(ema));
        } else {
            ema = x * k + ema * (1.0 - k);
            out.push(Reading::Ready(ema));
        }
    }

    out
}
